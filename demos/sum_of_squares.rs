use std::collections::VecDeque;

use amn::io::LogOutput;
use amn::{load, run, InstructionSet};
use color_eyre::eyre::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;

const PROGRAM: &str = include_str!("programs/sum_of_squares.am0");

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    let program = load(PROGRAM, InstructionSet::Am0)?;
    let mut input: VecDeque<i64> = vec![10].into();

    let (state, result) = run(&program, &mut input, &mut LogOutput);
    result?;

    log::info!("Final counter: {}", state.counter);

    Ok(())
}
