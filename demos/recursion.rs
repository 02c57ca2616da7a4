use std::io::{stdin, stdout, BufReader};

use amn::io::{LogOutput, Prompt};
use amn::processor::Processor;
use amn::{load, InstructionSet};
use color_eyre::eyre::Result;
use simple_logger::SimpleLogger;

const PROGRAM: &str = include_str!("programs/double.am1");

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init()?; // logging

    let program = load(PROGRAM, InstructionSet::Am1)?;
    let mut cpu = Processor::new(InstructionSet::Am1);
    let mut input = Prompt::new(BufReader::new(stdin()), stdout());

    cpu.run(&program, &mut input, &mut LogOutput)?;

    print!("{}", cpu.status());

    Ok(())
}
