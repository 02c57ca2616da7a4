use std::env;
use std::fs;

use amn::status::trace;
use amn::{load, InstructionSet};
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Usage: trace <AM0|AM1> <file> [inputs...]
fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .init()?; // logging

    let mut args = env::args().skip(1);
    let instruction_set: InstructionSet = args
        .next()
        .unwrap_or_else(|| "AM0".into())
        .parse()?;
    let path = args.next().unwrap_or_else(|| "demos/programs/sum_of_squares.am0".into());
    let inputs = args
        .map(|arg| arg.parse::<i64>().wrap_err_with(|| format!("Invalid input: {}", arg)))
        .collect::<Result<Vec<_>>>()?;

    let text = fs::read_to_string(&path).wrap_err_with(|| format!("Failed to read {}", path))?;
    let program = load(&text, instruction_set)?;

    let (lines, result) = trace(&program, &inputs);
    for line in lines {
        eprintln!("{}", line);
    }
    result?;

    Ok(())
}
