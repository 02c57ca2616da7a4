//! Line based driver executing single instructions:
//!
//!     exec LIT 3
//!     status
//!     state
//!     reset
//!     exit

use std::io::{stdin, stdout, BufRead, BufReader, Write};

use amn::io::{LogOutput, Prompt};
use amn::processor::Processor;
use amn::{Instruction, InstructionSet};
use color_eyre::eyre::Result;
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()?; // logging

    let instruction_set: InstructionSet = std::env::args()
        .nth(1)
        .map(|arg| arg.parse())
        .transpose()?
        .unwrap_or_default();
    let mut cpu = Processor::new(instruction_set);

    println!(
        "Welcome to the {} REPL, commands: exec <instruction>, status, state, reset, exit",
        instruction_set
    );

    let mut reader = BufReader::new(stdin());
    loop {
        print!("AMN >> ");
        stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, argument) = match line.find(' ') {
            Some(split) => (&line[..split], line[split..].trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "exec" => match Instruction::decode(argument, instruction_set) {
                Ok(instruction) => {
                    // inputs are read from the terminal on demand
                    let mut input = Prompt::new(&mut reader, stdout());
                    if let Err(fault) =
                        cpu.execute_instruction(instruction, &mut input, &mut LogOutput)
                    {
                        println!("Error while executing: {}", fault);
                    }
                }
                Err(err) => println!("Error while parsing: {}", err),
            },
            "status" => print!("{}", cpu.status()),
            "state" => println!("{}", cpu.configuration(&[], &[])),
            "reset" => cpu.reset(),
            "exit" => break,
            _ => println!("*** Unknown command: {}", line),
        }
    }

    println!("Exiting REPL...");

    Ok(())
}
