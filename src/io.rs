//! Collaborators feeding `READ` and receiving `WRITE`

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::memory::Value;

/// Source of the values consumed by `READ`
pub trait Input {
    /// Returns the next value, `None` once the source is exhausted
    fn next_input(&mut self) -> Option<Value>;
}

/// Sink for the values emitted by `WRITE`
pub trait Output {
    fn write_output(&mut self, value: Value);
}

impl Input for VecDeque<Value> {
    fn next_input(&mut self) -> Option<Value> {
        self.pop_front()
    }
}

impl Output for Vec<Value> {
    fn write_output(&mut self, value: Value) {
        self.push(value);
    }
}

/// Prints every output through the logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOutput;

impl Output for LogOutput {
    fn write_output(&mut self, value: Value) {
        log::info!("Output: {}", value);
    }
}

/// Asks for every input interactively
#[derive(Debug)]
pub struct Prompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> Input for Prompt<R, W> {
    /// Prompts until a number was entered. End of input and I/O errors exhaust the source.
    fn next_input(&mut self) -> Option<Value> {
        loop {
            write!(self.writer, "Input: ").ok()?;
            self.writer.flush().ok()?;

            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => {
                    log::error!("failed to read input: {}", err);
                    return None;
                }
            }

            match line.trim().parse() {
                Ok(value) => return Some(value),
                Err(_) => log::warn!("`{}` is not a number", line.trim()),
            }
        }
    }
}
