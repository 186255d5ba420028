//! The processing function under test: source text in, structured tree out.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Result, bail};
use serde_json::Value;

use crate::error::ProcessError;

pub trait Processor {
    fn process(&self, source: &str) -> Result<Value, ProcessError>;
}

impl<F> Processor for F
where
    F: Fn(&str) -> Result<Value, ProcessError>,
{
    fn process(&self, source: &str) -> Result<Value, ProcessError> {
        self(source)
    }
}

/// Number of top-level units in a tree: the length of `body` when present,
/// otherwise one. Used as the retained per-iteration result while benchmarking.
pub fn top_level_units(tree: &Value) -> usize {
    match tree.get("body") {
        Some(Value::Array(items)) => items.len(),
        _ => 1,
    }
}

/// Runs an external program per call: source on stdin, JSON tree on stdout.
///
/// A non-zero exit is a processing error. If stdout holds a JSON object with a
/// `message` it is used as the error, otherwise stderr becomes the message.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    program: String,
    args: Vec<String>,
}

impl CommandProcessor {
    pub fn new<S: AsRef<str>>(command: &[S]) -> Result<Self> {
        let Some((program, args)) = command.split_first() else {
            bail!("processor command is empty");
        };
        if program.as_ref().trim().is_empty() {
            bail!("processor program name is blank");
        }
        Ok(CommandProcessor {
            program: program.as_ref().to_string(),
            args: args.iter().map(|a| a.as_ref().to_string()).collect(),
        })
    }

    /// Splits a command line on whitespace. No quoting support.
    pub fn parse(command_line: &str) -> Result<Self> {
        let parts: Vec<&str> = command_line.split_whitespace().collect();
        Self::new(&parts)
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Processor for CommandProcessor {
    fn process(&self, source: &str) -> Result<Value, ProcessError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessError::new(format!("failed to spawn '{}': {}", self.program, e)))?;

        // Feed stdin from a separate thread so a chatty child cannot fill the
        // stdout pipe while we are still writing.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = source.to_owned();
            std::thread::spawn(move || stdin.write_all(input.as_bytes()))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| ProcessError::new(format!("failed to wait for '{}': {}", self.program, e)))?;

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Ok(())) => {}
                // The child may exit without draining stdin; its status decides.
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(ProcessError::new(format!("failed to write source: {}", e))),
                Err(_) => return Err(ProcessError::new("stdin writer thread panicked")),
            }
        }

        if !output.status.success() {
            if let Ok(err) = serde_json::from_slice::<ProcessError>(&output.stdout) {
                return Err(err);
            }
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("'{}' exited with {}", self.program, output.status),
                text => text.to_string(),
            };
            return Err(ProcessError::new(message));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ProcessError::new(format!("'{}' produced invalid JSON: {}", self.program, e)))
    }
}
