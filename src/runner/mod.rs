//! External command execution layer
//!
//! Every interaction with `git`, `cargo` and `gh` goes through the
//! [CommandRunner] trait so the adapters and the orchestrator can be exercised
//! without touching real tools.
//!
//! - [system::SystemRunner]: spawns real processes with `std::process::Command`
//! - [mock::MockRunner]: returns scripted outputs and records every invocation
//!
//! A non-zero exit code is an ordinary [CommandOutput], never an error. The
//! runner only fails when a process cannot be started at all; callers decide
//! whether a failed command is fatal.

pub mod mock;
pub mod system;

pub use mock::MockRunner;
pub use system::SystemRunner;

use crate::error::Result;
use std::fmt;
use std::path::Path;

/// A program invocation: program name, argument vector and optional stdin payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed `input` to the child's stdin (used for secrets that must not appear in argv)
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// The command line as a single string, for logging and mock matching
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        CommandOutput {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        CommandOutput {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Short human-readable reason for a failed command
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        let text = if !stderr.is_empty() { stderr } else { stdout };
        if text.is_empty() {
            format!("exit code {}", self.exit_code)
        } else {
            format!("exit code {}: {}", self.exit_code, text)
        }
    }
}

/// Runs external commands synchronously
pub trait CommandRunner {
    /// Run `spec` inside `dir` and wait for it to finish.
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` - The process ran; inspect `exit_code`
    /// * `Err` - The process could not be spawned or its output collected
    fn run(&self, spec: &CommandSpec, dir: &Path) -> Result<CommandOutput>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, spec: &CommandSpec, dir: &Path) -> Result<CommandOutput> {
        (**self).run(spec, dir)
    }
}
