use crate::error::Result;
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs commands as real child processes.
///
/// Output is captured in full; nothing is streamed and no timeout applies, so a
/// hung tool blocks the caller until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, dir: &Path) -> Result<CommandOutput> {
        debug!(command = %spec, dir = %dir.display(), "running command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match &spec.stdin {
            Some(input) => {
                cmd.stdin(Stdio::piped());
                let mut child = cmd.spawn()?;
                // the pipe closes when `stdin` drops so the child sees EOF
                let written = match child.stdin.take() {
                    Some(mut stdin) => stdin.write_all(input.as_bytes()),
                    None => Ok(()),
                };
                // reap the child even when it stopped reading early
                let output = child.wait_with_output()?;
                if let Err(e) = written {
                    debug!(command = %spec, error = %e, "child closed stdin early");
                    if output.status.success() {
                        return Err(e.into());
                    }
                }
                output
            }
            None => {
                cmd.stdin(Stdio::null());
                cmd.output()?
            }
        };

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(command = %spec, exit_code = result.exit_code, "command finished");
        Ok(result)
    }
}
