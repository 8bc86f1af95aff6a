use crate::error::{ReleaseError, Result};
use crate::runner::{CommandOutput, CommandRunner, CommandSpec};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// A recorded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command_line: String,
    pub dir: PathBuf,
    pub stdin: Option<String>,
}

struct Script {
    prefix: String,
    responses: VecDeque<Scripted>,
}

#[derive(Clone)]
enum Scripted {
    Output(CommandOutput),
    SpawnError(String),
}

/// Mock command runner for testing without spawning processes.
///
/// Responses are matched by the longest registered prefix of the command line.
/// Several responses registered for the same prefix are served in order, and the
/// last one repeats. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct MockRunner {
    scripts: RefCell<Vec<Script>>,
    calls: RefCell<Vec<Invocation>>,
}

impl MockRunner {
    /// Create a new mock runner with no scripted responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the output of commands starting with `prefix`
    pub fn on(self, prefix: impl Into<String>, output: CommandOutput) -> Self {
        self.push(prefix.into(), Scripted::Output(output));
        self
    }

    /// Script a successful command with the given stdout
    pub fn on_success(self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.on(prefix, CommandOutput::success(stdout))
    }

    /// Script a failing command with the given exit code and stderr
    pub fn on_failure(self, prefix: impl Into<String>, exit_code: i32, stderr: &str) -> Self {
        self.on(prefix, CommandOutput::failure(exit_code, stderr))
    }

    /// Script a command whose program cannot be started
    pub fn on_spawn_error(self, prefix: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(prefix.into(), Scripted::SpawnError(message.into()));
        self
    }

    fn push(&self, prefix: String, response: Scripted) {
        let mut scripts = self.scripts.borrow_mut();
        match scripts.iter_mut().find(|s| s.prefix == prefix) {
            Some(script) => script.responses.push_back(response),
            None => scripts.push(Script {
                prefix,
                responses: VecDeque::from([response]),
            }),
        }
    }

    /// All recorded command lines, in execution order
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.command_line.clone())
            .collect()
    }

    /// All recorded invocations with directory and stdin
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Whether any recorded command line starts with `prefix`
    pub fn was_called(&self, prefix: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c.command_line.starts_with(prefix))
    }

    /// Number of recorded command lines starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.command_line.starts_with(prefix))
            .count()
    }

    fn respond(&self, command_line: &str) -> Scripted {
        let mut scripts = self.scripts.borrow_mut();
        let best = scripts
            .iter_mut()
            .filter(|s| command_line.starts_with(&s.prefix))
            .max_by_key(|s| s.prefix.len());

        match best {
            Some(script) if script.responses.len() > 1 => script
                .responses
                .pop_front()
                .unwrap_or_else(|| Scripted::Output(CommandOutput::success(""))),
            Some(script) => script
                .responses
                .front()
                .cloned()
                .unwrap_or_else(|| Scripted::Output(CommandOutput::success(""))),
            None => Scripted::Output(CommandOutput::success("")),
        }
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec, dir: &Path) -> Result<CommandOutput> {
        let command_line = spec.command_line();
        self.calls.borrow_mut().push(Invocation {
            command_line: command_line.clone(),
            dir: dir.to_path_buf(),
            stdin: spec.stdin.clone(),
        });

        match self.respond(&command_line) {
            Scripted::Output(output) => Ok(output),
            Scripted::SpawnError(message) => Err(ReleaseError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                message,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(runner: &MockRunner, line: &[&str]) -> Result<CommandOutput> {
        let spec = CommandSpec::new(line[0]).args(line[1..].iter().copied());
        runner.run(&spec, Path::new("/project"))
    }

    #[test]
    fn test_unmatched_commands_succeed() {
        let runner = MockRunner::new();
        let output = run(&runner, &["git", "pull"]).unwrap();
        assert!(output.is_success());
        assert_eq!(runner.calls(), vec!["git pull"]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let runner = MockRunner::new()
            .on_success("git", "generic")
            .on_success("git diff", "specific");
        assert_eq!(run(&runner, &["git", "diff", "HEAD"]).unwrap().stdout, "specific");
        assert_eq!(run(&runner, &["git", "status"]).unwrap().stdout, "generic");
    }

    #[test]
    fn test_responses_served_in_order_last_repeats() {
        let runner = MockRunner::new()
            .on_failure("cargo test", 101, "first")
            .on_success("cargo test", "second");
        assert_eq!(run(&runner, &["cargo", "test"]).unwrap().exit_code, 101);
        assert!(run(&runner, &["cargo", "test"]).unwrap().is_success());
        assert!(run(&runner, &["cargo", "test"]).unwrap().is_success());
        assert_eq!(runner.count("cargo test"), 3);
    }

    #[test]
    fn test_spawn_error() {
        let runner = MockRunner::new().on_spawn_error("gh", "gh: command not found");
        assert!(run(&runner, &["gh", "--version"]).is_err());
        assert!(runner.was_called("gh --version"));
    }

    #[test]
    fn test_records_directory_and_stdin() {
        let runner = MockRunner::new();
        let spec = CommandSpec::new("gh").arg("auth").stdin("tok");
        runner.run(&spec, Path::new("/somewhere")).unwrap();
        let invocation = &runner.invocations()[0];
        assert_eq!(invocation.dir, PathBuf::from("/somewhere"));
        assert_eq!(invocation.stdin.as_deref(), Some("tok"));
    }
}
