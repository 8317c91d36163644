pub mod command_log;
pub mod runner;
pub mod sanitize;
pub mod tokio_process;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use crate::models::{CoreError, PackageAction};

pub use command_log::CommandLog;
pub use runner::{CommandOutcome, CommandRunner, SPAWN_FAILURE_EXIT_CODE};
pub use tokio_process::TokioProcessExecutor;

pub type ExecutionResult<T> = Result<T, CoreError>;

pub type ProcessWaitFuture = Pin<Box<dyn Future<Output = ExecutionResult<ProcessOutput>> + Send>>;

/// A winget invocation: the executable and its argument vector. Arguments are
/// passed as-is, never through a shell.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program and arguments joined by spaces, as written to the command log.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Rejects what winget would misread: a missing executable, a blank
    /// argument (an id or version the user never filled in) or an embedded NUL.
    pub fn validate(&self, action: PackageAction) -> ExecutionResult<()> {
        if self.program.as_os_str().is_empty() {
            return Err(CoreError::validation(action, "no winget executable configured"));
        }

        for (position, arg) in self.args.iter().enumerate() {
            if arg.trim().is_empty() {
                return Err(CoreError::validation(
                    action,
                    format!("argument {} of `{}` is blank", position + 1, self.command_line()),
                ));
            }
            if arg.contains('\0') {
                return Err(CoreError::validation(
                    action,
                    format!("argument {arg:?} contains a NUL byte"),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessSpawnRequest {
    pub action: PackageAction,
    pub command: CommandSpec,
    pub timeout: Option<Duration>,
}

impl ProcessSpawnRequest {
    pub fn new(action: PackageAction, command: CommandSpec) -> Self {
        Self {
            action,
            command,
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> ExecutionResult<()> {
        self.command.validate(self.action)?;

        match self.timeout {
            Some(timeout) if timeout.is_zero() => Err(CoreError::validation(
                self.action,
                "a command timeout must be longer than zero",
            )),
            _ => Ok(()),
        }
    }
}

/// Bytes a finished child wrote, with its exit code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessOutput {
    /// `None` when the child was killed before it could report one.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub elapsed: Duration,
    /// Set when a pipe was still held open by a grandchild (an installer
    /// winget launched) after winget exited. What arrived by then is kept.
    pub output_truncated: bool,
}

impl ProcessOutput {
    pub fn exited(exit_code: i32, stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: stdout.into(),
            stderr: Vec::new(),
            elapsed: Duration::ZERO,
            output_truncated: false,
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

pub trait RunningProcess: Send {
    fn pid(&self) -> Option<u32>;

    fn wait(self: Box<Self>) -> ProcessWaitFuture;
}

pub trait ProcessExecutor: Send + Sync {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>>;
}

/// Validates `request` and hands it to `executor`. Nothing is spawned for a
/// request that fails validation.
pub fn spawn_validated(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> ExecutionResult<Box<dyn RunningProcess>> {
    request.validate()?;
    executor.spawn(request)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CommandSpec, ProcessSpawnRequest};
    use crate::models::{CoreErrorKind, PackageAction};

    #[test]
    fn command_line_joins_program_and_args() {
        let spec = CommandSpec::new("winget").args(["upgrade", "--id", "Git.Git"]);
        assert_eq!(spec.command_line(), "winget upgrade --id Git.Git");
    }

    #[test]
    fn blank_argument_is_rejected_with_its_position() {
        let request = ProcessSpawnRequest::new(
            PackageAction::Search,
            CommandSpec::new("winget").args(["search", "  "]),
        );
        let error = request.validate().unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::ValidationFailure);
        assert_eq!(error.action, Some(PackageAction::Search));
        assert!(error.message.starts_with("argument 2 of `winget search"));
    }

    #[test]
    fn missing_program_is_rejected() {
        let request = ProcessSpawnRequest::new(PackageAction::ListUpgrades, CommandSpec::new(""));
        let error = request.validate().unwrap_err();
        assert_eq!(error.message, "no winget executable configured");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let request =
            ProcessSpawnRequest::new(PackageAction::ListUpgrades, CommandSpec::new("winget"))
                .timeout(Duration::ZERO);
        assert!(request.validate().is_err());
    }
}
