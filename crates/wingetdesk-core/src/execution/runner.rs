use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::execution::sanitize::{clean_stderr, clean_stdout};
use crate::execution::{ProcessExecutor, ProcessOutput, ProcessSpawnRequest, spawn_validated};
use crate::models::{CoreError, CoreErrorKind, CoreResult};

/// Exit code reported when the process never produced one of its own.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// What a finished invocation looks like to the rest of the crate.
///
/// `stdout` and `stderr` are cleaned for display. Listing parsers read
/// `raw_stdout`, which still has its separator lines and hyphenated tokens.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CommandOutcome {
    pub command_line: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    #[serde(skip)]
    pub raw_stdout: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn from_output(command_line: String, output: ProcessOutput) -> Self {
        let exit_code = output.exit_code.unwrap_or(SPAWN_FAILURE_EXIT_CODE);
        let raw_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let raw_stderr = String::from_utf8_lossy(&output.stderr);

        Self {
            command_line,
            exit_code,
            stdout: clean_stdout(&raw_stdout),
            stderr: clean_stderr(&raw_stderr),
            raw_stdout,
        }
    }

    fn from_error(command_line: String, error: &CoreError) -> Self {
        Self {
            command_line,
            exit_code: SPAWN_FAILURE_EXIT_CODE,
            stdout: String::new(),
            stderr: clean_stderr(&error.to_string()),
            raw_stdout: String::new(),
        }
    }
}

/// Runs one external command at a time and never fails.
///
/// Callers block until the child exits. A second caller arriving while a
/// command is in flight waits for the permit.
///
/// `run` drives its own runtime, so it must be called from plain threads.
/// A call made from inside a tokio runtime is refused with the sentinel
/// exit code instead of blocking that runtime.
pub struct CommandRunner {
    executor: Arc<dyn ProcessExecutor>,
    runtime: tokio::runtime::Runtime,
    permit: Mutex<()>,
    busy: AtomicBool,
}

impl CommandRunner {
    pub fn new(executor: Arc<dyn ProcessExecutor>) -> CoreResult<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                CoreError::new(
                    CoreErrorKind::Internal,
                    format!("failed to build command runtime: {error}"),
                )
            })?;

        Ok(Self {
            executor,
            runtime,
            permit: Mutex::new(()),
            busy: AtomicBool::new(false),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn run(&self, request: ProcessSpawnRequest) -> CommandOutcome {
        let action = request.action;
        let command_line = request.command.command_line();

        if tokio::runtime::Handle::try_current().is_ok() {
            let error = CoreError::new(
                CoreErrorKind::Internal,
                "commands cannot be run from inside an async runtime",
            )
            .with_action(action);
            tracing::error!(?action, command = %command_line, "{}", error.message);
            return CommandOutcome::from_error(command_line, &error);
        }

        let _permit = self.permit.lock().unwrap_or_else(PoisonError::into_inner);
        self.busy.store(true, Ordering::SeqCst);
        tracing::debug!(?action, command = %command_line, "running external command");

        let executor = self.executor.as_ref();
        let result = self.runtime.block_on(async move {
            let process = spawn_validated(executor, request)?;
            tracing::debug!(pid = ?process.pid(), "external command started");
            process.wait().await
        });

        self.busy.store(false, Ordering::SeqCst);

        match result {
            Ok(output) => {
                if output.output_truncated {
                    tracing::warn!(
                        ?action,
                        command = %command_line,
                        "output pipe still held open after exit; keeping what arrived"
                    );
                }
                let elapsed_ms = output.elapsed.as_millis();
                let outcome = CommandOutcome::from_output(command_line, output);
                tracing::info!(
                    ?action,
                    command = %outcome.command_line,
                    exit_code = outcome.exit_code,
                    elapsed_ms,
                    "external command finished"
                );
                outcome
            }
            Err(error) => {
                tracing::warn!(
                    ?action,
                    command = %command_line,
                    kind = ?error.kind,
                    "external command could not run: {}",
                    error.message
                );
                CommandOutcome::from_error(command_line, &error)
            }
        }
    }
}
