use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::execution::{
    ExecutionResult, ProcessExecutor, ProcessOutput, ProcessSpawnRequest, ProcessWaitFuture,
    RunningProcess,
};
use crate::models::{CoreError, CoreErrorKind, PackageAction};

/// How long stdout and stderr may stay open once winget has exited.
/// Installers started by winget inherit both pipes and can keep them open
/// long after winget itself is done.
const PIPE_DRAIN_WINDOW: Duration = Duration::from_millis(250);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Spawns real child processes. Must be used from inside a tokio runtime.
pub struct TokioProcessExecutor;

impl ProcessExecutor for TokioProcessExecutor {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>> {
        let mut command = Command::new(&request.command.program);
        command
            .args(&request.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // No console window flashes up behind the front end.
        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|error| {
            CoreError::new(
                CoreErrorKind::SpawnFailure,
                format!(
                    "failed to spawn '{}': {error}",
                    request.command.program.display()
                ),
            )
            .with_action(request.action)
        })?;

        // Drain from the start so a chatty child never blocks on a full pipe.
        let stdout = PipeCollector::start(child.stdout.take());
        let stderr = PipeCollector::start(child.stderr.take());

        Ok(Box::new(TokioRunningProcess {
            pid: child.id(),
            child,
            stdout,
            stderr,
            started: Instant::now(),
            timeout: request.timeout,
            action: request.action,
        }))
    }
}

struct TokioRunningProcess {
    pid: Option<u32>,
    child: Child,
    stdout: PipeCollector,
    stderr: PipeCollector,
    started: Instant,
    timeout: Option<Duration>,
    action: PackageAction,
}

impl RunningProcess for TokioRunningProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn wait(self: Box<Self>) -> ProcessWaitFuture {
        let TokioRunningProcess {
            mut child,
            stdout,
            stderr,
            started,
            timeout,
            action,
            ..
        } = *self;

        Box::pin(async move {
            let exited = match timeout {
                Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
                None => Some(child.wait().await),
            };

            let Some(status) = exited else {
                // kill() also reaps the child.
                let _ = child.kill().await;
                let (partial, _) = stdout.finish(drain_deadline()).await;
                let mut message = format!(
                    "process timed out after {}ms",
                    timeout.unwrap_or_default().as_millis()
                );
                if let Some(line) = last_line(&partial) {
                    message.push_str(&format!("; last output: {line}"));
                }
                return Err(CoreError::new(CoreErrorKind::Timeout, message).with_action(action));
            };

            let status = status.map_err(|error| {
                CoreError::new(
                    CoreErrorKind::SpawnFailure,
                    format!("failed to wait for process: {error}"),
                )
                .with_action(action)
            })?;

            let deadline = drain_deadline();
            let (stdout, stdout_cut) = stdout.finish(deadline).await;
            let (stderr, stderr_cut) = stderr.finish(deadline).await;

            Ok(ProcessOutput {
                exit_code: status.code(),
                stdout,
                stderr,
                elapsed: started.elapsed(),
                output_truncated: stdout_cut || stderr_cut,
            })
        })
    }
}

/// Reads one pipe into a shared buffer on a background task.
struct PipeCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
}

impl PipeCollector {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let task = pipe.map(|mut pipe| {
            let sink = buffer.clone();
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => sink
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .extend_from_slice(&chunk[..read]),
                    }
                }
            })
        });

        Self { buffer, task }
    }

    /// Waits until `deadline` for the pipe to close and returns everything
    /// read so far. The flag reports a pipe that was still open.
    async fn finish(self, deadline: tokio::time::Instant) -> (Vec<u8>, bool) {
        let still_open = match self.task {
            Some(mut task) => match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(_) => false,
                Err(_) => {
                    task.abort();
                    true
                }
            },
            None => false,
        };

        let bytes = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(PoisonError::into_inner));
        (bytes, still_open)
    }
}

fn drain_deadline() -> tokio::time::Instant {
    tokio::time::Instant::now() + PIPE_DRAIN_WINDOW
}

fn last_line(bytes: &[u8]) -> Option<String> {
    String::from_utf8_lossy(bytes)
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(str::to_owned)
}
