//! Child-process hook.
//!
//! Spawns the tool, forwards every output line to the log, keeps the last
//! lines for failure diagnostics and waits for the exit status. The child is
//! killed on cancellation and timeout, and `kill_on_drop` covers every other
//! early return.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ExecutionResult, TransferHook};
use crate::command::Invocation;
use crate::config::RuntimeConfig;
use crate::error::{OperatorError, Result};

const DEFAULT_TAIL_LINES: usize = 200;

/// How long to keep reading output once the tool has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Hook that runs the tool as a local child process.
#[derive(Debug, Clone)]
pub struct ProcessHook {
    timeout: Option<Duration>,
    tail_lines: usize,
}

impl Default for ProcessHook {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessHook {
    pub fn new() -> Self {
        Self {
            timeout: None,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }

    /// Create a hook from the `runtime:` section of a job file.
    pub fn from_runtime(runtime: &RuntimeConfig) -> Self {
        let hook = Self::new().with_tail_lines(runtime.output_tail_lines);
        match runtime.timeout_secs {
            Some(secs) => hook.with_timeout(Duration::from_secs(secs)),
            None => hook,
        }
    }

    /// Kill the tool if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Number of output lines kept for diagnostics.
    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.tail_lines = lines.max(1);
        self
    }

    fn timed_out(
        &self,
        invocation: &Invocation,
        command: String,
        mut tail: OutputTail,
    ) -> OperatorError {
        let timeout = self.timeout.unwrap_or_default();
        warn!("{} exceeded timeout of {:?}", invocation.program(), timeout);
        tail.push(format!("Exceeded timeout of {:?}", timeout));
        OperatorError::tool_failed(command, None, tail.join())
    }

    fn spawn(&self, invocation: &Invocation) -> Result<Child> {
        Command::new(invocation.program())
            .args(invocation.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OperatorError::tool_unavailable(invocation.program(), e.to_string()))
    }
}

#[async_trait]
impl TransferHook for ProcessHook {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult> {
        let command = invocation.masked();
        info!("Executing: {}", command);

        let mut child = self.spawn(invocation)?;
        debug!("Spawned {} with PID {:?}", invocation.program(), child.id());

        let (tx, mut rx) = mpsc::channel::<String>(256);
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let mut tail = OutputTail::new(self.tail_lines);
        let deadline = self.timeout.map(|t| Instant::now() + t);

        let status = loop {
            tokio::select! {
                Some(line) = rx.recv() => {
                    info!("{}", line);
                    tail.push(line);
                }
                status = child.wait() => break status,
                _ = cancel.cancelled() => {
                    warn!("Cancellation requested, killing {}", invocation.program());
                    terminate(&mut child).await;
                    return Err(OperatorError::Cancelled);
                }
                _ = wait_until(deadline) => {
                    terminate(&mut child).await;
                    return Err(self.timed_out(invocation, command, tail));
                }
            }
        };

        // Descendants of the tool can inherit its pipes and keep them open
        // after it exits, so the drain is bounded.
        let drain_deadline = Instant::now() + DRAIN_GRACE;
        loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) => {
                        info!("{}", line);
                        tail.push(line);
                    }
                    None => break,
                },
                _ = cancel.cancelled() => {
                    warn!("Cancellation requested while draining {} output", invocation.program());
                    return Err(OperatorError::Cancelled);
                }
                _ = wait_until(deadline) => {
                    return Err(self.timed_out(invocation, command, tail));
                }
                _ = tokio::time::sleep_until(drain_deadline) => {
                    warn!(
                        "{} exited but its output is still open, not waiting for it",
                        invocation.program()
                    );
                    break;
                }
            }
        }

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                tail.push(format!("Failed waiting for process: {}", e));
                return Err(OperatorError::tool_failed(command, None, tail.join()));
            }
        };

        if status.success() {
            Ok(ExecutionResult::succeeded(tail.join()))
        } else {
            Ok(ExecutionResult::failed(status.code(), tail.join()))
        }
    }

    fn hook_type(&self) -> &'static str {
        "process"
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = tx.send(format!("Failed reading tool output: {}", e)).await;
                break;
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to kill process {:?}: {}", child.id(), e);
    }
}

/// Bounded buffer of the most recent output lines.
struct OutputTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputTail {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn join(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}
