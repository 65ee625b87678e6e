//! Transfer hooks: the collaborators that actually run an [`Invocation`].
//!
//! The operator works with `Arc<dyn TransferHook>` and never spawns anything
//! itself. Implementations:
//!
//! - [`ProcessHook`]: runs the tool as a child process
//! - [`DryRunHook`]: logs the command line and reports success

mod dry_run;
mod process;

pub use dry_run::DryRunHook;
pub use process::ProcessHook;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::command::Invocation;
use crate::error::Result;

/// How a tool run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatus {
    Succeeded,
    /// Non-success exit; `None` when the process was terminated by a signal.
    Failed(Option<i32>),
}

/// Outcome of one tool run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExitStatus,
    /// Captured diagnostic output (stdout and stderr, interleaved).
    pub output: String,
}

impl ExecutionResult {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Succeeded,
            output: output.into(),
        }
    }

    pub fn failed(exit_code: Option<i32>, output: impl Into<String>) -> Self {
        Self {
            status: ExitStatus::Failed(exit_code),
            output: output.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExitStatus::Succeeded
    }
}

/// Runs invocations of the external transfer tool.
///
/// # Contract
///
/// - `run` is called at most once per task execution and must not retry.
/// - A tool that cannot be started at all fails with
///   [`OperatorError::ToolUnavailable`](crate::OperatorError::ToolUnavailable).
/// - A tool that ran and did not succeed is reported either as
///   `Ok(ExecutionResult { status: Failed(..), .. })` or as
///   [`OperatorError::ToolFailed`](crate::OperatorError::ToolFailed).
/// - When `cancel` fires, the in-flight run is terminated promptly and
///   [`OperatorError::Cancelled`](crate::OperatorError::Cancelled) returned.
/// - Any process or connection handle is released on every exit path.
#[async_trait]
pub trait TransferHook: Send + Sync {
    /// Run the invocation to completion.
    async fn run(&self, invocation: &Invocation, cancel: CancellationToken)
        -> Result<ExecutionResult>;

    /// Hook type identifier for logs (e.g., "process", "dry_run").
    fn hook_type(&self) -> &'static str;
}
