//! Hook that never starts the tool.
//!
//! Used for `--dry-run` style checks: the task is validated and its command
//! line built and logged, but nothing is transferred.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{ExecutionResult, TransferHook};
use crate::command::Invocation;
use crate::error::{OperatorError, Result};

/// Hook that logs the masked command line and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunHook;

impl DryRunHook {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransferHook for DryRunHook {
    async fn run(
        &self,
        invocation: &Invocation,
        cancel: CancellationToken,
    ) -> Result<ExecutionResult> {
        if cancel.is_cancelled() {
            return Err(OperatorError::Cancelled);
        }
        info!("Dry run, not executing: {}", invocation.masked());
        Ok(ExecutionResult::succeeded(String::new()))
    }

    fn hook_type(&self) -> &'static str {
        "dry_run"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_succeeds_without_spawning() {
        let inv = Invocation::new("definitely-not-installed-tool", vec!["import".into()]);
        let result = DryRunHook::new()
            .run(&inv, CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_success());
        assert!(result.output.is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_honors_cancellation() {
        let inv = Invocation::new("sqoop", vec!["import".into()]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = DryRunHook::new().run(&inv, cancel).await.unwrap_err();
        assert!(matches!(err, OperatorError::Cancelled));
    }
}
