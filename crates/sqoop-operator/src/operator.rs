//! Transfer operator - the orchestration-facing unit.
//!
//! One `execute` call walks
//! `Created -> Validating -> Building -> Invoking -> Succeeded`, leaving early
//! as `Failed(config)` or `Failed(tool)`. Nothing is retried here; retry
//! policy belongs to the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::{CommandBuilder, Invocation};
use crate::config::{Config, TransferConfig, TransferMode};
use crate::connection::{ConnectionResolver, StaticConnections};
use crate::error::{OperatorError, Result};
use crate::hook::{ExitStatus, ProcessHook, TransferHook};

/// Lifecycle of one `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorState {
    Created,
    Validating,
    Building,
    Invoking,
    Succeeded,
    FailedConfig,
    FailedTool,
}

impl OperatorState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperatorState::Succeeded | OperatorState::FailedConfig | OperatorState::FailedTool
        )
    }

    /// Terminal state an execution error leads to.
    pub fn for_error(err: &OperatorError) -> Self {
        match err {
            OperatorError::ToolUnavailable { .. }
            | OperatorError::ToolFailed { .. }
            | OperatorError::Cancelled => OperatorState::FailedTool,
            _ => OperatorState::FailedConfig,
        }
    }
}

impl fmt::Display for OperatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperatorState::Created => "created",
            OperatorState::Validating => "validating",
            OperatorState::Building => "building",
            OperatorState::Invoking => "invoking",
            OperatorState::Succeeded => "succeeded",
            OperatorState::FailedConfig => "failed(config)",
            OperatorState::FailedTool => "failed(tool)",
        };
        f.write_str(name)
    }
}

/// Result of a successful transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResult {
    /// Unique run identifier.
    pub run_id: String,

    pub task_id: String,

    pub mode: TransferMode,

    /// Command line with secrets masked.
    pub command: String,

    pub started_at: DateTime<Utc>,

    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Captured tool output.
    pub output: String,
}

impl TransferResult {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sqoop import/export operator.
///
/// Construction never fails; the configuration is checked when the task
/// executes so that declarations can always be loaded.
pub struct TransferOperator {
    task_id: String,
    config: TransferConfig,
    resolver: Arc<dyn ConnectionResolver>,
    hook: Arc<dyn TransferHook>,
    builder: CommandBuilder,
}

impl TransferOperator {
    /// Create a new operator.
    pub fn new(
        task_id: impl Into<String>,
        config: TransferConfig,
        resolver: Arc<dyn ConnectionResolver>,
        hook: Arc<dyn TransferHook>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            config,
            resolver,
            hook,
            builder: CommandBuilder::default(),
        }
    }

    /// Create an operator from a job file: static connections and a process
    /// hook configured from `runtime:`.
    pub fn from_config(task_id: impl Into<String>, config: Config) -> Self {
        let hook = ProcessHook::from_runtime(&config.runtime);
        let builder = CommandBuilder::new(config.runtime.program.clone());
        Self::new(
            task_id,
            config.task,
            Arc::new(StaticConnections::new(config.connections)),
            Arc::new(hook),
        )
        .with_builder(builder)
    }

    /// Replace the hook, e.g. with a [`DryRunHook`](crate::hook::DryRunHook).
    pub fn with_hook(mut self, hook: Arc<dyn TransferHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Use a custom command builder (program path).
    pub fn with_builder(mut self, builder: CommandBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Resolve, validate and build without running anything.
    pub fn render(&self) -> Result<Invocation> {
        let conn = self.resolver.resolve(&self.config.conn_id)?;
        let validated = self.config.validated()?;
        Ok(self.builder.build(&validated, &conn))
    }

    /// Run the task: the hook is invoked exactly once, or not at all when the
    /// configuration is rejected.
    ///
    /// The connection is resolved before the task is validated, so an unknown
    /// `conn_id` is reported ahead of any configuration error.
    pub async fn execute(&self, cancel: CancellationToken) -> Result<TransferResult> {
        let started_at = Utc::now();
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        self.transition(OperatorState::Created);

        let outcome = self.run_steps(cancel).await;
        let (mode, invocation, output) = match outcome {
            Ok(done) => done,
            Err(e) => {
                let state = OperatorState::for_error(&e);
                self.transition(state);
                warn!("Task {} {}: {}", self.task_id, state, e);
                return Err(e);
            }
        };

        self.transition(OperatorState::Succeeded);
        let duration = start.elapsed();
        info!(
            "Task {} completed {} in {:.2}s",
            self.task_id,
            mode,
            duration.as_secs_f64()
        );

        Ok(TransferResult {
            run_id,
            task_id: self.task_id.clone(),
            mode,
            command: invocation.masked(),
            started_at,
            completed_at: Utc::now(),
            duration_seconds: duration.as_secs_f64(),
            output,
        })
    }

    async fn run_steps(
        &self,
        cancel: CancellationToken,
    ) -> Result<(TransferMode, Invocation, String)> {
        let conn = self.resolver.resolve(&self.config.conn_id)?;

        self.transition(OperatorState::Validating);
        let validated = self.config.validated()?;
        let mode = validated.mode();

        self.transition(OperatorState::Building);
        let invocation = self.builder.build(&validated, &conn);

        self.transition(OperatorState::Invoking);
        info!(
            "Task {}: running {} via {} hook",
            self.task_id,
            mode,
            self.hook.hook_type()
        );
        let result = match self.hook.run(&invocation, cancel).await {
            Ok(result) => result,
            Err(OperatorError::Io(e)) => {
                return Err(OperatorError::tool_failed(
                    invocation.masked(),
                    None,
                    e.to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        match result.status {
            ExitStatus::Succeeded => Ok((mode, invocation, result.output)),
            ExitStatus::Failed(code) => Err(OperatorError::tool_failed(
                invocation.masked(),
                code,
                result.output,
            )),
        }
    }

    fn transition(&self, state: OperatorState) {
        debug!("Task {} -> {}", self.task_id, state);
    }
}
