//! Error types for the transfer operator.

use thiserror::Error;

/// Cross-field configuration problems detected before any external call.
///
/// These are fatal to the task attempt and never retryable: running the same
/// declaration again produces the same verdict.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `cmd_type` is neither `import` nor `export`.
    #[error("cmd_type should be 'import' or 'export', got '{0}'")]
    InvalidMode(String),

    /// Import mode needs exactly one of `query` or `table`.
    #[error("import requires exactly one of 'query' or 'table' ({0})")]
    AmbiguousSource(&'static str),

    /// Export mode needs a table or an export directory.
    #[error("export requires 'table' or 'export_dir'")]
    MissingExportSource,
}

/// Main error type for operator execution.
#[derive(Error, Debug)]
pub enum OperatorError {
    /// Task configuration rejected by the validator.
    #[error("Invalid task configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Job file problem (missing sections, bad runtime settings, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection id unknown to the resolver.
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// The tool binary could not be started at all.
    #[error("Transfer tool unavailable: {program}: {reason}")]
    ToolUnavailable { program: String, reason: String },

    /// The tool ran and did not succeed.
    #[error("Transfer failed ({exit}): {command}", exit = describe_exit(.exit_code))]
    ToolFailed {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// Task was cancelled by the orchestrator (SIGINT, SIGTERM, etc.)
    #[error("Transfer cancelled")]
    Cancelled,

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl OperatorError {
    /// Create a ToolFailed error
    pub fn tool_failed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        OperatorError::ToolFailed {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Create a ToolUnavailable error
    pub fn tool_unavailable(program: impl Into<String>, reason: impl Into<String>) -> Self {
        OperatorError::ToolUnavailable {
            program: program.into(),
            reason: reason.into(),
        }
    }

    /// Whether an orchestrator may reasonably retry the task attempt.
    ///
    /// The operator itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OperatorError::ToolUnavailable { .. } | OperatorError::ToolFailed { .. }
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            OperatorError::InvalidConfig(_)
            | OperatorError::Config(_)
            | OperatorError::Yaml(_)
            | OperatorError::Json(_) => 1,
            OperatorError::ToolFailed { .. } => 2,
            OperatorError::ToolUnavailable { .. } => 3,
            OperatorError::ConnectionNotFound(_) => 4,
            OperatorError::Io(_) => 7,
            OperatorError::Cancelled => 130,
        }
    }

    /// Format error with full details including error chain and tool output.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        if let OperatorError::ToolFailed { output: tool, .. } = self {
            if !tool.is_empty() {
                output.push_str("\nTool output:\n");
                output.push_str(tool);
            }
        }

        output
    }
}

/// Result type alias for operator operations.
pub type Result<T> = std::result::Result<T, OperatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_not_retryable() {
        let err = OperatorError::from(ConfigError::InvalidMode("copy".into()));
        assert!(!err.is_retryable());
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("'copy'"));
    }

    #[test]
    fn test_tool_failed_detail_includes_output() {
        let err = OperatorError::tool_failed("sqoop import", Some(1), "ERROR tool.ImportTool");
        assert!(err.is_retryable());
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Transfer failed (exit code 1): sqoop import");

        let detailed = err.format_detailed();
        assert!(detailed.contains("Tool output:"));
        assert!(detailed.contains("ERROR tool.ImportTool"));
    }

    #[test]
    fn test_tool_failed_without_exit_code() {
        let err = OperatorError::tool_failed("sqoop export", None, "");
        assert_eq!(err.to_string(), "Transfer failed (no exit code): sqoop export");
        assert!(!err.format_detailed().contains("Tool output:"));
    }
}
