//! Job file loading and task configuration validation.

mod types;
mod validation;

pub use types::*;
pub(crate) use types::present;
pub use validation::validate;

use crate::error::{ConfigError, OperatorError, Result};
use std::path::Path;

impl Config {
    /// Load a job file from YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a job file from a YAML string.
    ///
    /// Only runtime settings are checked here. The task itself is accepted as
    /// declared and validated when it executes.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate_runtime()?;
        Ok(config)
    }

    fn validate_runtime(&self) -> Result<()> {
        if self.runtime.program.trim().is_empty() {
            return Err(OperatorError::Config("runtime.program is required".into()));
        }
        if let Some(0) = self.runtime.timeout_secs {
            return Err(OperatorError::Config(
                "runtime.timeout_secs must be at least 1".into(),
            ));
        }
        if self.runtime.output_tail_lines == 0 {
            return Err(OperatorError::Config(
                "runtime.output_tail_lines must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl TransferConfig {
    /// Validate the cross-field rules of this task.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validation::validate(self)
    }

    /// Validate and pair the task with its parsed mode.
    pub fn validated(&self) -> std::result::Result<ValidatedConfig<'_>, ConfigError> {
        validation::check(self)
    }
}
