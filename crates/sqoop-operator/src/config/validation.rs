//! Task configuration validation.

use super::types::{present, TransferConfig, TransferMode, ValidatedConfig};
use crate::error::ConfigError;

/// Validate the cross-field rules of a task configuration.
pub fn validate(config: &TransferConfig) -> Result<(), ConfigError> {
    check(config).map(|_| ())
}

/// Validate and return the configuration paired with its parsed mode.
pub(crate) fn check(config: &TransferConfig) -> Result<ValidatedConfig<'_>, ConfigError> {
    let mode = match config.cmd_type.as_str() {
        "import" => TransferMode::Import,
        "export" => TransferMode::Export,
        other => return Err(ConfigError::InvalidMode(other.to_string())),
    };

    let has_table = present(&config.table).is_some();
    match mode {
        TransferMode::Import => match (has_table, present(&config.query).is_some()) {
            (true, true) => return Err(ConfigError::AmbiguousSource("both are set")),
            (false, false) => return Err(ConfigError::AmbiguousSource("neither is set")),
            _ => {}
        },
        TransferMode::Export => {
            if !has_table && present(&config.export_dir).is_none() {
                return Err(ConfigError::MissingExportSource);
            }
        }
    }

    Ok(ValidatedConfig { config, mode })
}
