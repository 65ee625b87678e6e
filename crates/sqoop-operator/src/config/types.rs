//! Configuration type definitions for Sqoop transfer tasks.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::connection::ConnectionParams;

/// Root structure of a job file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Connections the task may refer to by id.
    #[serde(default)]
    pub connections: IndexMap<String, ConnectionParams>,

    /// The transfer task itself.
    pub task: TransferConfig,

    /// Process runtime settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Settings for how the transfer tool is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Program to invoke (default: "sqoop").
    #[serde(default = "default_program")]
    pub program: String,

    /// Kill the tool after this many seconds. No limit if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Lines of tool output kept for failure diagnostics (default: 200).
    #[serde(default = "default_output_tail_lines")]
    pub output_tail_lines: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: None,
            output_tail_lines: default_output_tail_lines(),
        }
    }
}

/// Direction of a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    /// RDBMS table or query into the cluster.
    Import,
    /// Cluster files into an RDBMS table.
    Export,
}

impl TransferMode {
    /// Tool sub-command for this mode.
    pub fn command_word(&self) -> &'static str {
        match self {
            TransferMode::Import => "import",
            TransferMode::Export => "export",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command_word())
    }
}

/// Storage format of imported files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Text,
    Sequence,
    Avro,
    Parquet,
}

impl FileFormat {
    pub fn flag(&self) -> &'static str {
        match self {
            FileFormat::Text => "--as-textfile",
            FileFormat::Sequence => "--as-sequencefile",
            FileFormat::Avro => "--as-avrodatafile",
            FileFormat::Parquet => "--as-parquetfile",
        }
    }
}

/// Value of a passthrough CLI option.
///
/// `true` and `null` render as a bare flag, `false` drops the option
/// entirely. Any other scalar is forwarded as the option's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Flag(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Declarative parameters of one import or export task.
///
/// Construction never fails: `cmd_type` and the source fields are checked when
/// the task executes. Optional fields default to absent and then contribute
/// nothing to the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Connection id handed to the resolver (default: "sqoop_default").
    #[serde(default = "default_conn_id")]
    pub conn_id: String,

    /// "import" or "export".
    pub cmd_type: String,

    /// Database schema passed to the connector after `--`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Source (import) or destination (export) table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    /// Free-form import query. Mutually exclusive with `table`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Comma separated column list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<String>,

    /// Row filter for table imports.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,

    /// JDBC driver class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,

    /// HDFS destination of an import.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,

    /// HDFS source of an export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,

    /// Append to an existing import directory.
    #[serde(default)]
    pub append: bool,

    /// Import storage format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileFormat>,

    /// Number of parallel map tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_mappers: Option<u32>,

    /// Column used to split work between mappers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_by: Option<String>,

    /// Use the database's direct (native bulk) path.
    #[serde(default)]
    pub direct: bool,

    /// Batch statements on export.
    #[serde(default)]
    pub batch: bool,

    /// Read uncommitted on import.
    #[serde(default)]
    pub relaxed_isolation: bool,

    /// Verbose tool logging.
    #[serde(default)]
    pub verbose: bool,

    /// Field delimiter (`--input-fields-terminated-by` on export).
    #[serde(
        default,
        alias = "input_fields_terminated_by",
        skip_serializing_if = "Option::is_none"
    )]
    pub fields_terminated_by: Option<String>,

    /// Record delimiter.
    #[serde(
        default,
        alias = "input_lines_terminated_by",
        skip_serializing_if = "Option::is_none"
    )]
    pub lines_terminated_by: Option<String>,

    /// Text written for a null string column.
    #[serde(default, alias = "input_null_string", skip_serializing_if = "Option::is_none")]
    pub null_string: Option<String>,

    /// Text written for a null non-string column.
    #[serde(
        default,
        alias = "input_null_non_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub null_non_string: Option<String>,

    /// Character every field is enclosed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosed_by: Option<String>,

    /// Escape character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escaped_by: Option<String>,

    /// Enclosing character, used only where a field needs it.
    #[serde(
        default,
        alias = "input_optionally_enclosed_by",
        skip_serializing_if = "Option::is_none"
    )]
    pub optionally_enclosed_by: Option<String>,

    /// Staging table for atomic exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_table: Option<String>,

    /// Empty the staging table before exporting.
    #[serde(default)]
    pub clear_staging_table: bool,

    /// Create the HCatalog table if it does not exist.
    #[serde(default)]
    pub create_hcatalog_table: bool,

    /// HCatalog database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcatalog_database: Option<String>,

    /// HCatalog table to read from or write to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hcatalog_table: Option<String>,

    /// Hadoop properties, each forwarded as `-D key=value`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,

    /// Additional tool options, each forwarded as `--key [value]`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra_options: IndexMap<String, OptionValue>,
}

impl TransferConfig {
    /// Create a configuration with every optional field absent.
    pub fn new(cmd_type: impl Into<String>) -> Self {
        Self {
            conn_id: default_conn_id(),
            cmd_type: cmd_type.into(),
            schema: None,
            table: None,
            query: None,
            columns: None,
            where_clause: None,
            driver: None,
            target_dir: None,
            export_dir: None,
            append: false,
            file_type: None,
            num_mappers: None,
            split_by: None,
            direct: false,
            batch: false,
            relaxed_isolation: false,
            verbose: false,
            fields_terminated_by: None,
            lines_terminated_by: None,
            null_string: None,
            null_non_string: None,
            enclosed_by: None,
            escaped_by: None,
            optionally_enclosed_by: None,
            staging_table: None,
            clear_staging_table: false,
            create_hcatalog_table: false,
            hcatalog_database: None,
            hcatalog_table: None,
            properties: IndexMap::new(),
            extra_options: IndexMap::new(),
        }
    }

    /// Shorthand for `TransferConfig::new("import")`.
    pub fn import() -> Self {
        Self::new("import")
    }

    /// Shorthand for `TransferConfig::new("export")`.
    pub fn export() -> Self {
        Self::new("export")
    }
}

/// A configuration that passed validation, together with its parsed mode.
///
/// Only the validator creates these, so the command builder never sees an
/// illegal combination.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedConfig<'a> {
    pub(crate) config: &'a TransferConfig,
    pub(crate) mode: TransferMode,
}

impl<'a> ValidatedConfig<'a> {
    pub fn config(&self) -> &'a TransferConfig {
        self.config
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }
}

/// Non-empty value of an optional string field.
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// Default value functions for serde
fn default_conn_id() -> String {
    "sqoop_default".to_string()
}

fn default_program() -> String {
    "sqoop".to_string()
}

fn default_output_tail_lines() -> usize {
    200
}
