//! # sqoop-operator
//!
//! Validated Sqoop import/export task operator.
//!
//! The operator reconciles a declarative task configuration into a single
//! Sqoop command line and hands it to an injected hook:
//!
//! - **Validation** rejects illegal combinations before anything runs
//! - **Deterministic command lines** with a fixed flag order per mode
//! - **Passthrough** Hadoop properties and tool options in declaration order
//! - **Typed failures** separating configuration errors from tool failures
//!
//! ## Example
//!
//! ```rust,no_run
//! use sqoop_operator::{Config, TransferOperator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("job.yaml")?;
//!     let operator = TransferOperator::from_config("import_company", config);
//!     let result = operator.execute(CancellationToken::new()).await?;
//!     println!("Finished in {:.2}s", result.duration_seconds);
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod hook;
pub mod operator;

// Re-exports for convenient access
pub use command::{CommandBuilder, Invocation};
pub use config::{Config, FileFormat, OptionValue, RuntimeConfig, TransferConfig, TransferMode};
pub use connection::{ConnectionParams, ConnectionResolver, StaticConnections};
pub use error::{ConfigError, OperatorError, Result};
pub use hook::{DryRunHook, ExecutionResult, ExitStatus, ProcessHook, TransferHook};
pub use operator::{OperatorState, TransferOperator, TransferResult};
