//! Connection lookup.
//!
//! The operator only knows a connection id. A [`ConnectionResolver`] turns it
//! into the host and credentials used on the command line; where those live
//! (a secrets store, the orchestrator's metadata database, a job file) is the
//! resolver's business.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{OperatorError, Result};

/// Parameters of a database connection.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// JDBC host, e.g. `jdbc:mysql://db.example.com`.
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Database name appended to the connect string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Extra options: `namenode`, `job_tracker`, `libjars`, `files`,
    /// `archives`, `password_file`.
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl ConnectionParams {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            schema: None,
            login: None,
            password: None,
            extra: IndexMap::new(),
        }
    }

    /// JDBC connect string: `host[:port][/schema]`.
    pub fn connect_string(&self) -> String {
        let mut connect = self.host.clone();
        if let Some(port) = self.port {
            connect.push_str(&format!(":{}", port));
        }
        if let Some(schema) = self.schema.as_deref().filter(|s| !s.is_empty()) {
            connect.push('/');
            connect.push_str(schema);
        }
        connect
    }

    /// Non-empty extra option.
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("schema", &self.schema)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("extra", &self.extra)
            .finish()
    }
}

/// Resolve a connection id to its parameters.
pub trait ConnectionResolver: Send + Sync {
    /// Look up a connection. Unknown ids fail with
    /// [`OperatorError::ConnectionNotFound`].
    fn resolve(&self, conn_id: &str) -> Result<ConnectionParams>;
}

/// Resolver over a fixed set of connections, e.g. the `connections:` section
/// of a job file.
#[derive(Debug, Clone, Default)]
pub struct StaticConnections {
    connections: IndexMap<String, ConnectionParams>,
}

impl StaticConnections {
    pub fn new(connections: IndexMap<String, ConnectionParams>) -> Self {
        Self { connections }
    }

    /// Add or replace a connection.
    pub fn with_connection(mut self, conn_id: impl Into<String>, params: ConnectionParams) -> Self {
        self.connections.insert(conn_id.into(), params);
        self
    }
}

impl ConnectionResolver for StaticConnections {
    fn resolve(&self, conn_id: &str) -> Result<ConnectionParams> {
        self.connections
            .get(conn_id)
            .cloned()
            .ok_or_else(|| OperatorError::ConnectionNotFound(conn_id.to_string()))
    }
}
