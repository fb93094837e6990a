//! The resolved connection-configuration record.

use serde::{Deserialize, Serialize};

/// Immutable database connection parameters.
///
/// The resolver guarantees every field is populated (non-empty, non-zero
/// port) before a value of this type is handed to the connection provider.
/// It carries no secrets: passwords and tokens are resolved separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Database host, typically an RDS Proxy endpoint.
    pub endpoint: String,
    /// TCP port (always non-zero).
    pub port: u16,
    /// Target schema name.
    pub dbname: String,
    /// Database principal.
    pub username: String,
    /// Region used for IAM token signing.
    pub region: String,
}
