//! `config` crate — resolves database connection parameters.
//!
//! Two sources, selected by a single [`ConfigMode`] switch computed once at
//! startup and threaded explicitly through the rest of the bootstrap layer:
//! - local environment-variable fallback with documented defaults (no
//!   network I/O);
//! - one batch fetch from AWS SSM Parameter Store.

pub mod error;
pub mod mode;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::ConfigError;
pub use mode::ConfigMode;
pub use model::DbConfig;
pub use resolver::resolve;
