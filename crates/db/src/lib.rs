//! `db` crate — lazy, process-wide database pool bootstrap.
//!
//! [`DbProvider::get`] builds exactly one pool per process, choosing an
//! authentication strategy from the configuration mode:
//! - local without a password: a stub pool with canned results;
//! - local with a password: a real pool, TLS off;
//! - remote: a real pool authenticated with an RDS IAM auth token, TLS on.
//!
//! No query-execution business logic lives here.

pub mod error;
pub mod pool;
pub mod signer;
pub mod tls;

pub use error::DbError;
pub use pool::{DB, DbHandle, DbProvider, PoolMode, QueryOutput};
pub use tls::TlsStrategy;
