//! Typed error type for the db crate.

use thiserror::Error;

use crate::signer::SignerError;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// IAM auth token presigning failed; pool creation is aborted and
    /// nothing is cached.
    #[error("failed to obtain RDS IAM auth token: {0}")]
    Token(#[from] SignerError),
}
