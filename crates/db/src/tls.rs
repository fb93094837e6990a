//! TLS trust resolution for the remote connection.
//!
//! The container image may ship an RDS CA bundle at a well-known path. When
//! the file is readable it is pinned and the server certificate is validated
//! strictly; otherwise TLS stays on but certificate validation is skipped,
//! which is acceptable in dev environments only.

use std::fs;
use std::path::Path;

use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use tracing::{info, warn};

/// Which trust material the pool will use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsStrategy {
    /// Strict validation against a pinned CA bundle (PEM bytes).
    VerifyCa(Vec<u8>),
    /// TLS on, certificate validation off.
    NoVerify,
}

impl TlsStrategy {
    /// Read the bundle at `path` and pick a strategy.
    ///
    /// File-not-found and every other read error (permissions, path is a
    /// directory, I/O failure) fall back to [`TlsStrategy::NoVerify`] with a
    /// warning; the fallback is never fatal.
    pub fn resolve(path: &Path) -> Self {
        match fs::read(path) {
            Ok(pem) => {
                info!(
                    "Using CA bundle at {} with strict certificate validation",
                    path.display()
                );
                Self::VerifyCa(pem)
            }
            Err(err) => {
                warn!(
                    "CA bundle at {} is unreadable ({err}); disabling certificate validation (dev-mode only)",
                    path.display()
                );
                Self::NoVerify
            }
        }
    }

    /// Stamp the strategy onto MySQL connect options.
    pub fn apply(&self, options: MySqlConnectOptions) -> MySqlConnectOptions {
        match self {
            Self::VerifyCa(pem) => options
                .ssl_mode(MySqlSslMode::VerifyIdentity)
                .ssl_ca_from_pem(pem.clone()),
            Self::NoVerify => options.ssl_mode(MySqlSslMode::Required),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_bundle_falls_back_to_no_verify() {
        let strategy = TlsStrategy::resolve(Path::new("/definitely/not/here.pem"));
        assert_eq!(strategy, TlsStrategy::NoVerify);
    }

    #[test]
    fn present_bundle_selects_strict_validation() {
        let path = std::env::temp_dir().join("rds-bootstrap-test-ca.pem");
        let pem = b"-----BEGIN CERTIFICATE-----\n";
        fs::write(&path, pem).unwrap();

        let strategy = TlsStrategy::resolve(&path);
        assert_eq!(strategy, TlsStrategy::VerifyCa(pem.to_vec()));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn unreadable_bundle_falls_back_to_no_verify() {
        // The path exists and stats fine but reading it fails (it is a
        // directory). Read errors on a present bundle must fall back just
        // like absence does, never surface later as a connect error.
        let path = std::env::temp_dir().join("rds-bootstrap-test-ca-dir");
        fs::create_dir_all(&path).unwrap();

        let strategy = TlsStrategy::resolve(&path);
        assert_eq!(strategy, TlsStrategy::NoVerify);

        fs::remove_dir(&path).unwrap();
    }
}
