//! Configuration resolution — local env fallback or remote SSM fetch.

use std::env;

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::mode::ConfigMode;
use crate::model::DbConfig;
use crate::store::{self, ParameterStore, SsmParameterStore};

// Env vars recognised in local mode.
pub const LOCAL_DB_HOST: &str = "LOCAL_DB_HOST";
pub const LOCAL_DB_PORT: &str = "LOCAL_DB_PORT";
pub const LOCAL_DB_NAME: &str = "LOCAL_DB_NAME";
pub const LOCAL_DB_USER: &str = "LOCAL_DB_USER";
pub const AWS_REGION: &str = "AWS_REGION";
pub const LOCAL_AWS_REGION: &str = "LOCAL_AWS_REGION";

/// Region used when neither `AWS_REGION` nor `LOCAL_AWS_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Standard MySQL port, the local-mode default.
pub const DEFAULT_PORT: u16 = 3306;

/// Resolve the connection configuration for `mode`.
///
/// Local mode reads individual environment variables with documented
/// defaults and performs no network I/O. Remote mode issues one batch
/// `GetParameters` call against SSM; an incomplete response is a hard
/// failure, not a partially-filled config.
///
/// # Errors
/// - [`ConfigError::ParameterStore`] if the SSM call fails.
/// - [`ConfigError::MissingParameter`] if any of the five parameters is
///   absent or empty in the response.
/// - [`ConfigError::InvalidPort`] if the port value is zero or not a number.
pub async fn resolve(mode: ConfigMode) -> Result<DbConfig, ConfigError> {
    match mode {
        ConfigMode::Local => {
            info!("Using local config fallback");
            let config = local_config(|key| env::var(key).ok())?;
            debug!(
                "Local config: endpoint={} port={} dbname={} username={}",
                config.endpoint, config.port, config.dbname, config.username
            );
            Ok(config)
        }
        ConfigMode::Remote => {
            let region = env::var(AWS_REGION).unwrap_or_else(|_| DEFAULT_REGION.to_string());
            let ssm = SsmParameterStore::new(region).await;
            resolve_remote(&ssm).await
        }
    }
}

/// Build a local-mode config from an arbitrary lookup function.
///
/// Empty values count as unset and fall through to the defaults, keeping
/// the every-field-populated invariant of [`DbConfig`].
pub fn local_config<F>(get: F) -> Result<DbConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| get(key).filter(|value| !value.is_empty());

    let port = match get(LOCAL_DB_PORT) {
        Some(raw) => parse_port(&raw)?,
        None => DEFAULT_PORT,
    };

    Ok(DbConfig {
        endpoint: get(LOCAL_DB_HOST).unwrap_or_else(|| "127.0.0.1".to_string()),
        port,
        dbname: get(LOCAL_DB_NAME).unwrap_or_else(|| "test".to_string()),
        username: get(LOCAL_DB_USER).unwrap_or_else(|| "root".to_string()),
        region: get(AWS_REGION)
            .or_else(|| get(LOCAL_AWS_REGION))
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
    })
}

/// Resolve a remote config against an already-constructed parameter store.
pub async fn resolve_remote(store: &dyn ParameterStore) -> Result<DbConfig, ConfigError> {
    let map = store
        .fetch(&store::PARAMS)
        .await
        .map_err(ConfigError::ParameterStore)?;

    let take = |name: &'static str| -> Result<String, ConfigError> {
        map.get(name)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or(ConfigError::MissingParameter(name))
    };

    let config = DbConfig {
        endpoint: take(store::PARAM_ENDPOINT)?,
        port: parse_port(&take(store::PARAM_PORT)?)?,
        dbname: take(store::PARAM_DBNAME)?,
        username: take(store::PARAM_USERNAME)?,
        region: take(store::PARAM_REGION)?,
    };
    debug!(
        "Loaded config: endpoint={} port={} dbname={} username={}",
        config.endpoint, config.port, config.dbname, config.username
    );
    Ok(config)
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::BoxError;

    // -----------------------------------------------------------------------
    // Local mode
    // -----------------------------------------------------------------------

    /// Lookup over a literal key/value table.
    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn local_defaults_when_nothing_is_set() {
        let config = local_config(|_| None).unwrap();
        assert_eq!(config.endpoint, "127.0.0.1");
        assert_eq!(config.port, 3306);
        assert_eq!(config.dbname, "test");
        assert_eq!(config.username, "root");
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn local_explicit_values_win_over_defaults() {
        let config = local_config(env_of(&[
            ("LOCAL_DB_HOST", "db.internal"),
            ("LOCAL_DB_PORT", "3307"),
            ("LOCAL_DB_NAME", "orders"),
            ("LOCAL_DB_USER", "app_user"),
            ("AWS_REGION", "eu-west-1"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "db.internal");
        assert_eq!(config.port, 3307);
        assert_eq!(config.dbname, "orders");
        assert_eq!(config.username, "app_user");
        assert_eq!(config.region, "eu-west-1");
    }

    #[test]
    fn local_region_falls_back_through_both_vars() {
        let config = local_config(env_of(&[("LOCAL_AWS_REGION", "ap-south-1")])).unwrap();
        assert_eq!(config.region, "ap-south-1");

        // AWS_REGION takes precedence over the secondary fallback.
        let config = local_config(env_of(&[
            ("AWS_REGION", "eu-west-1"),
            ("LOCAL_AWS_REGION", "ap-south-1"),
        ]))
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
    }

    #[test]
    fn local_empty_value_counts_as_unset() {
        let config = local_config(env_of(&[("LOCAL_DB_HOST", "")])).unwrap();
        assert_eq!(config.endpoint, "127.0.0.1");
    }

    #[test]
    fn local_bad_port_is_rejected() {
        let err = local_config(env_of(&[("LOCAL_DB_PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    }

    // -----------------------------------------------------------------------
    // Remote mode, via a canned store
    // -----------------------------------------------------------------------

    enum MockBehaviour {
        /// Return this map.
        Return(HashMap<String, String>),
        /// Fail the call with this message.
        Fail(&'static str),
    }

    /// A canned parameter store that records every request it receives.
    struct MockStore {
        behaviour: MockBehaviour,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockStore {
        fn returning(pairs: &[(&str, &str)]) -> Self {
            let map = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Self {
                behaviour: MockBehaviour::Return(map),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &'static str) -> Self {
            Self {
                behaviour: MockBehaviour::Fail(message),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ParameterStore for MockStore {
        async fn fetch(&self, names: &[&str]) -> Result<HashMap<String, String>, BoxError> {
            self.calls
                .lock()
                .unwrap()
                .push(names.iter().map(|n| n.to_string()).collect());
            match &self.behaviour {
                MockBehaviour::Return(map) => Ok(map.clone()),
                MockBehaviour::Fail(message) => Err((*message).into()),
            }
        }
    }

    fn full_response() -> MockStore {
        MockStore::returning(&[
            (store::PARAM_ENDPOINT, "proxy.rds.amazonaws.com"),
            (store::PARAM_PORT, "3306"),
            (store::PARAM_DBNAME, "demo"),
            (store::PARAM_USERNAME, "app_user"),
            (store::PARAM_REGION, "us-east-1"),
        ])
    }

    #[tokio::test]
    async fn remote_full_response_maps_exactly() {
        let ssm = full_response();
        let config = resolve_remote(&ssm).await.unwrap();
        assert_eq!(
            config,
            DbConfig {
                endpoint: "proxy.rds.amazonaws.com".to_string(),
                port: 3306,
                dbname: "demo".to_string(),
                username: "app_user".to_string(),
                region: "us-east-1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn remote_requests_all_five_names_in_order() {
        let ssm = full_response();
        resolve_remote(&ssm).await.unwrap();
        let calls = ssm.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], store::PARAMS);
    }

    #[tokio::test]
    async fn remote_fetch_failure_propagates() {
        let ssm = MockStore::failing("ssm unreachable");
        let err = resolve_remote(&ssm).await.unwrap_err();
        assert!(matches!(err, ConfigError::ParameterStore(_)));
    }

    #[tokio::test]
    async fn remote_missing_parameter_is_a_hard_failure() {
        // Four of five returned: the port parameter never arrives.
        let ssm = MockStore::returning(&[
            (store::PARAM_ENDPOINT, "proxy.rds.amazonaws.com"),
            (store::PARAM_DBNAME, "demo"),
            (store::PARAM_USERNAME, "app_user"),
            (store::PARAM_REGION, "us-east-1"),
        ]);
        let err = resolve_remote(&ssm).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingParameter(name) if name == store::PARAM_PORT
        ));
    }

    #[tokio::test]
    async fn remote_zero_port_is_rejected() {
        let ssm = MockStore::returning(&[
            (store::PARAM_ENDPOINT, "proxy.rds.amazonaws.com"),
            (store::PARAM_PORT, "0"),
            (store::PARAM_DBNAME, "demo"),
            (store::PARAM_USERNAME, "app_user"),
            (store::PARAM_REGION, "us-east-1"),
        ]);
        let err = resolve_remote(&ssm).await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { value } if value == "0"));
    }
}
