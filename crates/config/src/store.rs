//! The `ParameterStore` trait and its AWS SSM implementation.
//!
//! The trait is the seam that lets the resolver be tested against a canned
//! store; production code goes through [`SsmParameterStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, info};

use crate::error::BoxError;

/// The five parameters the bootstrap layer reads, in fetch order.
pub const PARAM_ENDPOINT: &str = "/demo/rds/endpoint";
pub const PARAM_PORT: &str = "/demo/rds/port";
pub const PARAM_DBNAME: &str = "/demo/rds/dbname";
pub const PARAM_USERNAME: &str = "/demo/rds/username";
pub const PARAM_REGION: &str = "/demo/rds/region";

/// All parameter names, in the order they are requested.
pub const PARAMS: [&str; 5] = [
    PARAM_ENDPOINT,
    PARAM_PORT,
    PARAM_DBNAME,
    PARAM_USERNAME,
    PARAM_REGION,
];

/// Batch key-value fetch against a parameter store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch the given names in one call, returning a name-to-value map.
    /// Names absent upstream are simply absent from the map; only the call
    /// itself failing is an error.
    async fn fetch(&self, names: &[&str]) -> Result<HashMap<String, String>, BoxError>;
}

/// Production parameter store backed by `aws_sdk_ssm::Client`.
pub struct SsmParameterStore {
    client: aws_sdk_ssm::Client,
}

impl SsmParameterStore {
    /// Build a client for `region` using the default credential chain.
    pub async fn new(region: impl Into<String>) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;
        Self {
            client: aws_sdk_ssm::Client::new(&aws_config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn fetch(&self, names: &[&str]) -> Result<HashMap<String, String>, BoxError> {
        info!("Requesting parameters from SSM: {}", names.join(", "));
        let response = self
            .client
            .get_parameters()
            .set_names(Some(names.iter().map(|name| name.to_string()).collect()))
            .with_decryption(false)
            .send()
            .await
            .map_err(|err| Box::new(aws_sdk_ssm::Error::from(err)) as BoxError)?;

        let mut map = HashMap::new();
        for parameter in response.parameters() {
            if let (Some(name), Some(value)) = (parameter.name(), parameter.value()) {
                map.insert(name.to_string(), value.to_string());
            }
        }
        info!("Fetched {} parameters from SSM", map.len());
        debug!(
            "Parameter keys: {}",
            map.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        Ok(map)
    }
}
