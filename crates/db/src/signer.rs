//! RDS IAM auth token presigning.
//!
//! An auth token is a SigV4-presigned `connect` request against the
//! `rds-db` service: the signed URL, minus its scheme, is used verbatim as
//! the database password. Tokens are short-lived and never persisted.

use std::time::{Duration, SystemTime};

use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_credential_types::provider::error::CredentialsError;
use aws_sigv4::http_request::{
    self, SignableBody, SignableRequest, SignatureLocation, SigningError, SigningSettings,
};
use aws_sigv4::sign::v4;
use thiserror::Error;
use tracing::debug;

use config::DbConfig;

/// Token lifetime requested from the signer (the RDS maximum is 15 minutes).
const TOKEN_EXPIRY: Duration = Duration::from_secs(900);

/// Errors from token presigning.
#[derive(Debug, Error)]
pub enum SignerError {
    /// The loaded AWS config carries no credentials provider at all.
    #[error("no AWS credentials provider available")]
    NoCredentialsProvider,

    /// The credential chain failed to produce credentials.
    #[error("failed to load AWS credentials: {0}")]
    Credentials(#[from] CredentialsError),

    /// SigV4 signing failed.
    #[error("sigv4 signing failed: {0}")]
    Signing(#[from] SigningError),

    /// Signing parameter assembly failed.
    #[error("invalid signing parameters: {0}")]
    Params(#[from] v4::signing_params::BuildError),

    /// The endpoint/port/user combination is not a valid URL.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Mint one auth token scoped to `config`'s region, endpoint, port and user.
///
/// The returned string is a secret; callers must never log it in full.
pub async fn auth_token(config: &DbConfig) -> Result<String, SignerError> {
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let credentials = aws_config
        .credentials_provider()
        .ok_or(SignerError::NoCredentialsProvider)?
        .provide_credentials()
        .await?;
    let identity = credentials.into();

    let mut settings = SigningSettings::default();
    settings.expires_in = Some(TOKEN_EXPIRY);
    settings.signature_location = SignatureLocation::QueryParams;

    let params = v4::SigningParams::builder()
        .identity(&identity)
        .region(&config.region)
        .name("rds-db")
        .time(SystemTime::now())
        .settings(settings)
        .build()?
        .into();

    let plain_url = format!(
        "https://{}:{}/?Action=connect&DBUser={}",
        config.endpoint, config.port, config.username
    );
    let request = SignableRequest::new(
        "GET",
        &plain_url,
        std::iter::empty(),
        SignableBody::Bytes(&[]),
    )?;
    let (instructions, _signature) = http_request::sign(request, &params)?.into_parts();

    let mut signed = url::Url::parse(&plain_url)?;
    for (name, value) in instructions.params() {
        signed.query_pairs_mut().append_pair(name, value);
    }
    debug!("Signed RDS connect request for '{}'", config.username);

    // The driver expects host:port/?... without the scheme.
    Ok(signed.to_string().split_off("https://".len()))
}
