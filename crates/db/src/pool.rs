//! MySQL connection pool construction and the process-wide provider.

use std::env;
use std::fmt;
use std::path::Path;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use config::{ConfigMode, DbConfig};

use crate::DbError;
use crate::signer;
use crate::tls::TlsStrategy;

/// Env var holding the static password for local mode.
pub const LOCAL_DB_PASSWORD: &str = "LOCAL_DB_PASSWORD";

/// Well-known location of the RDS CA bundle inside the container image.
pub const RDS_CA_BUNDLE_PATH: &str = "/app/rds-ca-bundle.pem";

/// Pool ceiling. Acquires past the ceiling queue for a free connection
/// instead of failing.
pub const MAX_CONNECTIONS: u32 = 5;

// ---------------------------------------------------------------------------
// Pool mode selection
// ---------------------------------------------------------------------------

/// How the pool authenticates, decided once per process.
#[derive(Clone, PartialEq, Eq)]
pub enum PoolMode {
    /// No real database; canned results for smoke tests.
    Stub,
    /// Static password, TLS off.
    LocalPassword(String),
    /// Ephemeral RDS IAM auth token, TLS on.
    RemoteSigned,
}

impl PoolMode {
    /// Select the pool mode from the config mode and an optional local
    /// password. An empty password counts as unset.
    pub fn select(mode: ConfigMode, local_password: Option<String>) -> Self {
        match (mode, local_password.filter(|p| !p.is_empty())) {
            (ConfigMode::Local, None) => Self::Stub,
            (ConfigMode::Local, Some(password)) => Self::LocalPassword(password),
            (ConfigMode::Remote, _) => Self::RemoteSigned,
        }
    }

    /// Select the pool mode, reading the password from `LOCAL_DB_PASSWORD`.
    pub fn from_env(mode: ConfigMode) -> Self {
        Self::select(mode, env::var(LOCAL_DB_PASSWORD).ok())
    }
}

impl fmt::Debug for PoolMode {
    // Manual impl so the password can never leak through `{:?}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stub => write!(f, "Stub"),
            Self::LocalPassword(_) => write!(f, "LocalPassword(<redacted>)"),
            Self::RemoteSigned => write!(f, "RemoteSigned"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pool handle
// ---------------------------------------------------------------------------

/// Shared handle to the database, stub or real.
#[derive(Clone)]
pub enum DbHandle {
    /// Canned results; nothing behind it. Lets the service boot and answer
    /// smoke queries without a database.
    Stub,
    /// Real sqlx pool.
    Pool(MySqlPool),
}

/// What a query produced.
#[derive(Debug)]
pub enum QueryOutput {
    /// Row data from a `SELECT`.
    Rows(Vec<MySqlRow>),
    /// Acknowledgement of a statement that returns no rows.
    Ack { rows_affected: u64 },
}

impl DbHandle {
    /// Run one statement. Statements starting with a case-insensitive
    /// `select` yield [`QueryOutput::Rows`]; everything else yields
    /// [`QueryOutput::Ack`]. String parameters are bound positionally.
    pub async fn query(&self, sql: &str, params: &[&str]) -> Result<QueryOutput, DbError> {
        match self {
            Self::Stub => Ok(stub_reply(sql)),
            Self::Pool(pool) => {
                let mut query = sqlx::query(sql);
                for param in params {
                    query = query.bind(*param);
                }
                if is_select(sql) {
                    let rows = query.fetch_all(pool).await?;
                    Ok(QueryOutput::Rows(rows))
                } else {
                    let result = query.execute(pool).await?;
                    Ok(QueryOutput::Ack {
                        rows_affected: result.rows_affected(),
                    })
                }
            }
        }
    }
}

/// The stub contract: empty rows for selects, an empty ack for everything
/// else. No I/O of any kind.
fn stub_reply(sql: &str) -> QueryOutput {
    if is_select(sql) {
        QueryOutput::Rows(Vec::new())
    } else {
        QueryOutput::Ack { rows_affected: 0 }
    }
}

fn is_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

// ---------------------------------------------------------------------------
// Pool construction
// ---------------------------------------------------------------------------

/// Build a handle for the selected mode.
///
/// [`PoolMode::RemoteSigned`] signs one IAM auth token per call; callers are
/// expected to memoize through [`DbProvider`] so a process spends at most
/// one token.
///
/// # Errors
/// - [`DbError::Token`] if token presigning fails (remote mode only).
pub async fn connect(pool_mode: PoolMode, config: &DbConfig) -> Result<DbHandle, DbError> {
    match pool_mode {
        PoolMode::Stub => {
            warn!("No {LOCAL_DB_PASSWORD} provided; using a stub pool");
            Ok(DbHandle::Stub)
        }
        PoolMode::LocalPassword(password) => {
            info!("Initializing DB in local mode");
            let options = base_options(config)
                .password(&password)
                .ssl_mode(MySqlSslMode::Disabled);
            Ok(DbHandle::Pool(pool_with(options)))
        }
        PoolMode::RemoteSigned => {
            info!("Initializing DB with RDS IAM auth token");
            debug!("Requesting IAM auth token from signer");
            let token = signer::auth_token(config).await?;
            info!("Received IAM auth token");

            let options = TlsStrategy::resolve(Path::new(RDS_CA_BUNDLE_PATH))
                .apply(base_options(config).password(&token));
            debug!(
                "Created mysql pool (host={}, user={}, database={})",
                config.endpoint, config.username, config.dbname
            );
            Ok(DbHandle::Pool(pool_with(options)))
        }
    }
}

fn base_options(config: &DbConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.endpoint)
        .port(config.port)
        .username(&config.username)
        .database(&config.dbname)
}

fn pool_with(options: MySqlConnectOptions) -> MySqlPool {
    // Lazy: connections are dialed on first acquire. Excess acquires wait
    // for a free connection instead of erroring.
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_lazy_with(options)
}

// ---------------------------------------------------------------------------
// Process-wide provider
// ---------------------------------------------------------------------------

/// Explicitly owned, lazily-initialized pool singleton.
///
/// The first caller of [`DbProvider::get`] builds the handle; concurrent
/// callers during that initialization wait on it rather than racing their
/// own (single-flight), so a process builds at most one pool and spends at
/// most one auth token. A failed initialization caches nothing and the
/// error propagates; the next call starts over. There is no teardown path:
/// the handle lives for the rest of the process.
pub struct DbProvider {
    cell: OnceCell<DbHandle>,
}

/// The shared provider used by the whole process.
pub static DB: DbProvider = DbProvider::new();

impl DbProvider {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// Return the shared handle, building it on first use.
    ///
    /// The local password is read from `LOCAL_DB_PASSWORD` only when the
    /// handle is actually being built; later calls return the memoized
    /// handle without re-reading anything or re-authenticating.
    pub async fn get(&self, mode: ConfigMode, config: &DbConfig) -> Result<&DbHandle, DbError> {
        self.cell
            .get_or_try_init(|| connect(PoolMode::from_env(mode), config))
            .await
    }

    /// Like [`DbProvider::get`] with an explicit pool mode (tests, embedders
    /// that manage credentials themselves).
    pub async fn get_with(
        &self,
        pool_mode: PoolMode,
        config: &DbConfig,
    ) -> Result<&DbHandle, DbError> {
        self.cell
            .get_or_try_init(|| connect(pool_mode, config))
            .await
    }
}

impl Default for DbProvider {
    fn default() -> Self {
        Self::new()
    }
}
