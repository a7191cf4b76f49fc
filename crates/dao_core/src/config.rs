use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

const VAR_NETWORK: &str = "DAO_NETWORK";
const VAR_RPC_URL: &str = "DAO_RPC_URL";
const VAR_DEPLOYER_ADDRESS: &str = "DAO_DEPLOYER_ADDRESS";
const VAR_PRIVATE_KEY: &str = "DAO_PRIVATE_KEY";
const VAR_EXPLORER_API_KEY: &str = "ETHERSCAN_API_KEY";
const VAR_EXPLORER_API_URL: &str = "DAO_EXPLORER_API_URL";
const VAR_ARTIFACTS_DIR: &str = "DAO_ARTIFACTS_DIR";
const VAR_SETTLE_DELAY_SECS: &str = "DAO_SETTLE_DELAY_SECS";
const VAR_CONFIRMATION_TIMEOUT_SECS: &str = "DAO_CONFIRMATION_TIMEOUT_SECS";
const VAR_POLL_INTERVAL_MS: &str = "DAO_POLL_INTERVAL_MS";
const VAR_DAO_FUNDING_ETH: &str = "DAO_DAO_FUNDING_ETH";
const VAR_LOG_DIR: &str = "DAO_LOG_DIR";

/// Shorter intervals would hammer the node and the explorer.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Errors raised while reading the deployment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config {var}: expected a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("config {var}: invalid URL {value:?} (must be http or https with a host)")]
    InvalidUrl { var: &'static str, value: String },

    #[error("config {var}: {value} is below the minimum of {min}")]
    BelowMinimum {
        var: &'static str,
        value: u64,
        min: u64,
    },
}

// ---------------------------------------------------------------------------
// Secret
// ---------------------------------------------------------------------------

/// A credential that must never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ---------------------------------------------------------------------------
// .env loading
// ---------------------------------------------------------------------------

/// Result of looking for a `.env` file. Loading happens before logging is
/// initialised, so the outcome is kept and reported afterwards.
#[derive(Debug)]
pub enum DotenvStatus {
    Loaded(PathBuf),
    NotFound,
    Unreadable(String),
}

impl DotenvStatus {
    pub fn log(&self) {
        match self {
            DotenvStatus::Loaded(path) => info!("Loaded environment from {}", path.display()),
            DotenvStatus::NotFound => debug!("No .env file found"),
            DotenvStatus::Unreadable(e) => warn!("Ignoring unreadable .env file: {e}"),
        }
    }
}

impl From<dotenvy::Result<PathBuf>> for DotenvStatus {
    fn from(result: dotenvy::Result<PathBuf>) -> Self {
        match result {
            Ok(path) => DotenvStatus::Loaded(path),
            Err(e) if e.not_found() => DotenvStatus::NotFound,
            Err(e) => DotenvStatus::Unreadable(e.to_string()),
        }
    }
}

/// Load `.env` from the working directory or its ancestors into the process
/// environment.
pub fn load_dotenv() -> DotenvStatus {
    dotenvy::dotenv().into()
}

pub fn load_dotenv_from(path: &Path) -> DotenvStatus {
    dotenvy::from_path(path).map(|()| path.to_path_buf()).into()
}

// ---------------------------------------------------------------------------
// DeployConfig
// ---------------------------------------------------------------------------

/// Settings for one deployment run.
///
/// Read from the process environment (optionally seeded from a `.env` file).
/// There is no config file of our own; every field has a default so an empty
/// environment targets a local node.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub network: String,
    pub rpc_url: Option<String>,
    pub deployer_address: Option<String>,
    /// Signs deployments locally when set.
    pub private_key: Option<Secret>,

    pub explorer_api_key: Option<Secret>,
    pub explorer_api_url: Option<String>,

    pub artifacts_dir: PathBuf,

    // Timing
    pub settle_delay_secs: u64,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,

    /// Ether attached to the DAO contract's constructor, as a decimal string.
    pub dao_funding_eth: String,

    pub log_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: "localhost".into(),
            rpc_url: None,
            deployer_address: None,
            private_key: None,
            explorer_api_key: None,
            explorer_api_url: None,
            artifacts_dir: PathBuf::from("artifacts"),
            settle_delay_secs: 30,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 2_000,
            dao_funding_eth: "0.05".into(),
            log_dir: None,
        }
    }
}

impl DeployConfig {
    /// Read the configuration from the process environment. Call
    /// [`load_dotenv`] first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Unset and blank
    /// variables fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(network) = get(VAR_NETWORK) {
            config.network = network.to_lowercase();
        }
        if let Some(url) = get(VAR_RPC_URL) {
            config.rpc_url = Some(checked_url(VAR_RPC_URL, url)?);
        }
        config.deployer_address = get(VAR_DEPLOYER_ADDRESS);
        config.private_key = get(VAR_PRIVATE_KEY).map(Secret);
        config.explorer_api_key = get(VAR_EXPLORER_API_KEY).map(Secret);
        if let Some(url) = get(VAR_EXPLORER_API_URL) {
            config.explorer_api_url = Some(checked_url(VAR_EXPLORER_API_URL, url)?);
        }
        if let Some(dir) = get(VAR_ARTIFACTS_DIR) {
            config.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get(VAR_SETTLE_DELAY_SECS) {
            config.settle_delay_secs = parse_number(VAR_SETTLE_DELAY_SECS, raw)?;
        }
        if let Some(raw) = get(VAR_CONFIRMATION_TIMEOUT_SECS) {
            config.confirmation_timeout_secs = parse_number(VAR_CONFIRMATION_TIMEOUT_SECS, raw)?;
        }
        if let Some(raw) = get(VAR_POLL_INTERVAL_MS) {
            let value = parse_number(VAR_POLL_INTERVAL_MS, raw)?;
            if value < MIN_POLL_INTERVAL_MS {
                return Err(ConfigError::BelowMinimum {
                    var: VAR_POLL_INTERVAL_MS,
                    value,
                    min: MIN_POLL_INTERVAL_MS,
                });
            }
            config.poll_interval_ms = value;
        }
        if let Some(amount) = get(VAR_DAO_FUNDING_ETH) {
            config.dao_funding_eth = amount;
        }
        config.log_dir = get(VAR_LOG_DIR).map(PathBuf::from);

        Ok(config)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_number(var: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber { var, value: raw })
}

fn checked_url(var: &'static str, raw: String) -> Result<String, ConfigError> {
    if validate_url(&raw) {
        Ok(raw)
    } else {
        Err(ConfigError::InvalidUrl { var, value: raw })
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
