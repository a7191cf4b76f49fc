use std::time::Duration;

use dao_core::DeployConfig;

use crate::chain::Chain;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the node endpoint of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcConfig {
    pub chain: Chain,
    pub url: String,
    pub is_custom: bool,
    pub timeout_secs: u64,
}

impl RpcConfig {
    /// The chain's default RPC URL, unless `config` carries a custom one.
    /// Custom URLs are validated when the config is read.
    pub fn resolve(chain: Chain, config: &DeployConfig) -> Self {
        let (url, is_custom) = match &config.rpc_url {
            Some(url) => (url.clone(), true),
            None => (chain.default_rpc_url().to_string(), false),
        };
        Self {
            chain,
            url,
            is_custom,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Explorer API endpoint for `chain`: the configured override, else the
/// chain's default.
pub fn explorer_api_url(chain: Chain, config: &DeployConfig) -> Option<String> {
    config
        .explorer_api_url
        .clone()
        .or_else(|| chain.explorer_api_url().map(str::to_string))
}
