use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Etherscan's multichain API; the target chain goes in a `chainid` parameter.
pub const ETHERSCAN_V2_API_URL: &str = "https://api.etherscan.io/v2/api";

/// Networks the deployer knows how to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Localhost,
    Goerli,
    Sepolia,
    Ethereum,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network {0:?} (expected localhost, goerli, sepolia or mainnet)")]
pub struct UnknownChain(pub String);

impl Chain {
    /// Human-readable label for the chain.
    pub fn label(&self) -> &'static str {
        match self {
            Chain::Localhost => "Local Hardhat Node",
            Chain::Goerli => "Goerli Testnet",
            Chain::Sepolia => "Sepolia Testnet",
            Chain::Ethereum => "Ethereum Mainnet",
        }
    }

    /// EIP-155 chain ID.
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Localhost => 31337,
            Chain::Goerli => 5,
            Chain::Sepolia => 11_155_111,
            Chain::Ethereum => 1,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Chain::Localhost => "http://127.0.0.1:8545",
            Chain::Goerli => "https://rpc.ankr.com/eth_goerli",
            Chain::Sepolia => "https://rpc.sepolia.org",
            Chain::Ethereum => "https://eth.llamarpc.com",
        }
    }

    /// Etherscan-compatible API endpoint, if the chain has an explorer.
    pub fn explorer_api_url(&self) -> Option<&'static str> {
        match self {
            Chain::Localhost => None,
            Chain::Goerli | Chain::Sepolia | Chain::Ethereum => Some(ETHERSCAN_V2_API_URL),
        }
    }

    /// Browser-facing explorer, used for links in log output.
    pub fn explorer_url(&self) -> Option<&'static str> {
        match self {
            Chain::Localhost => None,
            Chain::Goerli => Some("https://goerli.etherscan.io"),
            Chain::Sepolia => Some("https://sepolia.etherscan.io"),
            Chain::Ethereum => Some("https://etherscan.io"),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_lowercase().as_str() {
            "localhost" | "hardhat" | "local" => Ok(Chain::Localhost),
            "goerli" => Ok(Chain::Goerli),
            "sepolia" => Ok(Chain::Sepolia),
            "mainnet" | "ethereum" => Ok(Chain::Ethereum),
            _ => Err(UnknownChain(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_network_names() {
        assert_eq!("goerli".parse::<Chain>().unwrap(), Chain::Goerli);
        assert_eq!("Hardhat".parse::<Chain>().unwrap(), Chain::Localhost);
        assert_eq!("mainnet".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert!("mars".parse::<Chain>().is_err());
    }

    #[test]
    fn localhost_has_no_explorer() {
        assert!(Chain::Localhost.explorer_api_url().is_none());
        assert!(Chain::Localhost.explorer_url().is_none());
    }

    #[test]
    fn public_rpc_urls_are_https() {
        for chain in [Chain::Goerli, Chain::Sepolia, Chain::Ethereum] {
            assert!(chain.default_rpc_url().starts_with("https://"));
            assert!(chain.explorer_api_url().unwrap().starts_with("https://"));
        }
    }

    #[test]
    fn public_chains_share_the_v2_explorer_api() {
        assert_eq!(Chain::Sepolia.explorer_api_url(), Some(ETHERSCAN_V2_API_URL));
        assert_eq!(Chain::Ethereum.explorer_api_url(), Some(ETHERSCAN_V2_API_URL));
    }

    #[test]
    fn chain_serializes_lowercase() {
        let json = serde_json::to_string(&Chain::Sepolia).unwrap();
        assert_eq!(json, "\"sepolia\"");
    }
}
