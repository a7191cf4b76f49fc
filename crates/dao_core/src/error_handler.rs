/// Broad category of a failed deployment run, derived from the error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    InsufficientFunds,
    Reverted,
    ConstructorArguments,
    Accounts,
    Configuration,
    Artifact,
    Network,
    Internal,
}

/// Classified error with an operator-facing hint.
#[derive(Debug, Clone)]
pub struct ClassifiedError {
    pub category: FailureCategory,
    pub message: String,
    pub hint: String,
}

/// Classify an `anyhow::Error` by inspecting every message in its chain for
/// known patterns.
pub fn classify_error(error: &anyhow::Error) -> ClassifiedError {
    let msg = error
        .chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
        .to_lowercase();

    // Configuration and argument errors mention variable names such as
    // DAO_RPC_URL, so they are matched before the network substrings.
    let (category, hint) = if msg.contains("insufficient funds") {
        (
            FailureCategory::InsufficientFunds,
            "The deployer account cannot cover gas plus attached value. Fund it and re-run.",
        )
    } else if msg.contains("reverted") {
        (
            FailureCategory::Reverted,
            "A constructor reverted. Check constructor arguments and attached value.",
        )
    } else if msg.contains("constructor") {
        (
            FailureCategory::ConstructorArguments,
            "Constructor arguments or attached value do not match the contract ABI. Recompile or fix the plan.",
        )
    } else if msg.contains("no accounts") {
        (
            FailureCategory::Accounts,
            "The node has no unlocked account. Set DAO_PRIVATE_KEY to sign locally, or DAO_DEPLOYER_ADDRESS.",
        )
    } else if msg.contains("config") || msg.contains("unknown network") || msg.contains("amount") {
        (
            FailureCategory::Configuration,
            "Configuration error. Check the DAO_* environment variables.",
        )
    } else if msg.contains("artifact") || msg.contains("build-info") {
        (
            FailureCategory::Artifact,
            "Contract artifacts are missing or stale. Compile the contracts and check DAO_ARTIFACTS_DIR.",
        )
    } else if msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("connection")
        || msg.contains("dns")
        || msg.contains("rpc")
    {
        (
            FailureCategory::Network,
            "Could not reach the node. Check DAO_RPC_URL and that the node is running.",
        )
    } else {
        (FailureCategory::Internal, "An unexpected error occurred.")
    };

    ClassifiedError {
        category,
        message: error.to_string(),
        hint: hint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn test_classify_insufficient_funds() {
        let err = anyhow!("node error -32000: insufficient funds for gas * price + value");
        let classified = classify_error(&err);
        assert_eq!(classified.category, FailureCategory::InsufficientFunds);
        assert!(classified.hint.contains("Fund"));
    }

    #[test]
    fn test_classify_reverted() {
        let err = anyhow!("transaction 0xabc reverted");
        assert_eq!(classify_error(&err).category, FailureCategory::Reverted);
    }

    #[test]
    fn test_classify_network_connection() {
        let err = anyhow!("connection refused on port 8545");
        assert_eq!(classify_error(&err).category, FailureCategory::Network);
    }

    #[test]
    fn test_classify_looks_through_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow!("insufficient funds for transfer"));
        let err = err.context("deploying CryptoDevsDAO").unwrap_err();
        let classified = classify_error(&err);
        assert_eq!(classified.category, FailureCategory::InsufficientFunds);
        assert_eq!(classified.message, "deploying CryptoDevsDAO");
    }

    #[test]
    fn test_classify_artifact() {
        let err = anyhow!("artifact not found for contract FakeMarketplace");
        assert_eq!(classify_error(&err).category, FailureCategory::Artifact);
    }

    #[test]
    fn test_classify_configuration() {
        let err = anyhow!("unknown network \"mars\"");
        assert_eq!(classify_error(&err).category, FailureCategory::Configuration);
    }

    #[test]
    fn test_classify_invalid_rpc_url_is_configuration() {
        let err = anyhow!(
            "config DAO_RPC_URL: invalid URL \"ftp://node\" (must be http or https with a host)"
        );
        let classified = classify_error(&err);
        assert_eq!(classified.category, FailureCategory::Configuration);
        assert!(classified.hint.contains("DAO_*"));
    }

    #[test]
    fn test_classify_invalid_private_key_is_configuration() {
        let err = anyhow!("config DAO_PRIVATE_KEY: not a valid secp256k1 private key");
        assert_eq!(classify_error(&err).category, FailureCategory::Configuration);
    }

    #[test]
    fn test_classify_no_accounts() {
        let err = anyhow!(
            "node exposes no accounts to deploy from; set DAO_PRIVATE_KEY or DAO_DEPLOYER_ADDRESS"
        );
        let classified = classify_error(&err);
        assert_eq!(classified.category, FailureCategory::Accounts);
        assert!(classified.hint.contains("DAO_PRIVATE_KEY"));
    }

    #[test]
    fn test_classify_constructor_argument_errors() {
        for msg in [
            "constructor of CryptoDevsDAO takes 2 argument(s), got 0",
            "constructor argument 1 of CryptoDevsDAO: expected address, got bool",
            "constructor of FakeMarketplace is not payable but a value was attached",
        ] {
            let err: anyhow::Result<()> = Err(anyhow!("{msg}"));
            let err = err.context("deploying CryptoDevsDAO failed").unwrap_err();
            assert_eq!(
                classify_error(&err).category,
                FailureCategory::ConstructorArguments,
                "{msg}"
            );
        }
    }

    #[test]
    fn test_classify_rpc_transport_is_network() {
        let err = anyhow!("rpc transport error: error sending request for url (http://127.0.0.1:8545/)");
        assert_eq!(classify_error(&err).category, FailureCategory::Network);
    }

    #[test]
    fn test_classify_internal_fallback() {
        let err = anyhow!("something totally unexpected happened");
        let classified = classify_error(&err);
        assert_eq!(classified.category, FailureCategory::Internal);
        assert_eq!(classified.hint, "An unexpected error occurred.");
    }
}
