//! Error types for deployment, verification, and plan construction.

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use alloy::transports::{RpcError, TransportError, TransportErrorKind};
use serde::Deserialize;

/// Failure of the deploy capability. Aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Failure talking to the node (connect, timeout, bad status, bad payload).
    #[error("rpc transport error: {0}")]
    Transport(TransportError),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("transaction {tx_hash} not mined within {waited:?} (confirmation timeout)")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    #[error("receipt for {tx_hash} carries no contract address")]
    MissingContractAddress { tx_hash: TxHash },

    #[error("node exposes no accounts to deploy from; set DAO_PRIVATE_KEY or DAO_DEPLOYER_ADDRESS")]
    NoAccounts,

    #[error("config DAO_PRIVATE_KEY: not a valid secp256k1 private key")]
    InvalidPrivateKey,

    #[error("config DAO_DEPLOYER_ADDRESS: invalid address {0:?}")]
    InvalidDeployerAddress(String),

    #[error("config: invalid RPC URL {0:?}")]
    InvalidRpcUrl(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error("constructor of {contract} takes {expected} argument(s), got {actual}")]
    ArgumentCount {
        contract: String,
        expected: usize,
        actual: usize,
    },

    #[error("constructor argument {index} of {contract}: expected {expected}, got {actual}")]
    ArgumentType {
        contract: String,
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("constructor of {contract} is not payable but a value was attached")]
    NotPayable { contract: String },

    #[error("constructor arguments of {contract} could not be encoded: {message}")]
    Encoding { contract: String, message: String },
}

#[derive(Debug, Deserialize)]
struct NodeErrorBody {
    error: NodeErrorObject,
}

#[derive(Debug, Deserialize)]
struct NodeErrorObject {
    code: i64,
    message: String,
}

impl DeployError {
    fn from_node(code: i64, message: String) -> Self {
        if message.to_lowercase().contains("insufficient funds") {
            DeployError::InsufficientFunds(message)
        } else {
            DeployError::Node { code, message }
        }
    }
}

/// JSON-RPC error objects become [`DeployError::Node`] (or
/// [`DeployError::InsufficientFunds`]), including those some providers send
/// with a non-2xx HTTP status.
impl From<TransportError> for DeployError {
    fn from(err: TransportError) -> Self {
        if let Some(payload) = err.as_error_resp() {
            return DeployError::from_node(payload.code, payload.message.to_string());
        }
        if let RpcError::Transport(TransportErrorKind::HttpError(http)) = &err {
            if let Ok(body) = serde_json::from_str::<NodeErrorBody>(&http.body) {
                return DeployError::from_node(body.error.code, body.error.message);
            }
        }
        DeployError::Transport(err)
    }
}

/// Failure of the verify capability. Logged; never aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("contract {0} is already verified")]
    AlreadyVerified(Address),

    #[error("explorer rejected verification: {0}")]
    Rejected(String),

    #[error("verification unavailable: {0}")]
    Unsupported(String),

    #[error("verification {guid} still pending after {attempts} status checks")]
    StatusTimeout { guid: String, attempts: u32 },

    #[error("malformed explorer response: {0}")]
    Malformed(String),

    #[error("constructor arguments could not be encoded: {0}")]
    Encoding(String),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Problems locating or reading Hardhat compilation output.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found for contract {name} under {}", dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("artifact name {name} is ambiguous: {} candidates", paths.len())]
    Ambiguous { name: String, paths: Vec<PathBuf> },

    #[error("failed to read artifact file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact for {0} has no deployable bytecode (abstract contract or interface?)")]
    MissingBytecode(String),

    #[error("artifact for {name} declares an unsupported ABI type {ty:?}")]
    UnsupportedType { name: String, ty: String },
}

/// Rejections raised while building a [`crate::plan::DeploymentPlan`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("deployment plan is empty")]
    Empty,

    #[error("contract {0} appears more than once in the plan")]
    DuplicateContract(String),

    #[error("{contract} references {referenced}, which is deployed later in the plan")]
    ForwardReference { contract: String, referenced: String },

    #[error("{contract} references {referenced}, which is not part of the plan")]
    UnknownReference { contract: String, referenced: String },
}

/// Why an orchestrated run stopped.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("deploying {contract} failed")]
    Deploy {
        contract: String,
        #[source]
        source: DeployError,
    },

    #[error("{contract} references {referenced}, which has not been deployed")]
    UnresolvedReference { contract: String, referenced: String },
}
