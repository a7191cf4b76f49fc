// Contract deployment + source verification

pub mod artifacts;
pub mod chain;
pub mod error;
pub mod evm;
pub mod explorer;
pub mod orchestrator;
pub mod plan;
pub mod rpc_config;

#[cfg(test)]
pub(crate) mod test_server;

// Re-export primary types for convenient access.
pub use alloy::dyn_abi::DynSolValue;
pub use alloy::primitives::utils::{format_ether, parse_ether};
pub use alloy::primitives::{Address, U256};
pub use artifacts::{ArtifactStore, BuildInfo, ContractArtifact};
pub use chain::{Chain, UnknownChain};
pub use error::{ArtifactError, DeployError, PlanError, RunError, VerifyError};
pub use evm::{RpcDeployer, Signing};
pub use explorer::EtherscanVerifier;
pub use orchestrator::{Deployer, Orchestrator, ProgressReporter, StdoutReporter, Verifier};
pub use plan::{ConstructorArg, DeployedContract, DeploymentPlan, DeploymentSpec};
pub use rpc_config::{RpcConfig, explorer_api_url};
