//! Deploy-all-then-verify-all orchestration of a [`DeploymentPlan`].
//!
//! Deployments run strictly in plan order and the first failure aborts the
//! run. Once every contract is mined the orchestrator sleeps for a single
//! settling delay so the explorer can index the new transactions, then asks
//! for verification of each contract in deployment order. Verification is
//! best-effort: failures are logged and never change the run's outcome.

use std::time::Duration;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{DeployError, RunError, VerifyError};
use crate::plan::{ConstructorArg, DeployedContract, DeploymentPlan, DeploymentSpec};

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Creates contracts on chain.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Submit the creation transaction and wait until it is mined.
    async fn deploy(
        &self,
        contract_name: &str,
        constructor_args: &[DynSolValue],
        attached_value: Option<U256>,
    ) -> Result<Address, DeployError>;
}

/// Submits deployed contracts to a source verification service.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, contract: &DeployedContract) -> Result<(), VerifyError>;
}

/// Receives one notification per successful deployment.
pub trait ProgressReporter: Send + Sync {
    fn deployed(&self, contract: &DeployedContract);
}

/// Writes `<Name> deployed to : <address>` lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutReporter;

impl ProgressReporter for StdoutReporter {
    fn deployed(&self, contract: &DeployedContract) {
        println!("{} deployed to : {}", contract.name, contract.address);
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<D, V> {
    deployer: D,
    verifier: V,
    settle_delay: Duration,
    reporter: Box<dyn ProgressReporter>,
}

impl<D: Deployer, V: Verifier> Orchestrator<D, V> {
    pub fn new(deployer: D, verifier: V) -> Self {
        Self {
            deployer,
            verifier,
            settle_delay: DEFAULT_SETTLE_DELAY,
            reporter: Box::new(StdoutReporter),
        }
    }

    /// Zero skips the wait entirely.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn with_reporter(mut self, reporter: impl ProgressReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    /// Deploy every contract in `plan`, wait once, then verify them all.
    ///
    /// Returns the deployed contracts in plan order. Only deploy-phase
    /// failures produce an error.
    pub async fn run(&self, plan: &DeploymentPlan) -> Result<Vec<DeployedContract>, RunError> {
        let deployed = self.deploy_all(plan).await?;

        if !self.settle_delay.is_zero() {
            info!(
                delay_secs = self.settle_delay.as_secs_f64(),
                "waiting for the explorer to index deployments"
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        self.verify_all(&deployed).await;
        Ok(deployed)
    }

    async fn deploy_all(&self, plan: &DeploymentPlan) -> Result<Vec<DeployedContract>, RunError> {
        let mut deployed: Vec<DeployedContract> = Vec::with_capacity(plan.len());

        for spec in plan.specs() {
            let args = resolve_args(spec, &deployed)?;
            debug!(
                contract = %spec.contract_name,
                args = args.len(),
                value = ?spec.attached_value,
                "deploying"
            );

            let address = self
                .deployer
                .deploy(&spec.contract_name, &args, spec.attached_value)
                .await
                .map_err(|source| RunError::Deploy {
                    contract: spec.contract_name.clone(),
                    source,
                })?;

            let contract = DeployedContract {
                name: spec.contract_name.clone(),
                address,
                constructor_args: args,
                deployed_at: Utc::now(),
            };
            info!(contract = %contract.name, address = %contract.address, "contract deployed");
            self.reporter.deployed(&contract);
            deployed.push(contract);
        }

        Ok(deployed)
    }

    /// Returns the number of contracts that verified successfully.
    async fn verify_all(&self, deployed: &[DeployedContract]) -> usize {
        let mut verified = 0;

        for contract in deployed {
            match self.verifier.verify(contract).await {
                Ok(()) => {
                    verified += 1;
                    info!(contract = %contract.name, address = %contract.address, "contract verified");
                }
                Err(err) => {
                    warn!(
                        contract = %contract.name,
                        address = %contract.address,
                        error = %err,
                        "verification failed"
                    );
                }
            }
        }

        info!(verified, total = deployed.len(), "verification finished");
        verified
    }
}

/// Substitute address references with the addresses of earlier deployments.
fn resolve_args(
    spec: &DeploymentSpec,
    deployed: &[DeployedContract],
) -> Result<Vec<DynSolValue>, RunError> {
    spec.constructor_args
        .iter()
        .map(|arg| match arg {
            ConstructorArg::Value(value) => Ok(value.clone()),
            ConstructorArg::AddressOf(name) => deployed
                .iter()
                .find(|c| &c.name == name)
                .map(|c| DynSolValue::Address(c.address))
                .ok_or_else(|| RunError::UnresolvedReference {
                    contract: spec.contract_name.clone(),
                    referenced: name.clone(),
                }),
        })
        .collect()
}
