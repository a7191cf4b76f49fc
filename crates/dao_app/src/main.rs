mod plan;

use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info, warn};

use dao_chain::{
    ArtifactStore, Chain, DeployedContract, EtherscanVerifier, Orchestrator, RpcConfig,
    RpcDeployer, Signing, explorer_api_url, format_ether, parse_ether,
};
use dao_core::config::{self, DeployConfig, Secret};
use dao_core::{classify_error, logging};

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` must be applied before RUST_LOG is read by the logging layer.
    let dotenv = config::load_dotenv();
    let config = DeployConfig::from_env();
    let log_dir = config.as_ref().ok().and_then(|c| c.log_dir.clone());

    let _log_guard = match logging::init_logging(log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };
    dotenv.log();

    let result = match config {
        Ok(config) => deploy(config).await,
        Err(e) => Err(e.into()),
    };
    report(&result);
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished run. Verification failures never reach
/// here, so only start-up and deploy-phase errors yield 1.
fn exit_status<T>(result: &anyhow::Result<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn report(result: &anyhow::Result<Vec<DeployedContract>>) {
    match result {
        Ok(deployed) => info!(contracts = deployed.len(), "deployment complete"),
        Err(e) => {
            let classified = classify_error(e);
            error!(category = ?classified.category, "deployment failed: {}", classified.message);
            for cause in e.chain().skip(1) {
                error!("  caused by: {cause}");
            }
            error!("{}", classified.hint);
        }
    }
}

/// Deploy the CryptoDevs contracts, then verify them. Only deploy-phase and
/// start-up failures are returned.
async fn deploy(config: DeployConfig) -> anyhow::Result<Vec<DeployedContract>> {
    let chain: Chain = config.network.parse()?;
    let rpc = RpcConfig::resolve(chain, &config);
    info!(
        network = %chain,
        rpc = %rpc.url,
        custom_rpc = rpc.is_custom,
        "starting deployment"
    );

    let dao_funding = parse_ether(&config.dao_funding_eth)
        .with_context(|| format!("invalid DAO_DAO_FUNDING_ETH amount {:?}", config.dao_funding_eth))?;
    let plan = plan::cryptodevs_plan(dao_funding)?;

    let signing = Signing::from_config(
        config.private_key.as_ref().map(Secret::expose),
        config.deployer_address.as_deref(),
    )?;
    if signing.is_local() {
        info!("signing deployments locally with DAO_PRIVATE_KEY");
    }

    let artifacts = ArtifactStore::new(&config.artifacts_dir);
    let deployer = RpcDeployer::connect(&rpc.url, rpc.timeout(), signing, artifacts.clone())?
        .with_timing(config.confirmation_timeout(), config.poll_interval());

    preflight(&deployer, chain).await?;

    let verifier = EtherscanVerifier::new(
        explorer_api_url(chain, &config),
        config.explorer_api_key.as_ref().map(|key| key.expose().to_string()),
        chain.chain_id(),
        artifacts,
        rpc.timeout(),
    )?
    .with_poll_interval(config.poll_interval())
    .with_explorer_url(chain.explorer_url().map(str::to_string));
    if !verifier.is_enabled() {
        warn!("source verification is unavailable for {chain}; verification steps will fail and be skipped");
    }

    let orchestrator =
        Orchestrator::new(deployer, verifier).with_settle_delay(config.settle_delay());
    Ok(orchestrator.run(&plan).await?)
}

/// Resolve the deployer account, log its balance, and warn when the node is
/// on a different chain than configured.
async fn preflight(deployer: &RpcDeployer, chain: Chain) -> anyhow::Result<()> {
    let chain_id = deployer
        .chain_id()
        .await
        .context("rpc node unreachable")?;
    if chain_id != chain.chain_id() {
        warn!(
            expected = chain.chain_id(),
            actual = chain_id,
            "node reports a different chain id than the configured network"
        );
    }

    let from = deployer.deployer_address().await?;
    let balance = deployer.balance(from).await?;
    info!(deployer = %from, balance = %format_ether(balance), "deployer account (ETH)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dao_chain::{
        Address, DeployError, Deployer, DynSolValue, ProgressReporter, U256, Verifier,
        VerifyError,
    };
    use std::sync::atomic::{AtomicU8, Ordering};
    use std::time::Duration;

    struct SequentialDeployer {
        next: AtomicU8,
        fail_on: Option<&'static str>,
    }

    impl SequentialDeployer {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                next: AtomicU8::new(1),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl Deployer for SequentialDeployer {
        async fn deploy(
            &self,
            contract_name: &str,
            _constructor_args: &[DynSolValue],
            _attached_value: Option<U256>,
        ) -> Result<Address, DeployError> {
            if self.fail_on == Some(contract_name) {
                return Err(DeployError::InsufficientFunds(
                    "insufficient funds for gas * price + value".into(),
                ));
            }
            let n = self.next.fetch_add(1, Ordering::SeqCst);
            Ok(Address::repeat_byte(n))
        }
    }

    struct FailingVerifier;

    #[async_trait]
    impl Verifier for FailingVerifier {
        async fn verify(&self, _contract: &DeployedContract) -> Result<(), VerifyError> {
            Err(VerifyError::Rejected("Invalid API Key".into()))
        }
    }

    struct Silent;

    impl ProgressReporter for Silent {
        fn deployed(&self, _contract: &DeployedContract) {}
    }

    async fn run_with(deployer: SequentialDeployer) -> anyhow::Result<Vec<DeployedContract>> {
        let plan = plan::cryptodevs_plan(parse_ether("0.05").unwrap()).unwrap();
        let orchestrator = Orchestrator::new(deployer, FailingVerifier)
            .with_settle_delay(Duration::ZERO)
            .with_reporter(Silent);
        Ok(orchestrator.run(&plan).await?)
    }

    #[test]
    fn success_exits_zero() {
        let result: anyhow::Result<()> = Ok(());
        assert_eq!(exit_status(&result), 0);
    }

    #[test]
    fn startup_error_exits_one() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("unknown network \"mars\""));
        assert_eq!(exit_status(&result), 1);
    }

    #[tokio::test]
    async fn verification_failures_do_not_change_exit_status() {
        let result = run_with(SequentialDeployer::new(None)).await;
        assert_eq!(exit_status(&result), 0);
        assert_eq!(result.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deploy_failure_exits_one() {
        let result = run_with(SequentialDeployer::new(Some(plan::DAO))).await;
        assert_eq!(exit_status(&result), 1);

        let err = result.unwrap_err();
        let classified = classify_error(&err);
        assert_eq!(classified.category, dao_core::FailureCategory::InsufficientFunds);
    }
}
