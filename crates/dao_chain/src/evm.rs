use std::borrow::Cow;
use std::time::Duration;

use alloy::dyn_abi::{DynSolValue, Specifier};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::client::RpcClient;
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::Http;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::artifacts::{ArtifactStore, ContractArtifact};
use crate::error::{ArtifactError, DeployError};
use crate::orchestrator::Deployer;

const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Who signs deployment transactions.
pub enum Signing {
    /// Sign locally and submit raw transactions. Works against any node.
    Local(PrivateKeySigner),
    /// Leave signing to the node (`eth_sendTransaction`). `None` uses the
    /// first account reported by `eth_accounts`.
    Node(Option<Address>),
}

impl Signing {
    /// A private key wins over a deployer address.
    pub fn from_config(
        private_key: Option<&str>,
        deployer_address: Option<&str>,
    ) -> Result<Self, DeployError> {
        if let Some(key) = private_key {
            let signer = key
                .parse::<PrivateKeySigner>()
                .map_err(|_| DeployError::InvalidPrivateKey)?;
            return Ok(Signing::Local(signer));
        }
        let from = deployer_address
            .map(|raw| {
                raw.parse::<Address>()
                    .map_err(|_| DeployError::InvalidDeployerAddress(raw.to_string()))
            })
            .transpose()?;
        Ok(Signing::Node(from))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Signing::Local(_))
    }
}

/// Deploys Hardhat-compiled contracts through an alloy provider.
pub struct RpcDeployer {
    provider: DynProvider,
    artifacts: ArtifactStore,
    from: OnceCell<Address>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl RpcDeployer {
    pub fn connect(
        rpc_url: &str,
        request_timeout: Duration,
        signing: Signing,
        artifacts: ArtifactStore,
    ) -> Result<Self, DeployError> {
        let url: Url = rpc_url
            .parse()
            .map_err(|_| DeployError::InvalidRpcUrl(rpc_url.to_string()))?;
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        let client = RpcClient::new(Http::with_client(http, url), false);

        let (provider, from) = match signing {
            Signing::Local(signer) => {
                let address = signer.address();
                let provider = ProviderBuilder::new()
                    .wallet(signer)
                    .connect_client(client)
                    .erased();
                (provider, Some(address))
            }
            Signing::Node(from) => (ProviderBuilder::new().connect_client(client).erased(), from),
        };

        Ok(Self {
            provider,
            artifacts,
            from: OnceCell::new_with(from),
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_timing(mut self, confirmation_timeout: Duration, poll_interval: Duration) -> Self {
        self.confirmation_timeout = confirmation_timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub async fn chain_id(&self) -> Result<u64, DeployError> {
        Ok(self.provider.get_chain_id().await?)
    }

    /// Balance in wei.
    pub async fn balance(&self, address: Address) -> Result<U256, DeployError> {
        Ok(self.provider.get_balance(address).await?)
    }

    /// The account deployments are sent from.
    pub async fn deployer_address(&self) -> Result<Address, DeployError> {
        self.from
            .get_or_try_init(|| async {
                let accounts = self.provider.get_accounts().await?;
                accounts.first().copied().ok_or(DeployError::NoAccounts)
            })
            .await
            .copied()
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, DeployError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if started.elapsed() >= self.confirmation_timeout {
                return Err(DeployError::ConfirmationTimeout {
                    tx_hash,
                    waited: started.elapsed(),
                });
            }
            debug!(tx_hash = %tx_hash, "transaction pending");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl Deployer for RpcDeployer {
    async fn deploy(
        &self,
        contract_name: &str,
        constructor_args: &[DynSolValue],
        attached_value: Option<U256>,
    ) -> Result<Address, DeployError> {
        let artifact = self.artifacts.load(contract_name)?;
        let data = creation_data(&artifact, constructor_args, attached_value)?;
        let from = self.deployer_address().await?;

        let pending = self
            .provider
            .send_transaction(creation_tx(from, data, attached_value))
            .await?;
        let tx_hash = *pending.tx_hash();
        info!(contract = %contract_name, tx_hash = %tx_hash, "deployment transaction sent");

        let receipt = self.wait_for_receipt(tx_hash).await?;
        contract_address(&receipt)
    }
}

/// Creation bytecode followed by the ABI-encoded constructor arguments, after
/// checking the arguments against the artifact's constructor.
pub fn creation_data(
    artifact: &ContractArtifact,
    args: &[DynSolValue],
    attached_value: Option<U256>,
) -> Result<Bytes, DeployError> {
    let contract = &artifact.contract_name;
    let inputs = artifact.constructor_inputs();
    if inputs.len() != args.len() {
        return Err(DeployError::ArgumentCount {
            contract: contract.clone(),
            expected: inputs.len(),
            actual: args.len(),
        });
    }
    for (index, (param, arg)) in inputs.iter().zip(args).enumerate() {
        let expected = param.resolve().map_err(|_| ArtifactError::UnsupportedType {
            name: contract.clone(),
            ty: param.ty.clone(),
        })?;
        if !expected.matches(arg) {
            return Err(DeployError::ArgumentType {
                contract: contract.clone(),
                index,
                expected: param.ty.clone(),
                actual: arg
                    .sol_type_name()
                    .map(Cow::into_owned)
                    .unwrap_or_else(|| "unknown".into()),
            });
        }
    }
    if attached_value.is_some_and(|v| !v.is_zero()) && !artifact.is_constructor_payable() {
        return Err(DeployError::NotPayable {
            contract: contract.clone(),
        });
    }

    let encoded_args = artifact
        .encode_constructor_args(args)
        .map_err(|e| DeployError::Encoding {
            contract: contract.clone(),
            message: e.to_string(),
        })?;
    let mut data = artifact.creation_code()?.to_vec();
    data.extend_from_slice(&encoded_args);
    Ok(data.into())
}

fn creation_tx(from: Address, data: Bytes, value: Option<U256>) -> TransactionRequest {
    let tx = TransactionRequest::default()
        .with_from(from)
        .with_deploy_code(data);
    match value.filter(|v| !v.is_zero()) {
        Some(value) => tx.with_value(value),
        None => tx,
    }
}

fn contract_address(receipt: &TransactionReceipt) -> Result<Address, DeployError> {
    let tx_hash = receipt.transaction_hash;
    if !receipt.status() {
        return Err(DeployError::Reverted { tx_hash });
    }
    let address = receipt
        .contract_address
        .ok_or(DeployError::MissingContractAddress { tx_hash })?;
    debug!(address = %address, gas_used = receipt.gas_used, "receipt confirmed");
    Ok(address)
}
