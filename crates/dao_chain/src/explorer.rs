use std::time::Duration;

use alloy::hex;
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::artifacts::{ArtifactStore, BuildInfo, ContractArtifact};
use crate::error::VerifyError;
use crate::orchestrator::Verifier;
use crate::plan::DeployedContract;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_STATUS_CHECKS: u32 = 30;

/// Envelope shared by every Etherscan API response.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

impl ExplorerResponse {
    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => self.message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerificationStatus {
    Pending,
    Verified,
}

/// Verifies contract sources through an Etherscan-compatible API.
///
/// Requests carry a `chainid` parameter, as the Etherscan V2 API requires.
/// Sources are submitted as Solidity standard-JSON input taken from the
/// Hardhat build-info of each contract, then the verification GUID is polled
/// until the explorer reports a final status.
pub struct EtherscanVerifier {
    client: Client,
    api_url: Option<String>,
    api_key: Option<String>,
    chain_id: u64,
    explorer_url: Option<String>,
    artifacts: ArtifactStore,
    poll_interval: Duration,
    max_status_checks: u32,
}

impl EtherscanVerifier {
    /// Both `api_url` and `api_key` are optional; without them every
    /// verification fails with [`VerifyError::Unsupported`].
    pub fn new(
        api_url: Option<String>,
        api_key: Option<String>,
        chain_id: u64,
        artifacts: ArtifactStore,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url,
            api_key,
            chain_id,
            explorer_url: None,
            artifacts,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_status_checks: DEFAULT_MAX_STATUS_CHECKS,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Browser URL used to log a link to verified contracts.
    pub fn with_explorer_url(mut self, explorer_url: Option<String>) -> Self {
        self.explorer_url = explorer_url;
        self
    }

    /// Whether verification can be attempted at all.
    pub fn is_enabled(&self) -> bool {
        self.endpoint().is_ok()
    }

    fn endpoint(&self) -> Result<(&str, &str), VerifyError> {
        let api_url = self
            .api_url
            .as_deref()
            .ok_or_else(|| VerifyError::Unsupported("no explorer API for this network".into()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| VerifyError::Unsupported("ETHERSCAN_API_KEY is not set".into()))?;
        Ok((api_url, api_key))
    }

    async fn submit(
        &self,
        api_url: &str,
        form: &[(&'static str, String)],
    ) -> Result<ExplorerResponse, VerifyError> {
        let response = self
            .client
            .post(api_url)
            .query(&[("chainid", self.chain_id.to_string())])
            .form(form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }

    async fn check_status(
        &self,
        api_url: &str,
        api_key: &str,
        guid: &str,
    ) -> Result<ExplorerResponse, VerifyError> {
        let chain_id = self.chain_id.to_string();
        let response = self
            .client
            .get(api_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl Verifier for EtherscanVerifier {
    async fn verify(&self, contract: &DeployedContract) -> Result<(), VerifyError> {
        let (api_url, api_key) = self.endpoint()?;

        let artifact = self.artifacts.load(&contract.name)?;
        let build_info = self.artifacts.build_info(&contract.name)?;
        let form = verification_form(self.chain_id, api_key, contract, &artifact, &build_info)?;

        debug!(contract = %contract.name, address = %contract.address, "submitting sources");
        let submission = self.submit(api_url, &form).await?;
        let guid = interpret_submission(&submission, contract.address)?;
        debug!(contract = %contract.name, guid = %guid, "verification queued");

        for _ in 0..self.max_status_checks {
            tokio::time::sleep(self.poll_interval).await;
            let status = self.check_status(api_url, api_key, &guid).await?;
            if interpret_status(&status, contract.address)? == VerificationStatus::Verified {
                match &self.explorer_url {
                    Some(base) => info!("{} verified: {base}/address/{}#code", contract.name, contract.address),
                    None => info!("{} verified", contract.name),
                }
                return Ok(());
            }
        }

        Err(VerifyError::StatusTimeout {
            guid,
            attempts: self.max_status_checks,
        })
    }
}

/// Form fields for `action=verifysourcecode`.
fn verification_form(
    chain_id: u64,
    api_key: &str,
    contract: &DeployedContract,
    artifact: &ContractArtifact,
    build_info: &BuildInfo,
) -> Result<Vec<(&'static str, String)>, VerifyError> {
    let constructor_args = artifact
        .encode_constructor_args(&contract.constructor_args)
        .map_err(|e| VerifyError::Encoding(e.to_string()))?;
    Ok(vec![
        ("chainid", chain_id.to_string()),
        ("apikey", api_key.to_string()),
        ("module", "contract".into()),
        ("action", "verifysourcecode".into()),
        ("contractaddress", contract.address.to_string()),
        ("sourceCode", build_info.input.to_string()),
        ("codeformat", "solidity-standard-json-input".into()),
        ("contractname", artifact.fully_qualified_name()),
        ("compilerversion", build_info.compiler_version()),
        // Etherscan's own spelling.
        ("constructorArguements", hex::encode(constructor_args)),
    ])
}

fn interpret_submission(response: &ExplorerResponse, address: Address) -> Result<String, VerifyError> {
    let text = response.result_text();
    if response.status == "1" {
        if text.is_empty() {
            return Err(VerifyError::Malformed("submission accepted without a GUID".into()));
        }
        return Ok(text);
    }
    if text.to_lowercase().contains("already verified") {
        return Err(VerifyError::AlreadyVerified(address));
    }
    Err(VerifyError::Rejected(text))
}

fn interpret_status(
    response: &ExplorerResponse,
    address: Address,
) -> Result<VerificationStatus, VerifyError> {
    let text = response.result_text();
    let lower = text.to_lowercase();
    if lower.contains("pending") {
        Ok(VerificationStatus::Pending)
    } else if lower.contains("already verified") {
        Err(VerifyError::AlreadyVerified(address))
    } else if response.status == "1" || lower.contains("pass - verified") {
        Ok(VerificationStatus::Verified)
    } else {
        Err(VerifyError::Rejected(text))
    }
}
