use std::path::{Path, PathBuf};

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::json_abi::{Constructor, JsonAbi, Param, StateMutability};
use alloy::primitives::Bytes;
use ignore::WalkBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ArtifactError;

/// A compiled contract as written by Hardhat to
/// `artifacts/<sourceName>/<ContractName>.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// `contracts/Foo.sol:Foo`, the form explorers expect.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.abi.constructor()
    }

    /// Declared constructor parameters; empty when the ABI has no constructor.
    pub fn constructor_inputs(&self) -> &[Param] {
        self.constructor()
            .map(|c| c.inputs.as_slice())
            .unwrap_or_default()
    }

    pub fn is_constructor_payable(&self) -> bool {
        self.constructor()
            .is_some_and(|c| c.state_mutability == StateMutability::Payable)
    }

    pub fn creation_code(&self) -> Result<&Bytes, ArtifactError> {
        if self.bytecode.is_empty() {
            return Err(ArtifactError::MissingBytecode(self.contract_name.clone()));
        }
        Ok(&self.bytecode)
    }

    /// ABI-encoded constructor arguments, the tail appended to the creation
    /// code. Values are type-checked against the declared inputs.
    pub fn encode_constructor_args(
        &self,
        args: &[DynSolValue],
    ) -> alloy::dyn_abi::Result<Vec<u8>> {
        match self.constructor() {
            Some(constructor) => constructor.abi_encode_input(args),
            None => Ok(Vec::new()),
        }
    }
}

/// Compiler input and version recorded by Hardhat under
/// `artifacts/build-info/<hash>.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Solidity standard-JSON input.
    pub input: serde_json::Value,
}

impl BuildInfo {
    /// Compiler version in the `v0.8.19+commit.7dd6d404` form explorers use.
    pub fn compiler_version(&self) -> String {
        format!("v{}", self.solc_long_version.trim_start_matches('v'))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// Read-only view over a Hardhat `artifacts/` directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find `<name>.json` anywhere below the root, ignoring build-info.
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        let file_name = format!("{name}.json");
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .build();

        let mut matches: Vec<PathBuf> = walker
            .flatten()
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.file_name().and_then(|f| f.to_str()) == Some(file_name.as_str())
                    && !path.components().any(|c| c.as_os_str() == "build-info")
            })
            .collect();

        match matches.len() {
            0 => Err(ArtifactError::NotFound {
                name: name.to_string(),
                dir: self.root.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => {
                matches.sort();
                Err(ArtifactError::Ambiguous {
                    name: name.to_string(),
                    paths: matches,
                })
            }
        }
    }

    pub fn load(&self, name: &str) -> Result<ContractArtifact, ArtifactError> {
        let path = self.artifact_path(name)?;
        debug!(contract = %name, path = %path.display(), "loading artifact");
        read_json(&path)
    }

    /// Resolve the build-info referenced by `<name>.dbg.json`.
    pub fn build_info(&self, name: &str) -> Result<BuildInfo, ArtifactError> {
        let artifact_path = self.artifact_path(name)?;
        let dir = artifact_path.parent().unwrap_or(&self.root);
        let debug_file: DebugFile = read_json(&dir.join(format!("{name}.dbg.json")))?;
        let path = dir.join(&debug_file.build_info);
        debug!(contract = %name, path = %path.display(), "loading build-info");
        read_json(&path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
