use std::collections::HashSet;

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};

use crate::error::PlanError;

/// A constructor argument as written in a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArg {
    Value(DynSolValue),
    /// The address of a contract deployed earlier in the same plan.
    AddressOf(String),
}

/// One contract to deploy. `attached_value` is in wei.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentSpec {
    pub contract_name: String,
    pub constructor_args: Vec<ConstructorArg>,
    pub attached_value: Option<U256>,
}

impl DeploymentSpec {
    pub fn new(contract_name: impl Into<String>) -> Self {
        Self {
            contract_name: contract_name.into(),
            constructor_args: Vec::new(),
            attached_value: None,
        }
    }

    pub fn arg(mut self, value: DynSolValue) -> Self {
        self.constructor_args.push(ConstructorArg::Value(value));
        self
    }

    pub fn address_of(mut self, contract_name: impl Into<String>) -> Self {
        self.constructor_args
            .push(ConstructorArg::AddressOf(contract_name.into()));
        self
    }

    pub fn value(mut self, amount: U256) -> Self {
        self.attached_value = Some(amount);
        self
    }

    /// Names of contracts whose addresses this spec consumes.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.constructor_args.iter().filter_map(|arg| match arg {
            ConstructorArg::AddressOf(name) => Some(name.as_str()),
            ConstructorArg::Value(_) => None,
        })
    }
}

/// An ordered, non-empty list of deployments in which every address
/// reference points backwards.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    specs: Vec<DeploymentSpec>,
}

impl DeploymentPlan {
    pub fn new(specs: Vec<DeploymentSpec>) -> Result<Self, PlanError> {
        if specs.is_empty() {
            return Err(PlanError::Empty);
        }

        let all: HashSet<&str> = specs.iter().map(|s| s.contract_name.as_str()).collect();
        let mut earlier: HashSet<&str> = HashSet::new();

        for spec in &specs {
            for referenced in spec.references() {
                if earlier.contains(referenced) {
                    continue;
                }
                let err = if all.contains(referenced) {
                    PlanError::ForwardReference {
                        contract: spec.contract_name.clone(),
                        referenced: referenced.to_string(),
                    }
                } else {
                    PlanError::UnknownReference {
                        contract: spec.contract_name.clone(),
                        referenced: referenced.to_string(),
                    }
                };
                return Err(err);
            }
            if !earlier.insert(spec.contract_name.as_str()) {
                return Err(PlanError::DuplicateContract(spec.contract_name.clone()));
            }
        }

        Ok(Self { specs })
    }

    pub fn specs(&self) -> &[DeploymentSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// A contract that has been mined, with the arguments it was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    pub name: String,
    pub address: Address,
    pub constructor_args: Vec<DynSolValue>,
    pub deployed_at: DateTime<Utc>,
}
