//! Contract registry: symbolic contract names to deployed addresses.
//!
//! The registry is loaded once from a JSON object such as
//! `{"GovernorOwner": "0x...", "multisig": "0x..."}` and is read-only afterwards.

use crate::error::{GovernanceError, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Governor whose proposals are queued and executed by the operator
pub const GOVERNOR_OWNER: &str = "GovernorOwner";
/// Governor controlling admin-level proposals
pub const GOVERNOR_ADMIN: &str = "GovernorAdmin";
/// Multisig wallet relaying privileged actions
pub const MULTISIG: &str = "multisig";
/// LockedSOV contract
pub const LOCKED_SOV: &str = "LockedSOV";
/// Timelock controlled by the admin governor
pub const TIMELOCK_ADMIN: &str = "TimelockAdmin";

/// Read-only mapping from contract name to address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    contracts: BTreeMap<String, Address>,
}

impl ContractRegistry {
    /// Build a registry from name/address pairs
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Address)>,
        K: Into<String>,
    {
        Self {
            contracts: entries
                .into_iter()
                .map(|(name, address)| (name.into(), address))
                .collect(),
        }
    }

    /// Parse a registry from a JSON object of name to hex address
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;

        let mut contracts = BTreeMap::new();
        for (name, value) in raw {
            let address: Address = value.parse().map_err(|e| {
                GovernanceError::ConfigError(format!(
                    "Invalid address for contract {}: {} ({})",
                    name, value, e
                ))
            })?;
            contracts.insert(name, address);
        }

        Ok(Self { contracts })
    }

    /// Load a registry file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json_str(&content)?;
        debug!(
            "Loaded {} contracts from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Resolve a contract name to its address
    pub fn address(&self, name: &str) -> Result<Address> {
        self.contracts
            .get(name)
            .copied()
            .ok_or_else(|| GovernanceError::UnknownContract(name.to_string()))
    }

    /// Address of the multisig wallet
    pub fn multisig(&self) -> Result<Address> {
        self.address(MULTISIG)
    }

    /// Whether a name is bound
    pub fn contains(&self, name: &str) -> bool {
        self.contracts.contains_key(name)
    }

    /// Number of bound contracts
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Iterate over all bindings in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Address)> {
        self.contracts
            .iter()
            .map(|(name, address)| (name.as_str(), *address))
    }
}
