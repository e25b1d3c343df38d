//! Chain, account and file configuration for the governance client.
//!
//! `ChainConfig` describes how to reach an EVM node (RSK mainnet, RSK testnet or a
//! custom endpoint) and how patient to be with it. `GovernanceConfig` is the on-disk
//! TOML document that ties a chain, an operator account and a contract registry file
//! together.

use crate::error::{GovernanceError, Result};
use crate::registry::ContractRegistry;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// RSK mainnet
    RskMainnet,
    /// RSK testnet
    RskTestnet,
    /// Custom network with user-defined endpoint
    Custom,
}

impl Network {
    /// Get the EIP-155 chain id for this network
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::RskMainnet => 30,
            Network::RskTestnet => 31,
            Network::Custom => 0,
        }
    }

    /// Get the default public RPC URL for this network
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::RskMainnet => "https://public-node.rsk.co",
            Network::RskTestnet => "https://public-node.testnet.rsk.co",
            Network::Custom => "",
        }
    }

    /// Get the conventional registry file name for this network
    pub fn default_contracts_file(&self) -> &'static str {
        match self {
            Network::RskMainnet => "mainnet_contracts.json",
            Network::RskTestnet => "testnet_contracts.json",
            Network::Custom => "contracts.json",
        }
    }
}

/// Configuration for the chain connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    /// Network to connect to
    pub network: Network,

    /// JSON-RPC endpoint URL
    pub rpc_url: String,

    /// EIP-155 chain id used when signing locally
    pub chain_id: u64,

    /// HTTP request timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,

    /// Maximum number of retries for failed requests
    pub max_retries: usize,

    /// Initial retry delay (in milliseconds)
    pub retry_initial_delay_ms: u64,

    /// Maximum retry delay (in milliseconds)
    pub retry_max_delay_ms: u64,

    /// Retry backoff multiplier
    pub retry_multiplier: f64,

    /// Receipt polling interval (in milliseconds)
    pub tx_poll_interval_ms: u64,

    /// Receipt timeout (in seconds)
    pub tx_timeout_secs: u64,
}

impl ChainConfig {
    /// Create a new configuration for the specified network
    pub fn new(network: Network) -> Self {
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            chain_id: network.chain_id(),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_initial_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_multiplier: 2.0,
            tx_poll_interval_ms: 1000,
            // RSK blocks land roughly every 30 seconds
            tx_timeout_secs: 180,
        }
    }

    /// Create configuration for RSK mainnet
    pub fn mainnet() -> Self {
        Self::new(Network::RskMainnet)
    }

    /// Create configuration for RSK testnet
    pub fn testnet() -> Self {
        Self::new(Network::RskTestnet)
    }

    /// Create a custom configuration
    pub fn custom(rpc_url: String, chain_id: u64) -> Result<Self> {
        if rpc_url.is_empty() {
            return Err(GovernanceError::ConfigError(
                "RPC URL cannot be empty".to_string(),
            ));
        }
        if chain_id == 0 {
            return Err(GovernanceError::ConfigError(
                "Chain id must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            rpc_url,
            chain_id,
            ..Self::new(Network::Custom)
        })
    }

    /// Set request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set maximum retries
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set retry delays
    pub fn with_retry_config(
        mut self,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        self.retry_initial_delay_ms = initial_delay_ms;
        self.retry_max_delay_ms = max_delay_ms;
        self.retry_multiplier = multiplier;
        self
    }

    /// Set receipt polling configuration
    pub fn with_tx_config(mut self, poll_interval_ms: u64, timeout_secs: u64) -> Self {
        self.tx_poll_interval_ms = poll_interval_ms;
        self.tx_timeout_secs = timeout_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(GovernanceError::ConfigError(
                "RPC URL cannot be empty".to_string(),
            ));
        }
        url::Url::parse(&self.rpc_url)?;
        if self.chain_id == 0 {
            return Err(GovernanceError::ConfigError(
                "Chain id must be greater than 0".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(GovernanceError::ConfigError(
                "Max retries must be greater than 0".to_string(),
            ));
        }
        if self.retry_initial_delay_ms == 0 {
            return Err(GovernanceError::ConfigError(
                "Retry initial delay must be greater than 0".to_string(),
            ));
        }
        if self.retry_multiplier <= 1.0 {
            return Err(GovernanceError::ConfigError(
                "Retry multiplier must be greater than 1.0".to_string(),
            ));
        }
        if self.tx_poll_interval_ms == 0 {
            return Err(GovernanceError::ConfigError(
                "Transaction poll interval must be greater than 0".to_string(),
            ));
        }
        if self.tx_timeout_secs == 0 {
            return Err(GovernanceError::ConfigError(
                "Transaction timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Which account submits transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    /// Node-managed account used with `eth_sendTransaction`
    pub address: Option<Address>,

    /// Name of the environment variable holding a hex private key for local signing
    pub private_key_env: Option<String>,
}

impl AccountConfig {
    /// Use an account unlocked on the node
    pub fn node(address: Address) -> Self {
        Self {
            address: Some(address),
            private_key_env: None,
        }
    }

    /// Sign locally with a key read from `env_var`
    pub fn local_key(env_var: impl Into<String>) -> Self {
        Self {
            address: None,
            private_key_env: Some(env_var.into()),
        }
    }

    /// Validate that exactly one account source is configured
    pub fn validate(&self) -> Result<()> {
        match (&self.address, &self.private_key_env) {
            (Some(_), Some(_)) => Err(GovernanceError::ConfigError(
                "Account must set either `address` or `private_key_env`, not both".to_string(),
            )),
            (None, None) => Err(GovernanceError::ConfigError(
                "Account must set `address` or `private_key_env`".to_string(),
            )),
            (None, Some(var)) if var.is_empty() => Err(GovernanceError::ConfigError(
                "Private key environment variable name cannot be empty".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Complete governance client configuration, usually read from a TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GovernanceConfig {
    /// Chain connection settings
    #[serde(default)]
    pub chain: ChainConfig,

    /// Operator account
    pub account: AccountConfig,

    /// Path to the contract registry JSON file
    pub contracts: PathBuf,
}

impl GovernanceConfig {
    /// Parse a configuration document
    ///
    /// Chain fields that are not set fall back to the preset of the selected
    /// network, so `network = "rsk-mainnet"` alone is enough to get the
    /// mainnet RPC URL and chain id. Without a `[chain]` table the RSK testnet
    /// preset is used. A missing `contracts` path defaults to the network's
    /// registry file name.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut document: toml::Table = toml::from_str(content)
            .map_err(|e| GovernanceError::ConfigError(format!("Failed to parse config: {}", e)))?;

        let overrides = match document.remove("chain") {
            Some(toml::Value::Table(table)) => table,
            Some(_) => {
                return Err(GovernanceError::ConfigError(
                    "`chain` must be a table".to_string(),
                ))
            }
            None => toml::Table::new(),
        };

        let network = overrides
            .get("network")
            .cloned()
            .map(|value| value.try_into::<Network>())
            .transpose()
            .map_err(|e| GovernanceError::ConfigError(format!("Invalid network: {}", e)))?
            .unwrap_or(Network::RskTestnet);

        let mut chain = match toml::Value::try_from(ChainConfig::new(network)) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => {
                return Err(GovernanceError::ConfigError(
                    "Chain preset is not a table".to_string(),
                ))
            }
            Err(e) => return Err(GovernanceError::ConfigError(e.to_string())),
        };
        chain.extend(overrides);
        document.insert("chain".to_string(), toml::Value::Table(chain));
        if !document.contains_key("contracts") {
            document.insert(
                "contracts".to_string(),
                toml::Value::String(network.default_contracts_file().to_string()),
            );
        }

        let config: GovernanceConfig = toml::Value::Table(document)
            .try_into()
            .map_err(|e| GovernanceError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// A relative `contracts` path is resolved against the directory holding
    /// the configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading governance config from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        if config.contracts.is_relative() {
            if let Some(dir) = path.parent() {
                config.contracts = dir.join(&config.contracts);
            }
        }

        Ok(config)
    }

    /// Validate chain and account settings
    pub fn validate(&self) -> Result<()> {
        self.chain.validate()?;
        self.account.validate()?;
        if self.contracts.as_os_str().is_empty() {
            return Err(GovernanceError::ConfigError(
                "Contracts file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the contract registry this configuration points at
    pub fn load_registry(&self) -> Result<ContractRegistry> {
        ContractRegistry::from_file(&self.contracts)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
