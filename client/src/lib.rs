//! Governance client for GovernorAlpha-based protocol administration
//!
//! This library queues, executes and cancels governance proposals, accepts
//! timelock admin rights and hands LockedSOV admin rights to governance. Calls
//! that need elevated privilege are relayed through a MultiSigWallet; the rest
//! are sent directly from the operator account.
//!
//! # Features
//!
//! - **Contract registry**: symbolic names (`GovernorOwner`, `multisig`, ...) resolved to addresses
//! - **Typed contract capabilities**: `GovernorContract`, `LockedSovContract`, `MultisigRelay`
//! - **Guarded cancellation**: cancels are refused unless the governor's guardian is the multisig
//! - **Transaction management**: node-managed or locally signed transactions, receipt polling
//! - **Retry logic**: exponential backoff for transient RPC failures
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use governance_client::{GovernanceClient, GovernanceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     governance_client::init_tracing();
//!
//!     let config = GovernanceConfig::from_file("governance.toml")?;
//!     let client = GovernanceClient::from_config(&config)?;
//!
//!     let info = client.dispatcher().queue_proposal(42).await?;
//!     println!("{}", info);
//!     Ok(())
//! }
//! ```
//!
//! ## Cancel a proposal through the multisig
//!
//! ```rust,no_run
//! # use governance_client::{GovernanceClient, GovernanceConfig, GovernanceError};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let client = GovernanceClient::from_config(&GovernanceConfig::from_file("governance.toml")?)?;
//! match client.dispatcher().cancel_proposal("GovernorOwner", 7).await {
//!     Ok(submission) => println!("multisig txid: {:?}", submission.multisig_tx_id),
//!     Err(GovernanceError::GuardianMismatch { guardian, .. }) => {
//!         eprintln!("guardian {:?} is not the multisig", guardian)
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod abi;
pub mod config;
pub mod contracts;
pub mod dispatcher;
pub mod error;
pub mod monitor;
pub mod multisig;
pub mod registry;
pub mod retry;
pub mod rpc;
pub mod signer;
pub mod transaction;
pub mod types;

pub use config::{AccountConfig, ChainConfig, GovernanceConfig, Network};
pub use contracts::{ContractBackend, GovernorContract, LockedSovContract, RpcBackend};
pub use dispatcher::{GovernanceContext, GovernanceDispatcher};
pub use error::{GovernanceError, Result};
pub use monitor::{MonitorOptions, MonitorResult, TransactionMonitor};
pub use multisig::{MultisigRelay, MultisigWallet};
pub use registry::ContractRegistry;
pub use retry::RetryStrategy;
pub use rpc::EthRpcClient;
pub use signer::TransactionSender;
pub use transaction::TransactionManager;
pub use types::{
    ActionOutcome, GovernanceAction, ProposalId, RelayRequest, RelaySubmission,
    TransactionStatus, TxInfo,
};

use tracing::info;

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`)
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Governance dispatcher wired to a live node
///
/// This is the primary entry point for operators.
pub struct GovernanceClient {
    dispatcher: GovernanceDispatcher<RpcBackend>,
    chain: ChainConfig,
}

impl GovernanceClient {
    /// Create a client from its parts
    pub fn new(
        chain: ChainConfig,
        registry: ContractRegistry,
        sender: TransactionSender,
    ) -> Result<Self> {
        chain.validate()?;

        info!(
            "Initializing governance client for {:?} ({} contracts, operator {:?})",
            chain.network,
            registry.len(),
            sender.address()
        );

        let context = GovernanceContext::new(registry, sender.address());
        let transactions = TransactionManager::new(&chain, sender)?;
        let backend = RpcBackend::new(transactions)?;

        Ok(Self {
            dispatcher: GovernanceDispatcher::new(context, backend),
            chain,
        })
    }

    /// Create a client from a loaded configuration file
    pub fn from_config(config: &GovernanceConfig) -> Result<Self> {
        config.validate()?;
        let registry = config.load_registry()?;
        let sender = TransactionSender::from_config(&config.account, config.chain.chain_id)?;
        Self::new(config.chain.clone(), registry, sender)
    }

    /// The dispatcher running governance actions
    pub fn dispatcher(&self) -> &GovernanceDispatcher<RpcBackend> {
        &self.dispatcher
    }

    /// Run one governance action
    pub async fn dispatch(&self, action: &GovernanceAction) -> Result<ActionOutcome> {
        self.dispatcher.dispatch(action).await
    }

    /// Verify the node is reachable and serves the configured chain
    pub async fn health_check(&self) -> Result<bool> {
        let rpc = self.dispatcher.backend().transactions().rpc();
        rpc.health_check().await?;

        let chain_id = rpc.chain_id().await?;
        if chain_id != self.chain.chain_id {
            return Err(GovernanceError::ConfigError(format!(
                "Node serves chain {} but chain {} is configured",
                chain_id, self.chain.chain_id
            )));
        }
        Ok(true)
    }

    /// Chain configuration
    pub fn config(&self) -> &ChainConfig {
        &self.chain
    }
}
