//! Typed capabilities over the deployed contracts.
//!
//! Each trait exposes exactly the calls governance actions need. The RPC
//! implementations encode with the embedded ABIs and go through a shared
//! [`TransactionManager`]; tests substitute in-memory fakes.

use crate::abi;
use crate::error::{GovernanceError, Result};
use crate::multisig::{MultisigRelay, MultisigWallet};
use crate::transaction::TransactionManager;
use crate::types::{ProposalId, TxInfo};
use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;
use tracing::info;

/// GovernorAlpha capability
#[async_trait]
pub trait GovernorContract: Send + Sync {
    /// Deployed address
    fn address(&self) -> Address;

    /// Calldata for `__acceptAdmin()`
    fn encode_accept_admin(&self) -> Result<Bytes>;

    /// Calldata for `cancel(proposalId)`
    fn encode_cancel(&self, proposal_id: ProposalId) -> Result<Bytes>;

    /// Current guardian
    async fn guardian(&self) -> Result<Address>;

    /// Send `queue(proposalId)` from the operator account
    async fn queue(&self, proposal_id: ProposalId) -> Result<TxInfo>;

    /// Send `execute(proposalId)` from the operator account
    async fn execute(&self, proposal_id: ProposalId) -> Result<TxInfo>;
}

/// LockedSOV capability
pub trait LockedSovContract: Send + Sync {
    /// Deployed address
    fn address(&self) -> Address;

    /// Calldata for `addAdmin(newAdmin)`
    fn encode_add_admin(&self, admin: Address) -> Result<Bytes>;

    /// Calldata for `removeAdmin(adminToRemove)`
    fn encode_remove_admin(&self, admin: Address) -> Result<Bytes>;
}

/// Builds contract capabilities from registry addresses
pub trait ContractBackend: Send + Sync {
    /// Governor at `address`
    fn governor(&self, address: Address) -> Result<Arc<dyn GovernorContract>>;

    /// LockedSOV at `address`
    fn locked_sov(&self, address: Address) -> Result<Arc<dyn LockedSovContract>>;

    /// Relay for privileged calls
    fn relay(&self) -> Arc<dyn MultisigRelay>;
}

fn encode_call(abi: &Abi, function: &str, args: &[Token]) -> Result<Bytes> {
    let encoded = abi.function(function)?.encode_input(args)?;
    Ok(Bytes::from(encoded))
}

/// GovernorAlpha reached over JSON-RPC
pub struct RpcGovernor {
    address: Address,
    abi: Abi,
    transactions: TransactionManager,
}

impl RpcGovernor {
    /// Bind the GovernorAlpha ABI to `address`
    pub fn new(address: Address, transactions: TransactionManager) -> Result<Self> {
        Ok(Self {
            address,
            abi: abi::governor_alpha()?,
            transactions,
        })
    }

    fn encode_proposal_call(&self, function: &str, proposal_id: ProposalId) -> Result<Bytes> {
        encode_call(&self.abi, function, &[Token::Uint(U256::from(proposal_id))])
    }
}

#[async_trait]
impl GovernorContract for RpcGovernor {
    fn address(&self) -> Address {
        self.address
    }

    fn encode_accept_admin(&self) -> Result<Bytes> {
        encode_call(&self.abi, "__acceptAdmin", &[])
    }

    fn encode_cancel(&self, proposal_id: ProposalId) -> Result<Bytes> {
        self.encode_proposal_call("cancel", proposal_id)
    }

    async fn guardian(&self) -> Result<Address> {
        let function = self.abi.function("guardian")?;
        let data = Bytes::from(function.encode_input(&[])?);
        let output = self.transactions.call(self.address, data).await?;

        function
            .decode_output(output.as_ref())?
            .into_iter()
            .next()
            .and_then(Token::into_address)
            .ok_or_else(|| {
                GovernanceError::InvalidResponse("guardian() did not return an address".to_string())
            })
    }

    async fn queue(&self, proposal_id: ProposalId) -> Result<TxInfo> {
        info!("Queueing proposal {} on {:?}", proposal_id, self.address);
        let data = self.encode_proposal_call("queue", proposal_id)?;
        self.transactions.send_and_confirm(self.address, data).await
    }

    async fn execute(&self, proposal_id: ProposalId) -> Result<TxInfo> {
        info!("Executing proposal {} on {:?}", proposal_id, self.address);
        let data = self.encode_proposal_call("execute", proposal_id)?;
        self.transactions.send_and_confirm(self.address, data).await
    }
}

/// LockedSOV reached over JSON-RPC
pub struct RpcLockedSov {
    address: Address,
    abi: Abi,
}

impl RpcLockedSov {
    /// Bind the LockedSOV ABI to `address`
    pub fn new(address: Address) -> Result<Self> {
        Ok(Self {
            address,
            abi: abi::locked_sov()?,
        })
    }
}

impl LockedSovContract for RpcLockedSov {
    fn address(&self) -> Address {
        self.address
    }

    fn encode_add_admin(&self, admin: Address) -> Result<Bytes> {
        encode_call(&self.abi, "addAdmin", &[Token::Address(admin)])
    }

    fn encode_remove_admin(&self, admin: Address) -> Result<Bytes> {
        encode_call(&self.abi, "removeAdmin", &[Token::Address(admin)])
    }
}

/// Backend that talks to a live node
#[derive(Clone)]
pub struct RpcBackend {
    transactions: TransactionManager,
    relay: Arc<MultisigWallet>,
}

impl RpcBackend {
    /// Create a backend sharing one transaction manager
    pub fn new(transactions: TransactionManager) -> Result<Self> {
        let relay = Arc::new(MultisigWallet::new(transactions.clone())?);
        Ok(Self {
            transactions,
            relay,
        })
    }

    /// Shared transaction manager
    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }
}

impl ContractBackend for RpcBackend {
    fn governor(&self, address: Address) -> Result<Arc<dyn GovernorContract>> {
        Ok(Arc::new(RpcGovernor::new(
            address,
            self.transactions.clone(),
        )?))
    }

    fn locked_sov(&self, address: Address) -> Result<Arc<dyn LockedSovContract>> {
        Ok(Arc::new(RpcLockedSov::new(address)?))
    }

    fn relay(&self) -> Arc<dyn MultisigRelay> {
        self.relay.clone()
    }
}
