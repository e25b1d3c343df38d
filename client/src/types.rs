//! Common types used across the governance client.
//!
//! This module defines the governance action value, the relay request handed
//! to the multisig, and the receipt summaries reported back to the operator.

use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered proposal number inside a governor contract
pub type ProposalId = u64;

/// Transaction hash type
pub type TransactionHash = H256;

/// One requested governance operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum GovernanceAction {
    /// Make the governor accept the pending timelock admin, via multisig
    AcceptAdmin {
        /// Registry key of the governor
        contract: String,
    },
    /// Queue a succeeded proposal on the owner governor
    Queue {
        /// Proposal to queue
        proposal_id: ProposalId,
    },
    /// Execute a queued proposal on the owner governor
    Execute {
        /// Proposal to execute
        proposal_id: ProposalId,
    },
    /// Cancel a proposal through the guardian multisig
    Cancel {
        /// Registry key of the governor
        contract: String,
        /// Proposal to cancel
        proposal_id: ProposalId,
    },
    /// Add the admin timelock as LockedSOV admin, via multisig
    TransferLockedSovOwnership,
}

impl GovernanceAction {
    /// Short operator-facing name of the action kind
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceAction::AcceptAdmin { .. } => "accept-admin",
            GovernanceAction::Queue { .. } => "queue",
            GovernanceAction::Execute { .. } => "execute",
            GovernanceAction::Cancel { .. } => "cancel",
            GovernanceAction::TransferLockedSovOwnership => "transfer-locked-sov-ownership",
        }
    }

    /// Whether the action is relayed through the multisig instead of sent directly
    pub fn requires_multisig(&self) -> bool {
        !matches!(
            self,
            GovernanceAction::Queue { .. } | GovernanceAction::Execute { .. }
        )
    }
}

impl fmt::Display for GovernanceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GovernanceAction::AcceptAdmin { contract } => write!(f, "accept-admin({})", contract),
            GovernanceAction::Queue { proposal_id } => write!(f, "queue({})", proposal_id),
            GovernanceAction::Execute { proposal_id } => write!(f, "execute({})", proposal_id),
            GovernanceAction::Cancel {
                contract,
                proposal_id,
            } => write!(f, "cancel({}, {})", contract, proposal_id),
            GovernanceAction::TransferLockedSovOwnership => {
                write!(f, "transfer-locked-sov-ownership")
            }
        }
    }
}

/// Call handed to the multisig relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayRequest {
    /// Multisig wallet that will hold the submission
    pub multisig: Address,
    /// Contract the multisig will eventually call
    pub target: Address,
    /// Encoded call for `target`
    pub data: Bytes,
    /// Account submitting to the multisig
    pub sender: Address,
}

/// Outcome of a multisig submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySubmission {
    /// Multisig-internal transaction id from the `Submission` event
    pub multisig_tx_id: Option<U256>,
    /// Receipt of the outer `submitTransaction` call
    pub tx: TxInfo,
}

/// Transaction status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    /// Transaction is pending
    Pending,
    /// Transaction was successful
    Success,
    /// Transaction reverted
    Reverted,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "PENDING"),
            TransactionStatus::Success => write!(f, "SUCCESS"),
            TransactionStatus::Reverted => write!(f, "REVERTED"),
        }
    }
}

/// Log entry as returned inside a receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLog {
    /// Emitting contract
    pub address: Address,
    /// Indexed topics, event signature first
    pub topics: Vec<H256>,
    /// Non-indexed data
    #[serde(default)]
    pub data: Bytes,
}

/// The subset of `eth_getTransactionReceipt` the client relies on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    /// Transaction hash
    pub transaction_hash: H256,
    /// Block that included the transaction
    pub block_number: Option<U64>,
    /// Sender
    pub from: Address,
    /// Recipient
    pub to: Option<Address>,
    /// Gas used by this transaction
    pub gas_used: Option<U256>,
    /// 1 on success, 0 on revert
    pub status: Option<U64>,
    /// Emitted logs
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

impl TransactionReceipt {
    /// Status derived from the receipt status field
    pub fn status(&self) -> TransactionStatus {
        match self.status {
            Some(status) if status.is_zero() => TransactionStatus::Reverted,
            Some(_) => TransactionStatus::Success,
            None if self.block_number.is_some() => TransactionStatus::Success,
            None => TransactionStatus::Pending,
        }
    }
}

/// Transaction report printed after every submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    /// Transaction hash
    pub hash: TransactionHash,
    /// Final status
    pub status: TransactionStatus,
    /// Block number
    pub block_number: Option<u64>,
    /// Sender
    pub from: Address,
    /// Recipient
    pub to: Option<Address>,
    /// Gas used
    pub gas_used: Option<U256>,
    /// Number of emitted events
    pub log_count: usize,
}

impl From<&TransactionReceipt> for TxInfo {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            hash: receipt.transaction_hash,
            status: receipt.status(),
            block_number: receipt.block_number.map(|n| n.as_u64()),
            from: receipt.from,
            to: receipt.to,
            gas_used: receipt.gas_used,
            log_count: receipt.logs.len(),
        }
    }
}

impl fmt::Display for TxInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction {:?}", self.hash)?;
        writeln!(f, "  Status:    {}", self.status)?;
        match self.block_number {
            Some(block) => writeln!(f, "  Block:     {}", block)?,
            None => writeln!(f, "  Block:     pending")?,
        }
        writeln!(f, "  From:      {:?}", self.from)?;
        match self.to {
            Some(to) => writeln!(f, "  To:        {:?}", to)?,
            None => writeln!(f, "  To:        contract creation")?,
        }
        match self.gas_used {
            Some(gas) => writeln!(f, "  Gas used:  {}", gas)?,
            None => writeln!(f, "  Gas used:  unknown")?,
        }
        write!(f, "  Events:    {}", self.log_count)
    }
}

/// What a dispatched action produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Submitted to the multisig for confirmation by the other signers
    Relayed(RelaySubmission),
    /// Sent directly and mined
    Sent(TxInfo),
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Relayed(submission) => {
                match submission.multisig_tx_id {
                    Some(id) => writeln!(f, "Submitted to multisig, txid {}", id)?,
                    None => writeln!(f, "Submitted to multisig, txid unknown")?,
                }
                write!(f, "{}", submission.tx)
            }
            ActionOutcome::Sent(info) => write!(f, "{}", info),
        }
    }
}
