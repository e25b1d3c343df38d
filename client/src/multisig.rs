//! Multisig relay for privileged governance calls.
//!
//! Privileged calls are not sent to their target directly. They are submitted
//! to a Gnosis-style MultiSigWallet through `submitTransaction(destination,
//! value, data)` and executed once enough owners confirm. The relay only
//! submits; confirmation by the other owners happens outside this client.

use crate::abi;
use crate::error::{GovernanceError, Result};
use crate::transaction::TransactionManager;
use crate::types::{ReceiptLog, RelayRequest, RelaySubmission, TransactionReceipt, TxInfo};
use async_trait::async_trait;
use ethers::abi::{Abi, RawLog, Token};
use ethers::types::{Address, Bytes, U256};
use tracing::{info, warn};

/// Submission path for calls that need multisig approval
#[async_trait]
pub trait MultisigRelay: Send + Sync {
    /// Submit `request.data` for `request.target` to the multisig at `request.multisig`
    async fn send_with_multisig(&self, request: RelayRequest) -> Result<RelaySubmission>;
}

/// MultiSigWallet reached over JSON-RPC
pub struct MultisigWallet {
    abi: Abi,
    transactions: TransactionManager,
}

impl MultisigWallet {
    /// Create a relay that submits from the transaction manager's account
    pub fn new(transactions: TransactionManager) -> Result<Self> {
        Ok(Self {
            abi: abi::multisig_wallet()?,
            transactions,
        })
    }

    /// Calldata for `submitTransaction(target, 0, data)`
    pub fn encode_submission(&self, target: Address, data: &Bytes) -> Result<Bytes> {
        let encoded = self.abi.function("submitTransaction")?.encode_input(&[
            Token::Address(target),
            Token::Uint(U256::zero()),
            Token::Bytes(data.to_vec()),
        ])?;
        Ok(Bytes::from(encoded))
    }

    /// Multisig transaction id from the wallet's `Submission` event
    pub fn submission_id(&self, multisig: Address, receipt: &TransactionReceipt) -> Result<Option<U256>> {
        let event = self.abi.event("Submission")?;
        let signature = event.signature();

        let log = receipt.logs.iter().find(|log: &&ReceiptLog| {
            log.address == multisig && log.topics.first() == Some(&signature)
        });

        let Some(log) = log else {
            return Ok(None);
        };

        let decoded = event.parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })?;

        Ok(decoded
            .params
            .into_iter()
            .find(|param| param.name == "transactionId")
            .and_then(|param| param.value.into_uint()))
    }
}

#[async_trait]
impl MultisigRelay for MultisigWallet {
    async fn send_with_multisig(&self, request: RelayRequest) -> Result<RelaySubmission> {
        if request.sender != self.transactions.sender_address() {
            return Err(GovernanceError::ConfigError(format!(
                "Relay sender {:?} does not match the operator account {:?}",
                request.sender,
                self.transactions.sender_address()
            )));
        }

        info!(
            "Submitting call to {:?} through multisig {:?}",
            request.target, request.multisig
        );

        let data = self.encode_submission(request.target, &request.data)?;
        let receipt = self
            .transactions
            .send_and_wait(request.multisig, data)
            .await?;

        let multisig_tx_id = self.submission_id(request.multisig, &receipt)?;
        match multisig_tx_id {
            Some(id) => info!("Submitted to multisig {:?}, txid {}", request.multisig, id),
            None => warn!(
                "No Submission event from multisig {:?} in {:?}",
                request.multisig, receipt.transaction_hash
            ),
        }

        Ok(RelaySubmission {
            multisig_tx_id,
            tx: TxInfo::from(&receipt),
        })
    }
}
