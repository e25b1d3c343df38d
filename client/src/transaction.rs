//! Transaction building and submission.
//!
//! Provides the read/send/confirm primitives every contract capability is built
//! on. Gas is always estimated first, so a call that would revert fails before
//! anything is broadcast and the node's revert reason reaches the caller.

use crate::config::ChainConfig;
use crate::error::Result;
use crate::monitor::TransactionMonitor;
use crate::rpc::{CallRequest, EthRpcClient};
use crate::signer::TransactionSender;
use crate::types::{TransactionReceipt, TxInfo};
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds, signs and submits transactions for the operator account
#[derive(Clone)]
pub struct TransactionManager {
    rpc: EthRpcClient,
    monitor: TransactionMonitor,
    sender: Arc<TransactionSender>,
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new(config: &ChainConfig, sender: TransactionSender) -> Result<Self> {
        let rpc = EthRpcClient::new(config)?;
        let monitor = TransactionMonitor::new(rpc.clone(), config);

        Ok(Self {
            rpc,
            monitor,
            sender: Arc::new(sender),
        })
    }

    /// Underlying RPC client
    pub fn rpc(&self) -> &EthRpcClient {
        &self.rpc
    }

    /// Receipt monitor
    pub fn monitor(&self) -> &TransactionMonitor {
        &self.monitor
    }

    /// Operator account address
    pub fn sender_address(&self) -> Address {
        self.sender.address()
    }

    /// Read-only call from the operator account
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let request = CallRequest::new(to, data).from(self.sender.address());
        self.rpc.call(&request).await
    }

    /// Submit a transaction and return its hash without waiting for it
    pub async fn send(&self, to: Address, data: Bytes) -> Result<H256> {
        let from = self.sender.address();
        let request = CallRequest::new(to, data.clone()).from(from);

        let gas = self.rpc.estimate_gas(&request).await?;
        debug!("Estimated gas for call to {:?}: {}", to, gas);

        match self.sender.as_ref() {
            TransactionSender::Node(_) => self.rpc.send_transaction(&request.gas(gas)).await,
            TransactionSender::Local(wallet) => {
                let nonce = self.rpc.transaction_count(from).await?;
                let gas_price = self.rpc.gas_price().await?;

                let tx: TypedTransaction = TransactionRequest::new()
                    .from(from)
                    .to(to)
                    .data(data)
                    .value(U256::zero())
                    .gas(gas)
                    .gas_price(gas_price)
                    .nonce(nonce)
                    .chain_id(wallet.chain_id())
                    .into();

                let signature = wallet.sign_transaction(&tx).await?;
                let raw = tx.rlp_signed(&signature);
                self.rpc.send_raw_transaction(&raw).await
            }
        }
    }

    /// Submit a transaction and wait for a successful receipt
    pub async fn send_and_wait(&self, to: Address, data: Bytes) -> Result<TransactionReceipt> {
        let hash = self.send(to, data).await?;
        let receipt = self.monitor.wait_for_receipt(hash).await?;
        info!(
            "Transaction {:?} mined in block {:?}",
            hash, receipt.block_number
        );
        Ok(receipt)
    }

    /// Submit a transaction, wait for it, and report its info
    pub async fn send_and_confirm(&self, to: Address, data: Bytes) -> Result<TxInfo> {
        let receipt = self.send_and_wait(to, data).await?;
        Ok(TxInfo::from(&receipt))
    }

    /// Health check - verify the node answers
    pub async fn health_check(&self) -> Result<bool> {
        self.rpc.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_config() -> ChainConfig {
        ChainConfig::testnet()
            .with_request_timeout(Duration::from_secs(10))
            .with_max_retries(1)
    }

    #[test]
    fn test_transaction_manager_creation() {
        let sender = TransactionSender::Node(Address::repeat_byte(0x01));
        let manager = TransactionManager::new(&create_test_config(), sender).unwrap();
        assert_eq!(manager.sender_address(), Address::repeat_byte(0x01));
        assert_eq!(
            manager.rpc().rpc_url(),
            "https://public-node.testnet.rsk.co"
        );
    }

    // Submission paths are covered against a mock node in tests/integration_tests.rs
}
