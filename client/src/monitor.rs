//! Transaction monitoring and receipt polling.

use crate::config::ChainConfig;
use crate::error::{GovernanceError, Result};
use crate::retry::RetryStrategy;
use crate::rpc::EthRpcClient;
use crate::types::{TransactionReceipt, TransactionStatus};
use ethers::types::H256;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

// Polling continues only through connection-level failures
fn is_transport_failure(error: &GovernanceError) -> bool {
    match error {
        GovernanceError::MaxRetriesExceeded(_) => true,
        GovernanceError::InvalidResponse(_) => false,
        other => RetryStrategy::is_retryable(other),
    }
}

/// Receipt poller
#[derive(Clone)]
pub struct TransactionMonitor {
    rpc: EthRpcClient,
    defaults: MonitorOptions,
}

/// Monitoring options
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Poll interval (in milliseconds)
    pub poll_interval_ms: u64,
    /// Timeout (in seconds)
    pub timeout_secs: u64,
}

impl MonitorOptions {
    /// Create from chain config
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            poll_interval_ms: config.tx_poll_interval_ms,
            timeout_secs: config.tx_timeout_secs,
        }
    }

    /// Set custom poll interval
    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    /// Set custom timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Transaction monitoring result
#[derive(Debug, Clone)]
pub enum MonitorResult {
    /// Mined with status 1
    Success(TransactionReceipt),
    /// Mined with status 0
    Reverted(TransactionReceipt),
    /// No receipt before the timeout
    Timeout,
}

impl TransactionMonitor {
    /// Create a new transaction monitor
    pub fn new(rpc: EthRpcClient, config: &ChainConfig) -> Self {
        Self {
            rpc,
            defaults: MonitorOptions::from_config(config),
        }
    }

    /// Default options taken from the chain config
    pub fn default_options(&self) -> MonitorOptions {
        self.defaults.clone()
    }

    /// Poll for the receipt of `tx_hash` until it is mined or the timeout passes
    ///
    /// A JSON-RPC error or an undecodable receipt ends the wait with that error.
    pub async fn monitor(&self, tx_hash: H256, options: MonitorOptions) -> Result<MonitorResult> {
        info!(
            "Waiting for transaction {:?} (timeout: {}s)",
            tx_hash, options.timeout_secs
        );

        let start = Instant::now();
        let timeout = Duration::from_secs(options.timeout_secs);
        let poll_interval = Duration::from_millis(options.poll_interval_ms);

        loop {
            match self.rpc.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => match receipt.status() {
                    TransactionStatus::Success => {
                        info!("Transaction confirmed: {:?}", tx_hash);
                        return Ok(MonitorResult::Success(receipt));
                    }
                    TransactionStatus::Reverted => {
                        warn!("Transaction reverted: {:?}", tx_hash);
                        return Ok(MonitorResult::Reverted(receipt));
                    }
                    TransactionStatus::Pending => {
                        debug!("Transaction still pending: {:?}", tx_hash);
                    }
                },
                Ok(None) => {
                    debug!("Transaction not yet mined: {:?}", tx_hash);
                }
                Err(e) if is_transport_failure(&e) => {
                    debug!("Error fetching receipt, still polling: {}", e);
                }
                Err(e) => {
                    warn!("Receipt lookup for {:?} failed: {}", tx_hash, e);
                    return Err(e);
                }
            }

            if start.elapsed() >= timeout {
                warn!("Transaction monitoring timed out: {:?}", tx_hash);
                return Ok(MonitorResult::Timeout);
            }

            sleep(poll_interval).await;
        }
    }

    /// Wait for a receipt and turn reverts and timeouts into errors
    pub async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        let options = self.default_options();
        let timeout_secs = options.timeout_secs;

        match self.monitor(tx_hash, options).await? {
            MonitorResult::Success(receipt) => Ok(receipt),
            MonitorResult::Reverted(_) => Err(GovernanceError::TransactionFailed {
                hash: tx_hash,
                reason: "execution reverted".to_string(),
            }),
            MonitorResult::Timeout => Err(GovernanceError::TransactionTimeout(
                tx_hash,
                timeout_secs,
            )),
        }
    }

    /// Current status of a transaction (single check, no polling)
    pub async fn get_status(&self, tx_hash: H256) -> Result<TransactionStatus> {
        Ok(self
            .rpc
            .transaction_receipt(tx_hash)
            .await?
            .map(|receipt| receipt.status())
            .unwrap_or(TransactionStatus::Pending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn receipt_body(status: &str) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "transactionHash": H256::repeat_byte(0x77),
                "blockNumber": "0x10",
                "from": "0x0101010101010101010101010101010101010101",
                "to": null,
                "gasUsed": "0x5208",
                "status": status,
                "logs": []
            }
        })
    }

    async fn monitor_for(server: &MockServer) -> TransactionMonitor {
        let config = ChainConfig::custom(server.uri(), 31)
            .unwrap()
            .with_tx_config(20, 2);
        TransactionMonitor::new(EthRpcClient::new(&config).unwrap(), &config)
    }

    #[test]
    fn test_rsk_defaults_allow_several_blocks() {
        let options = MonitorOptions::from_config(&ChainConfig::mainnet());
        assert!(options.timeout_secs >= 90);

        let options = options.with_poll_interval(250).with_timeout(30);
        assert_eq!((options.poll_interval_ms, options.timeout_secs), (250, 30));
    }

    #[tokio::test]
    async fn test_polls_until_mined() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": null })),
            )
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(receipt_body("0x1")))
            .mount(&server)
            .await;

        let monitor = monitor_for(&server).await;
        let receipt = monitor
            .wait_for_receipt(H256::repeat_byte(0x77))
            .await
            .unwrap();

        assert_eq!(receipt.block_number, Some(16u64.into()));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_reverted_receipt_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(receipt_body("0x0")))
            .mount(&server)
            .await;

        let monitor = monitor_for(&server).await;
        let hash = H256::repeat_byte(0x77);

        let result = monitor.monitor(hash, monitor.default_options()).await.unwrap();
        assert!(matches!(result, MonitorResult::Reverted(_)));
        assert_eq!(monitor.get_status(hash).await.unwrap(), TransactionStatus::Reverted);
    }

    #[tokio::test]
    async fn test_node_error_ends_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": { "code": -32601, "message": "method not allowed" }
            })))
            .mount(&server)
            .await;

        let monitor = monitor_for(&server).await;
        let result = monitor.wait_for_receipt(H256::repeat_byte(0x77)).await;

        assert!(matches!(
            result,
            Err(GovernanceError::RpcError(msg)) if msg.contains("method not allowed")
        ));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_receipt_ends_wait() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": { "transactionHash": "0x1234" }
            })))
            .mount(&server)
            .await;

        let monitor = monitor_for(&server).await;
        let result = monitor.wait_for_receipt(H256::repeat_byte(0x77)).await;
        assert!(matches!(result, Err(GovernanceError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": null })),
            )
            .mount(&server)
            .await;

        let monitor = monitor_for(&server).await;
        let hash = H256::repeat_byte(0x78);
        assert_eq!(monitor.get_status(hash).await.unwrap(), TransactionStatus::Pending);

        let options = monitor.default_options().with_timeout(0);
        assert!(matches!(
            monitor.monitor(hash, options).await.unwrap(),
            MonitorResult::Timeout
        ));
    }
}
