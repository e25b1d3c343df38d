//! EVM JSON-RPC client.
//!
//! Thin typed wrapper over the handful of `eth_*` methods the governance client
//! needs. Every request goes through the configured [`RetryStrategy`] except
//! `eth_sendTransaction` and `eth_sendRawTransaction`, which are sent once: a
//! submission that timed out on the wire may already be in the mempool.

use crate::config::ChainConfig;
use crate::error::{GovernanceError, Result};
use crate::retry::RetryStrategy;
use crate::types::TransactionReceipt;
use ethers::types::{Address, Bytes, H256, U256, U64};
use ethers::utils::keccak256;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

type RequestId = u64;

/// Node answers meaning the submitted transaction is already in its pool
const ALREADY_KNOWN: [&str; 3] = ["already known", "known transaction", "same hash already exists"];

fn is_already_known(message: &str) -> bool {
    let message = message.to_lowercase();
    ALREADY_KNOWN.iter().any(|known| message.contains(known))
}

/// JSON-RPC client for an EVM node
#[derive(Clone)]
pub struct EthRpcClient {
    client: Client,
    rpc_url: String,
    retry_strategy: RetryStrategy,
    request_id: Arc<AtomicU64>,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: RequestId,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Transaction fields for `eth_call`, `eth_estimateGas` and `eth_sendTransaction`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Target contract
    pub to: Address,
    /// Calldata
    pub data: Bytes,
    /// Gas limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U256>,
}

impl CallRequest {
    /// Call `to` with `data` and no sender
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            from: None,
            to,
            data,
            gas: None,
        }
    }

    /// Set the sender
    pub fn from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    /// Set the gas limit
    pub fn gas(mut self, gas: U256) -> Self {
        self.gas = Some(gas);
        self
    }
}

impl EthRpcClient {
    /// Create a new RPC client
    pub fn new(config: &ChainConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(GovernanceError::NetworkError)?;

        Ok(Self {
            client,
            rpc_url: config.rpc_url.clone(),
            retry_strategy: RetryStrategy::from_config(config),
            request_id: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Endpoint this client talks to
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn next_request_id(&self) -> RequestId {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn send_request(&self, method: &str, params: &Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id(),
            method,
            params,
        };

        debug!("RPC request: {} (id: {})", method, request.id);

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(GovernanceError::NetworkError)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(GovernanceError::RateLimitExceeded(retry_after));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GovernanceError::RpcError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| GovernanceError::InvalidResponse(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            error!("RPC error on {}: {} (code: {})", method, error.message, error.code);
            let detail = match error.data {
                Some(Value::String(data)) => format!(" [{}]", data),
                _ => String::new(),
            };
            return Err(GovernanceError::RpcError(format!(
                "{} (code: {}){}",
                error.message, error.code, detail
            )));
        }

        // A null result is meaningful for some methods (pending receipts)
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }

    async fn call_rpc(&self, method: &str, params: Value) -> Result<Value> {
        self.retry_strategy
            .retry(method, || self.send_request(method, &params))
            .await
    }

    async fn call_typed<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.call_rpc(method, params).await?;
        serde_json::from_value(result).map_err(|e| {
            GovernanceError::InvalidResponse(format!("Unexpected {} result: {}", method, e))
        })
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.call_typed("eth_chainId", json!([])).await?;
        Ok(id.as_u64())
    }

    /// Latest block number
    pub async fn block_number(&self) -> Result<u64> {
        let number: U64 = self.call_typed("eth_blockNumber", json!([])).await?;
        debug!("Latest block: {}", number);
        Ok(number.as_u64())
    }

    /// Execute a read-only call against the latest block
    pub async fn call(&self, request: &CallRequest) -> Result<Bytes> {
        self.call_typed("eth_call", json!([request, "latest"]))
            .await
    }

    /// Estimate gas for a transaction; reverts surface here as `RpcError`
    pub async fn estimate_gas(&self, request: &CallRequest) -> Result<U256> {
        self.call_typed("eth_estimateGas", json!([request])).await
    }

    /// Current gas price
    pub async fn gas_price(&self) -> Result<U256> {
        self.call_typed("eth_gasPrice", json!([])).await
    }

    /// Next nonce for `address`, counting pending transactions
    pub async fn transaction_count(&self, address: Address) -> Result<U256> {
        self.call_typed("eth_getTransactionCount", json!([address, "pending"]))
            .await
    }

    /// Submit a transaction signed by a node-managed account
    pub async fn send_transaction(&self, request: &CallRequest) -> Result<H256> {
        let result = self
            .send_request("eth_sendTransaction", &json!([request]))
            .await?;
        let hash: H256 = serde_json::from_value(result).map_err(|e| {
            GovernanceError::InvalidResponse(format!("Unexpected transaction hash: {}", e))
        })?;
        info!("Transaction sent: {:?}", hash);
        Ok(hash)
    }

    /// Submit a locally signed transaction
    ///
    /// Sent once, like `eth_sendTransaction`. A node that already holds the
    /// transaction has accepted it, so that answer resolves to the hash of
    /// `raw` instead of an error.
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<H256> {
        let local_hash = H256::from(keccak256(raw));

        let result = match self
            .send_request("eth_sendRawTransaction", &json!([raw]))
            .await
        {
            Ok(result) => result,
            Err(GovernanceError::RpcError(msg)) if is_already_known(&msg) => {
                info!("Node already holds transaction {:?}", local_hash);
                return Ok(local_hash);
            }
            Err(e) => return Err(e),
        };

        let hash: H256 = serde_json::from_value(result).map_err(|e| {
            GovernanceError::InvalidResponse(format!("Unexpected transaction hash: {}", e))
        })?;
        info!("Raw transaction sent: {:?}", hash);
        Ok(hash)
    }

    /// Receipt of a mined transaction, `None` while still pending
    pub async fn transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        self.call_typed("eth_getTransactionReceipt", json!([hash]))
            .await
    }

    /// Health check - verify the node answers
    pub async fn health_check(&self) -> Result<bool> {
        match self.block_number().await {
            Ok(block) => {
                info!("RPC health check passed (block {})", block);
                Ok(true)
            }
            Err(e) => {
                error!("RPC health check failed: {}", e);
                Err(e)
            }
        }
    }
}
