//! Error types for the governance client.
//!
//! Covers the three failure families an operator can hit: the chain rejecting a
//! call or transaction, a local invariant check failing (the guardian guard on
//! cancellation), and configuration problems such as a missing registry entry.

use ethers::types::{Address, H256};
use thiserror::Error;

/// Main error type for governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// JSON-RPC level error returned by the node (includes execution reverts)
    #[error("RPC error: {0}")]
    RpcError(String),

    /// Network communication error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The transaction was mined but reverted
    #[error("Transaction {hash:?} failed: {reason}")]
    TransactionFailed {
        /// Hash of the reverted transaction
        hash: H256,
        /// Human readable failure reason
        reason: String,
    },

    /// No receipt arrived before the configured timeout
    #[error("Transaction {0:?} not confirmed after {1} seconds")]
    TransactionTimeout(H256, u64),

    /// The target contract's guardian is not the configured multisig
    #[error("Guardian address is not multisig (guardian: {guardian:?}, multisig: {multisig:?})")]
    GuardianMismatch {
        /// Guardian reported by the governor contract
        guardian: Address,
        /// Multisig address bound in the registry
        multisig: Address,
    },

    /// Registry lookup for a contract name failed
    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    /// ABI encoding or decoding failed
    #[error("ABI error: {0}")]
    AbiError(#[from] ethers::abi::Error),

    /// ABI definition could not be loaded
    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    /// Local transaction signing failed
    #[error("Signer error: {0}")]
    SignerError(#[from] ethers::signers::WalletError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {0} seconds")]
    RateLimitExceeded(u64),

    /// Max retries exceeded
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(usize),

    /// Invalid response from the node
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// URL parse error
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// IO error while reading configuration files
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl GovernanceError {
    /// Whether the error is the guardian guard refusing a cancellation
    pub fn is_guardian_mismatch(&self) -> bool {
        matches!(self, GovernanceError::GuardianMismatch { .. })
    }
}

/// Result type alias for governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Error context for retryable operations
#[derive(Debug, Clone, Default)]
pub struct RetryContext {
    /// Number of attempts made
    pub attempts: usize,
    /// Last error encountered
    pub last_error: String,
    /// Total time spent waiting between attempts (in milliseconds)
    pub total_time_ms: u64,
}

impl RetryContext {
    /// Create a new retry context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt
    pub fn record_attempt(&mut self, error: &str, duration_ms: u64) {
        self.attempts += 1;
        self.last_error = error.to_string();
        self.total_time_ms += duration_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guardian_mismatch_message() {
        let err = GovernanceError::GuardianMismatch {
            guardian: Address::repeat_byte(0x11),
            multisig: Address::repeat_byte(0x22),
        };
        let message = err.to_string();
        assert!(message.starts_with("Guardian address is not multisig"));
        assert!(message.contains("0x1111111111111111111111111111111111111111"));
        assert!(err.is_guardian_mismatch());
    }

    #[test]
    fn test_unknown_contract_display() {
        let err = GovernanceError::UnknownContract("LockedSOV".to_string());
        assert_eq!(err.to_string(), "Unknown contract: LockedSOV");
        assert!(!err.is_guardian_mismatch());
    }

    #[test]
    fn test_retry_context_keeps_latest_failure() {
        let mut ctx = RetryContext::new();
        for (message, wait_ms) in [("HTTP 503 Service Unavailable: ", 120), ("HTTP 502 Bad Gateway: ", 240)] {
            ctx.record_attempt(message, wait_ms);
        }

        assert_eq!(
            (ctx.attempts, ctx.total_time_ms, ctx.last_error.as_str()),
            (2, 360, "HTTP 502 Bad Gateway: ")
        );
    }
}
