//! Operator account used to submit transactions.

use crate::config::AccountConfig;
use crate::error::{GovernanceError, Result};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::fmt;

/// Account that submits governance transactions
#[derive(Clone)]
pub enum TransactionSender {
    /// Account unlocked on the node, transactions go through `eth_sendTransaction`
    Node(Address),
    /// Key held by this process, transactions are signed locally
    Local(LocalWallet),
}

impl TransactionSender {
    /// Build the sender described by an account configuration
    ///
    /// `chain_id` is bound into locally signed transactions (EIP-155).
    pub fn from_config(account: &AccountConfig, chain_id: u64) -> Result<Self> {
        account.validate()?;

        if let Some(address) = account.address {
            return Ok(TransactionSender::Node(address));
        }

        let env_var = account.private_key_env.as_deref().unwrap_or_default();
        let key = std::env::var(env_var).map_err(|_| {
            GovernanceError::ConfigError(format!(
                "Environment variable {} is not set",
                env_var
            ))
        })?;

        Self::from_private_key(&key, chain_id)
    }

    /// Local signer from a hex private key, with or without `0x`
    pub fn from_private_key(key: &str, chain_id: u64) -> Result<Self> {
        let wallet: LocalWallet = key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|_| GovernanceError::ConfigError("Invalid private key".to_string()))?;
        Ok(TransactionSender::Local(wallet.with_chain_id(chain_id)))
    }

    /// Address transactions are sent from
    pub fn address(&self) -> Address {
        match self {
            TransactionSender::Node(address) => *address,
            TransactionSender::Local(wallet) => wallet.address(),
        }
    }

    /// Whether transactions are signed by this process
    pub fn signs_locally(&self) -> bool {
        matches!(self, TransactionSender::Local(_))
    }
}

// Never print key material
impl fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionSender::Node(address) => f.debug_tuple("Node").field(address).finish(),
            TransactionSender::Local(wallet) => {
                f.debug_tuple("Local").field(&wallet.address()).finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known development key, never funded on a real network
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_node_sender() {
        let account = AccountConfig::node(Address::repeat_byte(0x42));
        let sender = TransactionSender::from_config(&account, 31).unwrap();
        assert_eq!(sender.address(), Address::repeat_byte(0x42));
        assert!(!sender.signs_locally());
    }

    #[test]
    fn test_local_sender_from_key() {
        let sender = TransactionSender::from_private_key(DEV_KEY, 31).unwrap();
        assert_eq!(sender.address(), DEV_ADDRESS.parse::<Address>().unwrap());
        assert!(sender.signs_locally());
        match &sender {
            TransactionSender::Local(wallet) => assert_eq!(wallet.chain_id(), 31),
            _ => panic!("Expected local sender"),
        }
    }

    #[test]
    fn test_local_sender_from_env() {
        std::env::set_var("GOVERNANCE_SIGNER_TEST_KEY", DEV_KEY);
        let account = AccountConfig::local_key("GOVERNANCE_SIGNER_TEST_KEY");
        let sender = TransactionSender::from_config(&account, 30).unwrap();
        assert_eq!(sender.address(), DEV_ADDRESS.parse::<Address>().unwrap());
    }

    #[test]
    fn test_missing_env_var() {
        let account = AccountConfig::local_key("GOVERNANCE_SIGNER_TEST_UNSET");
        let result = TransactionSender::from_config(&account, 30);
        assert!(matches!(result, Err(GovernanceError::ConfigError(msg)) if msg.contains("GOVERNANCE_SIGNER_TEST_UNSET")));
    }

    #[test]
    fn test_invalid_key() {
        assert!(TransactionSender::from_private_key("not-a-key", 30).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let sender = TransactionSender::from_private_key(DEV_KEY, 31).unwrap();
        let rendered = format!("{:?}", sender);
        assert!(!rendered.contains("ac0974bec39a17e3"));
        assert!(rendered.starts_with("Local("));
    }
}
