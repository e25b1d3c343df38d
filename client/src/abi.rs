//! ABI definitions for the contracts the governance client talks to.
//!
//! Only the entries the client actually calls are listed.

use crate::error::{GovernanceError, Result};
use ethers::abi::Abi;

/// GovernorAlpha subset: admin acceptance, proposal lifecycle and guardian
pub const GOVERNOR_ALPHA_ABI: &str = r#"[
    {"type":"function","name":"__acceptAdmin","inputs":[],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"queue","inputs":[{"name":"proposalId","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"execute","inputs":[{"name":"proposalId","type":"uint256"}],"outputs":[],"stateMutability":"payable"},
    {"type":"function","name":"cancel","inputs":[{"name":"proposalId","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"guardian","inputs":[],"outputs":[{"name":"","type":"address"}],"stateMutability":"view"}
]"#;

/// LockedSOV admin management
pub const LOCKED_SOV_ABI: &str = r#"[
    {"type":"function","name":"addAdmin","inputs":[{"name":"_newAdmin","type":"address"}],"outputs":[],"stateMutability":"nonpayable"},
    {"type":"function","name":"removeAdmin","inputs":[{"name":"_adminToRemove","type":"address"}],"outputs":[],"stateMutability":"nonpayable"}
]"#;

/// Gnosis-style MultiSigWallet submission entry point
pub const MULTISIG_WALLET_ABI: &str = r#"[
    {"type":"function","name":"submitTransaction","inputs":[{"name":"destination","type":"address"},{"name":"value","type":"uint256"},{"name":"data","type":"bytes"}],"outputs":[{"name":"transactionId","type":"uint256"}],"stateMutability":"nonpayable"},
    {"type":"event","name":"Submission","inputs":[{"name":"transactionId","type":"uint256","indexed":true}],"anonymous":false}
]"#;

/// Parse an ABI from its JSON description
pub fn load_abi(name: &str, json: &str) -> Result<Abi> {
    serde_json::from_str(json)
        .map_err(|e| GovernanceError::InvalidAbi(format!("{}: {}", name, e)))
}

/// GovernorAlpha ABI
pub fn governor_alpha() -> Result<Abi> {
    load_abi("GovernorAlpha", GOVERNOR_ALPHA_ABI)
}

/// LockedSOV ABI
pub fn locked_sov() -> Result<Abi> {
    load_abi("LockedSOV", LOCKED_SOV_ABI)
}

/// MultiSigWallet ABI
pub fn multisig_wallet() -> Result<Abi> {
    load_abi("MultiSigWallet", MULTISIG_WALLET_ABI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governor_selectors() {
        let abi = governor_alpha().unwrap();
        // keccak256("queue(uint256)")[..4]
        assert_eq!(abi.function("queue").unwrap().short_signature(), [0xdd, 0xf0, 0xb0, 0x09]);
        // keccak256("execute(uint256)")[..4]
        assert_eq!(abi.function("execute").unwrap().short_signature(), [0xfe, 0x0d, 0x94, 0xc1]);
        // keccak256("cancel(uint256)")[..4]
        assert_eq!(abi.function("cancel").unwrap().short_signature(), [0x40, 0xe5, 0x8e, 0xe5]);
        assert!(abi.function("__acceptAdmin").is_ok());
        assert!(abi.function("guardian").is_ok());
    }

    #[test]
    fn test_multisig_abi_has_submission_event() {
        let abi = multisig_wallet().unwrap();
        assert!(abi.function("submitTransaction").is_ok());
        assert_eq!(
            abi.event("Submission").unwrap().signature(),
            ethers::types::H256::from(ethers::utils::keccak256("Submission(uint256)"))
        );
    }

    #[test]
    fn test_locked_sov_abi() {
        let abi = locked_sov().unwrap();
        assert!(abi.function("addAdmin").is_ok());
        assert!(abi.function("removeAdmin").is_ok());
    }

    #[test]
    fn test_invalid_abi() {
        let result = load_abi("Broken", "{not json");
        assert!(matches!(result, Err(GovernanceError::InvalidAbi(msg)) if msg.starts_with("Broken")));
    }
}
