//! Governance action dispatcher.
//!
//! Every operation follows the same path: resolve the target in the registry,
//! encode one call, then either send it from the operator account or hand it
//! to the multisig relay. The dispatcher keeps no contract state between calls.

use crate::contracts::ContractBackend;
use crate::error::{GovernanceError, Result};
use crate::registry::{ContractRegistry, GOVERNOR_OWNER, LOCKED_SOV, TIMELOCK_ADMIN};
use crate::types::{
    ActionOutcome, GovernanceAction, ProposalId, RelayRequest, RelaySubmission, TxInfo,
};
use ethers::types::{Address, Bytes};
use tracing::{info, warn};

/// Explicit process context: where contracts live and who is acting
#[derive(Debug, Clone)]
pub struct GovernanceContext {
    /// Contract name to address bindings
    pub registry: ContractRegistry,
    /// Operator account submitting transactions
    pub account: Address,
}

impl GovernanceContext {
    /// Create a context
    pub fn new(registry: ContractRegistry, account: Address) -> Self {
        Self { registry, account }
    }
}

/// Runs governance actions against a contract backend
pub struct GovernanceDispatcher<B> {
    context: GovernanceContext,
    backend: B,
}

impl<B: ContractBackend> GovernanceDispatcher<B> {
    /// Create a dispatcher
    pub fn new(context: GovernanceContext, backend: B) -> Self {
        Self { context, backend }
    }

    /// Context the dispatcher resolves against
    pub fn context(&self) -> &GovernanceContext {
        &self.context
    }

    /// Backend used to build contract capabilities
    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn relay(&self, target: Address, data: Bytes) -> Result<RelaySubmission> {
        let request = RelayRequest {
            multisig: self.context.registry.multisig()?,
            target,
            data,
            sender: self.context.account,
        };
        self.backend.relay().send_with_multisig(request).await
    }

    /// Have the governor bound to `contract_type` accept its pending admin
    pub async fn accept_admin(&self, contract_type: &str) -> Result<RelaySubmission> {
        let address = self.context.registry.address(contract_type)?;
        let governor = self.backend.governor(address)?;

        info!("Accepting admin on {} ({:?})", contract_type, address);
        let data = governor.encode_accept_admin()?;
        self.relay(governor.address(), data).await
    }

    /// Queue `proposal_id` on the owner governor, sent directly
    pub async fn queue_proposal(&self, proposal_id: ProposalId) -> Result<TxInfo> {
        let address = self.context.registry.address(GOVERNOR_OWNER)?;
        let governor = self.backend.governor(address)?;

        let info = governor.queue(proposal_id).await?;
        info!("Proposal {} queued\n{}", proposal_id, info);
        Ok(info)
    }

    /// Execute `proposal_id` on the owner governor, sent directly
    pub async fn execute_proposal(&self, proposal_id: ProposalId) -> Result<TxInfo> {
        let address = self.context.registry.address(GOVERNOR_OWNER)?;
        let governor = self.backend.governor(address)?;

        let info = governor.execute(proposal_id).await?;
        info!("Proposal {} executed\n{}", proposal_id, info);
        Ok(info)
    }

    /// Cancel `proposal_id` on the governor bound to `contract_type`
    ///
    /// Only relayed when the governor's guardian is the registry multisig;
    /// any other guardian fails with [`GovernanceError::GuardianMismatch`]
    /// before anything is submitted.
    pub async fn cancel_proposal(
        &self,
        contract_type: &str,
        proposal_id: ProposalId,
    ) -> Result<RelaySubmission> {
        let address = self.context.registry.address(contract_type)?;
        let governor = self.backend.governor(address)?;
        let data = governor.encode_cancel(proposal_id)?;

        let multisig = self.context.registry.multisig()?;
        let guardian = governor.guardian().await?;
        if guardian != multisig {
            warn!(
                "Refusing to cancel proposal {} on {}: guardian {:?} is not multisig {:?}",
                proposal_id, contract_type, guardian, multisig
            );
            return Err(GovernanceError::GuardianMismatch { guardian, multisig });
        }

        info!("Cancelling proposal {} on {} ({:?})", proposal_id, contract_type, address);
        self.relay(governor.address(), data).await
    }

    /// Add the admin timelock as LockedSOV admin, via multisig
    ///
    /// The current admin is left in place.
    pub async fn transfer_locked_sov_ownership_to_governance(&self) -> Result<RelaySubmission> {
        let timelock_admin = self.context.registry.address(TIMELOCK_ADMIN)?;
        let address = self.context.registry.address(LOCKED_SOV)?;
        let locked_sov = self.backend.locked_sov(address)?;

        info!("Add LockedSOV admin for address: {:?}", timelock_admin);
        // TODO: decide whether the previous admin should be removed with encode_remove_admin
        let data = locked_sov.encode_add_admin(timelock_admin)?;
        self.relay(locked_sov.address(), data).await
    }

    /// Run one action value
    pub async fn dispatch(&self, action: &GovernanceAction) -> Result<ActionOutcome> {
        info!("Dispatching {}", action);

        match action {
            GovernanceAction::AcceptAdmin { contract } => {
                self.accept_admin(contract).await.map(ActionOutcome::Relayed)
            }
            GovernanceAction::Queue { proposal_id } => {
                self.queue_proposal(*proposal_id).await.map(ActionOutcome::Sent)
            }
            GovernanceAction::Execute { proposal_id } => {
                self.execute_proposal(*proposal_id).await.map(ActionOutcome::Sent)
            }
            GovernanceAction::Cancel {
                contract,
                proposal_id,
            } => self
                .cancel_proposal(contract, *proposal_id)
                .await
                .map(ActionOutcome::Relayed),
            GovernanceAction::TransferLockedSovOwnership => self
                .transfer_locked_sov_ownership_to_governance()
                .await
                .map(ActionOutcome::Relayed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{GovernorContract, LockedSovContract};
    use crate::multisig::MultisigRelay;
    use crate::registry::{GOVERNOR_ADMIN, MULTISIG};
    use crate::types::TransactionStatus;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use ethers::types::{H256, U256};
    use std::sync::{Arc, Mutex};

    const GOVERNOR_A: Address = Address::repeat_byte(0xa1);
    const GOVERNOR_B: Address = Address::repeat_byte(0xb2);
    const MULTISIG_M: Address = Address::repeat_byte(0x3e);
    const LOCKED: Address = Address::repeat_byte(0x44);
    const TIMELOCK: Address = Address::repeat_byte(0x55);
    const OPERATOR: Address = Address::repeat_byte(0x01);

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Governor(Address),
        LockedSov(Address),
        Queue(Address, ProposalId),
        Execute(Address, ProposalId),
        Guardian(Address),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        relayed: Mutex<Vec<RelayRequest>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn relayed(&self) -> Vec<RelayRequest> {
            self.relayed.lock().unwrap().clone()
        }
    }

    fn tx_info(to: Address) -> TxInfo {
        TxInfo {
            hash: H256::repeat_byte(0x99),
            status: TransactionStatus::Success,
            block_number: Some(1),
            from: OPERATOR,
            to: Some(to),
            gas_used: Some(U256::from(50_000u64)),
            log_count: 1,
        }
    }

    struct FakeGovernor {
        address: Address,
        guardian: Address,
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl GovernorContract for FakeGovernor {
        fn address(&self) -> Address {
            self.address
        }

        fn encode_accept_admin(&self) -> Result<Bytes> {
            Ok(Bytes::from(b"accept".to_vec()))
        }

        fn encode_cancel(&self, proposal_id: ProposalId) -> Result<Bytes> {
            Ok(Bytes::from(format!("cancel:{}", proposal_id).into_bytes()))
        }

        async fn guardian(&self) -> Result<Address> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(Call::Guardian(self.address));
            Ok(self.guardian)
        }

        async fn queue(&self, proposal_id: ProposalId) -> Result<TxInfo> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(Call::Queue(self.address, proposal_id));
            Ok(tx_info(self.address))
        }

        async fn execute(&self, proposal_id: ProposalId) -> Result<TxInfo> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(Call::Execute(self.address, proposal_id));
            Ok(tx_info(self.address))
        }
    }

    struct FakeLockedSov {
        address: Address,
    }

    impl LockedSovContract for FakeLockedSov {
        fn address(&self) -> Address {
            self.address
        }

        fn encode_add_admin(&self, admin: Address) -> Result<Bytes> {
            Ok(Bytes::from([b"addAdmin:".as_slice(), admin.as_bytes()].concat()))
        }

        fn encode_remove_admin(&self, admin: Address) -> Result<Bytes> {
            Ok(Bytes::from([b"removeAdmin:".as_slice(), admin.as_bytes()].concat()))
        }
    }

    struct FakeRelay {
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl MultisigRelay for FakeRelay {
        async fn send_with_multisig(&self, request: RelayRequest) -> Result<RelaySubmission> {
            let target = request.target;
            self.recorder.relayed.lock().unwrap().push(request);
            Ok(RelaySubmission {
                multisig_tx_id: Some(U256::from(5u64)),
                tx: tx_info(target),
            })
        }
    }

    struct FakeBackend {
        guardian: Address,
        recorder: Arc<Recorder>,
    }

    impl ContractBackend for FakeBackend {
        fn governor(&self, address: Address) -> Result<Arc<dyn GovernorContract>> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(Call::Governor(address));
            Ok(Arc::new(FakeGovernor {
                address,
                guardian: self.guardian,
                recorder: self.recorder.clone(),
            }))
        }

        fn locked_sov(&self, address: Address) -> Result<Arc<dyn LockedSovContract>> {
            self.recorder
                .calls
                .lock()
                .unwrap()
                .push(Call::LockedSov(address));
            Ok(Arc::new(FakeLockedSov { address }))
        }

        fn relay(&self) -> Arc<dyn MultisigRelay> {
            Arc::new(FakeRelay {
                recorder: self.recorder.clone(),
            })
        }
    }

    fn registry() -> ContractRegistry {
        ContractRegistry::from_entries([
            (GOVERNOR_OWNER, GOVERNOR_A),
            (GOVERNOR_ADMIN, GOVERNOR_B),
            (MULTISIG, MULTISIG_M),
            (LOCKED_SOV, LOCKED),
            (TIMELOCK_ADMIN, TIMELOCK),
        ])
    }

    fn dispatcher_with_guardian(
        guardian: Address,
    ) -> (GovernanceDispatcher<FakeBackend>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let backend = FakeBackend {
            guardian,
            recorder: recorder.clone(),
        };
        (
            GovernanceDispatcher::new(GovernanceContext::new(registry(), OPERATOR), backend),
            recorder,
        )
    }

    #[tokio::test]
    async fn test_cancel_relays_when_guardian_is_multisig() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        let submission = dispatcher.cancel_proposal(GOVERNOR_OWNER, 7).await.unwrap();
        assert_eq!(submission.multisig_tx_id, Some(U256::from(5u64)));

        assert_eq!(
            recorder.relayed(),
            vec![RelayRequest {
                multisig: MULTISIG_M,
                target: GOVERNOR_A,
                data: Bytes::from(b"cancel:7".to_vec()),
                sender: OPERATOR,
            }]
        );
        assert_eq!(
            recorder.calls(),
            vec![Call::Governor(GOVERNOR_A), Call::Guardian(GOVERNOR_A)]
        );
    }

    #[tokio::test]
    async fn test_cancel_refused_when_guardian_differs() {
        let (dispatcher, recorder) = dispatcher_with_guardian(Address::repeat_byte(0xee));

        let result = dispatcher.cancel_proposal(GOVERNOR_OWNER, 7).await;
        assert_matches!(
            result,
            Err(GovernanceError::GuardianMismatch { guardian, multisig })
                if guardian == Address::repeat_byte(0xee) && multisig == MULTISIG_M
        );
        assert!(recorder.relayed().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_uses_requested_governor() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        dispatcher.cancel_proposal(GOVERNOR_ADMIN, 3).await.unwrap();
        assert_eq!(recorder.relayed()[0].target, GOVERNOR_B);
        assert_eq!(recorder.calls()[0], Call::Governor(GOVERNOR_B));
    }

    #[tokio::test]
    async fn test_cancel_unknown_contract_type() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        let result = dispatcher.cancel_proposal("GovernorVesting", 1).await;
        assert_matches!(result, Err(GovernanceError::UnknownContract(name)) if name == "GovernorVesting");
        assert!(recorder.calls().is_empty());
        assert!(recorder.relayed().is_empty());
    }

    #[tokio::test]
    async fn test_queue_and_execute_pass_id_unchanged() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        dispatcher.queue_proposal(0).await.unwrap();
        dispatcher.execute_proposal(u64::MAX).await.unwrap();

        assert_eq!(
            recorder.calls(),
            vec![
                Call::Governor(GOVERNOR_A),
                Call::Queue(GOVERNOR_A, 0),
                Call::Governor(GOVERNOR_A),
                Call::Execute(GOVERNOR_A, u64::MAX),
            ]
        );
        // Direct sends never touch the multisig
        assert!(recorder.relayed().is_empty());
    }

    #[tokio::test]
    async fn test_accept_admin_relays_through_multisig() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        dispatcher.accept_admin(GOVERNOR_ADMIN).await.unwrap();
        assert_eq!(
            recorder.relayed(),
            vec![RelayRequest {
                multisig: MULTISIG_M,
                target: GOVERNOR_B,
                data: Bytes::from(b"accept".to_vec()),
                sender: OPERATOR,
            }]
        );
    }

    #[tokio::test]
    async fn test_transfer_locked_sov_adds_timelock_admin_once() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        dispatcher
            .transfer_locked_sov_ownership_to_governance()
            .await
            .unwrap();

        let relayed = recorder.relayed();
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].target, LOCKED);
        assert_eq!(relayed[0].multisig, MULTISIG_M);
        assert_eq!(
            relayed[0].data,
            Bytes::from([b"addAdmin:".as_slice(), TIMELOCK.as_bytes()].concat())
        );
        assert_eq!(recorder.calls(), vec![Call::LockedSov(LOCKED)]);
    }

    #[tokio::test]
    async fn test_missing_multisig_is_lookup_failure() {
        let recorder = Arc::new(Recorder::default());
        let backend = FakeBackend {
            guardian: MULTISIG_M,
            recorder: recorder.clone(),
        };
        let registry = ContractRegistry::from_entries([(GOVERNOR_OWNER, GOVERNOR_A)]);
        let dispatcher = GovernanceDispatcher::new(GovernanceContext::new(registry, OPERATOR), backend);

        let result = dispatcher.accept_admin(GOVERNOR_OWNER).await;
        assert_matches!(result, Err(GovernanceError::UnknownContract(name)) if name == MULTISIG);
        assert!(recorder.relayed().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_routes_actions() {
        let (dispatcher, recorder) = dispatcher_with_guardian(MULTISIG_M);

        let outcome = dispatcher
            .dispatch(&GovernanceAction::Queue { proposal_id: 11 })
            .await
            .unwrap();
        assert_matches!(outcome, ActionOutcome::Sent(info) if info.to == Some(GOVERNOR_A));

        let outcome = dispatcher
            .dispatch(&GovernanceAction::Cancel {
                contract: GOVERNOR_OWNER.to_string(),
                proposal_id: 11,
            })
            .await
            .unwrap();
        assert_matches!(outcome, ActionOutcome::Relayed(_));

        let outcome = dispatcher
            .dispatch(&GovernanceAction::TransferLockedSovOwnership)
            .await
            .unwrap();
        assert_matches!(outcome, ActionOutcome::Relayed(submission) if submission.tx.to == Some(LOCKED));

        assert_eq!(recorder.relayed().len(), 2);
    }
}
