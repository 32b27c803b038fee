//! Per-proposal quorum state machine

use crate::policy::QuorumPolicy;
use chrono::{DateTime, Utc};
use sentinel_crypto::{Approval, RecoverableSignature};
use sentinel_errors::{Error, Result};
use sentinel_types::api::{ExecutionResult, QuorumStatus, SubmitReceipt};
use sentinel_types::{Address, ProposalState, SignerRole, TransactionProposal};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An accepted signature and when it arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecord {
    pub approval: Approval,
    pub role: Option<SignerRole>,
    pub received_at: DateTime<Utc>,
}

/// Signatures collected for one proposal.
///
/// Rejected submissions never mutate the state. `collected` holds at
/// most one signature per identity.
#[derive(Debug, Clone)]
pub struct QuorumState {
    proposal: TransactionProposal,
    policy: Arc<QuorumPolicy>,
    collected: BTreeMap<Address, SignatureRecord>,
    state: ProposalState,
    execution: Option<ExecutionResult>,
}

impl QuorumState {
    pub fn new(proposal: TransactionProposal, policy: Arc<QuorumPolicy>) -> Self {
        Self {
            proposal,
            policy,
            collected: BTreeMap::new(),
            state: ProposalState::Open,
            execution: None,
        }
    }

    pub fn proposal(&self) -> &TransactionProposal {
        &self.proposal
    }

    pub fn state(&self) -> ProposalState {
        self.state
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }

    pub fn threshold(&self) -> usize {
        self.policy.threshold()
    }

    pub fn execution(&self) -> Option<&ExecutionResult> {
        self.execution.as_ref()
    }

    /// Records ordered by signer address
    pub fn records(&self) -> impl Iterator<Item = &SignatureRecord> {
        self.collected.values()
    }

    /// Approvals ordered by signer address
    pub fn approvals(&self) -> Vec<Approval> {
        self.collected.values().map(|r| r.approval).collect()
    }

    /// Record `signature` from `signer`.
    ///
    /// Checks, in order: the signature recovers to `signer` over the
    /// proposal digest, `signer` is admitted by the policy, `signer` has
    /// not signed yet. Without an owner list the first `total_signers`
    /// distinct identities take the seats and later ones are refused, so
    /// the collected count never exceeds `total_signers`. Reaching the threshold moves `Open` to `Ready`.
    /// After execution, signatures are still recorded but the state stays
    /// `Executed`.
    pub fn submit(
        &mut self,
        signer: Address,
        signature: RecoverableSignature,
    ) -> Result<SubmitReceipt> {
        let approval = Approval::new(signer, signature);
        approval.verify(&self.proposal.digest)?;

        if !self.policy.admits(&signer) {
            return Err(Error::UnauthorizedSigner(signer.to_string()));
        }

        if self.collected.contains_key(&signer) {
            return Err(Error::DuplicateSigner(signer.to_string()));
        }

        if !self.policy.is_restricted() && self.collected.len() >= self.policy.total_signers() {
            return Err(Error::UnauthorizedSigner(format!(
                "{signer}: all {} signer seats are taken",
                self.policy.total_signers()
            )));
        }

        let role = self.policy.role_of(&signer);
        self.collected.insert(
            signer,
            SignatureRecord {
                approval,
                role,
                received_at: Utc::now(),
            },
        );

        if self.state == ProposalState::Open && self.collected.len() >= self.threshold() {
            self.state = ProposalState::Ready;
        }

        Ok(SubmitReceipt {
            accepted: true,
            collected_count: self.collected.len(),
            threshold: self.threshold(),
            state: self.state,
            signer_role: role,
        })
    }

    /// Move `Ready` to `Executed`.
    ///
    /// The caller triggers the external execution exactly when this
    /// returns `Ok`.
    pub fn begin_execution(&mut self) -> Result<()> {
        match self.state {
            ProposalState::Open => Err(Error::QuorumNotMet {
                collected: self.collected.len(),
                threshold: self.threshold(),
            }),
            ProposalState::Executed => Err(Error::AlreadyExecuted(self.proposal.id.to_string())),
            ProposalState::Ready => {
                self.state = ProposalState::Executed;
                Ok(())
            }
        }
    }

    /// Store what the execution sink reported. The state is not rolled
    /// back on failure.
    pub fn record_execution(&mut self, result: ExecutionResult) {
        self.execution = Some(result);
    }

    pub fn status(&self) -> QuorumStatus {
        QuorumStatus {
            proposal_id: self.proposal.id,
            state: self.state,
            collected_count: self.collected.len(),
            threshold: self.threshold(),
            total_signers: self.policy.total_signers(),
            signer_identities: self.collected.keys().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sentinel_crypto::{sign_digest, PrivateKey};
    use sentinel_types::Digest;

    fn proposal() -> TransactionProposal {
        TransactionProposal::new(Address::new([0x6f; 20]), 1_000, None, 0)
    }

    fn keys(n: usize) -> Vec<PrivateKey> {
        (0..n).map(|_| PrivateKey::random()).collect()
    }

    fn open_state(threshold: usize, total: usize) -> QuorumState {
        QuorumState::new(
            proposal(),
            Arc::new(QuorumPolicy::new(threshold, total).unwrap()),
        )
    }

    fn sign(state: &QuorumState, key: &PrivateKey) -> RecoverableSignature {
        sign_digest(key, &state.proposal().digest).unwrap()
    }

    #[test]
    fn test_reaches_ready_at_threshold() {
        let mut state = open_state(2, 3);
        let keys = keys(3);

        let receipt = state.submit(keys[0].address(), sign(&state, &keys[0])).unwrap();
        assert_eq!(receipt.collected_count, 1);
        assert_eq!(receipt.state, ProposalState::Open);

        let receipt = state.submit(keys[1].address(), sign(&state, &keys[1])).unwrap();
        assert_eq!(receipt.collected_count, 2);
        assert_eq!(receipt.state, ProposalState::Ready);

        // Extra signatures after Ready are kept
        let receipt = state.submit(keys[2].address(), sign(&state, &keys[2])).unwrap();
        assert_eq!(receipt.collected_count, 3);
        assert_eq!(receipt.state, ProposalState::Ready);
    }

    #[test]
    fn test_duplicate_signer_rejected_without_mutation() {
        let mut state = open_state(2, 3);
        let key = PrivateKey::random();
        let signature = sign(&state, &key);

        state.submit(key.address(), signature).unwrap();
        let err = state.submit(key.address(), signature).unwrap_err();
        assert_eq!(err, Error::DuplicateSigner(key.address().to_string()));
        assert_eq!(state.collected_count(), 1);
        assert_eq!(state.state(), ProposalState::Open);
    }

    #[test]
    fn test_signature_for_other_identity_rejected() {
        let mut state = open_state(1, 2);
        let signer = PrivateKey::random();
        let claimed = PrivateKey::random();

        let err = state
            .submit(claimed.address(), sign(&state, &signer))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSignature(_)));
        assert_eq!(state.collected_count(), 0);
    }

    #[test]
    fn test_signature_over_other_digest_rejected() {
        let mut state = open_state(1, 2);
        let key = PrivateKey::random();
        let signature = sign_digest(&key, &Digest::keccak(b"something else")).unwrap();

        assert!(matches!(
            state.submit(key.address(), signature),
            Err(Error::InvalidSignature(_))
        ));
        assert_eq!(state.state(), ProposalState::Open);
    }

    #[test]
    fn test_non_owner_rejected() {
        let owners = keys(2);
        let policy = QuorumPolicy::new(1, 2)
            .unwrap()
            .with_owners([
                (owners[0].address(), SignerRole::Human),
                (owners[1].address(), SignerRole::Agent),
            ])
            .unwrap();
        let mut state = QuorumState::new(proposal(), Arc::new(policy));

        let outsider = PrivateKey::random();
        let err = state
            .submit(outsider.address(), sign(&state, &outsider))
            .unwrap_err();
        assert!(matches!(err, Error::UnauthorizedSigner(_)));

        let receipt = state
            .submit(owners[1].address(), sign(&state, &owners[1]))
            .unwrap();
        assert_eq!(receipt.signer_role, Some(SignerRole::Agent));
        assert_eq!(receipt.state, ProposalState::Ready);
    }

    #[test]
    fn test_open_policy_caps_collected_at_total_signers() {
        let mut state = open_state(4, 5);
        let keys = keys(7);

        for key in keys.iter().take(5) {
            state.submit(key.address(), sign(&state, key)).unwrap();
        }
        for key in keys.iter().skip(5) {
            let err = state.submit(key.address(), sign(&state, key)).unwrap_err();
            assert!(matches!(err, Error::UnauthorizedSigner(_)));
        }
        assert_eq!(state.collected_count(), 5);
        assert_eq!(state.status().total_signers, 5);

        // A seated signer resubmitting is still a duplicate, not a seat error
        let err = state
            .submit(keys[0].address(), sign(&state, &keys[0]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSigner(_)));
    }

    #[test]
    fn test_execution_transitions() {
        let mut state = open_state(1, 1);
        assert_eq!(
            state.begin_execution().unwrap_err(),
            Error::QuorumNotMet {
                collected: 0,
                threshold: 1
            }
        );

        let key = PrivateKey::random();
        state.submit(key.address(), sign(&state, &key)).unwrap();
        state.begin_execution().unwrap();
        assert_eq!(state.state(), ProposalState::Executed);

        assert!(matches!(
            state.begin_execution(),
            Err(Error::AlreadyExecuted(_))
        ));
    }

    #[test]
    fn test_status_lists_identities() {
        let mut state = open_state(4, 5);
        let keys = keys(2);
        for key in &keys {
            state.submit(key.address(), sign(&state, key)).unwrap();
        }
        let status = state.status();
        assert_eq!(status.collected_count, 2);
        assert_eq!(status.threshold, 4);
        assert_eq!(status.total_signers, 5);
        assert_eq!(status.state, ProposalState::Open);
        let mut expected: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        expected.sort();
        assert_eq!(status.signer_identities, expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_arrival_order_does_not_matter(order in Just((0..5usize).collect::<Vec<_>>()).prop_shuffle()) {
            let keys = keys(5);
            let mut state = open_state(4, 5);
            let signatures: Vec<_> = keys.iter().map(|k| sign(&state, k)).collect();

            for (accepted, &i) in order.iter().enumerate() {
                let receipt = state.submit(keys[i].address(), signatures[i]).unwrap();
                let expected = if accepted + 1 >= 4 { ProposalState::Ready } else { ProposalState::Open };
                prop_assert_eq!(receipt.state, expected);
                prop_assert_eq!(receipt.collected_count, accepted + 1);
            }
        }
    }
}
