//! Where a ready proposal goes once execution is requested

use async_trait::async_trait;
use sentinel_crypto::{Approval, SIGNATURE_LEN};
use sentinel_errors::Result;
use sentinel_types::TransactionProposal;

/// Receives a proposal together with its collected approvals.
///
/// Called at most once per proposal, with approvals sorted by signer
/// address. Returns an identifier for the submitted transaction.
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    async fn execute(
        &self,
        proposal: &TransactionProposal,
        approvals: &[Approval],
    ) -> Result<String>;
}

/// Concatenate `r || s || v` of each approval in address order
pub fn packed_signatures(approvals: &[Approval]) -> Vec<u8> {
    let mut sorted: Vec<&Approval> = approvals.iter().collect();
    sorted.sort_by_key(|a| a.signer);

    let mut packed = Vec::with_capacity(sorted.len() * SIGNATURE_LEN);
    for approval in sorted {
        packed.extend_from_slice(&approval.signature.to_bytes());
    }
    packed
}
