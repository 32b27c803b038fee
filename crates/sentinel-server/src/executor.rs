//! Execution sink used by the orchestrator

use async_trait::async_trait;
use sentinel_crypto::Approval;
use sentinel_errors::Result;
use sentinel_quorum::{packed_signatures, ExecutionSink};
use sentinel_types::{Digest, TransactionProposal};
use tracing::info;

/// Logs the proposal and returns a mock transaction hash instead of
/// broadcasting.
///
/// The hash is `keccak256(digest || packed signatures)`, so the same
/// approvals always yield the same hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

#[async_trait]
impl ExecutionSink for LoggingExecutor {
    async fn execute(
        &self,
        proposal: &TransactionProposal,
        approvals: &[Approval],
    ) -> Result<String> {
        let packed = packed_signatures(approvals);
        let mut preimage = Vec::with_capacity(32 + packed.len());
        preimage.extend_from_slice(proposal.digest.as_bytes());
        preimage.extend_from_slice(&packed);
        let tx_hash = Digest::keccak(&preimage).to_hex();

        info!(
            proposal_id = %proposal.id,
            to = %proposal.destination,
            value = %proposal.value,
            nonce = proposal.nonce,
            signatures = approvals.len(),
            signatures_hex = %format!("0x{}", hex::encode(&packed)),
            %tx_hash,
            "would submit multisig transaction"
        );
        Ok(tx_hash)
    }
}
