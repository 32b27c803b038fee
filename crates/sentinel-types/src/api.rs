//! Request and response bodies of the orchestrator HTTP API

use crate::address::Address;
use crate::digest::Digest;
use crate::proposal::{ProposalId, ProposalState, SignerRole, TransactionProposal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub to: String,
    /// Decimal amount in the smallest unit
    pub value: String,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransactionResponse {
    pub tx_id: ProposalId,
    pub safe_tx_hash: Digest,
    pub required_signatures: usize,
    pub current_signatures: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignTransactionRequest {
    pub signer_address: String,
    /// `0x`-prefixed 65-byte `r || s || v`
    pub signature: String,
}

/// Outcome of an accepted signature submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub accepted: bool,
    pub collected_count: usize,
    pub threshold: usize,
    pub state: ProposalState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_role: Option<SignerRole>,
}

/// Snapshot of a proposal's quorum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumStatus {
    pub proposal_id: ProposalId,
    pub state: ProposalState,
    pub collected_count: usize,
    pub threshold: usize,
    pub total_signers: usize,
    pub signer_identities: Vec<Address>,
}

/// What the execution sink reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub proposal_id: ProposalId,
    pub state: ProposalState,
    pub execution_result: ExecutionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signer: Address,
    pub signer_role: Option<SignerRole>,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInfoResponse {
    pub tx_id: ProposalId,
    pub transaction: TransactionProposal,
    pub signatures: Vec<SignatureInfo>,
    pub status: ProposalState,
    pub ready_to_execute: bool,
    pub safe_tx_hash: Digest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerEntry {
    pub address: Address,
    pub role: Option<SignerRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatusResponse {
    pub tx_id: ProposalId,
    pub status: ProposalState,
    pub signatures_collected: usize,
    pub required_signatures: usize,
    pub signers: Vec<SignerEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnersByRole {
    pub humans: Vec<Address>,
    pub agents: Vec<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeInfoResponse {
    pub threshold: usize,
    pub total_signers: usize,
    pub owners: OwnersByRole,
    pub next_nonce: u64,
}
