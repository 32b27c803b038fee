//! Concurrent registry of proposals and their quorum states

use crate::policy::QuorumPolicy;
use crate::sink::ExecutionSink;
use crate::state::{QuorumState, SignatureRecord};
use sentinel_crypto::RecoverableSignature;
use sentinel_errors::{Error, Result};
use sentinel_types::api::{ExecutionReport, ExecutionResult, QuorumStatus, SubmitReceipt};
use sentinel_types::{Address, ProposalId, TransactionProposal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Everything known about one proposal at a point in time
#[derive(Debug, Clone)]
pub struct ProposalSnapshot {
    pub proposal: TransactionProposal,
    pub status: QuorumStatus,
    pub records: Vec<SignatureRecord>,
    pub execution: Option<ExecutionResult>,
}

/// Collects signatures for many proposals.
///
/// Each proposal sits behind its own mutex. Submissions and execution for
/// the same proposal are serialized; the map lock is only held long enough
/// to find the entry.
pub struct Collector {
    proposals: RwLock<HashMap<ProposalId, Arc<Mutex<QuorumState>>>>,
    policy: Arc<QuorumPolicy>,
    sink: Arc<dyn ExecutionSink>,
    open: Arc<AtomicUsize>,
}

impl Collector {
    pub fn new(policy: QuorumPolicy, sink: Arc<dyn ExecutionSink>) -> Self {
        Self {
            proposals: RwLock::new(HashMap::new()),
            policy: Arc::new(policy),
            sink,
            open: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn policy(&self) -> &QuorumPolicy {
        &self.policy
    }

    /// Start collecting for `proposal`. Its state begins `Open`.
    pub async fn register(&self, proposal: TransactionProposal) -> ProposalId {
        let id = proposal.id;
        let digest = proposal.digest;
        let state = QuorumState::new(proposal, Arc::clone(&self.policy));
        let previous = self
            .proposals
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(state)));
        if previous.is_none() {
            self.open.fetch_add(1, Ordering::SeqCst);
        }
        info!(proposal = %id, %digest, "registered proposal");
        id
    }

    async fn entry(&self, id: &ProposalId) -> Result<Arc<Mutex<QuorumState>>> {
        self.proposals
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("proposal {id}")))
    }

    /// Verify and record a signature for proposal `id`
    pub async fn submit_signature(
        &self,
        id: &ProposalId,
        signer: Address,
        signature: RecoverableSignature,
    ) -> Result<SubmitReceipt> {
        let entry = self.entry(id).await?;
        let mut state = entry.lock().await;

        match state.submit(signer, signature) {
            Ok(receipt) => {
                info!(
                    proposal = %id,
                    %signer,
                    collected = receipt.collected_count,
                    threshold = receipt.threshold,
                    state = %receipt.state,
                    "accepted signature"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(proposal = %id, %signer, error = %err, "rejected signature");
                Err(err)
            }
        }
    }

    pub async fn quorum_status(&self, id: &ProposalId) -> Result<QuorumStatus> {
        let entry = self.entry(id).await?;
        let state = entry.lock().await;
        Ok(state.status())
    }

    /// Hand a `Ready` proposal to the sink.
    ///
    /// The proposal is marked `Executed` before the sink runs and stays
    /// that way even when the sink fails; the failure is reported in the
    /// returned [`ExecutionResult`].
    ///
    /// The transition and the sink call run on a spawned task that owns the
    /// proposal lock, so dropping the returned future (a request timeout,
    /// a disconnected client) never abandons the sink halfway. The outcome
    /// is still recorded and visible through [`Collector::snapshot`].
    pub async fn execute(&self, id: &ProposalId) -> Result<ExecutionReport> {
        let entry = self.entry(id).await?;
        let sink = Arc::clone(&self.sink);
        let open = Arc::clone(&self.open);
        let id = *id;

        let task = tokio::spawn(async move {
            let mut state = entry.lock_owned().await;
            state.begin_execution()?;
            open.fetch_sub(1, Ordering::SeqCst);

            let approvals = state.approvals();
            debug!(proposal = %id, approvals = approvals.len(), "executing proposal");

            let execution_result = match sink.execute(state.proposal(), &approvals).await {
                Ok(tx_hash) => {
                    info!(proposal = %id, %tx_hash, "proposal executed");
                    ExecutionResult {
                        success: true,
                        tx_hash: Some(tx_hash),
                        message: None,
                    }
                }
                Err(err) => {
                    warn!(proposal = %id, error = %err, "execution sink failed");
                    ExecutionResult {
                        success: false,
                        tx_hash: None,
                        message: Some(err.to_string()),
                    }
                }
            };
            state.record_execution(execution_result.clone());

            Ok(ExecutionReport {
                proposal_id: id,
                state: state.state(),
                execution_result,
            })
        });

        task.await
            .map_err(|e| Error::Execution(format!("execution task for {id} aborted: {e}")))?
    }

    pub async fn snapshot(&self, id: &ProposalId) -> Result<ProposalSnapshot> {
        let entry = self.entry(id).await?;
        let state = entry.lock().await;
        Ok(ProposalSnapshot {
            proposal: state.proposal().clone(),
            status: state.status(),
            records: state.records().cloned().collect(),
            execution: state.execution().cloned(),
        })
    }

    /// Number of proposals not yet executed. Never waits on a proposal
    /// lock.
    pub fn open_count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}
