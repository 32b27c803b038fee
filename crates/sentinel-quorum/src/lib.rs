//! Threshold signature collection for proposed transactions.
//!
//! [`QuorumState`] is the per-proposal state machine
//! (`Open -> Ready -> Executed`). [`Collector`] owns many of them, puts
//! each behind its own lock so that submissions and execution for one
//! proposal are serialized while different proposals proceed in
//! parallel, and triggers the [`ExecutionSink`] at most once per
//! proposal.

pub mod collector;
pub mod policy;
pub mod sink;
pub mod state;

pub use collector::{Collector, ProposalSnapshot};
pub use policy::QuorumPolicy;
pub use sink::{packed_signatures, ExecutionSink};
pub use state::{QuorumState, SignatureRecord};
