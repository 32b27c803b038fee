//! Core types for sentinel
//!
//! Addresses, 32-byte digests, transaction proposals, the HTTP wire
//! types shared by the orchestrator and its clients, and configuration.

pub mod address;
pub mod api;
pub mod config;
pub mod digest;
pub mod proposal;

pub use address::Address;
pub use config::{Config, ConfigError};
pub use digest::{keccak256, Digest};
pub use proposal::{ProposalId, ProposalState, SignerRole, TransactionProposal};
