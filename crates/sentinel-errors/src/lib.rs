//! Error types shared by the sentinel crates.
//!
//! Every failure of the signature collection protocol is local and
//! synchronous. Nothing here is retried automatically; callers decide
//! whether a rejected submission should be attempted again.

use thiserror::Error;

/// Core error type for sentinel operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Digest did not normalize to exactly 32 bytes
    #[error("invalid digest length: expected {expected} bytes, got {actual}")]
    InvalidDigestLength { expected: usize, actual: usize },

    /// Input was not valid hexadecimal
    #[error("invalid hex:: {0}")]
    InvalidHex(String),

    /// Key handle missing or unusable
    #[error("signing error:: {0}")]
    SigningError(String),

    /// Signature malformed or recovering to another identity
    #[error("invalid signature:: {0}")]
    InvalidSignature(String),

    /// Identity already has a recorded signature for this proposal
    #[error("duplicate signer:: {0}")]
    DuplicateSigner(String),

    /// Identity is not one of the configured owners
    #[error("unauthorized signer:: {0}")]
    UnauthorizedSigner(String),

    /// Execution requested before the threshold was reached
    #[error("quorum not met: collected {collected}, need {threshold}")]
    QuorumNotMet { collected: usize, threshold: usize },

    /// Proposal was already executed
    #[error("already executed:: {0}")]
    AlreadyExecuted(String),

    #[error("invalid threshold {threshold} for {total_signers} signers")]
    InvalidThreshold {
        threshold: usize,
        total_signers: usize,
    },

    /// Not found error
    #[error("not found:: {0}")]
    NotFound(String),

    /// Invalid request error
    #[error("invalid request:: {0}")]
    InvalidRequest(String),

    /// Execution sink reported a failure
    #[error("execution failed:: {0}")]
    Execution(String),
}

impl Error {
    /// Stable numeric code for this error
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidDigestLength { .. } => codes::INVALID_DIGEST,
            Error::InvalidHex(_) => codes::INVALID_DIGEST,
            Error::SigningError(_) => codes::SIGNING,
            Error::InvalidSignature(_) => codes::INVALID_SIGNATURE,
            Error::DuplicateSigner(_) => codes::DUPLICATE_SIGNER,
            Error::UnauthorizedSigner(_) => codes::UNAUTHORIZED,
            Error::QuorumNotMet { .. } => codes::QUORUM_NOT_MET,
            Error::AlreadyExecuted(_) => codes::ALREADY_EXECUTED,
            Error::InvalidThreshold { .. } => codes::INVALID_ARGUMENT,
            Error::NotFound(_) => codes::NOT_FOUND,
            Error::InvalidRequest(_) => codes::INVALID_ARGUMENT,
            Error::Execution(_) => codes::INTERNAL,
        }
    }

    /// Whether the error is a rejection of the caller's input rather than
    /// a conflict with the current proposal state
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::DuplicateSigner(_)
                | Error::QuorumNotMet { .. }
                | Error::AlreadyExecuted(_)
                | Error::NotFound(_)
                | Error::Execution(_)
        )
    }
}

/// Result type alias for sentinel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes reported alongside error messages
pub mod codes {
    /// Success
    pub const OK: u32 = 0;
    /// Internal error
    pub const INTERNAL: u32 = 1;
    /// Invalid argument
    pub const INVALID_ARGUMENT: u32 = 3;
    /// Not found
    pub const NOT_FOUND: u32 = 5;
    /// Unauthorized
    pub const UNAUTHORIZED: u32 = 7;
    /// Digest could not be normalized
    pub const INVALID_DIGEST: u32 = 20;
    /// Signing failed
    pub const SIGNING: u32 = 21;
    /// Signature did not verify
    pub const INVALID_SIGNATURE: u32 = 22;
    /// Signer already recorded
    pub const DUPLICATE_SIGNER: u32 = 23;
    /// Threshold not reached
    pub const QUORUM_NOT_MET: u32 = 24;
    /// Proposal already executed
    pub const ALREADY_EXECUTED: u32 = 25;
}
