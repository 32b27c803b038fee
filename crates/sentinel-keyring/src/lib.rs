//! Key management for sentinel signers
//!
//! A keyring maps key names (the key handles) to private keys and signs
//! digests on request; callers only ever see public material. Each
//! [`Signer`] owns exactly one handle.

use async_trait::async_trait;
use sentinel_crypto::{PublicKey, RecoverableSignature};
use sentinel_types::{Address, Digest, SignerRole};
use serde::Serialize;
use thiserror::Error;

pub mod env;
pub mod memory;
pub mod signer;

pub use env::load_signers;
pub use memory::MemoryKeyring;
pub use signer::Signer;

#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("key not found:: {0}")]
    KeyNotFound(String),

    #[error("key already exists:: {0}")]
    KeyExists(String),

    #[error("invalid key material for {0}")]
    InvalidKey(String),

    #[error("backend error:: {0}")]
    BackendError(String),
}

impl From<KeyringError> for sentinel_errors::Error {
    fn from(err: KeyringError) -> Self {
        sentinel_errors::Error::SigningError(err.to_string())
    }
}

/// Public information about a stored key
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub name: String,
    pub role: SignerRole,
    pub pubkey: PublicKey,
    pub address: Address,
}

/// Trait for keyring implementations
#[async_trait]
pub trait Keyring: Send + Sync {
    /// Import a key from a private key hex string
    async fn import_private_key(
        &mut self,
        name: &str,
        role: SignerRole,
        private_key_hex: &str,
    ) -> Result<KeyInfo, KeyringError>;

    /// List all stored keys
    async fn list_keys(&self) -> Result<Vec<KeyInfo>, KeyringError>;

    /// Get a key by name
    async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError>;

    /// Sign a 32-byte digest directly, without any message prefix
    async fn sign_digest(
        &self,
        name: &str,
        digest: &Digest,
    ) -> Result<RecoverableSignature, KeyringError>;
}
