//! Signers: one identity bound to one key handle

use sentinel_crypto::Approval;
use sentinel_types::{Address, Digest, SignerRole};
use std::sync::Arc;
use tracing::debug;

use crate::{Keyring, KeyringError};

/// A signer whose key lives in a keyring under `name`.
///
/// Signing never touches the network; the digest is signed exactly as
/// given.
pub struct Signer<K: Keyring + ?Sized> {
    name: String,
    identity: Address,
    role: SignerRole,
    keyring: Arc<K>,
}

impl<K: Keyring + ?Sized> Signer<K> {
    /// Bind to an existing key handle
    pub async fn from_keyring(keyring: Arc<K>, name: &str) -> Result<Self, KeyringError> {
        let info = keyring.get_key(name).await?;
        Ok(Self {
            name: info.name,
            identity: info.address,
            role: info.role,
            keyring,
        })
    }

    /// One signer per stored key, in keyring order
    pub async fn all(keyring: Arc<K>) -> Result<Vec<Self>, KeyringError> {
        let keys = keyring.list_keys().await?;
        Ok(keys
            .into_iter()
            .map(|info| Self {
                name: info.name,
                identity: info.address,
                role: info.role,
                keyring: Arc::clone(&keyring),
            })
            .collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn role(&self) -> SignerRole {
        self.role
    }

    /// Sign `digest` and pair the signature with this signer's identity
    pub async fn sign(&self, digest: &Digest) -> Result<Approval, KeyringError> {
        let signature = self.keyring.sign_digest(&self.name, digest).await?;
        debug!(signer = %self.name, %digest, "signed digest");
        Ok(Approval::new(self.identity, signature))
    }
}

impl<K: Keyring + ?Sized> std::fmt::Debug for Signer<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("role", &self.role)
            .finish()
    }
}
