//! In-memory keyring backend

use async_trait::async_trait;
use sentinel_crypto::{sign_digest, PrivateKey, RecoverableSignature};
use sentinel_types::{Digest, SignerRole};
use std::collections::BTreeMap;

use crate::{KeyInfo, Keyring, KeyringError};

/// In-memory keyring.
///
/// Keys live only for the lifetime of the process and are wiped when
/// dropped. Suitable for demos and for agents that receive their key from
/// the environment at startup.
#[derive(Debug, Default)]
pub struct MemoryKeyring {
    keys: BTreeMap<String, StoredKey>,
}

#[derive(Debug)]
struct StoredKey {
    privkey: PrivateKey,
    info: KeyInfo,
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub(crate) fn insert(
        &mut self,
        name: &str,
        role: SignerRole,
        privkey: PrivateKey,
    ) -> Result<KeyInfo, KeyringError> {
        if self.keys.contains_key(name) {
            return Err(KeyringError::KeyExists(name.to_string()));
        }
        let pubkey = privkey.public_key();
        let info = KeyInfo {
            name: name.to_string(),
            role,
            address: pubkey.to_address(),
            pubkey,
        };
        self.keys.insert(
            name.to_string(),
            StoredKey {
                privkey,
                info: info.clone(),
            },
        );
        Ok(info)
    }
}

#[async_trait]
impl Keyring for MemoryKeyring {
    async fn import_private_key(
        &mut self,
        name: &str,
        role: SignerRole,
        private_key_hex: &str,
    ) -> Result<KeyInfo, KeyringError> {
        let privkey = PrivateKey::from_hex(private_key_hex)
            .map_err(|_| KeyringError::InvalidKey(name.to_string()))?;
        self.insert(name, role, privkey)
    }

    async fn list_keys(&self) -> Result<Vec<KeyInfo>, KeyringError> {
        Ok(self.keys.values().map(|k| k.info.clone()).collect())
    }

    async fn get_key(&self, name: &str) -> Result<KeyInfo, KeyringError> {
        self.keys
            .get(name)
            .map(|k| k.info.clone())
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))
    }

    async fn sign_digest(
        &self,
        name: &str,
        digest: &Digest,
    ) -> Result<RecoverableSignature, KeyringError> {
        let key = self
            .keys
            .get(name)
            .ok_or_else(|| KeyringError::KeyNotFound(name.to_string()))?;

        sign_digest(&key.privkey, digest)
            .map_err(|e| KeyringError::BackendError(format!("failed to sign: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_crypto::recover_address;

    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[tokio::test]
    async fn test_memory_keyring_basic_operations() {
        let mut keyring = MemoryKeyring::new();

        let key_info = keyring
            .insert("test_key", SignerRole::Human, PrivateKey::random())
            .unwrap();
        assert_eq!(key_info.name, "test_key");
        assert_eq!(key_info.role, SignerRole::Human);

        let keys = keyring.list_keys().await.unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].name, "test_key");

        let retrieved = keyring.get_key("test_key").await.unwrap();
        assert_eq!(retrieved.address, key_info.address);

        let digest = Digest::keccak(b"test message");
        let signature = keyring.sign_digest("test_key", &digest).await.unwrap();
        assert_eq!(recover_address(&digest, &signature).unwrap(), key_info.address);

        assert!(matches!(
            keyring.get_key("non_existent").await,
            Err(KeyringError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_private_key() {
        let mut keyring = MemoryKeyring::new();
        let info = keyring
            .import_private_key("cfo", SignerRole::Agent, TEST_KEY)
            .await
            .unwrap();
        assert_eq!(
            info.address.to_string(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[tokio::test]
    async fn test_import_invalid_key() {
        let mut keyring = MemoryKeyring::new();
        let result = keyring
            .import_private_key("bad", SignerRole::Human, "0x1234")
            .await;
        assert!(matches!(result, Err(KeyringError::InvalidKey(_))));
        assert!(keyring.is_empty());
    }

    #[tokio::test]
    async fn test_memory_keyring_duplicate_key() {
        let mut keyring = MemoryKeyring::new();

        keyring
            .insert("duplicate_key", SignerRole::Human, PrivateKey::random())
            .unwrap();

        let result = keyring
            .import_private_key("duplicate_key", SignerRole::Agent, TEST_KEY)
            .await;
        assert!(matches!(result, Err(KeyringError::KeyExists(_))));
    }

    #[tokio::test]
    async fn test_sign_with_missing_key() {
        let keyring = MemoryKeyring::new();
        let result = keyring.sign_digest("ghost", &Digest::ZERO).await;
        assert!(matches!(result, Err(KeyringError::KeyNotFound(_))));
    }
}
