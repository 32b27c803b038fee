//! secp256k1 key wrappers

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sentinel_errors::{Error, Result};
use sentinel_types::Address;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// secp256k1 public key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

/// secp256k1 private key.
///
/// The inner `SigningKey` zeroizes its scalar on drop. `Debug` never
/// prints key material.
#[derive(Clone)]
pub struct PrivateKey(SigningKey);

impl PublicKey {
    pub fn from_verifying_key(key: VerifyingKey) -> Self {
        Self(key)
    }

    /// Parse a SEC1 encoded key, compressed or not
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|e| Error::InvalidRequest(format!("invalid public key: {e}")))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }

    /// Signer identity derived from this key
    pub fn to_address(&self) -> Address {
        let point = self.0.to_encoded_point(false);
        // An uncompressed point is always 65 bytes with the 0x04 tag
        Address::from_uncompressed_pubkey(point.as_bytes()).unwrap_or(Address::ZERO)
    }

    /// Compressed SEC1 encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.to_encoded_point(true).as_bytes().to_vec()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.to_bytes()))
    }
}

impl PrivateKey {
    /// Generate a fresh key from the OS RNG
    pub fn random() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::SigningError(format!("invalid private key: {e}")))
    }

    /// Parse a 32-byte hex private key, with or without `0x`
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let trimmed = hex_key.trim();
        let payload = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = Zeroizing::new(
            hex::decode(payload)
                .map_err(|_| Error::SigningError("private key is not valid hex".to_string()))?,
        );
        Self::from_bytes(&bytes)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(*self.0.verifying_key())
    }

    pub fn address(&self) -> Address {
        self.public_key().to_address()
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.0
    }

    /// Raw scalar bytes, wrapped so the copy is wiped when dropped
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(self.0.to_bytes().to_vec())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey({})", self.address())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.to_bytes())))
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        PublicKey::from_sec1_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}
