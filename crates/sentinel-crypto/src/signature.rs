//! Recoverable ECDSA signatures over raw digests
//!
//! The digest is signed as is: no re-hashing and no message prefix, which
//! is what wallet contracts expect from an owner's raw-hash signature.
//!
//! Wire format is 65 bytes `r || s || v`, big-endian, with `v = 27 + y
//! parity`. Only 27 and 28 are accepted when decoding.

use crate::keys::{PrivateKey, PublicKey};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sentinel_errors::{Error, Result};
use sentinel_types::{Address, Digest};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Encoded signature length
pub const SIGNATURE_LEN: usize = 65;

/// Offset added to the raw recovery id
const V_OFFSET: u8 = 27;

/// `(r, s, v)` signature from which the signer's key can be recovered
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 27 or 28
    pub v: u8,
}

impl RecoverableSignature {
    fn from_parts(signature: &Signature, recovery_id: RecoveryId) -> Self {
        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self {
            r,
            s,
            v: V_OFFSET + recovery_id.to_byte(),
        }
    }

    /// Decode the 65-byte wire format
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(Error::InvalidSignature(format!(
                "expected {SIGNATURE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let v = bytes[64];
        if v != V_OFFSET && v != V_OFFSET + 1 {
            return Err(Error::InvalidSignature(format!(
                "recovery byte must be 27 or 28, got {v}"
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v })
    }

    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    /// `0x`-prefixed lowercase hex, 132 characters
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Raw recovery id, 0 or 1
    pub fn recovery_id(&self) -> u8 {
        self.v - V_OFFSET
    }

    fn to_k256(self) -> Result<(Signature, RecoveryId)> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature = Signature::from_slice(&rs)
            .map_err(|e| Error::InvalidSignature(format!("malformed r/s: {e}")))?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id())
            .ok_or_else(|| Error::InvalidSignature(format!("bad recovery byte {}", self.v)))?;
        Ok((signature, recovery_id))
    }
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({})", self.to_hex())
    }
}

impl FromStr for RecoverableSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let payload = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(payload).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl Serialize for RecoverableSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A signer's signature over one proposal digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub signer: Address,
    pub signature: RecoverableSignature,
}

impl Approval {
    pub fn new(signer: Address, signature: RecoverableSignature) -> Self {
        Self { signer, signature }
    }

    /// Check that the signature recovers to `signer` over `digest`
    pub fn verify(&self, digest: &Digest) -> Result<()> {
        verify_digest_signature(&self.signer, digest, &self.signature)
    }
}

/// Sign a 32-byte digest with RFC 6979 deterministic nonces.
///
/// The result is low-S normalized.
pub fn sign_digest(key: &PrivateKey, digest: &Digest) -> Result<RecoverableSignature> {
    let (signature, recovery_id) = key
        .signing_key()
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| Error::SigningError(e.to_string()))?;

    let (signature, recovery_id) = match signature.normalize_s() {
        Some(normalized) => (
            normalized,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    Ok(RecoverableSignature::from_parts(&signature, recovery_id))
}

/// Recover the public key that produced `signature` over `digest`
pub fn recover_public_key(digest: &Digest, signature: &RecoverableSignature) -> Result<PublicKey> {
    let (sig, recovery_id) = signature.to_k256()?;
    VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map(PublicKey::from_verifying_key)
        .map_err(|e| Error::InvalidSignature(format!("recovery failed: {e}")))
}

pub fn recover_address(digest: &Digest, signature: &RecoverableSignature) -> Result<Address> {
    recover_public_key(digest, signature).map(|key| key.to_address())
}

/// Verify that `signature` over `digest` recovers to `expected`
pub fn verify_digest_signature(
    expected: &Address,
    digest: &Digest,
    signature: &RecoverableSignature,
) -> Result<()> {
    let recovered = recover_address(digest, signature)?;
    if &recovered != expected {
        return Err(Error::InvalidSignature(format!(
            "signature recovers to {recovered}, expected {expected}"
        )));
    }
    Ok(())
}
