//! Fixed-width 32-byte digests

use sentinel_errors::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest as _, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Length of every digest handled by the protocol
pub const DIGEST_LEN: usize = 32;

/// Keccak-256 of arbitrary bytes
pub fn keccak256(data: impl AsRef<[u8]>) -> [u8; DIGEST_LEN] {
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&Keccak256::digest(data.as_ref()));
    out
}

/// Transaction digest - exactly the bytes every signer signs
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a slice, failing unless it holds exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| Error::InvalidDigestLength {
            expected: DIGEST_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Keccak-256 of `data`
    pub fn keccak(data: impl AsRef<[u8]>) -> Self {
        Self(keccak256(data))
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex, 66 characters
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Strict parse: `0x` followed by exactly 64 hex characters.
///
/// Lenient handling of malformed upstream hashes lives in
/// `sentinel_crypto::normalize_digest`.
impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s
            .strip_prefix("0x")
            .ok_or_else(|| Error::InvalidHex(format!("missing 0x prefix: {s}")))?;
        let bytes = hex::decode(payload).map_err(|e| Error::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
