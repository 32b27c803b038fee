//! Signer addresses

use crate::digest::keccak256;
use sentinel_errors::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Account address - 20 bytes
///
/// Derived as the last 20 bytes of keccak256 over the uncompressed
/// secp256k1 public key (without the 0x04 tag). Displayed as lowercase
/// `0x` hex; parsing accepts any case.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive an address from an uncompressed SEC1 public key.
    ///
    /// Accepts the 65-byte tagged form or the bare 64-byte `x || y`.
    pub fn from_uncompressed_pubkey(pubkey: &[u8]) -> Result<Self, Error> {
        let xy = match pubkey.len() {
            65 if pubkey[0] == 0x04 => &pubkey[1..],
            64 => pubkey,
            len => {
                return Err(Error::InvalidRequest(format!(
                    "expected uncompressed public key, got {len} bytes"
                )))
            }
        };
        let hash = keccak256(xy);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash[12..]);
        Ok(Self(bytes))
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if payload.len() != 40 {
            return Err(Error::InvalidRequest(format!("invalid address: {s}")));
        }
        let decoded = hex::decode(payload).map_err(|e| Error::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
