//! Digest normalization
//!
//! Upstream components hand out transaction hashes as hex strings. Every
//! signer must turn the same string into the same 32 bytes, so malformed
//! shapes are repaired deterministically or rejected.

use sentinel_errors::{Error, Result};
use sentinel_types::Digest;

/// `0x` plus 64 hex characters
const CANONICAL_LEN: usize = 66;

/// Turn a hex hash string into the 32 bytes to sign.
///
/// - `0x` + 64 hex chars: decoded as is.
/// - longer than 66 chars: keccak256 of the string's UTF-8 bytes.
/// - anything else: `0x` added when missing, payload left-padded with `0`
///   to 64 chars when short, then decoded.
///
/// Fails with `InvalidDigestLength` unless exactly 32 bytes result.
pub fn normalize_digest(input: &str) -> Result<Digest> {
    // Lengths are in characters; a multibyte character must not push a
    // canonical-length string into the hashing branch.
    let chars = input.chars().count();
    if chars == CANONICAL_LEN && input.starts_with("0x") {
        return decode(&input[2..]);
    }

    if chars > CANONICAL_LEN {
        return Ok(Digest::keccak(input.as_bytes()));
    }

    let payload = input.strip_prefix("0x").unwrap_or(input);
    // A 66-char string without the prefix grows past 64 nibbles here and
    // fails the final length check.
    if payload.chars().count() + 2 < CANONICAL_LEN {
        decode(&format!("{payload:0>64}"))
    } else {
        decode(payload)
    }
}

fn decode(payload: &str) -> Result<Digest> {
    let bytes = hex::decode(payload).map_err(|e| Error::InvalidHex(e.to_string()))?;
    Digest::from_slice(&bytes)
}
