//! Cryptographic primitives for sentinel
//!
//! Digest normalization, secp256k1 keys and recoverable ECDSA signatures
//! over raw 32-byte digests, built on the RustCrypto `k256` crate.

pub mod digest;
pub mod keys;
pub mod signature;

pub use digest::normalize_digest;
pub use keys::{PrivateKey, PublicKey};
pub use signature::{
    recover_address, recover_public_key, sign_digest, verify_digest_signature, Approval, RecoverableSignature,
    SIGNATURE_LEN,
};
