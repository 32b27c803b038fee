//! Transaction proposals and their lifecycle states

use crate::address::Address;
use crate::digest::Digest;
use chrono::{DateTime, Utc};
use sentinel_errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Proposal identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(Uuid);

impl ProposalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProposalId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::NotFound(format!("proposal {s}")))
    }
}

/// Quorum lifecycle of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    /// Collecting signatures, threshold not yet met
    Open,
    /// Threshold met, awaiting execution
    Ready,
    /// Execution triggered; terminal
    Executed,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalState::Open => write!(f, "open"),
            ProposalState::Ready => write!(f, "ready"),
            ProposalState::Executed => write!(f, "executed"),
        }
    }
}

/// Who stands behind a signing key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerRole {
    Human,
    /// Automated agent
    Agent,
}

impl fmt::Display for SignerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignerRole::Human => write!(f, "human"),
            SignerRole::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for SignerRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human" => Ok(SignerRole::Human),
            "agent" | "ai_agent" => Ok(SignerRole::Agent),
            other => Err(Error::InvalidRequest(format!("unknown signer role: {other}"))),
        }
    }
}

/// A proposed wallet transaction.
///
/// Immutable once built; `digest` is the exact byte sequence every signer
/// signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionProposal {
    pub id: ProposalId,
    pub destination: Address,
    /// Amount in the smallest unit
    #[serde(with = "u128_string")]
    pub value: u128,
    #[serde(with = "hex_bytes", default, skip_serializing_if = "Option::is_none")]
    pub call_data: Option<Vec<u8>>,
    pub nonce: u64,
    pub digest: Digest,
    pub created_at: DateTime<Utc>,
}

impl TransactionProposal {
    /// Build a proposal and derive its digest
    pub fn new(
        destination: Address,
        value: u128,
        call_data: Option<Vec<u8>>,
        nonce: u64,
    ) -> Self {
        let call_data = call_data.filter(|d| !d.is_empty());
        let digest = Digest::keccak(Self::encode_for_signing(
            &destination,
            value,
            call_data.as_deref().unwrap_or_default(),
            nonce,
        ));
        Self {
            id: ProposalId::new(),
            destination,
            value,
            call_data,
            nonce,
            digest,
            created_at: Utc::now(),
        }
    }

    /// Signing payload: `to || value(32, BE) || data || operation || nonce(32, BE)`.
    ///
    /// Operation is always 0 (plain call).
    pub fn encode_for_signing(destination: &Address, value: u128, data: &[u8], nonce: u64) -> Vec<u8> {
        let mut out = Vec::with_capacity(20 + 32 + data.len() + 1 + 32);
        out.extend_from_slice(destination.as_bytes());
        out.extend_from_slice(&[0u8; 16]);
        out.extend_from_slice(&value.to_be_bytes());
        out.extend_from_slice(data);
        out.push(0);
        out.extend_from_slice(&[0u8; 24]);
        out.extend_from_slice(&nonce.to_be_bytes());
        out
    }
}

mod u128_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_str(&format!("0x{}", hex::encode(bytes))),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom))
            .transpose()
    }
}
