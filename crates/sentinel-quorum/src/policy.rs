//! Threshold and owner set applied to proposals

use sentinel_errors::{Error, Result};
use sentinel_types::config::QuorumConfig;
use sentinel_types::{Address, SignerRole};
use std::collections::BTreeMap;

/// `threshold`-of-`total_signers`, optionally restricted to known owners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumPolicy {
    threshold: usize,
    total_signers: usize,
    owners: BTreeMap<Address, SignerRole>,
}

impl QuorumPolicy {
    /// Policy accepting any signer whose signature verifies
    pub fn new(threshold: usize, total_signers: usize) -> Result<Self> {
        if threshold == 0 || threshold > total_signers {
            return Err(Error::InvalidThreshold {
                threshold,
                total_signers,
            });
        }
        Ok(Self {
            threshold,
            total_signers,
            owners: BTreeMap::new(),
        })
    }

    /// Restrict submissions to `owners`; the owner count must equal
    /// `total_signers` and addresses must be distinct
    pub fn with_owners(
        mut self,
        owners: impl IntoIterator<Item = (Address, SignerRole)>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        for (address, role) in owners {
            if map.insert(address, role).is_some() {
                return Err(Error::InvalidRequest(format!(
                    "owner {address} listed twice"
                )));
            }
        }
        if map.len() != self.total_signers {
            return Err(Error::InvalidRequest(format!(
                "{} owners for {} signers",
                map.len(),
                self.total_signers
            )));
        }
        self.owners = map;
        Ok(self)
    }

    pub fn from_config(config: &QuorumConfig) -> Result<Self> {
        let policy = Self::new(config.threshold, config.total_signers)?;
        if config.owners.is_empty() {
            return Ok(policy);
        }
        policy.with_owners(config.owners.iter().map(|o| (o.address, o.role)))
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn total_signers(&self) -> usize {
        self.total_signers
    }

    pub fn owners(&self) -> &BTreeMap<Address, SignerRole> {
        &self.owners
    }

    pub fn is_restricted(&self) -> bool {
        !self.owners.is_empty()
    }

    pub fn role_of(&self, address: &Address) -> Option<SignerRole> {
        self.owners.get(address).copied()
    }

    /// Whether `address` may contribute a signature
    pub fn admits(&self, address: &Address) -> bool {
        !self.is_restricted() || self.owners.contains_key(address)
    }
}
