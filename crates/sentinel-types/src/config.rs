//! Configuration management for sentinel
//!
//! Values are layered with `figment`: built-in defaults, then an optional
//! TOML file, then `SENTINEL_`-prefixed environment variables where `__`
//! separates nested keys (`SENTINEL_QUORUM__THRESHOLD=3`).

use crate::address::Address;
use crate::proposal::SignerRole;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SENTINEL_";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),
    #[error("failed to parse configuration: {0}")]
    ParseError(String),
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    #[error("failed to serialize configuration: {0}")]
    SerializeError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub quorum: QuorumConfig,
    pub client: ClientConfig,
    pub signers: Vec<SignerKeyConfig>,
}

/// Orchestrator HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_address: String,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

/// Quorum policy applied to every proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumConfig {
    pub threshold: usize,
    pub total_signers: usize,
    /// Wallet owners; empty accepts any signer whose signature verifies
    #[serde(default)]
    pub owners: Vec<OwnerConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerConfig {
    pub name: String,
    pub role: SignerRole,
    pub address: Address,
}

/// Client-side settings used by `sentinel-cli`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub orchestrator_url: String,
    pub timeout_secs: u64,
}

/// Where a local signer's private key comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerKeyConfig {
    pub name: String,
    pub role: SignerRole,
    /// Environment variable holding the hex private key
    pub key_env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:3001".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            threshold: 4,
            total_signers: 5,
            owners: Vec::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            orchestrator_url: "http://localhost:3001/api/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SignerKeyConfig {
    fn new(name: &str, role: SignerRole, key_env: &str) -> Self {
        Self {
            name: name.to_string(),
            role,
            key_env: key_env.to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            quorum: QuorumConfig::default(),
            client: ClientConfig::default(),
            signers: vec![
                SignerKeyConfig::new("human-1", SignerRole::Human, "HUMAN1_PRIVATE_KEY"),
                SignerKeyConfig::new("human-2", SignerRole::Human, "HUMAN2_PRIVATE_KEY"),
                SignerKeyConfig::new("ai-cfo", SignerRole::Agent, "AI_CFO_PRIVATE_KEY"),
                SignerKeyConfig::new("ai-security", SignerRole::Agent, "AI_SECURITY_PRIVATE_KEY"),
                SignerKeyConfig::new("ai-analyst", SignerRole::Agent, "AI_ANALYST_PRIVATE_KEY"),
            ],
        }
    }
}

impl Config {
    /// Layered provider: defaults, optional TOML file, environment
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate configuration.
    ///
    /// A missing file given explicitly is an error; `None` uses defaults
    /// plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.display().to_string()));
            }
        }
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.quorum;
        if q.threshold == 0 || q.threshold > q.total_signers {
            return Err(ConfigError::InvalidValue(format!(
                "threshold {} must be between 1 and total_signers {}",
                q.threshold, q.total_signers
            )));
        }
        if !q.owners.is_empty() {
            if q.owners.len() != q.total_signers {
                return Err(ConfigError::InvalidValue(format!(
                    "{} owners listed but total_signers is {}",
                    q.owners.len(),
                    q.total_signers
                )));
            }
            let mut seen = HashSet::new();
            for owner in &q.owners {
                if !seen.insert(owner.address) {
                    return Err(ConfigError::InvalidValue(format!(
                        "owner address {} listed twice",
                        owner.address
                    )));
                }
            }
        }
        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}
