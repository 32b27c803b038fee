//! Loading signer keys from environment variables

use sentinel_types::config::SignerKeyConfig;
use tracing::{debug, info};

use crate::{KeyInfo, Keyring, KeyringError};

/// Import every configured signer whose key variable is set.
///
/// `lookup` resolves a variable name to its value; pass
/// `|name| std::env::var(name).ok()` for the process environment.
/// Unset or empty variables are skipped. A set but malformed key is an
/// error so that a typo never silently drops a signer.
pub async fn load_signers<K, F>(
    keyring: &mut K,
    specs: &[SignerKeyConfig],
    lookup: F,
) -> Result<Vec<KeyInfo>, KeyringError>
where
    K: Keyring + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let mut loaded = Vec::with_capacity(specs.len());
    for spec in specs {
        let Some(secret) = lookup(&spec.key_env).filter(|v| !v.trim().is_empty()) else {
            debug!(signer = %spec.name, var = %spec.key_env, "key variable not set, skipping");
            continue;
        };
        let secret = zeroize::Zeroizing::new(secret);
        let info = keyring
            .import_private_key(&spec.name, spec.role, &secret)
            .await?;
        info!(signer = %info.name, role = %info.role, address = %info.address, "loaded signer");
        loaded.push(info);
    }
    Ok(loaded)
}
