//! Credential provisioning: dashboard key and owner PIN hash.
//!
//! Draws entropy from an [`Environment`] and feeds it to the pure primitives
//! in [`familiar_crypto`]. Both credentials use the same secure source.

use familiar_core::{EntropyError, Environment, ServiceEnv, keys};
use familiar_crypto::{DASHBOARD_KEY_BYTES, DashboardKey, PinHash, SALT_LEN, encode_token};
use zeroize::Zeroizing;

/// Generate a URL-safe random token carrying `byte_length` bytes of entropy.
pub fn generate_token<E: Environment>(env: &E, byte_length: usize) -> Result<String, EntropyError> {
    let mut entropy = Zeroizing::new(vec![0u8; byte_length]);
    env.random_bytes(&mut entropy)?;
    Ok(encode_token(&entropy))
}

/// Generate a fresh dashboard key.
pub fn generate_dashboard_key<E: Environment>(env: &E) -> Result<DashboardKey, EntropyError> {
    let entropy = Zeroizing::new(env.random_array::<DASHBOARD_KEY_BYTES>()?);
    Ok(DashboardKey::from_entropy(&entropy))
}

/// Hash a raw secret under a freshly drawn salt.
///
/// An empty secret yields `Ok(None)` without touching the entropy source.
pub fn hash_secret<E: Environment>(env: &E, raw: &str) -> Result<Option<PinHash>, EntropyError> {
    if raw.is_empty() {
        return Ok(None);
    }

    let salt = env.random_array::<SALT_LEN>()?;
    Ok(PinHash::derive(raw, salt))
}

/// What happened to the staged owner PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStatus {
    /// No raw PIN was staged
    NotStaged,
    /// A blank PIN was staged; PIN protection is off
    Blank,
    /// The PIN was hashed into `OWNER_PIN_HASH`
    Hashed,
}

/// Consume the staged raw PIN and publish its hash.
///
/// The raw secret is removed from `service_env` before hashing starts, so it
/// is gone on every path, including entropy failure. A blank PIN also clears
/// any `OWNER_PIN_HASH` carried over from the inherited environment: the host
/// explicitly turned protection off.
pub fn consume_raw_secret<E: Environment>(
    env: &E,
    service_env: &mut ServiceEnv,
) -> Result<PinStatus, EntropyError> {
    let Some(raw) = service_env.take_raw_secret() else {
        return Ok(PinStatus::NotStaged);
    };

    match hash_secret(env, &raw)? {
        Some(hash) => {
            service_env.set(keys::OWNER_PIN_HASH, hash.to_string());
            tracing::debug!("Owner PIN hashed");
            Ok(PinStatus::Hashed)
        },
        None => {
            service_env.take(keys::OWNER_PIN_HASH);
            tracing::debug!("Blank owner PIN staged; PIN protection disabled");
            Ok(PinStatus::Blank)
        },
    }
}
