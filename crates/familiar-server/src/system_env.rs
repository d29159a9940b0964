//! Production Environment implementation using the OS RNG.
//!
//! `SystemEnv` is the production implementation of the Environment trait. All
//! salts and dashboard keys drawn during bootstrap come from here.

use familiar_core::{EntropyError, Environment};

/// Production environment using OS cryptographic randomness.
///
/// # Security
///
/// The RNG uses getrandom which provides OS-level cryptographic randomness
/// (e.g., `getrandom(2)` or /dev/urandom on Linux, `BCryptGenRandom` on
/// Windows). There is no fallback: if the OS source fails, bootstrap fails,
/// because a dashboard key from weak randomness is worse than no dashboard.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer).map_err(|e| EntropyError::Unavailable(e.to_string()))
    }
}
