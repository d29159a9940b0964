//! Deterministic environment.
//!
//! `SimEnv` replaces the OS random source with a seeded ChaCha20 stream so
//! that keys, salts and hashes are reproducible across runs. It can also
//! simulate an entropy source that fails, immediately or after a number of
//! successful draws.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use familiar_core::{EntropyError, Environment};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Seeded, failure-injectable [`Environment`].
///
/// Clones share the same stream and draw counter.
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha20Rng>>,
    draws: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

impl SimEnv {
    /// Environment whose randomness is fully determined by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))),
            draws: Arc::new(AtomicUsize::new(0)),
            fail_after: None,
        }
    }

    /// Environment whose random source is always unavailable.
    pub fn failing() -> Self {
        Self::fail_after(0)
    }

    /// Environment that serves `successful` draws, then fails every draw.
    pub fn fail_after(successful: usize) -> Self {
        Self { fail_after: Some(successful), ..Self::with_seed(0) }
    }

    /// Number of draws attempted so far, failed ones included.
    pub fn draws(&self) -> usize {
        self.draws.load(Ordering::SeqCst)
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        let attempt = self.draws.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| attempt >= limit) {
            tracing::debug!(attempt, "Simulated entropy failure");
            return Err(EntropyError::Unavailable("simulated entropy failure".to_string()));
        }

        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
        Ok(())
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv")
            .field("draws", &self.draws())
            .field("fail_after", &self.fail_after)
            .finish_non_exhaustive()
    }
}
