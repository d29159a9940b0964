//! Environment abstraction for deterministic testing.
//!
//! Decouples bootstrap logic from the OS entropy source. Production code uses
//! the operating system RNG, tests use a seeded generator so salts and
//! dashboard keys are reproducible.

use crate::error::EntropyError;

/// Abstract environment providing secure randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production
/// - Failure is reported, never papered over with weaker randomness. A
///   bootstrap that cannot draw entropy must not produce credentials.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    /// - On error the buffer contents are unspecified and must not be used
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError>;

    /// Generates a fixed-size array of random bytes.
    ///
    /// Convenience wrapper for salts and key material.
    fn random_array<const N: usize>(&self) -> Result<[u8; N], EntropyError> {
        let mut bytes = [0u8; N];
        self.random_bytes(&mut bytes)?;
        Ok(bytes)
    }
}
