//! Familiar credential primitives
//!
//! Pure functions for the two credentials the bootstrap provisions. Callers
//! provide random bytes, which keeps every function here deterministic and
//! testable with fixed inputs.
//!
//! # Credentials
//!
//! ```text
//! OS RNG ──32 bytes──> base64url (no pad) ──> DashboardKey
//!                                              ├─> service env
//!                                              └─> <dataDir>/.dashboard_key
//!
//! OS RNG ──16 bytes──> salt ─┐
//! owner PIN ─────────────────┴─> PBKDF2-HMAC-SHA256 (100,000) ──> salt:hash
//! ```
//!
//! # Security
//!
//! - The dashboard key is regenerated on every start and never logged
//! - A PIN is only ever stored as a salted, iterated hash
//! - An empty PIN never produces a hash
//! - Comparisons against stored credentials run in constant time

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod pin_hash;
pub mod token;

pub use error::PinHashError;
pub use pin_hash::{HASH_LEN, HashScheme, PinHash, SALT_LEN, V1_ITERATIONS};
pub use token::{DASHBOARD_KEY_BYTES, DASHBOARD_KEY_LEN, DashboardKey, encode_token, is_url_safe};

/// Compare two byte strings without early exit on the first difference.
///
/// Length is not secret: unequal lengths return immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (&x, &y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
