//! Ephemeral dashboard key.
//!
//! Tokens are URL-safe base64 without padding, so they survive file
//! contents, HTTP headers and query strings unchanged.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use zeroize::Zeroizing;

use crate::constant_time_eq;

/// Entropy behind a dashboard key, in bytes.
pub const DASHBOARD_KEY_BYTES: usize = 32;

/// Encoded length of a dashboard key (`ceil(32 * 4 / 3)`).
pub const DASHBOARD_KEY_LEN: usize = 43;

/// Encode random bytes as a URL-safe token.
pub fn encode_token(entropy: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(entropy)
}

/// Whether `candidate` uses only the URL-safe base64 alphabet.
pub fn is_url_safe(candidate: &str) -> bool {
    candidate.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Ephemeral key authenticating the host to the local dashboard.
///
/// Generated fresh on every start and never rotated mid-run. The encoded
/// text is zeroized on drop and `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct DashboardKey(Zeroizing<String>);

impl DashboardKey {
    /// Build a key from freshly drawn entropy.
    pub fn from_entropy(entropy: &[u8; DASHBOARD_KEY_BYTES]) -> Self {
        Self(Zeroizing::new(encode_token(entropy)))
    }

    /// Encoded key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare a presented credential in constant time.
    pub fn matches(&self, presented: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), presented.as_bytes())
    }
}

impl fmt::Debug for DashboardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DashboardKey").field(&"<redacted>").finish()
    }
}
