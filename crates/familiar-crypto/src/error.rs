//! Credential parsing errors.

use thiserror::Error;

/// A stored owner PIN hash could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PinHashError {
    /// Missing `:` or `$` separator
    #[error("malformed PIN hash: expected <salt_hex>:<hash_hex>")]
    Malformed,

    /// Scheme prefix is not recognized
    #[error("unknown PIN hash scheme: {0}")]
    UnknownScheme(String),

    /// Iteration count is not a positive integer within bounds
    #[error("invalid PIN hash iteration count")]
    InvalidIterations,

    /// Hex field has the wrong length
    #[error("invalid {field} length: expected {expected} hex chars, got {actual}")]
    InvalidLength {
        /// Field name (`salt` or `hash`)
        field: &'static str,
        /// Expected hex length
        expected: usize,
        /// Actual hex length
        actual: usize,
    },

    /// Hex field contains non-hex characters
    #[error("invalid hex in {0}")]
    InvalidHex(&'static str),
}
