//! Error types for the Familiar bootstrap core.
//!
//! Configuration errors are isolated to a single key and never abort a
//! bootstrap. Entropy errors are always fatal: serving without a retrievable
//! dashboard key is not an acceptable degraded mode.

use thiserror::Error;

/// Secure random source could not produce output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntropyError {
    /// The OS (or simulated) entropy source failed.
    #[error("secure random source unavailable: {0}")]
    Unavailable(String),
}

/// A single configuration entry could not be applied.
///
/// Messages name the key and the reason, never the value: values routinely
/// carry API keys and PINs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The key cannot name a service variable.
    #[error("invalid configuration key {key:?}: {reason}")]
    InvalidKey {
        /// Offending key
        key: String,
        /// Why the key was rejected
        reason: &'static str,
    },

    /// The value cannot be coerced to text.
    #[error("value for {key} cannot be coerced to text: {reason}")]
    Coercion {
        /// Key whose value failed
        key: String,
        /// Why coercion failed
        reason: &'static str,
    },
}

impl ConfigurationError {
    /// Key this error belongs to.
    pub fn key(&self) -> &str {
        match self {
            Self::InvalidKey { key, .. } | Self::Coercion { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_key_not_value() {
        let err = ConfigurationError::Coercion {
            key: "API_KEY".to_string(),
            reason: "bytes are not valid UTF-8",
        };

        assert_eq!(err.to_string(), "value for API_KEY cannot be coerced to text: bytes are not valid UTF-8");
        assert_eq!(err.key(), "API_KEY");
    }

    #[test]
    fn entropy_error_display() {
        let err = EntropyError::Unavailable("getrandom: ENOSYS".to_string());
        assert_eq!(err.to_string(), "secure random source unavailable: getrandom: ENOSYS");
    }
}
