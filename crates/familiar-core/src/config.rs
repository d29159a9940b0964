//! Environment Binder: host configuration into the service environment.
//!
//! The host hands over a [`ConfigMap`] once at start. Every entry is applied
//! to a [`ServiceEnv`] independently: a value that cannot be coerced to text
//! is reported and skipped, the rest still apply. Host values always replace
//! whatever the environment held before, so stale settings from a previous
//! run never survive a start.
//!
//! [`ServiceEnv`] is an explicit configuration object. The orchestrator owns
//! it during bootstrap and then hands it, frozen, to the agent and dashboard.
//! Nothing here mutates the process-wide environment.

use std::{collections::BTreeMap, fmt};

use zeroize::{Zeroize, Zeroizing};

use crate::error::ConfigurationError;

/// Well-known service variable names.
pub mod keys {
    /// Ephemeral dashboard key, regenerated on every start.
    pub const DASHBOARD_KEY: &str = "FAMILIAR_DASHBOARD_KEY";

    /// Salted owner PIN hash (`salt_hex:hash_hex`).
    pub const OWNER_PIN_HASH: &str = "OWNER_PIN_HASH";

    /// Raw owner PIN staged by the host. Consumed and removed at start.
    pub const OWNER_PIN_RAW: &str = "OWNER_PIN_RAW";

    /// Raw owner PIN name used by older host builds.
    pub const LEGACY_OWNER_PIN_RAW: &str = "FAMILIAR_OWNER_PIN_RAW";

    /// Every name a raw secret may arrive under, in precedence order.
    pub const RAW_SECRET_KEYS: [&str; 2] = [OWNER_PIN_RAW, LEGACY_OWNER_PIN_RAW];

    /// Whether `key` carries a raw secret.
    pub fn is_raw_secret(key: &str) -> bool {
        RAW_SECRET_KEYS.contains(&key)
    }
}

/// Host-supplied configuration, consumed once at start.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A configuration value as supplied by the host.
#[derive(Clone, PartialEq)]
pub enum ConfigValue {
    /// Plain text
    Text(String),
    /// Signed integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag, rendered `true` / `false`
    Bool(bool),
    /// Raw bytes, accepted only when valid UTF-8
    Bytes(Vec<u8>),
}

impl ConfigValue {
    /// Coerce to the text stored in the service environment.
    ///
    /// Fails for non-UTF-8 bytes, non-finite floats and values containing NUL
    /// (which no environment can carry).
    pub fn coerce(&self) -> Result<String, &'static str> {
        let text = match self {
            Self::Text(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(f) if f.is_finite() => f.to_string(),
            Self::Float(_) => return Err("non-finite number"),
            Self::Bool(b) => b.to_string(),
            Self::Bytes(bytes) => {
                String::from_utf8(bytes.clone()).map_err(|_| "bytes are not valid UTF-8")?
            },
        };

        if text.contains('\0') {
            return Err("value contains NUL");
        }

        Ok(text)
    }
}

// The staged PIN travels as a ConfigValue; text and bytes are wiped on drop.
impl Drop for ConfigValue {
    fn drop(&mut self) {
        match self {
            Self::Text(text) => text.zeroize(),
            Self::Bytes(bytes) => bytes.zeroize(),
            Self::Integer(_) | Self::Float(_) | Self::Bool(_) => {},
        }
    }
}

// Values are secrets as often as not.
impl fmt::Debug for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Text(_) => "Text",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Bool(_) => "Bool",
            Self::Bytes(_) => "Bytes",
        };
        write!(f, "{kind}(<redacted>)")
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<u8>> for ConfigValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// Outcome of [`ServiceEnv::bind`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BindReport {
    /// Keys written to the environment
    pub applied: Vec<String>,
    /// Keys that failed, one error each
    pub errors: Vec<ConfigurationError>,
}

impl BindReport {
    /// True if every key applied.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Service environment handed to the agent and dashboard.
///
/// Ordered map of variable name to text value. `Debug` lists names only.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ServiceEnv {
    vars: BTreeMap<String, String>,
}

impl ServiceEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from inherited variables, e.g. the process environment.
    ///
    /// Raw secret keys are never inherited: a PIN is accepted only when the
    /// host stages it explicitly through [`ServiceEnv::bind`]. A skipped
    /// PIN is wiped and logged by key name, so a host that relied on the
    /// environment learns that PIN protection is off.
    pub fn inherit<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env = Self::new();
        for (key, value) in vars {
            let key = key.into();
            let value = value.into();
            if keys::is_raw_secret(&key) {
                drop(Zeroizing::new(value));
                tracing::warn!(
                    key = %key,
                    "Ignoring inherited raw PIN; stage it through host configuration"
                );
                continue;
            }
            env.vars.insert(key, value);
        }
        env
    }

    /// Seed from the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn inherit_process() -> Self {
        Self::inherit(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Apply every entry of `mapping`, overwriting existing variables.
    ///
    /// Each key is an independent operation: failures are collected in the
    /// report and do not stop the remaining keys.
    pub fn bind(&mut self, mapping: ConfigMap) -> BindReport {
        let mut report = BindReport::default();

        for (key, value) in mapping {
            if let Err(reason) = validate_key(&key) {
                tracing::warn!(key = %key, reason, "Skipping configuration key");
                report.errors.push(ConfigurationError::InvalidKey { key, reason });
                continue;
            }

            match value.coerce() {
                Ok(text) => {
                    self.vars.insert(key.clone(), text);
                    report.applied.push(key);
                },
                Err(reason) => {
                    tracing::warn!(key = %key, reason, "Skipping configuration value");
                    report.errors.push(ConfigurationError::Coercion { key, reason });
                },
            }
        }

        report
    }

    /// Set a variable, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.into(), value.into())
    }

    /// Look up a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Whether a variable is set.
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Read and remove a variable in one step.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    /// Pop the staged raw secret.
    ///
    /// Removes every raw secret key, whichever are present, and returns the
    /// first non-empty value in precedence order. An empty value is still
    /// returned when nothing better exists so callers can tell "staged but
    /// blank" from "absent".
    pub fn take_raw_secret(&mut self) -> Option<Zeroizing<String>> {
        let mut found: Option<Zeroizing<String>> = None;

        for key in keys::RAW_SECRET_KEYS {
            let Some(value) = self.vars.remove(key) else {
                continue;
            };
            let value = Zeroizing::new(value);
            match &found {
                Some(existing) if !existing.is_empty() => {},
                _ => found = Some(value),
            }
        }

        found
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the environment is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl fmt::Debug for ServiceEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEnv").field("keys", &self.vars.keys().collect::<Vec<_>>()).finish()
    }
}

fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("key is empty");
    }
    if key.contains('=') {
        return Err("key contains '='");
    }
    if key.contains('\0') {
        return Err("key contains NUL");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, ConfigValue)]) -> ConfigMap {
        entries.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    #[test]
    fn bind_coerces_values_to_text() {
        let mut env = ServiceEnv::new();
        let report = env.bind(mapping(&[
            ("API_KEY", "x".into()),
            ("PORT", 5000i64.into()),
            ("RATIO", 0.5f64.into()),
            ("BRIEFING", true.into()),
            ("RAW", b"bytes".to_vec().into()),
        ]));

        assert!(report.is_clean());
        assert_eq!(report.applied.len(), 5);
        assert_eq!(env.get("API_KEY"), Some("x"));
        assert_eq!(env.get("PORT"), Some("5000"));
        assert_eq!(env.get("RATIO"), Some("0.5"));
        assert_eq!(env.get("BRIEFING"), Some("true"));
        assert_eq!(env.get("RAW"), Some("bytes"));
    }

    #[test]
    fn bind_overwrites_stale_values() {
        let mut env = ServiceEnv::inherit([("API_KEY", "stale")]);
        env.bind(mapping(&[("API_KEY", "fresh".into())]));

        assert_eq!(env.get("API_KEY"), Some("fresh"));
    }

    #[test]
    fn failing_key_does_not_block_others() {
        let mut env = ServiceEnv::new();
        let report = env.bind(mapping(&[
            ("A", "ok".into()),
            ("B", vec![0xff, 0xfe].into()),
            ("C", f64::NAN.into()),
            ("D", "also ok".into()),
        ]));

        assert_eq!(report.applied, vec!["A".to_string(), "D".to_string()]);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.errors[0].key(), "B");
        assert_eq!(report.errors[1].key(), "C");
        assert!(!env.contains("B"));
        assert!(!env.contains("C"));
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut env = ServiceEnv::new();
        let report = env.bind(mapping(&[
            ("", "x".into()),
            ("A=B", "x".into()),
            ("NUL\0", "x".into()),
        ]));

        assert_eq!(report.errors.len(), 3);
        assert!(
            report.errors.iter().all(|e| matches!(e, ConfigurationError::InvalidKey { .. }))
        );
        assert!(env.is_empty());
    }

    #[test]
    fn nul_in_value_is_rejected() {
        let mut env = ServiceEnv::new();
        let report = env.bind(mapping(&[("A", "a\0b".into())]));

        assert!(matches!(report.errors[0], ConfigurationError::Coercion { .. }));
    }

    #[test]
    fn take_removes_in_one_step() {
        let mut env = ServiceEnv::inherit([("K", "v")]);

        assert_eq!(env.take("K").as_deref(), Some("v"));
        assert!(!env.contains("K"));
        assert_eq!(env.take("K"), None);
    }

    #[test]
    fn take_raw_secret_removes_all_aliases() {
        let mut env = ServiceEnv::new();
        env.set(keys::OWNER_PIN_RAW, "1234");
        env.set(keys::LEGACY_OWNER_PIN_RAW, "9999");

        let secret = env.take_raw_secret();

        assert_eq!(secret.as_deref().map(String::as_str), Some("1234"));
        assert!(!env.contains(keys::OWNER_PIN_RAW));
        assert!(!env.contains(keys::LEGACY_OWNER_PIN_RAW));
    }

    #[test]
    fn take_raw_secret_prefers_non_empty_alias() {
        let mut env = ServiceEnv::new();
        env.set(keys::OWNER_PIN_RAW, "");
        env.set(keys::LEGACY_OWNER_PIN_RAW, "4321");

        let secret = env.take_raw_secret();

        assert_eq!(secret.as_deref().map(String::as_str), Some("4321"));
    }

    #[test]
    fn take_raw_secret_reports_blank() {
        let mut env = ServiceEnv::new();
        env.set(keys::OWNER_PIN_RAW, "");

        let secret = env.take_raw_secret();

        assert_eq!(secret.as_deref().map(String::as_str), Some(""));
        assert!(env.is_empty());
    }

    #[test]
    fn inherit_skips_raw_secrets() {
        let env = ServiceEnv::inherit([
            (keys::OWNER_PIN_RAW, "1234"),
            (keys::LEGACY_OWNER_PIN_RAW, "1234"),
            ("HOME", "/home/app"),
        ]);

        assert_eq!(env.len(), 1);
        assert_eq!(env.get("HOME"), Some("/home/app"));
    }

    #[test]
    fn debug_output_hides_values() {
        let mut env = ServiceEnv::new();
        env.set("API_KEY", "sk-secret");

        let rendered = format!("{env:?} {:?}", ConfigValue::from("sk-secret"));

        assert!(rendered.contains("API_KEY"));
        assert!(!rendered.contains("sk-secret"));
    }
}
