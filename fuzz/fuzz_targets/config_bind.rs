//! Fuzz target for ServiceEnv::bind
//!
//! Binds arbitrary host configuration into a service environment and checks:
//! - Every key either applied or produced exactly one error
//! - Applied keys read back as their coerced value
//! - No raw PIN key survives take_raw_secret
//!
//! The binder should never panic, whatever the keys and values.

#![no_main]

use arbitrary::Arbitrary;
use familiar_core::{ConfigMap, ConfigValue, ServiceEnv, keys};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl From<FuzzValue> for ConfigValue {
    fn from(value: FuzzValue) -> Self {
        match value {
            FuzzValue::Text(v) => ConfigValue::Text(v),
            FuzzValue::Integer(v) => ConfigValue::Integer(v),
            FuzzValue::Float(v) => ConfigValue::Float(v),
            FuzzValue::Bool(v) => ConfigValue::Bool(v),
            FuzzValue::Bytes(v) => ConfigValue::Bytes(v),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    inherited: Vec<(String, String)>,
    config: Vec<(String, FuzzValue)>,
    stage_pin: Option<String>,
}

fuzz_target!(|input: Input| {
    let mut env = ServiceEnv::inherit(input.inherited);

    let mut config: ConfigMap =
        input.config.into_iter().map(|(k, v)| (k, ConfigValue::from(v))).collect();
    if let Some(pin) = input.stage_pin {
        config.insert(keys::OWNER_PIN_RAW.to_string(), ConfigValue::Text(pin));
    }
    let expected: Vec<(String, Result<String, &'static str>)> =
        config.iter().map(|(k, v)| (k.clone(), v.coerce())).collect();

    let report = env.bind(config);
    assert_eq!(report.applied.len() + report.errors.len(), expected.len());

    for key in &report.applied {
        let coerced = expected.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());
        assert_eq!(coerced, Some(Ok(env.get(key).unwrap_or_default().to_string())));
    }

    let _ = env.take_raw_secret();
    for key in keys::RAW_SECRET_KEYS {
        assert!(!env.contains(key));
    }
});
