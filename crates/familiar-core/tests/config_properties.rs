//! Property-based tests for the Environment Binder.
//!
//! These verify invariants that must hold for every host configuration:
//! host values win, failures are isolated per key, and raw secrets never
//! survive consumption.

use familiar_core::{ConfigMap, ConfigValue, ServiceEnv, keys};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,15}"
}

fn value_strategy() -> impl Strategy<Value = ConfigValue> {
    prop_oneof![
        "[ -~]{0,32}".prop_map(ConfigValue::Text),
        any::<i64>().prop_map(ConfigValue::Integer),
        any::<bool>().prop_map(ConfigValue::Bool),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(ConfigValue::Bytes),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: every key either applies or is reported, never both
    #[test]
    fn prop_every_key_accounted_for(
        mapping in prop::collection::btree_map(key_strategy(), value_strategy(), 0..16)
    ) {
        let total = mapping.len();
        let mut env = ServiceEnv::new();

        let report = env.bind(mapping.clone());

        prop_assert_eq!(report.applied.len() + report.errors.len(), total);
        for key in &report.applied {
            prop_assert!(env.contains(key));
        }
        for err in &report.errors {
            prop_assert!(!env.contains(err.key()));
        }
    }

    /// Property: host configuration overwrites whatever was inherited
    #[test]
    fn prop_host_values_are_authoritative(
        key in key_strategy(),
        stale in "[a-z]{1,8}",
        fresh in "[A-Z]{1,8}",
    ) {
        let mut env = ServiceEnv::inherit([(key.clone(), stale)]);
        let mut mapping = ConfigMap::new();
        mapping.insert(key.clone(), ConfigValue::Text(fresh.clone()));

        env.bind(mapping);

        prop_assert_eq!(env.get(&key), Some(fresh.as_str()));
    }

    /// Property: after taking the raw secret no alias remains
    #[test]
    fn prop_raw_secret_never_survives_take(
        primary in prop::option::of("[0-9]{0,8}"),
        legacy in prop::option::of("[0-9]{0,8}"),
    ) {
        let mut env = ServiceEnv::new();
        if let Some(pin) = &primary {
            env.set(keys::OWNER_PIN_RAW, pin.clone());
        }
        if let Some(pin) = &legacy {
            env.set(keys::LEGACY_OWNER_PIN_RAW, pin.clone());
        }

        let taken = env.take_raw_secret();

        prop_assert_eq!(taken.is_some(), primary.is_some() || legacy.is_some());
        for key in keys::RAW_SECRET_KEYS {
            prop_assert!(!env.contains(key));
        }
    }
}
