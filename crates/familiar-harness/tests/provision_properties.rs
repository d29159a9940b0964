//! Property tests for provisioning under seeded randomness.
//!
//! 1. **Credentials**: any seed yields a well-formed key and a verifiable hash
//! 2. **No leak**: no raw PIN key survives provisioning
//! 3. **Determinism**: the same seed provisions the same key
//! 4. **Abort**: an entropy failure at any draw leaves no key file behind

use familiar_core::{ConfigMap, ConfigValue, ServiceEnv, keys};
use familiar_crypto::{DASHBOARD_KEY_LEN, PinHash, is_url_safe};
use familiar_harness::SimEnv;
use familiar_server::{BootstrapError, provision};
use proptest::prelude::*;

fn pin_config(key: &str, pin: &str) -> ConfigMap {
    ConfigMap::from([(key.to_string(), ConfigValue::from(pin))])
}

proptest! {
    // Each case runs the full 100,000-iteration PBKDF2
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_provision_yields_valid_credentials(
        seed in any::<u64>(),
        pin in "[0-9]{4,8}",
        legacy in any::<bool>(),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let key_name = if legacy { keys::LEGACY_OWNER_PIN_RAW } else { keys::OWNER_PIN_RAW };

        let provisioned = provision(
            &SimEnv::with_seed(seed),
            ServiceEnv::new(),
            dir.path(),
            pin_config(key_name, &pin),
        )
        .unwrap();

        let env = &provisioned.context.env;
        let key = provisioned.key_file.read().unwrap();
        prop_assert_eq!(key.len(), DASHBOARD_KEY_LEN);
        prop_assert!(is_url_safe(&key));
        prop_assert_eq!(env.get(keys::DASHBOARD_KEY), Some(key.as_str()));

        let hash: PinHash = env.get(keys::OWNER_PIN_HASH).unwrap().parse().unwrap();
        prop_assert!(hash.verify(&pin));

        for raw_key in keys::RAW_SECRET_KEYS {
            prop_assert!(!env.contains(raw_key));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_same_seed_same_key(seed in any::<u64>()) {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();

        let a = provision(&SimEnv::with_seed(seed), ServiceEnv::new(), first.path(), ConfigMap::new())
            .unwrap();
        let b = provision(&SimEnv::with_seed(seed), ServiceEnv::new(), second.path(), ConfigMap::new())
            .unwrap();

        prop_assert_eq!(a.key_file.read().unwrap(), b.key_file.read().unwrap());
    }

    #[test]
    fn prop_entropy_failure_leaves_no_key_file(successful in 0usize..2) {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("files");

        let result = provision(
            &SimEnv::fail_after(successful),
            ServiceEnv::new(),
            &data_dir,
            pin_config(keys::OWNER_PIN_RAW, "1234"),
        );

        prop_assert!(matches!(result, Err(BootstrapError::Entropy(_))));
        prop_assert!(!data_dir.join(".dashboard_key").exists());
    }
}
