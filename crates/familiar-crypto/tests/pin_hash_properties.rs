//! Property-based tests for owner PIN hashing.
//!
//! Uses a reduced work factor except where the production scheme itself is
//! under test, so the suite stays fast at `opt-level = 0`.

use familiar_crypto::{HashScheme, PinHash, SALT_LEN};
use proptest::prelude::*;

const FAST: HashScheme = HashScheme::Pbkdf2Sha256 { iterations: 64 };

fn pin_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,12}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: a hash always verifies against the PIN it came from
    #[test]
    fn prop_hash_verifies_hashed_pin(
        pin in pin_strategy(),
        salt in any::<[u8; SALT_LEN]>(),
    ) {
        let hash = PinHash::derive_with(FAST, &pin, salt);
        prop_assert!(hash.is_some_and(|h| h.verify(&pin)));
    }

    /// Property: distinct PINs under the same salt never collide
    #[test]
    fn prop_distinct_pins_distinct_hashes(
        a in pin_strategy(),
        b in pin_strategy(),
        salt in any::<[u8; SALT_LEN]>(),
    ) {
        prop_assume!(a != b);

        let ha = PinHash::derive_with(FAST, &a, salt).map(|h| h.to_string());
        let hb = PinHash::derive_with(FAST, &b, salt).map(|h| h.to_string());

        prop_assert_ne!(ha, hb);
    }

    /// Property: the same PIN under distinct salts serializes differently
    #[test]
    fn prop_distinct_salts_distinct_output(
        pin in pin_strategy(),
        s1 in any::<[u8; SALT_LEN]>(),
        s2 in any::<[u8; SALT_LEN]>(),
    ) {
        prop_assume!(s1 != s2);

        let h1 = PinHash::derive_with(FAST, &pin, s1);
        let h2 = PinHash::derive_with(FAST, &pin, s2);

        prop_assert_ne!(h1.as_ref().map(ToString::to_string), h2.as_ref().map(ToString::to_string));
        prop_assert!(h1.is_some_and(|h| h.verify(&pin)));
        prop_assert!(h2.is_some_and(|h| h.verify(&pin)));
    }

    /// Property: parsing never panics on arbitrary input
    #[test]
    fn prop_parse_never_panics(input in ".{0,128}") {
        let _ = input.parse::<PinHash>();
    }

    /// Property: serialized hashes parse back to the same value
    #[test]
    fn prop_serialized_hash_parses_back(
        pin in pin_strategy(),
        salt in any::<[u8; SALT_LEN]>(),
    ) {
        let hash = PinHash::derive_with(FAST, &pin, salt);
        let parsed = hash.as_ref().map(|h| h.to_string().parse::<PinHash>());

        prop_assert_eq!(parsed, hash.map(Ok));
    }
}

#[test]
fn production_scheme_uses_100k_iterations() {
    assert_eq!(HashScheme::V1.iterations(), 100_000);

    let hash = PinHash::derive("1234", [0x5a; SALT_LEN]).unwrap();
    let text = hash.to_string();

    let (salt, digest) = text.split_once(':').unwrap();
    assert_eq!(salt.len(), 32);
    assert_eq!(digest.len(), 64);
    assert!(hash.verify("1234"));
    assert!(!hash.needs_rehash());
}
