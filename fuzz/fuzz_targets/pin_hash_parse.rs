//! Fuzz target for PinHash parsing
//!
//! The stored hash comes back from host storage that may have been edited or
//! truncated. This fuzzer feeds arbitrary text to the parser to find:
//! - Panics on malformed hex or separators
//! - Accepted inputs whose serialized form parses to a different hash
//! - Iteration counts that slip past the upper bound
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use familiar_crypto::PinHash;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(hash) = text.parse::<PinHash>() {
        let reparsed: PinHash = hash.to_string().parse().expect("serialized hash must parse");
        assert!(reparsed == hash);
        assert!(hash.scheme().iterations() <= 10_000_000);
    }
});
