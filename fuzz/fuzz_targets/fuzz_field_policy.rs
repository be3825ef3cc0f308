//! Fuzz target for field policy parsing and validation.

#![no_main]

use cs_redact::FieldPolicy;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(policy) = serde_json::from_slice::<FieldPolicy>(data) {
        let _ = policy.validate();
    }
});
