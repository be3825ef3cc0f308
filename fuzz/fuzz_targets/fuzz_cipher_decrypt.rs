//! Fuzz target for ciphertext decoding.
//!
//! Arbitrary text handed to decrypt must come back as an error, never a panic.

#![no_main]

use cs_redact::{AesGcmCipher, CipherProducer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = AesGcmCipher::random().decrypt(text, "fuzz-key");
    }
});
