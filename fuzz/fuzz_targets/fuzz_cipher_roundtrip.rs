//! Fuzz target for encrypt/decrypt under both nonce modes.

#![no_main]

use arbitrary::Arbitrary;
use cs_redact::{AesGcmCipher, CipherProducer};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    plaintext: String,
    key: String,
    synthetic: bool,
}

fuzz_target!(|input: Input| {
    let cipher = if input.synthetic {
        AesGcmCipher::synthetic()
    } else {
        AesGcmCipher::random()
    };
    let sealed = cipher
        .encrypt(&input.plaintext, &input.key)
        .expect("encrypt accepts any text");
    let opened = cipher
        .decrypt(&sealed, &input.key)
        .expect("own ciphertext decrypts");
    assert_eq!(opened, input.plaintext);
});
