//! Fuzz target for card document parsing.
//!
//! Any document that parses must also transform and reveal back to itself.

#![no_main]

use cs_core::CardDocument;
use cs_redact::{AesGcmCipher, FieldPolicy, RecordTransformer, SaltedSha256, TransformClass};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(doc) = serde_json::from_slice::<CardDocument>(data) else {
        return;
    };

    let transformer =
        RecordTransformer::new(FieldPolicy::default(), SaltedSha256, AesGcmCipher::synthetic());
    let sealed = transformer
        .transform(&doc.cards, "fuzz-salt", "fuzz-key")
        .expect("text fields always transform");
    let revealed = transformer
        .reveal(&sealed, "fuzz-key")
        .expect("own output reveals");

    for (original, back) in doc.cards.iter().zip(&revealed) {
        for field in transformer.policy().fields_in(TransformClass::Encrypt) {
            assert_eq!(original.get(field), back.get(field));
        }
    }
});
