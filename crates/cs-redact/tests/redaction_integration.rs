//! Integration tests for cs-redact.
//!
//! These tests verify:
//! - The worked Ann/Lee example end to end
//! - Every field is transformed exactly once, by the class its policy names
//! - Batch order survives sequential and parallel processing
//! - Transforming twice does not give back the original
//! - Plaintext values never appear in transformed output

use cs_redact::{
    AesGcmCipher, CardField, CardRecord, CipherProducer, DigestAlgorithm, DigestProducer,
    FieldPolicy, HmacSha256, NonceMode, RecordTransformer, SaltedSha256, TransformClass,
};

const SALT: &str = "S";
const KEY: &str = "K";

fn ann() -> CardRecord {
    CardRecord::new("Ann", "Lee", "123", "07", "2026", "4111111111111111")
}

fn sample_batch(n: usize) -> Vec<CardRecord> {
    (0..n)
        .map(|i| {
            CardRecord::new(
                format!("Holder{}", i),
                format!("Family{}", i),
                format!("{:03}", i % 1000),
                format!("{:02}", (i % 12) + 1),
                format!("{}", 2025 + (i % 10)),
                format!("4000{:012}", i),
            )
        })
        .collect()
}

fn deterministic() -> RecordTransformer {
    RecordTransformer::new(FieldPolicy::default(), SaltedSha256, AesGcmCipher::synthetic())
}

// ============================================================================
// Worked Example
// ============================================================================

#[test]
fn test_ann_lee_example_deterministic() {
    let transformer = deterministic();
    let cipher = AesGcmCipher::synthetic();

    let output = transformer.transform(&[ann()], SALT, KEY).unwrap();
    let out = &output[0];

    assert_eq!(out.cvc, SaltedSha256.digest("123", SALT).unwrap());
    assert_eq!(out.number, SaltedSha256.digest("4111111111111111", SALT).unwrap());
    assert_eq!(out.name, cipher.encrypt("Ann", KEY).unwrap());
    assert_eq!(out.family, cipher.encrypt("Lee", KEY).unwrap());
    assert_eq!(out.month, cipher.encrypt("07", KEY).unwrap());
    assert_eq!(out.year, cipher.encrypt("2026", KEY).unwrap());

    assert_eq!(cipher.decrypt(&out.name, KEY).unwrap(), "Ann");
    assert_eq!(cipher.decrypt(&out.family, KEY).unwrap(), "Lee");
    assert_eq!(cipher.decrypt(&out.month, KEY).unwrap(), "07");
    assert_eq!(cipher.decrypt(&out.year, KEY).unwrap(), "2026");
}

#[test]
fn test_ann_lee_example_random_nonce() {
    let transformer = RecordTransformer::default();
    assert_eq!(transformer.nonce_mode(), NonceMode::Random);

    let output = transformer.transform(&[ann()], SALT, KEY).unwrap();
    let out = &output[0];

    // Digests are deterministic regardless of nonce mode.
    assert_eq!(out.cvc, SaltedSha256.digest("123", SALT).unwrap());
    assert_eq!(out.number, SaltedSha256.digest("4111111111111111", SALT).unwrap());

    let cipher = AesGcmCipher::random();
    assert_eq!(cipher.decrypt(&out.name, KEY).unwrap(), "Ann");
    assert_eq!(cipher.decrypt(&out.family, KEY).unwrap(), "Lee");
    assert_eq!(cipher.decrypt(&out.month, KEY).unwrap(), "07");
    assert_eq!(cipher.decrypt(&out.year, KEY).unwrap(), "2026");
}

// ============================================================================
// Field Completeness
// ============================================================================

#[test]
fn test_every_field_transformed_in_every_record() {
    let transformer = RecordTransformer::default();
    let batch = sample_batch(25);
    let output = transformer.transform(&batch, SALT, KEY).unwrap();

    for (input, out) in batch.iter().zip(&output) {
        for field in CardField::ALL {
            assert_ne!(input.get(field), out.get(field), "{} left untransformed", field);
        }
    }
}

#[test]
fn test_each_field_transformed_exactly_once() {
    let transformer = deterministic();
    let cipher = AesGcmCipher::synthetic();
    let out = transformer.transform_record(&ann(), 0, SALT, KEY).unwrap();

    // A double-applied transform would not decrypt to the original in one step.
    for field in transformer.policy().fields_in(TransformClass::Encrypt) {
        assert_eq!(cipher.decrypt(out.get(field), KEY).unwrap(), ann().get(field));
    }
    for field in transformer.policy().fields_in(TransformClass::Digest) {
        assert_eq!(
            out.get(field),
            SaltedSha256.digest(ann().get(field), SALT).unwrap()
        );
    }
}

#[test]
fn test_output_is_printable_base64() {
    let transformer = RecordTransformer::default();
    let out = transformer.transform_record(&ann(), 0, SALT, KEY).unwrap();

    for field in CardField::ALL {
        let value = out.get(field);
        assert!(!value.is_empty());
        assert!(
            value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '='),
            "{} is not base64 text: {}",
            field,
            value
        );
    }
}

#[test]
fn test_plaintext_never_leaks() {
    let transformer = RecordTransformer::default();
    let batch = sample_batch(10);
    let output = transformer.transform(&batch, SALT, KEY).unwrap();
    let serialized = serde_json::to_string(&output).unwrap();

    for record in &batch {
        assert!(!serialized.contains(&record.number));
        assert!(!serialized.contains(&record.name));
        assert!(!serialized.contains(&record.family));
    }
    assert!(!serialized.contains("4000000000000"));
}

// ============================================================================
// Order Preservation
// ============================================================================

#[test]
fn test_order_preserved_sequential() {
    let transformer = RecordTransformer::default();
    let batch = sample_batch(50);
    let output = transformer.transform(&batch, SALT, KEY).unwrap();
    let revealed = transformer.reveal(&output, KEY).unwrap();

    assert_eq!(output.len(), batch.len());
    for (i, (input, back)) in batch.iter().zip(&revealed).enumerate() {
        assert_eq!(input.name, back.name, "record {} moved", i);
        assert_eq!(
            output[i].number,
            SaltedSha256.digest(&input.number, SALT).unwrap()
        );
    }
}

#[test]
fn test_order_preserved_parallel() {
    let transformer = RecordTransformer::default();
    let batch = sample_batch(103);

    let outcomes = transformer.transform_parallel(&batch, SALT, KEY, 7);
    assert_eq!(outcomes.len(), batch.len());

    let output: Vec<CardRecord> = outcomes.into_iter().map(Result::unwrap).collect();
    let revealed = transformer.reveal(&output, KEY).unwrap();
    let names: Vec<&str> = revealed.iter().map(|r| r.name.as_str()).collect();
    let expected: Vec<&str> = batch.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, expected);
    for (input, out) in batch.iter().zip(&output) {
        assert_eq!(out.cvc, SaltedSha256.digest(&input.cvc, SALT).unwrap());
    }
}

#[test]
fn test_parallel_equals_sequential_when_deterministic() {
    let transformer = deterministic();
    let batch = sample_batch(64);

    let sequential = transformer.transform(&batch, SALT, KEY).unwrap();
    let parallel: Vec<CardRecord> = transformer
        .transform_parallel(&batch, SALT, KEY, 5)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(parallel, sequential);
}

// ============================================================================
// Non-idempotence
// ============================================================================

#[test]
fn test_retransform_does_not_restore_original() {
    for transformer in [deterministic(), RecordTransformer::default()] {
        let once = transformer.transform_record(&ann(), 0, SALT, KEY).unwrap();
        let twice = transformer.transform_record(&once, 0, SALT, KEY).unwrap();

        assert_ne!(twice, ann());
        assert_ne!(twice, once);
        for field in CardField::ALL {
            assert_ne!(twice.get(field), ann().get(field));
        }
    }
}

#[test]
fn test_retransform_needs_two_reveals() {
    let transformer = deterministic();
    let once = transformer.transform_record(&ann(), 0, SALT, KEY).unwrap();
    let twice = transformer.transform_record(&once, 0, SALT, KEY).unwrap();

    let back_once = transformer.reveal_record(&twice, 0, KEY).unwrap();
    assert_ne!(back_once.name, "Ann");
    assert_eq!(back_once.name, once.name);

    let back_twice = transformer.reveal_record(&back_once, 0, KEY).unwrap();
    assert_eq!(back_twice.name, "Ann");
}

// ============================================================================
// Substitution and Secrets
// ============================================================================

#[test]
fn test_primitives_substitute_without_orchestration_changes() {
    let sha = RecordTransformer::new(FieldPolicy::default(), SaltedSha256, AesGcmCipher::synthetic());
    let hmac = RecordTransformer::new(FieldPolicy::default(), HmacSha256, AesGcmCipher::synthetic());

    let a = sha.transform_record(&ann(), 0, SALT, KEY).unwrap();
    let b = hmac.transform_record(&ann(), 0, SALT, KEY).unwrap();

    assert_ne!(a.number, b.number);
    assert_eq!(b.number, HmacSha256.digest("4111111111111111", SALT).unwrap());
    assert_eq!(a.name, b.name);
    assert_eq!(hmac.digest_algorithm(), DigestAlgorithm::HmacSha256);
}

#[test]
fn test_different_salt_and_key_change_output() {
    let transformer = deterministic();
    let base = transformer.transform_record(&ann(), 0, SALT, KEY).unwrap();
    let other_salt = transformer.transform_record(&ann(), 0, "S2", KEY).unwrap();
    let other_key = transformer.transform_record(&ann(), 0, SALT, "K2").unwrap();

    assert_ne!(base.number, other_salt.number);
    assert_eq!(base.name, other_salt.name);
    assert_ne!(base.name, other_key.name);
    assert_eq!(base.number, other_key.number);
}

#[test]
fn test_secrets_not_in_output() {
    let salt = "very-distinct-salt-value";
    let key = "very-distinct-key-value";
    let transformer = RecordTransformer::default();
    let output = transformer.transform(&sample_batch(5), salt, key).unwrap();
    let serialized = serde_json::to_string(&output).unwrap();

    assert!(!serialized.contains(salt));
    assert!(!serialized.contains(key));
}

#[test]
fn test_empty_batch() {
    let transformer = RecordTransformer::default();
    assert!(transformer.transform(&[], SALT, KEY).unwrap().is_empty());
    assert!(transformer.transform_each(&[], SALT, KEY).is_empty());
}

#[test]
fn test_empty_field_values_still_transformed() {
    let transformer = RecordTransformer::default();
    let blank = CardRecord::default();
    let out = transformer.transform_record(&blank, 0, SALT, KEY).unwrap();

    for field in CardField::ALL {
        assert!(!out.get(field).is_empty(), "{} stayed empty", field);
    }
    let back = transformer.reveal_record(&out, 0, KEY).unwrap();
    assert_eq!(back.name, "");
}
