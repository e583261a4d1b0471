//! End-to-end tests over the public API, including stored wire-format
//! vectors. If a vector test fails here, the token format has changed and
//! previously issued tokens will no longer verify.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use signet::signer::{KeyDerivation, Signer, TimestampSigner, KEY_LEN, NO_MAX_AGE};
use signet::{generate_key, HashAlgorithm, SignetError, UrlSafeSerializer};

const VECTOR_KEY: &[u8] = b"0123456789abcdef0123456789abcdef";

fn vector_signer() -> Signer {
    Signer::new(VECTOR_KEY).expect("vector key is 32 bytes")
}

// === Wire-format vectors ===

#[test]
fn test_vector_default_token() {
    let signed = vector_signer().sign(b"hello world");
    assert_eq!(signed, b"hello world.djAjh6v-QyrAs9F8uGKIvp15F2s");
}

#[test]
fn test_vector_concat_derivation_token() {
    let signer = Signer::builder()
        .key(VECTOR_KEY)
        .derivation(KeyDerivation::Concat)
        .build()
        .unwrap();
    let signed = signer.sign(b"hello world");
    assert_eq!(signed, b"hello world.nXN0Ky4l9nV1df9EX8a5i5HL20k");
}

#[test]
fn test_vector_sha256_token() {
    let signer = Signer::builder()
        .key(VECTOR_KEY)
        .digest(HashAlgorithm::Sha256)
        .build()
        .unwrap();
    let signed = signer.sign(b"hello world");
    assert_eq!(
        signed,
        b"hello world.eNukCLtswKlNF_5AArWch7FS70C85CpjV7zN6nZMll0"
    );
}

#[test]
fn test_vector_timestamp_token() {
    let signer = TimestampSigner::new(vector_signer());
    let signed = signer.sign_at(b"hello", 1_700_000_000);
    assert_eq!(signed, b"hello.ZVPxAA.KMk1yyD6tfyI34Fkz0bnHhO-knY");

    let (value, issued_at) = signer.unsign(&signed, NO_MAX_AGE).unwrap();
    assert_eq!(value, b"hello");
    assert_eq!(issued_at, 1_700_000_000);
}

// === Properties across the full stack ===

#[test]
fn test_roundtrip_with_generated_key() {
    let signer = Signer::new(generate_key()).unwrap();
    let signed = signer.sign(b"the quick brown fox");
    assert_eq!(signer.unsign(&signed).unwrap(), b"the quick brown fox");
}

#[test]
fn test_rotated_keyset_accepts_old_and_signs_new() {
    let old_key = vec![0x11u8; KEY_LEN];
    let new_key = vec![0x22u8; KEY_LEN];

    let before = Signer::new(old_key.clone()).unwrap();
    let token = before.sign(b"pre-rotation token");

    let after = Signer::builder()
        .keys(vec![old_key, new_key.clone()])
        .build()
        .unwrap();
    assert_eq!(after.unsign(&token).unwrap(), b"pre-rotation token");

    let fresh = after.sign(b"post-rotation token");
    let new_only = Signer::new(new_key).unwrap();
    assert_eq!(new_only.unsign(&fresh).unwrap(), b"post-rotation token");
}

#[test]
fn test_immediate_unsign_reports_recent_issuance() {
    let signer = TimestampSigner::new(vector_signer());
    let before = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let signed = signer.sign(b"hello");
    let (_, issued_at) = signer.unsign(&signed, Duration::from_secs(3600)).unwrap();
    assert!(issued_at >= before && issued_at <= before + 1);
}

#[test]
fn test_expired_token_still_reports_issued_at() {
    let signer = TimestampSigner::new(vector_signer());
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let signed = signer.sign_at(b"stale", now - 500);

    match signer.unsign(&signed, Duration::from_secs(60)) {
        Err(SignetError::SignatureExpired { issued_at, .. }) => {
            assert_eq!(issued_at, now - 500);
        }
        other => panic!("expected SignatureExpired, got {other:?}"),
    }
    // The zero sentinel disables the age check entirely.
    assert!(signer.unsign(&signed, NO_MAX_AGE).is_ok());
}

#[test]
fn test_url_safe_compression_marker_and_roundtrip() {
    let serializer = UrlSafeSerializer::new(vector_signer());

    let tiny = serde_json::json!({"a": "a"});
    let tiny_token = serializer.serialize(&tiny).unwrap();
    assert_ne!(tiny_token[0], b'.');
    let restored: serde_json::Value = serializer.deserialize(&tiny_token).unwrap();
    assert_eq!(restored, tiny);

    let big = serde_json::json!(vec!["highly repetitive content"; 300]);
    let big_token = serializer.serialize(&big).unwrap();
    assert_eq!(big_token[0], b'.');
    assert!(big_token.len() < serde_json::to_vec(&big).unwrap().len());
    let restored: serde_json::Value = serializer.deserialize(&big_token).unwrap();
    assert_eq!(restored, big);
}

#[test]
fn test_construction_failures() {
    assert!(matches!(
        Signer::new(vec![0u8; 16]),
        Err(SignetError::InvalidKeyLength { actual: 16 })
    ));
    assert!(matches!(
        Signer::builder().keys(Vec::new()).build(),
        Err(SignetError::NoKeys)
    ));
    // One bad key in an otherwise valid set still fails.
    assert!(matches!(
        Signer::builder()
            .keys(vec![vec![0u8; KEY_LEN], vec![0u8; 31]])
            .build(),
        Err(SignetError::InvalidKeyLength { actual: 31 })
    ));
}

#[test]
fn test_unsign_format_error() {
    let signer = Signer::builder()
        .key(VECTOR_KEY)
        .separator(b':')
        .build()
        .unwrap();
    assert!(matches!(
        signer.unsign(b"token without the separator"),
        Err(SignetError::InvalidFormat)
    ));
}
