use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignetError {
    #[error("no signing keys configured")]
    NoKeys,

    #[error("invalid key length: expected 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    #[error("invalid token format: separator not found")]
    InvalidFormat,

    #[error("signature does not match for any configured key")]
    InvalidSignature,

    #[error("signed value carries no timestamp")]
    MissingTimestamp,

    #[error("signature expired: issued at {issued_at}, age {age_secs}s exceeds max {max_age_secs}s")]
    SignatureExpired {
        issued_at: u64,
        age_secs: u64,
        max_age_secs: u64,
    },

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("payload codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}
