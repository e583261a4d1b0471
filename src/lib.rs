//! Signet: tamper-evident signed tokens with key rotation, embedded
//! timestamps, and URL-safe framing.
//!
//! Tokens are `value '.' base64url(hmac)` with the HMAC key derived from
//! a salted secret. Verification accepts any key in an ordered key set so
//! keys can be rotated without invalidating outstanding tokens. Tokens
//! authenticate their contents but do not encrypt them.

pub mod digest;
pub mod encoding;
pub mod error;
pub mod keys;
pub mod serializer;
pub mod signer;

pub use digest::HashAlgorithm;
pub use error::SignetError;
pub use keys::generate_key;
pub use serializer::{JsonCodec, PayloadCodec, Serializer, TimestampSerializer, UrlSafeSerializer};
pub use signer::{KeyDerivation, Signer, TimestampSigner, KEY_LEN, NO_MAX_AGE};
