//! Token signing and verification: `Signer` and `TimestampSigner`.
//!
//! A token is `value || separator || base64url(hmac)`. The HMAC key is
//! derived from the last ("primary") key in the configured key set;
//! verification tries every key in order, which is the rotation mechanism:
//! append a new primary key and keep old keys so outstanding tokens still
//! verify.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use subtle::ConstantTimeEq;

use crate::digest::HashAlgorithm;
use crate::encoding::{base64_decode, base64_encode, bytes_to_int, int_to_bytes, rfind_byte};
use crate::error::SignetError;

/// Required secret key length in bytes.
pub const KEY_LEN: usize = 32;

/// Default separator between the value and signature segments.
pub const DEFAULT_SEPARATOR: u8 = b'.';

/// Default key-derivation salt.
pub const DEFAULT_SALT: &[u8] = b"signet.Signer";

/// Sentinel for "no expiry limit" in timestamp verification.
pub const NO_MAX_AGE: Duration = Duration::ZERO;

/// How a raw secret key is turned into the HMAC signing key.
///
/// Both modes mix in the configured salt so the same secret can be used
/// in unrelated signing contexts without producing interchangeable
/// signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyDerivation {
    /// `hash(salt || key)`
    Concat,
    /// `hash(salt || "signer" || key)`
    #[default]
    DjangoConcat,
}

/// Signs byte values and verifies signed tokens.
///
/// Immutable after construction; share freely across threads. Key
/// rotation means building a new `Signer` with the updated key set.
#[derive(Debug, Clone)]
pub struct Signer {
    keys: Vec<Vec<u8>>,
    separator: u8,
    digest: HashAlgorithm,
    salt: Vec<u8>,
    derivation: KeyDerivation,
}

/// Builder for [`Signer`]; validation happens in [`SignerBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct SignerBuilder {
    keys: Vec<Vec<u8>>,
    separator: Option<u8>,
    digest: Option<HashAlgorithm>,
    salt: Option<Vec<u8>>,
    derivation: Option<KeyDerivation>,
}

impl SignerBuilder {
    /// Use a single signing key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.keys = vec![key.into()];
        self
    }

    /// Use an ordered key set; the last entry is the primary key.
    #[must_use]
    pub fn keys(mut self, keys: Vec<Vec<u8>>) -> Self {
        self.keys = keys;
        self
    }

    /// Override the separator byte (default `.`). Must not be a byte from
    /// the URL-safe base64 alphabet, or signatures cannot be split off.
    #[must_use]
    pub fn separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Override the hash algorithm (default SHA-1).
    #[must_use]
    pub fn digest(mut self, digest: HashAlgorithm) -> Self {
        self.digest = Some(digest);
        self
    }

    /// Override the key-derivation salt.
    #[must_use]
    pub fn salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Override the key-derivation mode.
    #[must_use]
    pub fn derivation(mut self, derivation: KeyDerivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    /// Validate the configuration and produce an immutable [`Signer`].
    pub fn build(self) -> Result<Signer, SignetError> {
        if self.keys.is_empty() {
            return Err(SignetError::NoKeys);
        }
        for key in &self.keys {
            if key.len() != KEY_LEN {
                return Err(SignetError::InvalidKeyLength { actual: key.len() });
            }
        }
        Ok(Signer {
            keys: self.keys,
            separator: self.separator.unwrap_or(DEFAULT_SEPARATOR),
            digest: self.digest.unwrap_or_default(),
            salt: self.salt.unwrap_or_else(|| DEFAULT_SALT.to_vec()),
            derivation: self.derivation.unwrap_or_default(),
        })
    }
}

impl Signer {
    #[must_use]
    pub fn builder() -> SignerBuilder {
        SignerBuilder::default()
    }

    /// Build a signer with a single key and default configuration.
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Signer, SignetError> {
        Signer::builder().key(key).build()
    }

    #[must_use]
    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// The primary key, used for producing new signatures.
    fn primary_key(&self) -> &[u8] {
        // The key set is validated non-empty at construction.
        &self.keys[self.keys.len() - 1]
    }

    /// Derive the HMAC signing key from a base secret.
    fn derive_signing_key(&self, base_key: &[u8]) -> Vec<u8> {
        let mut input = self.salt.clone();
        if self.derivation == KeyDerivation::DjangoConcat {
            input.extend_from_slice(b"signer");
        }
        input.extend_from_slice(base_key);
        self.digest.digest(&input)
    }

    fn signature_for(&self, value: &[u8], base_key: &[u8]) -> Vec<u8> {
        let signing_key = self.derive_signing_key(base_key);
        self.digest.hmac(&signing_key, value)
    }

    /// Sign `value`, returning `value || separator || base64url(hmac)`.
    ///
    /// The separator may appear inside `value`; verification splits on the
    /// rightmost occurrence.
    #[must_use]
    pub fn sign(&self, value: &[u8]) -> Vec<u8> {
        let signature = base64_encode(&self.signature_for(value, self.primary_key()));
        let mut signed = Vec::with_capacity(value.len() + 1 + signature.len());
        signed.extend_from_slice(value);
        signed.push(self.separator);
        signed.extend_from_slice(&signature);
        signed
    }

    /// Verify `signed` and return the original value.
    ///
    /// Every configured key is tried in order; the comparison against each
    /// candidate signature is constant-time.
    pub fn unsign(&self, signed: &[u8]) -> Result<Vec<u8>, SignetError> {
        let sep = rfind_byte(signed, self.separator).ok_or(SignetError::InvalidFormat)?;
        let value = &signed[..sep];
        let signature = base64_decode(&signed[sep + 1..])?;

        for key in &self.keys {
            let expected = self.signature_for(value, key);
            if expected.ct_eq(&signature).into() {
                return Ok(value.to_vec());
            }
        }
        Err(SignetError::InvalidSignature)
    }

    /// True if `signed` carries a valid signature under any configured key.
    #[must_use]
    pub fn validate(&self, signed: &[u8]) -> bool {
        self.unsign(signed).is_ok()
    }
}

/// A [`Signer`] that stamps each value with its issuance time and checks
/// token age on verification.
///
/// The timestamp is appended to the value before signing, so it is covered
/// by the signature and cannot be altered without detection.
#[derive(Debug, Clone)]
pub struct TimestampSigner {
    signer: Signer,
}

impl TimestampSigner {
    #[must_use]
    pub fn new(signer: Signer) -> TimestampSigner {
        TimestampSigner { signer }
    }

    /// The wrapped plain signer.
    #[must_use]
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Sign `value` with the current Unix time embedded.
    #[must_use]
    pub fn sign(&self, value: &[u8]) -> Vec<u8> {
        self.sign_at(value, Self::unix_now())
    }

    /// Sign `value` with an explicit issuance time. Exposed for callers
    /// that stamp tokens from their own clock.
    #[must_use]
    pub fn sign_at(&self, value: &[u8], issued_at: u64) -> Vec<u8> {
        let timestamp = base64_encode(&int_to_bytes(issued_at));
        let mut stamped = Vec::with_capacity(value.len() + 1 + timestamp.len());
        stamped.extend_from_slice(value);
        stamped.push(self.signer.separator);
        stamped.extend_from_slice(&timestamp);
        self.signer.sign(&stamped)
    }

    /// Verify `signed`, recover the original value and its issuance time,
    /// and reject tokens older than `max_age`.
    ///
    /// `max_age` of [`NO_MAX_AGE`] (zero) disables the age check. An expired
    /// token fails with [`SignetError::SignatureExpired`], which carries the
    /// parsed issuance time so callers can report the actual age.
    pub fn unsign(
        &self,
        signed: &[u8],
        max_age: Duration,
    ) -> Result<(Vec<u8>, u64), SignetError> {
        let stamped = self.signer.unsign(signed)?;

        let sep =
            rfind_byte(&stamped, self.signer.separator).ok_or(SignetError::MissingTimestamp)?;
        let value = &stamped[..sep];
        let timestamp_bytes = base64_decode(&stamped[sep + 1..])?;
        let issued_at = bytes_to_int(&timestamp_bytes);

        // A clock skewed behind the issuer yields age zero, not an error.
        let age_secs = Self::unix_now().saturating_sub(issued_at);
        if max_age != NO_MAX_AGE && age_secs > max_age.as_secs() {
            return Err(SignetError::SignatureExpired {
                issued_at,
                age_secs,
                max_age_secs: max_age.as_secs(),
            });
        }

        Ok((value.to_vec(), issued_at))
    }

    /// True if `signed` is authentic and no older than `max_age`.
    #[must_use]
    pub fn validate(&self, signed: &[u8], max_age: Duration) -> bool {
        self.unsign(signed, max_age).is_ok()
    }
}
