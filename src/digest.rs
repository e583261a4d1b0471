//! Keyed digest primitive: plain and HMAC digests over a pluggable hash.
//!
//! The hash is a closed enumeration rather than a trait object so a
//! `Signer` stays `Copy`-cheap to configure and trivially `Send + Sync`.

use hmac::digest::core_api::BlockSizeUser;
use hmac::{Mac, SimpleHmac};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Hash function underlying key derivation and HMAC signatures.
///
/// `Sha1` is the default for wire compatibility with existing 160-bit
/// token deployments; prefer `Sha256` for new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    /// Digest output length in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Plain one-way hash of `data`.
    #[must_use]
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// HMAC of `data` under `key` with this hash.
    #[must_use]
    pub fn hmac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => hmac_with::<Sha1>(key, data),
            HashAlgorithm::Sha256 => hmac_with::<Sha256>(key, data),
            HashAlgorithm::Sha512 => hmac_with::<Sha512>(key, data),
        }
    }
}

fn hmac_with<D: Digest + BlockSizeUser>(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
