//! Secret key generation.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::signer::KEY_LEN;

/// Generate a fresh signing key from the OS CSPRNG.
///
/// 16 random bytes are hex-expanded to 32 printable ASCII bytes, which
/// satisfies the signer's key-length invariant and keeps keys easy to
/// store in environment variables and config files.
#[must_use]
pub fn generate_key() -> Vec<u8> {
    let mut raw = [0u8; KEY_LEN / 2];
    OsRng.fill_bytes(&mut raw);
    hex::encode(raw).into_bytes()
}
