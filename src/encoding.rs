//! Byte-level codecs shared by the signing layers.
//!
//! Covers three concerns:
//! - Minimal big-endian integer encoding, used for token timestamps
//! - URL-safe unpadded base64, used for signatures and framed payloads
//! - zlib compression for the URL-safe serializer

use std::io::{Read, Write};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::SignetError;

/// Encode a non-negative integer as minimal-width big-endian bytes.
/// Zero encodes to an empty sequence; the output never has a leading
/// zero byte.
#[must_use]
pub fn int_to_bytes(mut n: u64) -> Vec<u8> {
    let mut out = Vec::new();
    while n > 0 {
        out.insert(0, (n & 0xFF) as u8);
        n >>= 8;
    }
    out
}

/// Decode minimal big-endian bytes back to an integer.
/// Empty input decodes to zero.
#[must_use]
pub fn bytes_to_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Base64-encode with the URL-safe alphabet, no padding.
#[must_use]
pub fn base64_encode(data: &[u8]) -> Vec<u8> {
    URL_SAFE_NO_PAD.encode(data).into_bytes()
}

/// Decode URL-safe unpadded base64.
pub fn base64_decode(encoded: &[u8]) -> Result<Vec<u8>, SignetError> {
    Ok(URL_SAFE_NO_PAD.decode(encoded)?)
}

/// Compress with zlib at the default level.
#[must_use]
pub fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .expect("writing to Vec cannot fail");
    encoder.finish().expect("writing to Vec cannot fail")
}

/// Decompress a zlib stream to completion. The decoder's own end-of-stream
/// signal decides where the payload ends, so trailing NUL bytes in genuine
/// content survive intact.
pub fn zlib_decompress(compressed: &[u8]) -> Result<Vec<u8>, SignetError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(SignetError::Decompress)?;
    Ok(out)
}

/// Search `haystack` for `needle` right-to-left, returning the index of the
/// rightmost occurrence.
#[must_use]
pub fn rfind_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().rposition(|&b| b == needle)
}
