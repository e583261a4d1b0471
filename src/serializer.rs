//! Signed serializers: marshal a structured value, sign the bytes, and
//! reverse the process on the way back in.
//!
//! Three variants over the same pattern:
//! - [`Serializer`]: marshal + plain signature
//! - [`TimestampSerializer`]: marshal + timestamped signature
//! - [`UrlSafeSerializer`]: marshal + opportunistic zlib + base64 framing,
//!   producing tokens safe to embed in URLs and cookies

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::encoding::{base64_decode, base64_encode, zlib_compress, zlib_decompress};
use crate::error::SignetError;
use crate::signer::{Signer, TimestampSigner};

/// Marker prefixed to a framed payload when it was stored compressed.
/// Distinct in role from the signer's separator: this is a leading content
/// marker, not a segment delimiter.
const COMPRESSED_MARKER: u8 = b'.';

/// The injectable marshal/unmarshal pair. The default [`JsonCodec`] covers
/// the common case; substitute another implementation to change the payload
/// representation without touching the signing layers.
pub trait PayloadCodec {
    fn marshal<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SignetError>;
    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SignetError>;
}

/// JSON payload codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn marshal<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SignetError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn unmarshal<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, SignetError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Marshal-then-sign over a plain [`Signer`].
#[derive(Debug, Clone)]
pub struct Serializer<C: PayloadCodec = JsonCodec> {
    signer: Signer,
    codec: C,
}

impl Serializer<JsonCodec> {
    #[must_use]
    pub fn new(signer: Signer) -> Serializer<JsonCodec> {
        Serializer {
            signer,
            codec: JsonCodec,
        }
    }
}

impl<C: PayloadCodec> Serializer<C> {
    #[must_use]
    pub fn with_codec(signer: Signer, codec: C) -> Serializer<C> {
        Serializer { signer, codec }
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SignetError> {
        let marshaled = self.codec.marshal(value)?;
        Ok(self.signer.sign(&marshaled))
    }

    pub fn deserialize<T: DeserializeOwned>(&self, signed: &[u8]) -> Result<T, SignetError> {
        let marshaled = self.signer.unsign(signed)?;
        self.codec.unmarshal(&marshaled)
    }
}

/// Marshal-then-sign over a [`TimestampSigner`]; deserialization enforces
/// `max_age` and returns the issuance time.
#[derive(Debug, Clone)]
pub struct TimestampSerializer<C: PayloadCodec = JsonCodec> {
    signer: TimestampSigner,
    codec: C,
}

impl TimestampSerializer<JsonCodec> {
    #[must_use]
    pub fn new(signer: TimestampSigner) -> TimestampSerializer<JsonCodec> {
        TimestampSerializer {
            signer,
            codec: JsonCodec,
        }
    }
}

impl<C: PayloadCodec> TimestampSerializer<C> {
    #[must_use]
    pub fn with_codec(signer: TimestampSigner, codec: C) -> TimestampSerializer<C> {
        TimestampSerializer { signer, codec }
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SignetError> {
        let marshaled = self.codec.marshal(value)?;
        Ok(self.signer.sign(&marshaled))
    }

    pub fn deserialize<T: DeserializeOwned>(
        &self,
        signed: &[u8],
        max_age: Duration,
    ) -> Result<(T, u64), SignetError> {
        let (marshaled, issued_at) = self.signer.unsign(signed, max_age)?;
        Ok((self.codec.unmarshal(&marshaled)?, issued_at))
    }
}

/// Marshal, opportunistically compress, base64-frame, then sign.
///
/// Compression is used only when it actually shrinks the payload; a
/// compressed frame is marked with a leading `.` so decoding knows whether
/// to inflate.
#[derive(Debug, Clone)]
pub struct UrlSafeSerializer<C: PayloadCodec = JsonCodec> {
    signer: Signer,
    codec: C,
}

impl UrlSafeSerializer<JsonCodec> {
    #[must_use]
    pub fn new(signer: Signer) -> UrlSafeSerializer<JsonCodec> {
        UrlSafeSerializer {
            signer,
            codec: JsonCodec,
        }
    }
}

impl<C: PayloadCodec> UrlSafeSerializer<C> {
    #[must_use]
    pub fn with_codec(signer: Signer, codec: C) -> UrlSafeSerializer<C> {
        UrlSafeSerializer { signer, codec }
    }

    pub fn serialize<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, SignetError> {
        let marshaled = self.codec.marshal(value)?;

        let compressed = zlib_compress(&marshaled);
        let (payload, is_compressed) = if compressed.len() < marshaled.len() {
            (compressed, true)
        } else {
            (marshaled, false)
        };

        let encoded = base64_encode(&payload);
        let mut frame = Vec::with_capacity(encoded.len() + 1);
        if is_compressed {
            frame.push(COMPRESSED_MARKER);
        }
        frame.extend_from_slice(&encoded);

        Ok(self.signer.sign(&frame))
    }

    pub fn deserialize<T: DeserializeOwned>(&self, signed: &[u8]) -> Result<T, SignetError> {
        let frame = self.signer.unsign(signed)?;

        let (encoded, is_compressed) = match frame.split_first() {
            Some((&COMPRESSED_MARKER, rest)) => (rest, true),
            _ => (frame.as_slice(), false),
        };

        let mut payload = base64_decode(encoded)?;
        if is_compressed {
            payload = zlib_decompress(&payload)?;
        }
        self.codec.unmarshal(&payload)
    }
}
