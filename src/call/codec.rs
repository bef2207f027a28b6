use crate::call::SignedCall;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode call: {0}")]
    EncodeError(String),

    #[error("Failed to decode call: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Wire encodings for signed calls (postcard binary, hex, URL-safe base64)
pub struct CallCodec;

impl CallCodec {
    pub fn encode(call: &SignedCall) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(call).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<SignedCall, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    pub fn encode_hex(call: &SignedCall) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode(call)?))
    }

    pub fn decode_hex(hex_str: &str) -> Result<SignedCall, CodecError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    pub fn encode_base64(call: &SignedCall) -> Result<String, CodecError> {
        Ok(URL_SAFE_NO_PAD.encode(Self::encode(call)?))
    }

    pub fn decode_base64(b64_str: &str) -> Result<SignedCall, CodecError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str.trim())
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
