//! Codec trait and implementations for request and response bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The session layer doesn't care HOW bodies are serialized; it holds
//! something that implements [`Codec`]. The auth API speaks JSON, so
//! [`JsonCodec`] is the only implementation today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// - `Send + Sync + 'static` → the codec lives inside the session manager,
///   which is shared across tasks.
/// - `DeserializeOwned` → decoded values own their data, so the response
///   buffer can be dropped right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` header value for encoded bodies.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use spendwise_protocol::{Codec, JsonCodec, RefreshResponse};
///
/// let codec = JsonCodec;
/// let resp: RefreshResponse = codec
///     .decode(br#"{"access_token": "A2"}"#)
///     .unwrap();
/// assert_eq!(resp.access_token, "A2");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value)
            .map_err(|e| ProtocolError::Encode(e.to_string()))
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data)
            .map_err(|e| ProtocolError::Decode(e.to_string()))
    }
}

/// Extracts the human-readable reason from a failure body.
///
/// The backend answers errors with `{"message": "..."}`. Anything else
/// (an HTML proxy page, an empty body) falls back to the trimmed raw text,
/// and an empty body becomes `"no message"`.
#[cfg(feature = "json")]
pub fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<crate::ErrorBody>(body) {
        return parsed.message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no message".to_string()
    } else {
        text.to_string()
    }
}
