//! Error types for the protocol layer.
//!
//! Each Spendwise crate defines its own error enum. When you see a
//! `ProtocolError`, the bytes arrived fine but were not the shape the
//! auth API promises.

/// Errors that can occur in the protocol layer.
///
/// The serde error is rendered to a string so the type stays `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(String),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: a missing `access_token`, an HTML error page where
    /// JSON was expected, or a truncated body.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The body parsed but violates the API contract, e.g. an empty
    /// access token.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
