//! Unified error type for the Spendwise client.

use spendwise_client::ClientError;
use spendwise_protocol::ProtocolError;
use spendwise_session::{SessionError, StoreError};
use spendwise_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `spendwise` crate, you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpendwiseError {
    /// Configuration could not be read.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A transport-level error (connect, timeout, body).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The token store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A session-level error (credentials, expiry, no session).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An authenticated request failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SpendwiseError {
    /// `true` if the user has to log in (again) before retrying.
    pub fn requires_login(&self) -> bool {
        match self {
            Self::Session(SessionError::NoSession | SessionError::SessionExpired(_)) => true,
            Self::Store(StoreError::NoSession) => true,
            Self::Client(e) => e.requires_login(),
            _ => false,
        }
    }
}
