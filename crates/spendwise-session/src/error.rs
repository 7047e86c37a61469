//! Error types for the session layer.

use std::path::PathBuf;

use spendwise_protocol::ProtocolError;
use spendwise_transport::TransportError;

/// Errors raised by a [`TokenStore`](crate::TokenStore).
///
/// I/O errors are rendered to strings so the type is `Clone`, like every
/// other error a refresh can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("session store I/O failed at {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// The backing document exists but cannot be parsed.
    #[error("session store is corrupt: {0}")]
    Corrupt(String),

    /// An update needed an existing session and there was none.
    #[error("no session to update")]
    NoSession,
}

/// Errors that can occur during session operations.
///
/// These cover the whole session lifecycle: login, registration, refresh
/// and the storage underneath.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The operation needs a session and none is stored.
    #[error("no active session")]
    NoSession,

    /// The server rejected the username/password pair.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server rejected the registration (e.g. duplicate username).
    #[error("registration rejected: {0}")]
    Registration(String),

    /// The refresh token could not be exchanged. The session has already
    /// been cleared; the user must log in again.
    #[error("session expired: {0}")]
    SessionExpired(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// Rejected locally before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The server answered with a status the operation has no meaning for
    /// (typically 5xx).
    #[error("unexpected HTTP {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// A success body did not match the API contract.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The token store failed.
    #[error(transparent)]
    Store(StoreError),

    /// The refresh task ended without producing an outcome (it panicked).
    #[error("refresh aborted: {0}")]
    RefreshAborted(String),
}

/// `StoreError::NoSession` surfaces as `SessionError::NoSession`, so
/// callers see one "not logged in" condition whichever layer noticed it.
impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoSession => SessionError::NoSession,
            other => SessionError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_store_no_session_maps_to_no_session() {
        let err: SessionError = StoreError::NoSession.into();
        assert_eq!(err, SessionError::NoSession);
    }

    #[test]
    fn test_from_store_corrupt_wraps() {
        let err: SessionError = StoreError::Corrupt("bad json".into()).into();
        assert!(matches!(err, SessionError::Store(StoreError::Corrupt(_))));
        assert!(err.to_string().contains("bad json"));
    }

    #[test]
    fn test_from_transport_error_is_network() {
        let err: SessionError = TransportError::Timeout.into();
        assert_eq!(err, SessionError::Network(TransportError::Timeout));
    }
}
