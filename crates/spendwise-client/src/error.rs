//! Error types for authenticated requests.

use spendwise_protocol::ProtocolError;
use spendwise_session::SessionError;
use spendwise_transport::TransportError;

/// Errors returned by [`RequestExecutor`](crate::RequestExecutor).
///
/// Note that `execute` only produces `Session`, `Network` and `Protocol`:
/// a non-2xx response is still a response. `Status` comes from
/// `execute_json`, which needs a 2xx body to decode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No session, or the session expired and was cleared.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// `true` if the user has to log in (again) before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::NoSession | SessionError::SessionExpired(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_login_for_missing_or_expired_session() {
        assert!(ClientError::from(SessionError::NoSession).requires_login());
        assert!(
            ClientError::from(SessionError::SessionExpired("gone".into()))
                .requires_login()
        );
    }

    #[test]
    fn test_requires_login_false_for_other_errors() {
        assert!(!ClientError::from(TransportError::Timeout).requires_login());
        assert!(
            !ClientError::Status {
                status: 500,
                message: "boom".into()
            }
            .requires_login()
        );
    }

    #[test]
    fn test_session_error_display_is_transparent() {
        let err = ClientError::from(SessionError::NoSession);
        assert_eq!(err.to_string(), SessionError::NoSession.to_string());
    }
}
