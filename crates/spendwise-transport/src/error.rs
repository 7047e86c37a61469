/// Errors that can occur in the transport layer.
///
/// Every variant means no usable HTTP response was obtained. An HTTP error
/// status is a response, not a `TransportError`.
///
/// Payloads are rendered messages rather than source errors so the type
/// stays `Clone`: one refresh failure is handed to every caller waiting on
/// it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached (DNS, refused, TLS).
    #[error("connect failed: {0}")]
    Connect(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The request failed after the connection was established.
    #[error("request failed: {0}")]
    Request(String),

    /// Reading the response body failed.
    #[error("reading response body failed: {0}")]
    Body(String),

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
