//! The authenticated request executor.
//!
//! Wraps every protected API call with the refresh-and-retry policy:
//!
//! ```text
//!  read session ──(none)──→ NoSession
//!       │
//!  send with access token ──(not 401)──→ return response
//!       │ 401
//!  request_refresh() ──(fails)──→ SessionExpired  (session already cleared)
//!       │                  └──(aborted, store error)──→ passed through
//!       │ new token
//!  send again, exactly once ──→ return response, even another 401
//! ```
//!
//! The executor owns the `Authorization` header. Whatever the caller put
//! there is dropped.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use spendwise_protocol::{Codec, JsonCodec, error_message};
use spendwise_session::{SessionError, SessionManager, TokenStore};
use spendwise_transport::{HttpRequest, HttpResponse, HttpTransport, Method};

use crate::{ClientError, RefreshCoordinator};

const AUTHORIZATION: &str = "Authorization";

// ---------------------------------------------------------------------------
// RequestSpec
// ---------------------------------------------------------------------------

/// What the caller wants sent.
///
/// `path` is either an absolute `http(s)://` URL or a path relative to the
/// API base URL, e.g. `"/expense/1/expenses"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a header. An `Authorization` header is accepted here but
    /// never sent.
    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a raw body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Serializes `body` as JSON and sets the matching `Content-Type`.
    pub fn json<B: Serialize>(self, body: &B) -> Result<Self, ClientError> {
        let codec = JsonCodec;
        let bytes = codec.encode(body)?;
        Ok(self.header("Content-Type", codec.content_type()).body(bytes))
    }
}

// ---------------------------------------------------------------------------
// Attempt
// ---------------------------------------------------------------------------

/// How a call ended, for the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    /// Answered on the first send.
    Direct,
    /// Answered by the single retry after a refresh.
    Retried,
    /// The refresh failed, so there was no retry.
    RefreshFailed,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Direct => "direct",
            Self::Retried => "retried",
            Self::RefreshFailed => "refresh_failed",
        })
    }
}

// ---------------------------------------------------------------------------
// RequestExecutor
// ---------------------------------------------------------------------------

/// Sends requests as the logged-in user.
pub struct RequestExecutor<T: HttpTransport, S: TokenStore> {
    coordinator: RefreshCoordinator<T, S>,
    codec: JsonCodec,
}

impl<T: HttpTransport, S: TokenStore> Clone for RequestExecutor<T, S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            codec: JsonCodec,
        }
    }
}

impl<T: HttpTransport, S: TokenStore> RequestExecutor<T, S> {
    pub fn new(coordinator: RefreshCoordinator<T, S>) -> Self {
        Self {
            coordinator,
            codec: JsonCodec,
        }
    }

    pub fn coordinator(&self) -> &RefreshCoordinator<T, S> {
        &self.coordinator
    }

    fn manager(&self) -> &SessionManager<T, S> {
        self.coordinator.manager()
    }

    /// Sends `spec` with the current access token, refreshing and retrying
    /// once on `401`.
    ///
    /// Any status other than the first `401` is returned as-is, so callers
    /// still see `403`, `404`, `500`, or a `401` from the retry.
    ///
    /// # Errors
    /// - `Session(NoSession)`: nobody is logged in; nothing was sent
    /// - `Session(SessionExpired)`: the refresh failed and the session has
    ///   been cleared
    /// - `Session(RefreshAborted | Store)`: the refresh could not finish;
    ///   the stored session is untouched
    /// - `Network`: a send produced no response
    pub async fn execute(
        &self,
        spec: &RequestSpec,
    ) -> Result<HttpResponse, ClientError> {
        let session = self.manager().current()?.ok_or(SessionError::NoSession)?;
        let url = self.manager().api().join(&spec.path);

        let response = self.send(spec, &url, &session.access_token).await?;
        if !response.is_unauthorized() {
            log_done(spec.method, &url, Attempt::Direct, response.status);
            return Ok(response);
        }

        tracing::debug!(method = %spec.method, %url, "access token rejected, refreshing");

        let access_token = match self.coordinator.request_refresh().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(
                    method = %spec.method,
                    %url,
                    attempt = %Attempt::RefreshFailed,
                    error = %e,
                    "request abandoned"
                );
                return Err(refresh_failure(e).into());
            }
        };

        let response = self.send(spec, &url, &access_token).await?;
        log_done(spec.method, &url, Attempt::Retried, response.status);
        Ok(response)
    }

    /// Like [`execute`](Self::execute), then decodes a 2xx JSON body.
    ///
    /// # Errors
    /// Everything `execute` returns, plus `Status` for a non-2xx response
    /// and `Protocol` for a body that doesn't decode as `R`.
    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
    ) -> Result<R, ClientError> {
        let response = self.execute(spec).await?;
        if !response.is_success() {
            return Err(ClientError::Status {
                status: response.status,
                message: error_message(&response.body),
            });
        }
        Ok(self.codec.decode(&response.body)?)
    }

    async fn send(
        &self,
        spec: &RequestSpec,
        url: &str,
        access_token: &str,
    ) -> Result<HttpResponse, ClientError> {
        let request = authorized_request(spec, url, access_token);
        Ok(self.manager().transport().send(request).await?)
    }
}

/// Builds the wire request for `spec` without touching `spec` itself.
fn authorized_request(
    spec: &RequestSpec,
    url: &str,
    access_token: &str,
) -> HttpRequest {
    let mut request = HttpRequest::new(spec.method, url);
    request.headers = spec.headers.clone();
    request.set_header(AUTHORIZATION, format!("Bearer {access_token}"));
    if let Some(body) = &spec.body {
        request = request.body(body.clone());
    }
    request
}

/// A session that vanished during the refresh (a racing logout) is as
/// gone as an expired one. Every other failure is returned verbatim: an
/// aborted refresh or a failing store leaves the session in place.
fn refresh_failure(e: SessionError) -> SessionError {
    match e {
        SessionError::NoSession => {
            SessionError::SessionExpired(SessionError::NoSession.to_string())
        }
        other => other,
    }
}

fn log_done(method: Method, url: &str, attempt: Attempt, status: u16) {
    tracing::debug!(%method, %url, %attempt, status, "request complete");
}
