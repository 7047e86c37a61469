//! The session manager: the only writer of session state.
//!
//! It's responsible for:
//! - Logging in (and persisting the resulting session)
//! - Registering new accounts (without logging in)
//! - Exchanging the refresh token for a new access token
//! - Logging out
//!
//! # Refresh failure policy
//!
//! `refresh()` clears the whole session on ANY failure: a rejected refresh
//! token, a network error, a malformed body. A session that cannot be
//! refreshed must not linger, or every later request would 401, refresh,
//! fail, and repeat.
//!
//! # Concurrency note
//!
//! `SessionManager` does not deduplicate refreshes. Two concurrent calls to
//! `refresh()` make two requests. Single-flight is the job of the
//! `RefreshCoordinator` one layer up.

use std::sync::Arc;

use spendwise_protocol::{
    error_message, ApiUrl, Codec, JsonCodec, LoginResponse, RefreshResponse,
    RegisterResponse, LOGIN_PATH, REFRESH_PATH, REGISTER_PATH,
};
use spendwise_transport::{HttpRequest, HttpResponse, HttpTransport, Method};

use crate::{
    AuthCredentials, RegisteredUser, Session, SessionError, TokenStore,
};

/// Performs the auth API operations and owns the persisted session.
///
/// ## Lifecycle
///
/// ```text
///            login()                 refresh() ok
///  [None] ───────────→ [Session] ─────────────────→ [Session'] (new access token)
///    ↑                    │  │
///    │     logout()       │  │ refresh() fails
///    └────────────────────┘  └──────────────→ [None] + SessionExpired
/// ```
pub struct SessionManager<T: HttpTransport, S: TokenStore> {
    transport: Arc<T>,
    store: Arc<S>,
    api: ApiUrl,
    codec: JsonCodec,
}

impl<T: HttpTransport, S: TokenStore> SessionManager<T, S> {
    /// Creates a manager talking to `api` through `transport` and
    /// persisting into `store`.
    pub fn new(transport: Arc<T>, store: Arc<S>, api: ApiUrl) -> Self {
        Self {
            transport,
            store,
            api,
            codec: JsonCodec,
        }
    }

    /// The store this manager persists into.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The transport this manager sends through.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// The API base URL.
    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// Logs in and persists the resulting session.
    ///
    /// An existing session is only replaced once the new login succeeds.
    ///
    /// # Errors
    /// - [`SessionError::InvalidInput`]: blank username or password
    /// - [`SessionError::InvalidCredentials`]: the server answered 4xx
    /// - [`SessionError::Network`]: no response at all
    /// - [`SessionError::UnexpectedStatus`]: any other non-2xx status
    /// - [`SessionError::Protocol`]: the 2xx body wasn't a login response
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, SessionError> {
        let credentials = AuthCredentials::new(username, password);
        let response = self.post_credentials(LOGIN_PATH, &credentials).await?;

        if response.is_client_error() {
            let message = error_message(&response.body);
            tracing::warn!(
                username,
                status = response.status,
                %message,
                "login rejected"
            );
            return Err(SessionError::InvalidCredentials(message));
        }
        ensure_success(&response)?;

        let body: LoginResponse = self.codec.decode(&response.body)?;
        body.validate()?;
        let session = Session::from(body);
        self.store.set(&session)?;

        tracing::info!(
            user_id = %session.user.id,
            username = %session.user.username,
            "logged in"
        );
        Ok(session)
    }

    /// Creates an account. Does not log in and does not touch the store.
    ///
    /// # Errors
    /// - [`SessionError::InvalidInput`]: blank username or password
    /// - [`SessionError::Registration`]: the server answered 4xx
    ///   (e.g. "User already exists")
    /// - [`SessionError::Network`]: no response at all
    /// - [`SessionError::UnexpectedStatus`]: any other non-2xx status
    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisteredUser, SessionError> {
        let credentials = AuthCredentials::new(username, password);
        let response =
            self.post_credentials(REGISTER_PATH, &credentials).await?;

        if response.is_client_error() {
            let message = error_message(&response.body);
            tracing::warn!(
                username,
                status = response.status,
                %message,
                "registration rejected"
            );
            return Err(SessionError::Registration(message));
        }
        ensure_success(&response)?;

        // An empty 2xx body is still a successful registration.
        let body: RegisterResponse = if response.body.is_empty() {
            RegisterResponse::default()
        } else {
            self.codec.decode(&response.body)?
        };

        tracing::info!(username, "registered");

        Ok(match body.user {
            Some(user) => RegisteredUser {
                id: Some(user.id),
                username: user.username,
                message: body.message,
            },
            None => RegisteredUser {
                id: None,
                username: credentials.username,
                message: body.message,
            },
        })
    }

    /// Exchanges the stored refresh token for a new access token.
    ///
    /// On success only the access token is updated in the store, and the
    /// new token is returned. When the exchange fails the session is
    /// cleared. A store that fails to save the new token keeps the old
    /// session.
    ///
    /// # Errors
    /// - [`SessionError::NoSession`]: nothing to refresh (also returned if
    ///   a logout raced this refresh and won)
    /// - [`SessionError::SessionExpired`]: the exchange failed; the
    ///   session is gone
    /// - [`SessionError::Store`]: the store itself failed; the session is
    ///   left as it was
    pub async fn refresh(&self) -> Result<String, SessionError> {
        let session = self.store.get()?.ok_or(SessionError::NoSession)?;

        match self.exchange_refresh_token(&session.refresh_token).await {
            Ok(access_token) => {
                self.store.set_access_token(&access_token)?;
                tracing::info!(
                    user_id = %session.user.id,
                    "access token refreshed"
                );
                Ok(access_token)
            }
            Err(reason) => {
                tracing::warn!(
                    user_id = %session.user.id,
                    %reason,
                    "refresh failed, clearing session"
                );
                self.store.clear()?;
                Err(SessionError::SessionExpired(reason))
            }
        }
    }

    /// Clears the session. Calling it with no session is a no-op.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.store.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Returns the persisted session, if any.
    ///
    /// Use at startup to resume a previous login without asking for
    /// credentials again.
    pub fn current(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.store.get()?)
    }

    /// `true` if a complete session is stored.
    pub fn is_authenticated(&self) -> Result<bool, SessionError> {
        Ok(self.current()?.is_some())
    }

    /// The current access token.
    ///
    /// # Errors
    /// Returns [`SessionError::NoSession`] if nobody is logged in.
    pub fn access_token(&self) -> Result<String, SessionError> {
        self.current()?
            .map(|s| s.access_token)
            .ok_or(SessionError::NoSession)
    }

    // === Private Methods ===

    async fn post_credentials(
        &self,
        path: &str,
        credentials: &AuthCredentials,
    ) -> Result<HttpResponse, SessionError> {
        credentials.validate()?;
        let body = self.codec.encode(&credentials.body())?;
        let request = HttpRequest::new(Method::Post, self.api.join(path))
            .header("Content-Type", self.codec.content_type())
            .body(body);
        Ok(self.transport.send(request).await?)
    }

    /// Performs `POST /auth/refresh`. The error is a human-readable reason,
    /// because every failure collapses into `SessionExpired` anyway.
    async fn exchange_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<String, String> {
        let request = HttpRequest::new(Method::Post, self.api.join(REFRESH_PATH))
            .header("Authorization", format!("Bearer {refresh_token}"))
            .header("Content-Type", self.codec.content_type());

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!(
                "HTTP {}: {}",
                response.status,
                error_message(&response.body)
            ));
        }

        let body: RefreshResponse = self
            .codec
            .decode(&response.body)
            .map_err(|e| e.to_string())?;
        body.validate().map_err(|e| e.to_string())?;
        Ok(body.access_token)
    }
}

fn ensure_success(response: &HttpResponse) -> Result<(), SessionError> {
    if response.is_success() {
        Ok(())
    } else {
        Err(SessionError::UnexpectedStatus {
            status: response.status,
            message: error_message(&response.body),
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! The transport is a scripted double: it replays canned responses in
    //! order and records every request, so tests can assert both what the
    //! manager did with the answer and what it put on the wire.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use spendwise_protocol::{UserId, UserRecord};
    use spendwise_transport::TransportError;

    use super::*;
    use crate::{MemoryTokenStore, StoreError};

    // -- Helpers ----------------------------------------------------------

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn replying(
            replies: impl IntoIterator<Item = Result<HttpResponse, TransportError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpTransport for ScriptedTransport {
        async fn send(
            &self,
            request: HttpRequest,
        ) -> Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left")
        }
    }

    fn ok(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(status, body.as_bytes().to_vec()))
    }

    const LOGIN_OK: &str = r#"{
        "message": "Login successful",
        "access_token": "A1",
        "refresh_token": "R1",
        "user": {"id": 1, "username": "alice"}
    }"#;

    fn alice() -> Session {
        Session {
            access_token: "A1".into(),
            refresh_token: "R1".into(),
            user: UserRecord {
                id: UserId(1),
                username: "alice".into(),
            },
        }
    }

    fn manager(
        transport: Arc<ScriptedTransport>,
        store: Arc<MemoryTokenStore>,
    ) -> SessionManager<ScriptedTransport, MemoryTokenStore> {
        SessionManager::new(transport, store, ApiUrl::new("http://api.test"))
    }

    // =====================================================================
    // login()
    // =====================================================================

    #[tokio::test]
    async fn test_login_success_persists_and_returns_session() {
        let transport = ScriptedTransport::replying([ok(200, LOGIN_OK)]);
        let store = Arc::new(MemoryTokenStore::new());
        let mgr = manager(transport.clone(), store.clone());

        let session = mgr.login("alice", "pw").await.expect("should log in");

        assert_eq!(session, alice());
        assert_eq!(store.get().unwrap(), Some(alice()));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].url, "http://api.test/auth/login");
        assert_eq!(sent[0].header_value("authorization"), None);
        let body: serde_json::Value =
            serde_json::from_slice(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["password"], "pw");
    }

    #[tokio::test]
    async fn test_login_misspelled_refresh_field_accepted() {
        let body = LOGIN_OK.replace("refresh_token", "refesh_token");
        let transport = ScriptedTransport::replying([ok(200, &body)]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let session = mgr.login("alice", "pw").await.expect("should log in");
        assert_eq!(session.refresh_token, "R1");
    }

    #[tokio::test]
    async fn test_login_rejected_returns_invalid_credentials() {
        let transport = ScriptedTransport::replying([ok(
            401,
            r#"{"message": "Invalid credentials"}"#,
        )]);
        let store = Arc::new(MemoryTokenStore::new());
        let mgr = manager(transport, store.clone());

        let result = mgr.login("alice", "wrong").await;

        assert_eq!(
            result,
            Err(SessionError::InvalidCredentials("Invalid credentials".into()))
        );
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_previous_session() {
        let transport = ScriptedTransport::replying([ok(401, "")]);
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(transport, store.clone());

        assert!(mgr.login("bob", "nope").await.is_err());
        assert_eq!(store.get().unwrap(), Some(alice()));
    }

    #[tokio::test]
    async fn test_login_transport_failure_returns_network() {
        let transport = ScriptedTransport::replying([Err(
            TransportError::Connect("refused".into()),
        )]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let result = mgr.login("alice", "pw").await;

        assert!(matches!(result, Err(SessionError::Network(_))));
    }

    #[tokio::test]
    async fn test_login_server_error_returns_unexpected_status() {
        let transport = ScriptedTransport::replying([ok(500, "boom")]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let result = mgr.login("alice", "pw").await;

        assert_eq!(
            result,
            Err(SessionError::UnexpectedStatus {
                status: 500,
                message: "boom".into()
            })
        );
    }

    #[tokio::test]
    async fn test_login_blank_username_never_hits_network() {
        let transport = ScriptedTransport::replying([]);
        let mgr = manager(transport.clone(), Arc::new(MemoryTokenStore::new()));

        let result = mgr.login("", "pw").await;

        assert!(matches!(result, Err(SessionError::InvalidInput(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_login_malformed_body_returns_protocol_error() {
        let transport = ScriptedTransport::replying([ok(200, "<html>")]);
        let store = Arc::new(MemoryTokenStore::new());
        let mgr = manager(transport, store.clone());

        let result = mgr.login("alice", "pw").await;

        assert!(matches!(result, Err(SessionError::Protocol(_))));
        assert_eq!(store.get().unwrap(), None);
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[tokio::test]
    async fn test_register_message_only_returns_submitted_username() {
        let transport = ScriptedTransport::replying([ok(
            201,
            r#"{"message": "User registered successfully"}"#,
        )]);
        let store = Arc::new(MemoryTokenStore::new());
        let mgr = manager(transport.clone(), store.clone());

        let user = mgr.register("bob", "pw").await.expect("should register");

        assert_eq!(user.id, None);
        assert_eq!(user.username, "bob");
        assert_eq!(user.message.as_deref(), Some("User registered successfully"));
        assert_eq!(store.get().unwrap(), None, "register must not log in");
        assert_eq!(transport.requests()[0].url, "http://api.test/auth/register");
    }

    #[tokio::test]
    async fn test_register_with_user_returns_server_id() {
        let transport = ScriptedTransport::replying([ok(
            200,
            r#"{"user": {"id": 9, "username": "bob"}}"#,
        )]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let user = mgr.register("bob", "pw").await.expect("should register");

        assert_eq!(user.id, Some(UserId(9)));
    }

    #[tokio::test]
    async fn test_register_empty_body_is_success() {
        let transport = ScriptedTransport::replying([ok(201, "")]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        assert!(mgr.register("bob", "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_registration_error() {
        let transport = ScriptedTransport::replying([ok(
            400,
            r#"{"message": "User already exists"}"#,
        )]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let result = mgr.register("alice", "pw").await;

        assert_eq!(
            result,
            Err(SessionError::Registration("User already exists".into()))
        );
    }

    #[tokio::test]
    async fn test_register_transport_failure_returns_network() {
        let transport =
            ScriptedTransport::replying([Err(TransportError::Timeout)]);
        let mgr = manager(transport, Arc::new(MemoryTokenStore::new()));

        let result = mgr.register("bob", "pw").await;

        assert_eq!(result, Err(SessionError::Network(TransportError::Timeout)));
    }

    // =====================================================================
    // refresh()
    // =====================================================================

    #[tokio::test]
    async fn test_refresh_success_updates_only_access_token() {
        let transport =
            ScriptedTransport::replying([ok(200, r#"{"access_token": "A2"}"#)]);
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(transport.clone(), store.clone());

        let token = mgr.refresh().await.expect("should refresh");

        assert_eq!(token, "A2");
        assert_eq!(store.get().unwrap(), Some(alice().with_access_token("A2")));

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/auth/refresh");
        assert_eq!(sent[0].header_value("Authorization"), Some("Bearer R1"));
    }

    #[tokio::test]
    async fn test_refresh_without_session_returns_no_session() {
        let transport = ScriptedTransport::replying([]);
        let mgr = manager(transport.clone(), Arc::new(MemoryTokenStore::new()));

        assert_eq!(mgr.refresh().await, Err(SessionError::NoSession));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejected_clears_session() {
        let transport = ScriptedTransport::replying([ok(
            401,
            r#"{"message": "Token has expired"}"#,
        )]);
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(transport, store.clone());

        let result = mgr.refresh().await;

        assert!(
            matches!(&result, Err(SessionError::SessionExpired(reason)) if reason.contains("Token has expired")),
            "got {result:?}"
        );
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_network_error_clears_session() {
        let transport =
            ScriptedTransport::replying([Err(TransportError::Timeout)]);
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(transport, store.clone());

        let result = mgr.refresh().await;

        assert!(matches!(result, Err(SessionError::SessionExpired(_))));
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_malformed_body_clears_session() {
        let transport = ScriptedTransport::replying([ok(200, r#"{"nope": 1}"#)]);
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(transport, store.clone());

        assert!(matches!(
            mgr.refresh().await,
            Err(SessionError::SessionExpired(_))
        ));
        assert_eq!(store.get().unwrap(), None);
    }

    /// A store whose session disappears between the read and the write,
    /// as if a logout ran while the refresh request was in flight.
    struct LogoutDuringRefresh(MemoryTokenStore);

    impl TokenStore for LogoutDuringRefresh {
        fn get(&self) -> Result<Option<Session>, StoreError> {
            self.0.get()
        }
        fn set(&self, session: &Session) -> Result<(), StoreError> {
            self.0.set(session)
        }
        fn clear(&self) -> Result<(), StoreError> {
            self.0.clear()
        }
        fn set_access_token(&self, _token: &str) -> Result<(), StoreError> {
            self.0.clear()?;
            Err(StoreError::NoSession)
        }
    }

    #[tokio::test]
    async fn test_refresh_after_concurrent_logout_does_not_resurrect() {
        let transport =
            ScriptedTransport::replying([ok(200, r#"{"access_token": "A2"}"#)]);
        let store = Arc::new(LogoutDuringRefresh(
            MemoryTokenStore::with_session(alice()),
        ));
        let mgr = SessionManager::new(
            transport,
            store.clone(),
            ApiUrl::new("http://api.test"),
        );

        assert_eq!(mgr.refresh().await, Err(SessionError::NoSession));
        assert_eq!(store.get().unwrap(), None);
    }

    /// A store that can be read but refuses every write.
    struct ReadOnlyStore(MemoryTokenStore);

    impl TokenStore for ReadOnlyStore {
        fn get(&self) -> Result<Option<Session>, StoreError> {
            self.0.get()
        }
        fn set(&self, _session: &Session) -> Result<(), StoreError> {
            Err(read_only())
        }
        fn clear(&self) -> Result<(), StoreError> {
            Err(read_only())
        }
        fn set_access_token(&self, _token: &str) -> Result<(), StoreError> {
            Err(read_only())
        }
    }

    fn read_only() -> StoreError {
        StoreError::Io {
            path: "session.json".into(),
            message: "read-only file system".into(),
        }
    }

    #[tokio::test]
    async fn test_refresh_store_write_failure_keeps_session() {
        let transport =
            ScriptedTransport::replying([ok(200, r#"{"access_token": "A2"}"#)]);
        let store = Arc::new(ReadOnlyStore(MemoryTokenStore::with_session(
            alice(),
        )));
        let mgr = SessionManager::new(
            transport,
            store.clone(),
            ApiUrl::new("http://api.test"),
        );

        assert_eq!(mgr.refresh().await, Err(SessionError::Store(read_only())));
        assert_eq!(store.get().unwrap(), Some(alice()));
    }

    // =====================================================================
    // logout() / current()
    // =====================================================================

    #[tokio::test]
    async fn test_logout_twice_is_idempotent() {
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(ScriptedTransport::replying([]), store.clone());

        mgr.logout().expect("first logout");
        assert_eq!(store.get().unwrap(), None);
        mgr.logout().expect("second logout");
        assert_eq!(store.get().unwrap(), None);
    }

    #[tokio::test]
    async fn test_current_resumes_persisted_session() {
        let store = Arc::new(MemoryTokenStore::with_session(alice()));
        let mgr = manager(ScriptedTransport::replying([]), store);

        assert_eq!(mgr.current().unwrap(), Some(alice()));
        assert!(mgr.is_authenticated().unwrap());
        assert_eq!(mgr.access_token().unwrap(), "A1");
    }

    #[tokio::test]
    async fn test_access_token_without_session_returns_no_session() {
        let mgr = manager(
            ScriptedTransport::replying([]),
            Arc::new(MemoryTokenStore::new()),
        );

        assert_eq!(mgr.access_token(), Err(SessionError::NoSession));
        assert!(!mgr.is_authenticated().unwrap());
    }
}
