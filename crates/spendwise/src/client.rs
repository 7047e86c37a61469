//! `SpendwiseClient` builder and facade.
//!
//! This is the entry point for talking to a Spendwise backend. It ties
//! together all the layers: transport → protocol → session → client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use spendwise_client::{RefreshCoordinator, RequestExecutor, RequestSpec};
use spendwise_protocol::ApiUrl;
use spendwise_session::{
    FileTokenStore, MemoryTokenStore, RegisteredUser, Session, SessionManager,
    StoreError, TokenStore,
};
use spendwise_transport::{HttpResponse, HttpTransport, ReqwestTransport};

use crate::{ClientConfig, SpendwiseError};

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// The token store picked by [`SpendwiseClientBuilder`].
#[derive(Debug)]
pub enum SessionStore {
    File(FileTokenStore),
    Memory(MemoryTokenStore),
}

impl TokenStore for SessionStore {
    fn get(&self) -> Result<Option<Session>, StoreError> {
        match self {
            Self::File(store) => store.get(),
            Self::Memory(store) => store.get(),
        }
    }

    fn set(&self, session: &Session) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.set(session),
            Self::Memory(store) => store.set(session),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.clear(),
            Self::Memory(store) => store.clear(),
        }
    }

    fn set_access_token(&self, token: &str) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.set_access_token(token),
            Self::Memory(store) => store.set_access_token(token),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`SpendwiseClient`].
///
/// # Example
///
/// ```rust,no_run
/// use spendwise::prelude::*;
///
/// # async fn demo() -> Result<(), SpendwiseError> {
/// let client = SpendwiseClient::builder()
///     .api_url("http://127.0.0.1:5000")
///     .in_memory()
///     .build()?;
/// client.login("alice", "pw").await?;
/// let body = client.execute(&RequestSpec::get("/expense/1/expenses")).await?;
/// println!("{}", body.text());
/// # Ok(())
/// # }
/// ```
pub struct SpendwiseClientBuilder {
    config: ClientConfig,
    in_memory: bool,
}

impl SpendwiseClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            in_memory: false,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API base URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Persists the session at `path` instead of the default location.
    pub fn session_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.session_path = path.into();
        self.in_memory = false;
        self
    }

    /// Keeps the session in memory only; nothing is written to disk.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Builds the client with a `reqwest` transport.
    pub fn build(
        self,
    ) -> Result<SpendwiseClient<ReqwestTransport, SessionStore>, SpendwiseError>
    {
        let transport = ReqwestTransport::new(self.config.request_timeout)?;
        let store = if self.in_memory {
            SessionStore::Memory(MemoryTokenStore::new())
        } else {
            SessionStore::File(FileTokenStore::new(&self.config.session_path))
        };

        tracing::debug!(
            api_url = %self.config.api_url,
            in_memory = self.in_memory,
            "building client"
        );

        Ok(SpendwiseClient::from_parts(
            transport,
            store,
            ApiUrl::new(self.config.api_url),
        ))
    }
}

impl Default for SpendwiseClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// SpendwiseClient
// ---------------------------------------------------------------------------

/// A logged-in (or not yet logged-in) Spendwise user.
///
/// Cloning is cheap; clones share the session, the transport and the
/// in-flight refresh.
pub struct SpendwiseClient<T: HttpTransport = ReqwestTransport, S: TokenStore = SessionStore> {
    manager: Arc<SessionManager<T, S>>,
    executor: RequestExecutor<T, S>,
}

impl<T: HttpTransport, S: TokenStore> Clone for SpendwiseClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            executor: self.executor.clone(),
        }
    }
}

impl SpendwiseClient {
    /// Creates a new builder.
    pub fn builder() -> SpendwiseClientBuilder {
        SpendwiseClientBuilder::new()
    }
}

impl<T: HttpTransport, S: TokenStore> SpendwiseClient<T, S> {
    /// Wires a client from explicit parts.
    pub fn from_parts(transport: T, store: S, api: ApiUrl) -> Self {
        let manager = Arc::new(SessionManager::new(
            Arc::new(transport),
            Arc::new(store),
            api,
        ));
        let coordinator = RefreshCoordinator::new(Arc::clone(&manager));
        Self {
            manager,
            executor: RequestExecutor::new(coordinator),
        }
    }

    /// The session manager behind this client.
    pub fn session_manager(&self) -> &SessionManager<T, S> {
        &self.manager
    }

    /// The request executor behind this client.
    pub fn executor(&self) -> &RequestExecutor<T, S> {
        &self.executor
    }

    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Session, SpendwiseError> {
        Ok(self.manager.login(username, password).await?)
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
    ) -> Result<RegisteredUser, SpendwiseError> {
        Ok(self.manager.register(username, password).await?)
    }

    pub fn logout(&self) -> Result<(), SpendwiseError> {
        Ok(self.manager.logout()?)
    }

    /// The persisted session, if any.
    pub fn current_session(&self) -> Result<Option<Session>, SpendwiseError> {
        Ok(self.manager.current()?)
    }

    /// Forces a token refresh, joining one already in flight.
    pub async fn refresh(&self) -> Result<String, SpendwiseError> {
        Ok(self.executor.coordinator().request_refresh().await?)
    }

    /// Sends an authenticated request. See
    /// [`RequestExecutor::execute`].
    pub async fn execute(
        &self,
        spec: &RequestSpec,
    ) -> Result<HttpResponse, SpendwiseError> {
        Ok(self.executor.execute(spec).await?)
    }

    /// Sends an authenticated request and decodes a 2xx JSON body.
    pub async fn execute_json<R: DeserializeOwned>(
        &self,
        spec: &RequestSpec,
    ) -> Result<R, SpendwiseError> {
        Ok(self.executor.execute_json(spec).await?)
    }
}
