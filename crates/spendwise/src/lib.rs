//! # Spendwise
//!
//! Client library for the Spendwise expense tracker API.
//!
//! Spendwise keeps a user logged in across calls: it persists the session,
//! attaches the access token to every protected request, and when the
//! server answers `401` it refreshes the token (once, however many requests
//! noticed) and retries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spendwise::prelude::*;
//!
//! # async fn demo() -> Result<(), SpendwiseError> {
//! let client = SpendwiseClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .build()?;
//!
//! let session = client.login("alice", "pw").await?;
//! let path = format!("/expense/{}/expenses", session.user.id.0);
//! let expenses: serde_json::Value =
//!     client.execute_json(&RequestSpec::get(path)).await?;
//! # let _ = expenses;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{SessionStore, SpendwiseClient, SpendwiseClientBuilder};
pub use config::{
    API_URL_VAR, ClientConfig, ConfigError, DEFAULT_API_URL,
    REQUEST_TIMEOUT_VAR, SESSION_PATH_VAR,
};
pub use error::SpendwiseError;

pub use spendwise_client::{ClientError, RefreshCoordinator, RequestExecutor, RequestSpec};
pub use spendwise_protocol::{ApiUrl, ProtocolError, UserId, UserRecord};
pub use spendwise_session::{
    FileTokenStore, MemoryTokenStore, RegisteredUser, Session, SessionError,
    SessionManager, StoreError, TokenStore,
};
pub use spendwise_transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport,
    TransportError,
};

/// The types most callers need.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientError, HttpResponse, Method, RegisteredUser,
        RequestSpec, Session, SessionError, SpendwiseClient, SpendwiseError,
        UserId, UserRecord,
    };
}
