//! Authenticated requests for Spendwise.
//!
//! Every protected call goes through a [`RequestExecutor`], which attaches
//! the current access token, notices a `401`, refreshes the token once and
//! retries once. Refreshes are funnelled through a [`RefreshCoordinator`] so
//! that a burst of expired requests costs exactly one `/auth/refresh`.
//!
//! # Key types
//!
//! - [`RequestExecutor`]: sends requests on behalf of the logged-in user
//! - [`RequestSpec`]: what the caller wants sent (never mutated)
//! - [`RefreshCoordinator`]: single-flight wrapper around
//!   `SessionManager::refresh`
//! - [`ClientError`]: everything a protected call can fail with

mod coordinator;
mod error;
mod executor;

pub use coordinator::RefreshCoordinator;
pub use error::ClientError;
pub use executor::{RequestExecutor, RequestSpec};
