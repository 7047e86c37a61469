//! Session management for Spendwise.
//!
//! This crate owns everything about "who is logged in":
//!
//! 1. **Persistence**: storing the token pair and user ([`TokenStore`],
//!    with [`MemoryTokenStore`] and [`FileTokenStore`])
//! 2. **Auth operations**: login, registration, logout and token refresh
//!    against the auth API ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)  ← single-flight refresh, authenticated requests
//!     ↕
//! Session Layer (this crate)  ← session state and /auth/* calls
//!     ↕
//! Protocol + Transport (below)  ← wire bodies, HTTP
//! ```

mod error;
mod manager;
mod session;
mod store;

pub use error::{SessionError, StoreError};
pub use manager::SessionManager;
pub use session::{AuthCredentials, RegisteredUser, Session};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
