//! Session types: the data structures that describe a logged-in user.
//!
//! A "session" is the client's record of a successful login. It holds:
//! - WHO is logged in (`UserRecord`)
//! - HOW to authorize calls right now (the short-lived access token)
//! - HOW to get a new access token later (the long-lived refresh token)

use std::fmt;

use serde::{Deserialize, Serialize};
use spendwise_protocol::{CredentialsBody, LoginResponse, UserId, UserRecord};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The current login, as persisted by a [`TokenStore`](crate::TokenStore).
///
/// A `Session` is always complete: there is no way to hold a token without
/// a user or a user without tokens. Stores either return a whole `Session`
/// or nothing.
///
/// `Debug` is hand-written so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived credential sent as `Authorization: Bearer ...`.
    pub access_token: String,

    /// Long-lived credential, only ever sent to `/auth/refresh`.
    pub refresh_token: String,

    /// The logged-in user.
    pub user: UserRecord,
}

impl Session {
    /// Returns a copy of this session carrying a new access token.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..self.clone()
        }
    }
}

impl From<LoginResponse> for Session {
    fn from(resp: LoginResponse) -> Self {
        Self {
            access_token: resp.access_token,
            refresh_token: resp.refresh_token,
            user: resp.user,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AuthCredentials
// ---------------------------------------------------------------------------

/// A username/password pair on its way to the auth API.
///
/// Transient: it is never persisted, and `Debug` hides the password.
#[derive(Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

impl AuthCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects blank fields before anything touches the network. The
    /// backend answers those with a 400 anyway.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.username.trim().is_empty() {
            return Err(SessionError::InvalidInput(
                "username is required".into(),
            ));
        }
        if self.password.is_empty() {
            return Err(SessionError::InvalidInput(
                "password is required".into(),
            ));
        }
        Ok(())
    }

    /// Borrows the credentials as a wire body.
    pub fn body(&self) -> CredentialsBody<'_> {
        CredentialsBody {
            username: &self.username,
            password: &self.password,
        }
    }
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// RegisteredUser
// ---------------------------------------------------------------------------

/// The account created by a successful registration.
///
/// `id` is `None` when the server only acknowledges with a message, which
/// is what the reference backend does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUser {
    pub id: Option<UserId>,
    pub username: String,
    pub message: Option<String>,
}
