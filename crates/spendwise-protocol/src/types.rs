//! Core protocol types for the auth API's JSON bodies.
//!
//! Every type here is something that travels on the wire between the
//! client and `/auth/*`. Field names follow the backend's snake_case JSON.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A user's server-side identifier.
///
/// Newtype over `u64` so it can't be confused with an expense or category
/// id. `#[serde(transparent)]` keeps it a bare number in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// The user object embedded in a login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login` and `POST /auth/register`.
///
/// Borrowed so credentials are never copied into a long-lived value just to
/// be serialized.
#[derive(Serialize)]
pub struct CredentialsBody<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl fmt::Debug for CredentialsBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsBody")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Success body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,

    /// The reference backend spells this field `refesh_token`; accept both.
    #[serde(alias = "refesh_token")]
    pub refresh_token: String,

    pub user: UserRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoginResponse {
    /// Rejects bodies that parsed but carry unusable tokens.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.access_token.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "login response has an empty access_token".into(),
            ));
        }
        if self.refresh_token.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "login response has an empty refresh_token".into(),
            ));
        }
        Ok(())
    }
}

/// Success body of `POST /auth/refresh`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RefreshResponse {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.access_token.is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "refresh response has an empty access_token".into(),
            ));
        }
        Ok(())
    }
}

/// Success body of `POST /auth/register`.
///
/// The reference backend only returns a message; newer revisions also
/// echo the created user. Both shapes decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
}

/// Failure body of every auth endpoint: `{"message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(42).to_string(), "U-42");
    }

    #[test]
    fn test_user_id_serializes_transparent() {
        let json = serde_json::to_string(&UserId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_login_response_decodes_correct_spelling() {
        let json = r#"{
            "access_token": "A1",
            "refresh_token": "R1",
            "user": {"id": 1, "username": "alice"}
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.refresh_token, "R1");
        assert_eq!(resp.user.id, UserId(1));
        assert_eq!(resp.message, None);
    }

    #[test]
    fn test_login_response_decodes_misspelled_refresh_token() {
        let json = r#"{
            "message": "Login successful",
            "access_token": "A1",
            "refesh_token": "R1",
            "user": {"id": 1, "username": "alice"}
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.refresh_token, "R1");
        assert_eq!(resp.message.as_deref(), Some("Login successful"));
    }

    #[test]
    fn test_login_response_missing_user_fails() {
        let json = r#"{"access_token": "A1", "refresh_token": "R1"}"#;
        assert!(serde_json::from_str::<LoginResponse>(json).is_err());
    }

    #[test]
    fn test_login_response_validate_rejects_empty_tokens() {
        let mut resp = LoginResponse {
            access_token: "A1".into(),
            refresh_token: String::new(),
            user: UserRecord {
                id: UserId(1),
                username: "alice".into(),
            },
            message: None,
        };
        assert!(matches!(
            resp.validate(),
            Err(ProtocolError::InvalidMessage(_))
        ));

        resp.refresh_token = "R1".into();
        assert!(resp.validate().is_ok());
    }

    #[test]
    fn test_refresh_response_validate_rejects_empty_token() {
        let resp = RefreshResponse {
            access_token: String::new(),
            message: None,
        };
        assert!(resp.validate().is_err());
    }

    #[test]
    fn test_register_response_accepts_message_only() {
        let json = r#"{"message": "User registered successfully"}"#;
        let resp: RegisterResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.user, None);
    }

    #[test]
    fn test_credentials_body_debug_redacts_password() {
        let body = CredentialsBody {
            username: "alice",
            password: "hunter2",
        };
        let debug = format!("{body:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
