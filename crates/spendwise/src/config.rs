//! Client configuration.
//!
//! Defaults target a backend on `http://127.0.0.1:5000` and persist the
//! session under the user's config directory. Every field can be
//! overridden from the environment:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `SPENDWISE_API_URL` | `api_url` | `http://127.0.0.1:5000` |
//! | `SPENDWISE_REQUEST_TIMEOUT_SECS` | `request_timeout` | `30` |
//! | `SPENDWISE_SESSION_PATH` | `session_path` | `<config dir>/spendwise/session.json` |

use std::path::PathBuf;
use std::time::Duration;

use spendwise_session::FileTokenStore;

pub const API_URL_VAR: &str = "SPENDWISE_API_URL";
pub const REQUEST_TIMEOUT_VAR: &str = "SPENDWISE_REQUEST_TIMEOUT_SECS";
pub const SESSION_PATH_VAR: &str = "SPENDWISE_SESSION_PATH";

/// Default API base URL (the backend's development server).
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but its value can't be used.
    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Settings for a [`SpendwiseClient`](crate::SpendwiseClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every API path is joined to.
    pub api_url: String,

    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout: Duration,

    /// Where the file token store keeps the session.
    pub session_path: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            session_path: FileTokenStore::default_path(),
        }
    }
}

impl ClientConfig {
    /// Loads `.env` if present, then reads the `SPENDWISE_*` variables on
    /// top of the defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a blank URL or a timeout that
    /// isn't a positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), with variables resolved by
    /// `lookup` instead of the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::Invalid {
                    var: API_URL_VAR,
                    message: "must not be empty".into(),
                });
            }
            config.api_url = url.to_string();
        }

        if let Some(secs) = lookup(REQUEST_TIMEOUT_VAR) {
            config.request_timeout = match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: REQUEST_TIMEOUT_VAR,
                        message: format!("expected a positive number of seconds, got {secs:?}"),
                    });
                }
            };
        }

        if let Some(path) = lookup(SESSION_PATH_VAR) {
            if !path.trim().is_empty() {
                config.session_path = PathBuf::from(path);
            }
        }

        Ok(config)
    }
}
