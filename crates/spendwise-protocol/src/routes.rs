//! Auth API routes and base-URL handling.

/// `POST`: exchange credentials for a token pair.
pub const LOGIN_PATH: &str = "/auth/login";

/// `POST`: create an account; does not log in.
pub const REGISTER_PATH: &str = "/auth/register";

/// `POST` with `Authorization: Bearer <refresh_token>`: mint a new
/// access token.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// The API's base URL, normalised so joining never doubles a slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiUrl(String);

impl ApiUrl {
    /// Wraps a base URL such as `http://127.0.0.1:5000/`. Trailing slashes
    /// are trimmed.
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self(base.trim_end_matches('/').to_string())
    }

    /// Returns the normalised base URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves `path` against the base.
    ///
    /// Absolute `http://` and `https://` URLs are returned unchanged, so
    /// callers may mix relative paths and full URLs.
    pub fn join(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.0, path)
    }
}

impl std::fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slashes() {
        assert_eq!(ApiUrl::new("http://api.test//").as_str(), "http://api.test");
    }

    #[test]
    fn test_join_relative_path_with_and_without_slash() {
        let base = ApiUrl::new("http://api.test/");
        assert_eq!(base.join(LOGIN_PATH), "http://api.test/auth/login");
        assert_eq!(base.join("expense/1/expenses"), "http://api.test/expense/1/expenses");
    }

    #[test]
    fn test_join_absolute_url_passes_through() {
        let base = ApiUrl::new("http://api.test");
        assert_eq!(
            base.join("https://other.test/x"),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_join_keeps_base_path_prefix() {
        let base = ApiUrl::new("http://api.test/v1");
        assert_eq!(base.join("/auth/refresh"), "http://api.test/v1/auth/refresh");
    }
}
