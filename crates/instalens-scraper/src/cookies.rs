//! Browser session cookies used to authenticate web-API requests.
//!
//! The cookie file is a browser extension export: a JSON array of objects with
//! at least `name` and `value`. Extra fields (domain, expiry, ...) are ignored.

use std::path::Path;

use serde::Deserialize;

use crate::error::ScraperError;

const REQUIRED_COOKIES: [&str; 3] = ["sessionid", "csrftoken", "ds_user_id"];

#[derive(Debug, Deserialize)]
struct ExportedCookie {
    name: String,
    value: String,
}

/// An authenticated cookie jar reduced to what request headers need.
#[derive(Clone)]
pub struct SessionCookies {
    header: String,
    csrf_token: String,
}

impl std::fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookies")
            .field("header", &"[redacted]")
            .field("csrf_token", &"[redacted]")
            .finish()
    }
}

impl SessionCookies {
    /// Parse a cookie export.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Deserialize`] if the JSON is not a cookie array,
    /// or [`ScraperError::MissingCookie`] when `sessionid`, `csrftoken` or
    /// `ds_user_id` is absent or empty.
    pub fn from_json(raw: &str) -> Result<Self, ScraperError> {
        let cookies: Vec<ExportedCookie> =
            serde_json::from_str(raw).map_err(|source| ScraperError::Deserialize {
                context: "session cookie export".to_string(),
                source,
            })?;

        let value_of = |name: &str| {
            cookies
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.value.as_str())
                .filter(|v| !v.is_empty())
        };

        for required in REQUIRED_COOKIES {
            if value_of(required).is_none() {
                return Err(ScraperError::MissingCookie(required));
            }
        }
        let csrf_token = value_of("csrftoken")
            .ok_or(ScraperError::MissingCookie("csrftoken"))?
            .to_string();

        let header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Self { header, csrf_token })
    }

    /// Read and parse a cookie export from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::CookieFile`] if the file cannot be read, plus
    /// any error from [`SessionCookies::from_json`].
    pub async fn load(path: &Path) -> Result<Self, ScraperError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScraperError::CookieFile {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json(&raw)
    }

    #[must_use]
    pub fn header_value(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"[
        {"name": "sessionid", "value": "abc", "domain": ".instagram.com"},
        {"name": "csrftoken", "value": "tok"},
        {"name": "ds_user_id", "value": "42"},
        {"name": "mid", "value": "zzz"}
    ]"#;

    #[test]
    fn builds_cookie_header_from_all_cookies() {
        let cookies = SessionCookies::from_json(EXPORT).expect("parse");
        assert_eq!(
            cookies.header_value(),
            "sessionid=abc; csrftoken=tok; ds_user_id=42; mid=zzz"
        );
        assert_eq!(cookies.csrf_token(), "tok");
    }

    #[test]
    fn missing_session_cookie_is_rejected() {
        let raw = r#"[{"name": "csrftoken", "value": "tok"}, {"name": "ds_user_id", "value": "1"}]"#;
        let err = SessionCookies::from_json(raw).unwrap_err();
        assert!(matches!(err, ScraperError::MissingCookie("sessionid")));
    }

    #[test]
    fn empty_cookie_value_counts_as_missing() {
        let raw = r#"[
            {"name": "sessionid", "value": "abc"},
            {"name": "csrftoken", "value": ""},
            {"name": "ds_user_id", "value": "1"}
        ]"#;
        let err = SessionCookies::from_json(raw).unwrap_err();
        assert!(matches!(err, ScraperError::MissingCookie("csrftoken")));
    }

    #[test]
    fn non_array_export_is_a_deserialize_error() {
        let err = SessionCookies::from_json(r#"{"sessionid": "abc"}"#).unwrap_err();
        assert!(matches!(err, ScraperError::Deserialize { .. }));
    }

    #[test]
    fn debug_output_redacts_values() {
        let cookies = SessionCookies::from_json(EXPORT).expect("parse");
        assert!(!format!("{cookies:?}").contains("abc"));
    }

    #[tokio::test]
    async fn load_reports_unreadable_file() {
        let err = SessionCookies::load(Path::new("/nonexistent/instalens/cookies.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScraperError::CookieFile { .. }));
    }
}
