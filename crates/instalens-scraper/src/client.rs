use std::path::PathBuf;
use std::time::Duration;

use instalens_core::{AppConfig, RawProfile};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::cookies::SessionCookies;
use crate::error::ScraperError;
use crate::parse::build_raw_profile;
use crate::retry::retry_with_backoff;
use crate::types::{FeedResponse, WebProfileInfoResponse};

const DEFAULT_BASE_URL: &str = "https://www.instagram.com/";
const IG_APP_ID: &str = "936619743392459";

/// Transport settings for [`InstagramClient`].
#[derive(Debug, Clone)]
pub struct InstagramClientConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Additional attempts after the first failure on transient errors.
    pub max_retries: u32,
    /// Base delay for exponential back-off: `backoff_base_ms * 2^(n-1)`.
    pub backoff_base_ms: u64,
}

impl InstagramClientConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            backoff_base_ms: config.scraper_retry_backoff_base_ms,
        }
    }
}

#[derive(Debug)]
enum CookieSource {
    /// Re-read on every fetch so a refreshed export is picked up without a restart.
    File(PathBuf),
    Fixed(SessionCookies),
}

/// Client for Instagram's authenticated web API.
///
/// Use [`InstagramClient::new`] for production or
/// [`InstagramClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug)]
pub struct InstagramClient {
    client: Client,
    base_url: Url,
    cookies: CookieSource,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl InstagramClient {
    /// Creates a client against the production web API, reading session
    /// cookies from `cookies_path` on each fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        config: &InstagramClientConfig,
        cookies_path: impl Into<PathBuf>,
    ) -> Result<Self, ScraperError> {
        Self::with_base_url(config, cookies_path, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`ScraperError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn with_base_url(
        config: &InstagramClientConfig,
        cookies_path: impl Into<PathBuf>,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;

        // A trailing slash keeps `Url::join` from replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            cookies: CookieSource::File(cookies_path.into()),
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
        })
    }

    /// Use an already-parsed cookie jar instead of reading the export file.
    #[must_use]
    pub fn with_session_cookies(mut self, cookies: SessionCookies) -> Self {
        self.cookies = CookieSource::Fixed(cookies);
        self
    }

    /// Fetches identity, counts and recent media for `handle`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::CookieFile`] / [`ScraperError::MissingCookie`] when the
    ///   session cookies are unusable.
    /// - [`ScraperError::ProfileUnavailable`] when the user does not exist or
    ///   the profile is private.
    /// - [`ScraperError::RateLimited`], [`ScraperError::UnexpectedStatus`] or
    ///   [`ScraperError::Http`] after retries are exhausted.
    /// - [`ScraperError::Deserialize`] if a response has an unexpected shape.
    pub async fn fetch_profile(&self, handle: &str) -> Result<RawProfile, ScraperError> {
        let cookies = self.session_cookies().await?;

        tracing::debug!(handle, "fetching instagram profile info");
        let mut profile_url = self.endpoint("api/v1/users/web_profile_info/")?;
        profile_url.query_pairs_mut().append_pair("username", handle);

        let info: WebProfileInfoResponse = match self
            .get_json(&profile_url, handle, &cookies, "web_profile_info")
            .await
        {
            Err(ScraperError::NotFound { .. }) => {
                return Err(ScraperError::ProfileUnavailable {
                    handle: handle.to_owned(),
                })
            }
            other => other?,
        };

        let user = info
            .data
            .user
            .ok_or_else(|| ScraperError::ProfileUnavailable {
                handle: handle.to_owned(),
            })?;

        tracing::debug!(handle, user_id = %user.id, "fetching instagram user feed");
        let feed_url = self.endpoint(&format!("api/v1/feed/user/{}/", user.id))?;
        let feed: FeedResponse = self
            .get_json(&feed_url, handle, &cookies, "user feed")
            .await?;

        let raw = build_raw_profile(handle, user, feed.items);
        tracing::info!(
            handle,
            posts = raw.posts.len(),
            reels = raw.reels.len(),
            "instagram profile fetched"
        );
        Ok(raw)
    }

    async fn session_cookies(&self) -> Result<SessionCookies, ScraperError> {
        match &self.cookies {
            CookieSource::File(path) => SessionCookies::load(path).await,
            CookieSource::Fixed(cookies) => Ok(cookies.clone()),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ScraperError> {
        self.base_url
            .join(path)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        handle: &str,
        cookies: &SessionCookies,
        context: &str,
    ) -> Result<T, ScraperError> {
        let referer = format!("https://www.instagram.com/{handle}/");

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = self
                .client
                .get(url.clone())
                .header(ACCEPT, "*/*")
                .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .header(COOKIE, cookies.header_value())
                .header(REFERER, referer.as_str())
                .header("X-CSRFToken", cookies.csrf_token())
                .header("X-IG-App-ID", IG_APP_ID)
                .header("X-IG-WWW-Claim", "0")
                .header("X-Requested-With", "XMLHttpRequest");

            async move {
                let response = request.send().await?;
                let status = response.status();

                if status == StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(0);
                    return Err(ScraperError::RateLimited { retry_after_secs });
                }

                if status == StatusCode::NOT_FOUND {
                    return Err(ScraperError::NotFound {
                        url: url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                let body = response.text().await?;
                serde_json::from_str::<T>(&body).map_err(|source| ScraperError::Deserialize {
                    context: format!("{context} for {handle}"),
                    source,
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> InstagramClientConfig {
        InstagramClientConfig {
            timeout_secs: 5,
            user_agent: "instalens-test".to_owned(),
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    #[test]
    fn endpoint_joins_below_base_path() {
        let client =
            InstagramClient::with_base_url(&config(), "cookies.json", "http://127.0.0.1:9/ig")
                .expect("client");
        let url = client.endpoint("api/v1/feed/user/42/").expect("url");
        assert_eq!(url.as_str(), "http://127.0.0.1:9/ig/api/v1/feed/user/42/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err =
            InstagramClient::with_base_url(&config(), "cookies.json", "not a url").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidBaseUrl { .. }));
    }
}
