//! OAuth 1.0a client for the four REST v1.1 reads chirp supports.
//!
//! Every operation builds its query, goes through [`TwitterClient::execute`]
//! and hands the decoded body to the handler given at construction. There is
//! no retry, pagination or rate-limit handling: one call, one request.
use chirp_config::ApiConfig;
use chirp_http::{Auth, HttpClient, HttpResponse, OAuth1Signer, RequestOpts};
use chrono::NaiveDate;
use serde_json::Value;
use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;

use crate::twitter::error::{Result, TwitterError};
use crate::twitter::handlers::ResponseHandler;

pub const BASE_URL: &str = chirp_config::DEFAULT_BASE_URL;
pub const USER_TIMELINE_PATH: &str = "1.1/statuses/user_timeline.json";
pub const LIST_MEMBERSHIPS_PATH: &str = "1.1/lists/memberships.json";
pub const SEARCH_PATH: &str = "1.1/search/tweets.json";

/// `count` used when the caller does not pass one.
pub const DEFAULT_COUNT: u32 = 5;

const SEARCH_RESULT_TYPE: &str = "mixed";

/// Authenticated session plus the handler that receives every response.
pub struct TwitterClient<H> {
    http: HttpClient,
    signer: OAuth1Signer,
    handler: H,
}

impl<H: ResponseHandler> TwitterClient<H> {
    pub fn new(config: &ApiConfig, handler: H) -> Result<Self> {
        let mut http = HttpClient::new(&config.base_url)?;
        if let Some(secs) = config.timeout_secs {
            http = http.with_timeout(Duration::from_secs(secs));
        }
        let signer = OAuth1Signer::new(
            config.consumer_key.as_str(),
            config.consumer_secret.as_str(),
            config.access_token.as_str(),
            config.access_token_secret.as_str(),
        );
        tracing::debug!(base_url = %http.base(), "twitter.client.ready");
        Ok(Self {
            http,
            signer,
            handler,
        })
    }

    /// Load credentials from `path` (see [`chirp_config`]) and build a client.
    pub fn from_config_file<P: AsRef<Path>>(path: P, handler: H) -> Result<Self> {
        let config = ApiConfig::from_file(path)?;
        Self::new(&config, handler)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The authenticated user's own timeline.
    pub async fn fetch_own_timeline(&self, count: Option<u32>) -> Result<()> {
        let params = vec![("count", count_param(count))];
        self.execute(USER_TIMELINE_PATH, params).await
    }

    /// Another user's timeline.
    pub async fn fetch_user_timeline(&self, screen_name: &str, count: Option<u32>) -> Result<()> {
        let screen_name = require_screen_name(screen_name)?;
        let params = vec![
            ("screen_name", screen_name.to_string()),
            ("count", count_param(count)),
        ];
        self.execute(USER_TIMELINE_PATH, params).await
    }

    /// Lists `screen_name` has been added to.
    pub async fn fetch_user_lists(&self, screen_name: &str) -> Result<()> {
        let screen_name = require_screen_name(screen_name)?;
        let params = vec![("screen_name", screen_name.to_string())];
        self.execute(LIST_MEMBERSHIPS_PATH, params).await
    }

    /// Statuses posted by `screen_name` before `until` (`YYYY-MM-DD`).
    ///
    /// `until` is mandatory; `None` or a blank string fails before any request
    /// is sent.
    pub async fn search(
        &self,
        screen_name: &str,
        count: Option<u32>,
        until: Option<&str>,
    ) -> Result<()> {
        let q = search_query(screen_name, until)?;
        let params = vec![
            ("q", q),
            ("count", count_param(count)),
            ("result_type", SEARCH_RESULT_TYPE.to_string()),
        ];
        self.execute(SEARCH_PATH, params).await
    }

    /// Shared request routine: signed GET, then [`Self::process_response`].
    async fn execute(&self, path: &str, params: Vec<(&'static str, String)>) -> Result<()> {
        let query = params
            .into_iter()
            .map(|(k, v)| (k, Cow::Owned(v)))
            .collect::<Vec<_>>();
        let resp = self
            .http
            .get(
                path,
                RequestOpts {
                    auth: Auth::OAuth1(&self.signer),
                    query: Some(query),
                    ..Default::default()
                },
            )
            .await?;
        self.process_response(path, resp).await
    }

    /// `200` → decode and dispatch to the handler; anything else → `Status` error.
    async fn process_response(&self, path: &str, resp: HttpResponse) -> Result<()> {
        if !resp.is_ok() {
            let status = resp.status.as_u16();
            let message = resp.error_message();
            tracing::warn!(req_id = %resp.req_id, path, status, %message, "twitter.request.failed");
            return Err(TwitterError::Status { status, message });
        }

        let body: Value = serde_json::from_slice(&resp.body)?;
        tracing::debug!(req_id = %resp.req_id, path, "twitter.request.dispatch");
        self.handler
            .handle(body)
            .await
            .map_err(TwitterError::Handler)
    }
}

fn count_param(count: Option<u32>) -> String {
    count.unwrap_or(DEFAULT_COUNT).to_string()
}

fn require_screen_name(screen_name: &str) -> Result<&str> {
    let trimmed = screen_name.trim();
    if trimmed.is_empty() {
        return Err(TwitterError::InvalidInput(
            "screen_name must not be empty".into(),
        ));
    }
    Ok(trimmed)
}

/// Build the `q` value `from:<screen_name> until:<until>` (unencoded).
///
/// ```
/// use chirp_social::twitter::search_query;
///
/// assert_eq!(
///     search_query("alice", Some("2020-01-01")).unwrap(),
///     "from:alice until:2020-01-01"
/// );
/// assert!(search_query("alice", None).is_err());
/// ```
pub fn search_query(screen_name: &str, until: Option<&str>) -> Result<String> {
    let screen_name = require_screen_name(screen_name)?;
    let until = until.map(str::trim).unwrap_or_default();
    if until.is_empty() {
        return Err(TwitterError::InvalidInput(
            "search requires an `until` date (YYYY-MM-DD)".into(),
        ));
    }
    NaiveDate::parse_from_str(until, "%Y-%m-%d").map_err(|e| {
        TwitterError::InvalidInput(format!("`until` must be YYYY-MM-DD, got `{until}`: {e}"))
    })?;
    Ok(format!("from:{screen_name} until:{until}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_defaults_to_five() {
        assert_eq!(count_param(None), "5");
        assert_eq!(count_param(Some(100)), "100");
    }

    #[test]
    fn search_query_rejects_blank_until() {
        for until in [None, Some(""), Some("   ")] {
            let err = search_query("alice", until).unwrap_err();
            assert!(matches!(err, TwitterError::InvalidInput(_)), "{until:?}");
        }
    }

    #[test]
    fn search_query_rejects_malformed_dates() {
        assert!(search_query("alice", Some("yesterday")).is_err());
        assert!(search_query("alice", Some("2020-13-01")).is_err());
    }

    #[test]
    fn search_query_trims_inputs() {
        assert_eq!(
            search_query(" alice ", Some(" 2020-01-01 ")).unwrap(),
            "from:alice until:2020-01-01"
        );
    }

    #[test]
    fn blank_screen_names_are_rejected() {
        assert!(require_screen_name("  ").is_err());
        assert_eq!(require_screen_name("bob").unwrap(), "bob");
    }
}
