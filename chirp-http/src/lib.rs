//! Minimal HTTP client with safe logging and OAuth 1.0a signing.
//!
//! - Per-request options: headers, [`Auth`], query pairs, timeout
//! - Query strings are encoded per RFC 3986 so the bytes on the wire are the
//!   bytes the OAuth signature covers
//! - Secret headers and query values are masked in every log line
//! - Optional *raw* request/response logging via `CHIRP_HTTP_RAW=1`
//!
//! The client does not judge the response status: callers get an
//! [`HttpResponse`] back and decide what counts as success.
//!
//! ```no_run
//! # async fn demo() -> Result<(), chirp_http::HttpError> {
//! let client = chirp_http::HttpClient::new("https://api.example.com")?;
//! let resp = client
//!     .get("v1/items", chirp_http::RequestOpts::default())
//!     .await?;
//! if resp.is_ok() {
//!     let _items: serde_json::Value = resp.json()?;
//! }
//! # Ok(()) }
//! ```

mod oauth;
mod redact;
mod response;

pub use oauth::{OAuth1Signer, encode};
pub use reqwest::StatusCode;
pub use response::{HttpResponse, RateLimit};

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Url};
use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

const RAW_ENV: &str = "CHIRP_HTTP_RAW";
const RAW_BODY_MAX: usize = 64 * 1024;

static NEXT_REQ: AtomicU64 = AtomicU64::new(1);

fn raw_enabled() -> bool {
    std::env::var(RAW_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("request signing failed: {0}")]
    Signing(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
}

/// How a request authenticates.
#[derive(Clone, Debug, Default)]
pub enum Auth<'a> {
    /// `Authorization: OAuth ...`, signed per request.
    OAuth1(&'a OAuth1Signer),
    #[default]
    None,
}

/// Per-request knobs.
///
/// ```
/// use chirp_http::RequestOpts;
/// use std::time::Duration;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(30)),
///     query: Some(vec![("count", "5".into())]),
///     ..Default::default()
/// };
///
/// assert_eq!(opts.timeout.unwrap().as_secs(), 30);
/// assert!(!opts.allow_absolute);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub auth: Auth<'a>,
    pub headers: Option<HeaderMap>,
    /// Unencoded query pairs, e.g. `[("q", "from:alice".into())]`.
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// Accept an absolute URL as `path` instead of joining it to the base.
    pub allow_absolute: bool,
}

/// The URL as sent plus what the signer needs: the query-less URL and the
/// decoded parameters.
struct Target {
    url: Url,
    signing_url: String,
    params: Vec<(String, String)>,
}

impl Target {
    fn new(mut url: Url, extra: Option<&[(&str, Cow<'_, str>)]>) -> Self {
        let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        params.extend(
            extra
                .unwrap_or_default()
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        url.set_query(None);
        let signing_url = url.to_string();
        if !params.is_empty() {
            let query: Vec<String> = params
                .iter()
                .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
                .collect();
            url.set_query(Some(&query.join("&")));
        }
        Self {
            url,
            signing_url,
            params,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
}

impl HttpClient {
    /// Construct a client anchored to a base URL. A missing trailing `/` is
    /// added so relative paths resolve under it.
    ///
    /// ```no_run
    /// use chirp_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new("https://api.example.com/v1")?;
    /// assert_eq!(client.base().as_str(), "https://api.example.com/v1/");
    /// assert_eq!(client.default_timeout, Duration::from_secs(15));
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("chirp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET `path` and read the whole body. Only transport failures are errors.
    pub async fn get(&self, path: &str, opts: RequestOpts<'_>) -> Result<HttpResponse, HttpError> {
        let target = Target::new(
            self.resolve(path, opts.allow_absolute)?,
            opts.query.as_deref(),
        );
        let method = Method::GET;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let mut headers = opts.headers.unwrap_or_default();
        let auth_kind = match opts.auth {
            Auth::OAuth1(signer) => {
                let value = signer.authorization_header(
                    method.as_str(),
                    &target.signing_url,
                    &target.params,
                )?;
                let value = HeaderValue::from_str(&value)
                    .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
                headers.insert(AUTHORIZATION, value);
                "oauth1"
            }
            Auth::None => "none",
        };

        let req_id = format!("r{}", NEXT_REQ.fetch_add(1, Ordering::Relaxed));
        let logged = redact::LoggedUrl::new(&target.url);
        tracing::debug!(
            %req_id,
            %method,
            endpoint = %logged.endpoint,
            query = ?logged.query,
            timeout_ms = timeout.as_millis() as u64,
            auth_kind,
            "http.request.start"
        );
        let raw = raw_enabled();
        if raw {
            let curl = redact::curl(&method, &target.url, &headers);
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        let started = Instant::now();
        let network = |stage: &'static str, err: reqwest::Error| {
            let message = err.to_string();
            tracing::warn!(%req_id, stage, %message, "http.network_error");
            HttpError::Network(message)
        };
        let resp = self
            .inner
            .request(method, target.url)
            .timeout(timeout)
            .headers(headers)
            .send()
            .await
            .map_err(|e| network("send", e))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(|e| network("body", e))?.to_vec();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let rate = RateLimit::from_headers(&headers);
        tracing::debug!(
            %req_id,
            %status,
            elapsed_ms,
            body_len = body.len(),
            rate_limit.limit = ?rate.limit,
            rate_limit.remaining = ?rate.remaining,
            rate_limit.reset = ?rate.reset,
            "http.response"
        );
        if raw {
            let shown = &body[..body.len().min(RAW_BODY_MAX)];
            tracing::info!(
                target: "http.raw",
                %req_id,
                %status,
                headers = ?redact::headers(&headers),
                body = %String::from_utf8_lossy(shown),
                truncated = body.len() > RAW_BODY_MAX,
                "response"
            );
        }
        tracing::trace!(%req_id, body_snippet = %response::snippet(&body), "http.response.body");

        Ok(HttpResponse {
            status,
            headers,
            body,
            req_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_gets_trailing_slash() {
        let client = HttpClient::new("http://127.0.0.1:8080/api").unwrap();
        assert_eq!(client.base().as_str(), "http://127.0.0.1:8080/api/");
        let url = client.resolve("1.1/lists/memberships.json", false).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/api/1.1/lists/memberships.json"
        );
    }

    #[test]
    fn absolute_paths_need_opt_in() {
        let client = HttpClient::new("https://api.twitter.com/").unwrap();
        let abs = client
            .resolve("http://pbs.twimg.com/media/a.jpg", true)
            .unwrap();
        assert_eq!(abs.host_str(), Some("pbs.twimg.com"));
        assert!(client.resolve("not a url", true).is_ok());
    }

    #[test]
    fn target_merges_and_reencodes_query() {
        let url = Url::parse("https://api.twitter.com/1.1/search/tweets.json?lang=en").unwrap();
        let extra = [("q", Cow::Borrowed("from:alice until:2020-01-01"))];
        let target = Target::new(url, Some(&extra[..]));

        assert_eq!(
            target.signing_url,
            "https://api.twitter.com/1.1/search/tweets.json"
        );
        assert_eq!(
            target.params,
            vec![
                ("lang".to_string(), "en".to_string()),
                ("q".to_string(), "from:alice until:2020-01-01".to_string()),
            ]
        );
        assert_eq!(
            target.url.query(),
            Some("lang=en&q=from%3Aalice%20until%3A2020-01-01")
        );
    }
}
