use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::HttpError;

const SNIPPET_MAX: usize = 500;

/// A fully read response. The status is reported, never interpreted.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    /// Client-side id, shared by every log line about this request.
    pub req_id: String,
}

/// The `x-rate-limit-*` headers Twitter attaches to every v1.1 response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Unix seconds at which the window resets.
    pub reset: Option<i64>,
}

impl RateLimit {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }
        Self {
            limit: parse(headers, "x-rate-limit-limit"),
            remaining: parse(headers, "x-rate-limit-remaining"),
            reset: parse(headers, "x-rate-limit-reset"),
        }
    }
}

impl HttpResponse {
    /// Only `200 OK` counts; the v1.1 GET endpoints never answer with another 2xx.
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::from_headers(&self.headers)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            let snippet = snippet(&self.body);
            tracing::warn!(
                req_id = %self.req_id,
                line = e.line(),
                column = e.column(),
                error = %e,
                body_snippet = %snippet,
                "http.response.decode_error"
            );
            HttpError::Decode(e.to_string(), snippet)
        })
    }

    /// Human readable text from an error body.
    ///
    /// Understands Twitter's `{"errors": [{"message": ..}]}` as well as flat
    /// `message` / `detail` / `error` fields, and falls back to a body snippet.
    pub fn error_message(&self) -> String {
        serde_json::from_slice::<Value>(&self.body)
            .ok()
            .and_then(|v| message_from(&v))
            .unwrap_or_else(|| snippet(&self.body))
    }
}

fn message_from(body: &Value) -> Option<String> {
    let first_error = body.get("errors").and_then(|e| e.get(0));
    let candidates = first_error
        .into_iter()
        .flat_map(|e| ["message", "detail", "title"].map(|k| e.get(k)))
        .chain(["message", "detail", "error"].map(|k| body.get(k)));

    candidates
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// At most [`SNIPPET_MAX`] bytes of the body, cut on a char boundary.
pub(crate) fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_MAX {
        return text.into_owned();
    }
    let cut = (0..=SNIPPET_MAX)
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}...", &text[..cut])
}
