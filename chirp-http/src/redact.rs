//! Log-safe views of requests. Nothing in here ever returns a secret.

use reqwest::header::HeaderMap;
use reqwest::{Method, Url};

use crate::encode;

const MASK: &str = "<redacted>";

// Query keys and header names whose values never reach a log line.
const SECRET_KEYS: &[&str] = &[
    "authorization",
    "oauth_consumer_key",
    "oauth_token",
    "oauth_signature",
    "oauth_nonce",
    "access_token",
    "access_token_secret",
    "consumer_secret",
    "api_key",
    "token",
    "secret",
];

pub(crate) fn is_secret(key: &str) -> bool {
    SECRET_KEYS.iter().any(|s| s.eq_ignore_ascii_case(key))
}

/// Headers as `(name, value)` with secret values masked.
pub(crate) fn headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(name, value)| {
            let value = if is_secret(name.as_str()) {
                MASK.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            (name.as_str().to_string(), value)
        })
        .collect()
}

/// A URL split into what a log line needs.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LoggedUrl {
    pub endpoint: String,
    pub query: Vec<(String, String)>,
}

impl LoggedUrl {
    pub fn new(url: &Url) -> Self {
        let mut endpoint = url.host_str().unwrap_or("-").to_string();
        if let Some(port) = url.port() {
            endpoint.push_str(&format!(":{port}"));
        }
        endpoint.push_str(url.path());

        let query = url
            .query_pairs()
            .map(|(k, v)| {
                let v = if is_secret(&k) { MASK.into() } else { v.into_owned() };
                (k.into_owned(), v)
            })
            .collect();
        Self { endpoint, query }
    }
}

/// A pasteable `curl` line for reproducing a request, secrets masked.
pub(crate) fn curl(method: &Method, url: &Url, h: &HeaderMap) -> String {
    let logged = LoggedUrl::new(url);
    let mut target = format!("{}://{}", url.scheme(), logged.endpoint);
    if !logged.query.is_empty() {
        target.push('?');
        let pairs: Vec<String> = logged
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect();
        target.push_str(&pairs.join("&"));
    }

    let mut cmd = format!("curl -X {method}");
    for (name, value) in headers(h) {
        cmd.push_str(&format!(" -H '{name}: {}'", value.replace('\'', r"'\''")));
    }
    cmd.push_str(&format!(" '{target}'"));
    cmd
}
