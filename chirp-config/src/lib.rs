//! Loader for the API credentials file with YAML + environment overlays.
//!
//! The file is a flat YAML mapping, by default at `config/api.yml`:
//!
//! ```yaml
//! CONSUMER_KEY: "..."
//! CONSUMER_SECRET: "..."
//! ACCESS_TOKEN: "..."
//! ACCESS_TOKEN_SECRET: "${TWITTER_ACCESS_TOKEN_SECRET}"
//! # optional
//! BASE_URL: "https://api.twitter.com/"
//! TIMEOUT_SECS: 20
//! ```
//!
//! Keys are case-insensitive. Every key can be overridden with a
//! `CHIRP_`-prefixed environment variable (`CHIRP_ACCESS_TOKEN=...`), and
//! string values may reference other environment variables with `${VAR}`.
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

pub use config::ConfigError;

/// Location of the credentials file relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/api.yml";
/// REST API root every endpoint path is resolved against.
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com/";

const ENV_PREFIX: &str = "CHIRP";
const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// OAuth 1.0a user credentials plus the few knobs the client honours.
#[derive(Clone, Deserialize)]
pub struct ApiConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; the HTTP layer default applies when unset.
    #[serde(default, deserialize_with = "lenient_secs")]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    /// Load and validate the credentials file at `path` (env overlays included).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ApiConfigLoader::new().with_file(path).load()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("CONSUMER_KEY", &self.consumer_key),
            ("CONSUMER_SECRET", &self.consumer_secret),
            ("ACCESS_TOKEN", &self.access_token),
            ("ACCESS_TOKEN_SECRET", &self.access_token_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{key} is missing or empty")));
            }
            if value.contains("${") {
                return Err(ConfigError::Message(format!(
                    "{key} references an unset environment variable"
                )));
            }
        }

        let base = url::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::Message(format!("BASE_URL is not a valid URL: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "BASE_URL must be http(s), got `{}`",
                base.scheme()
            )));
        }
        Ok(())
    }
}

// Secrets never reach logs through `{:?}`.
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

/// Env overrides always arrive as strings, so accept `"20"` as well as `20`.
fn lenient_secs<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Num(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("TIMEOUT_SECS: {e}"))),
    }
}

/// Expand `${VAR}` placeholders once. A `$` outside `${...}` is literal, so
/// secrets containing `$NAME` survive untouched. Unset variables stay as
/// written.
fn expand_placeholders(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let placeholder = &tail[..=end];
        match shellexpand::env(placeholder) {
            Ok(value) => out.push_str(&value),
            Err(_) => out.push_str(placeholder),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains("${") {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = expand_placeholders(&cur);
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Fold top-level keys to lower case. Keys that were already lower case come
/// from the environment overlay and take precedence over file keys.
fn normalize_keys(v: &mut Value) {
    let Value::Object(obj) = v else {
        return;
    };

    let (lower, mixed): (Vec<_>, Vec<_>) = std::mem::take(obj)
        .into_iter()
        .partition(|(k, _)| *k == k.to_ascii_lowercase());

    let mut out = Map::new();
    for (k, val) in mixed {
        out.insert(k.to_ascii_lowercase(), val);
    }
    for (k, val) in lower {
        out.insert(k, val);
    }
    *obj = out;
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct ApiConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl Default for ApiConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiConfigLoader {
    /// Start an empty loader; the `CHIRP_` environment overlay is applied last
    /// in [`ApiConfigLoader::load`], so it wins over every file.
    ///
    /// ```
    /// use chirp_config::ApiConfigLoader;
    ///
    /// let cfg = ApiConfigLoader::new()
    ///     .with_yaml_str(
    ///         "CONSUMER_KEY: ck\nCONSUMER_SECRET: cs\nACCESS_TOKEN: at\nACCESS_TOKEN_SECRET: ats",
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.consumer_key, "ck");
    /// assert_eq!(cfg.base_url, chirp_config::DEFAULT_BASE_URL);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder, expand `${VAR}` placeholders and validate the
    /// resulting credentials.
    pub fn load(self) -> Result<ApiConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        normalize_keys(&mut v);
        expand_env_in_value(&mut v);

        let typed: ApiConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
