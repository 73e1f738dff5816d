use std::sync::OnceLock;

use chirp_common::observability::{LogConfig, LogFormat, init_logging};
use chirp_config::{ApiConfig, ApiConfigLoader};
use wiremock::MockServer;

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "chirp-tests",
            log_dir: Some(std::env::temp_dir().join("chirp-tests")),
            emit_stderr: true,
            format: if std::env::var("CHIRP_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug",
        };

        init_logging(config).unwrap_or_default()
    });
}

/// Credentials pointing at the mock server.
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> ApiConfig {
    ApiConfigLoader::new()
        .with_yaml_str(&format!(
            "CONSUMER_KEY: ck\nCONSUMER_SECRET: cs\nACCESS_TOKEN: at\nACCESS_TOKEN_SECRET: ats\nBASE_URL: '{}/'\n",
            server.uri()
        ))
        .load()
        .expect("test config")
}
