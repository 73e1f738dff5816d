//! `tracing` setup shared by the `chirp` binary and the integration tests.
//!
//! Events always go to a daily-rolling file; [`LogConfig::emit_stderr`]
//! mirrors them to the terminal as well. Only the first [`init_logging`] call
//! installs a subscriber, later ones just get the file path back.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static INSTALLED: OnceLock<(PathBuf, WorkerGuard)> = OnceLock::new();

/// Overrides the per-user data directory when [`LogConfig::log_dir`] is unset.
pub const LOG_DIR_ENV: &str = "CHIRP_LOG_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Names the default directory and the log file.
    pub app_name: &'static str,
    pub log_dir: Option<PathBuf>,
    pub emit_stderr: bool,
    pub format: LogFormat,
    /// Used when `RUST_LOG` is unset.
    pub default_filter: &'static str,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "chirp",
            log_dir: None,
            emit_stderr: false,
            format: LogFormat::Text,
            default_filter: "info",
        }
    }
}

impl LogConfig {
    /// Settings behind the CLI's `--verbose` and `--log-json` flags.
    pub fn for_cli(verbose: bool, json: bool) -> Self {
        Self {
            emit_stderr: verbose,
            format: if json { LogFormat::Json } else { LogFormat::Text },
            default_filter: if verbose { "debug" } else { "info" },
            ..Self::default()
        }
    }

    /// Explicit `log_dir`, then `$CHIRP_LOG_DIR`, then `~/.local/share/<app_name>`.
    pub fn resolve_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return expand_home(dir);
        }
        match std::env::var_os(LOG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => expand_home(Path::new(&dir)),
            _ => default_data_dir(self.app_name),
        }
    }
}

fn layer_for<S, W>(format: LogFormat, writer: W, ansi: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Text => fmt::layer().with_writer(writer).with_ansi(ansi).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    }
}

/// Install the global subscriber and return today's log file path.
pub fn init_logging(config: LogConfig) -> anyhow::Result<PathBuf> {
    if let Some((path, _)) = INSTALLED.get() {
        return Ok(path.clone());
    }

    let dir = config.resolve_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let file_name = format!("{}.log", config.app_name);
    let path = dir.join(format!("{file_name}.{}", Local::now().format("%Y-%m-%d")));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, &file_name));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(layer_for(config.format, file_writer, false))
        .with(
            config
                .emit_stderr
                .then(|| layer_for(config.format, std::io::stderr, true)),
        )
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    tracing::debug!(path = %path.display(), format = ?config.format, "logging.initialised");
    let _ = INSTALLED.set((path.clone(), guard));
    Ok(path)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn default_data_dir(app_name: &str) -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".local/share").join(app_name),
        None => PathBuf::from(app_name),
    }
}
