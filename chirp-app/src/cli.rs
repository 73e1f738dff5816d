use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chirp_config::{ApiConfig, DEFAULT_CONFIG_PATH};
use chirp_http::HttpClient;
use chirp_social::twitter::{
    DEFAULT_IMAGES_DIR, ImageDownloader, ListDisplay, ResponseHandler, TimelineDisplay,
    TwitterClient, TwitterError,
};
use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chirp", version, about = "Read timelines, lists and searches from Twitter")]
pub struct Args {
    /// YAML file holding the OAuth credentials
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Mirror logs to stderr at debug level
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// The authenticated user's own timeline
    Timeline {
        #[arg(long)]
        count: Option<u32>,
        #[command(flatten)]
        media: MediaOpts,
    },
    /// Another user's timeline
    UserTimeline {
        screen_name: String,
        #[arg(long)]
        count: Option<u32>,
        #[command(flatten)]
        media: MediaOpts,
    },
    /// Lists a user has been added to
    Lists { screen_name: String },
    /// Statuses from a user posted before a date
    Search {
        screen_name: String,
        /// Upper bound, YYYY-MM-DD
        #[arg(long)]
        until: String,
        #[arg(long)]
        count: Option<u32>,
        #[command(flatten)]
        media: MediaOpts,
    },
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub struct MediaOpts {
    /// Download attached photos instead of printing statuses
    #[arg(long)]
    pub images: bool,

    /// Where downloaded photos go, one directory per user
    #[arg(long, default_value = DEFAULT_IMAGES_DIR, requires = "images")]
    pub images_dir: PathBuf,
}

/// Client for media downloads, with the same timeout as API calls.
fn media_client(config: &ApiConfig) -> anyhow::Result<HttpClient> {
    let mut http = HttpClient::new(&config.base_url)?;
    if let Some(secs) = config.timeout_secs {
        http = http.with_timeout(Duration::from_secs(secs));
    }
    Ok(http)
}

/// Pick the handler a timeline-shaped response should go to.
fn timeline_handler(
    config: &ApiConfig,
    media: &MediaOpts,
) -> anyhow::Result<Box<dyn ResponseHandler>> {
    if media.images {
        let http = media_client(config)?;
        Ok(Box::new(ImageDownloader::new(http, &media.images_dir)))
    } else {
        Ok(Box::new(TimelineDisplay::stdout()))
    }
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = ApiConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    tracing::info!(command = ?args.command, "chirp.start");

    match &args.command {
        Command::Timeline { count, media } => {
            let client = TwitterClient::new(&config, timeline_handler(&config, media)?)?;
            client.fetch_own_timeline(*count).await?;
        }
        Command::UserTimeline {
            screen_name,
            count,
            media,
        } => {
            let client = TwitterClient::new(&config, timeline_handler(&config, media)?)?;
            client.fetch_user_timeline(screen_name, *count).await?;
        }
        Command::Lists { screen_name } => {
            let client = TwitterClient::new(&config, ListDisplay::stdout())?;
            client.fetch_user_lists(screen_name).await?;
        }
        Command::Search {
            screen_name,
            until,
            count,
            media,
        } => {
            let client = TwitterClient::new(&config, timeline_handler(&config, media)?)?;
            client.search(screen_name, *count, Some(until.as_str())).await?;
        }
    }
    Ok(())
}

/// Print a failed run: a non-200 answer becomes `Failed: <status>` on `out`,
/// everything else goes to `err` with its cause chain.
pub fn report(error: &anyhow::Error, out: &mut impl Write, err: &mut impl Write) {
    let _ = match error.downcast_ref::<TwitterError>() {
        Some(TwitterError::Status { status, .. }) => writeln!(out, "Failed: {status}"),
        _ => writeln!(err, "error: {error:#}"),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("chirp").chain(argv.iter().copied()))
    }

    fn reported(error: anyhow::Error) -> (String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        report(&error, &mut out, &mut err);
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn status_failures_print_the_code_on_stdout() {
        let error = anyhow::Error::from(TwitterError::Status {
            status: 404,
            message: "Sorry, that page does not exist.".into(),
        });
        assert_eq!(reported(error), ("Failed: 404\n".to_string(), String::new()));
    }

    #[test]
    fn other_failures_go_to_stderr() {
        let error = anyhow::Error::from(TwitterError::InvalidInput(
            "screen_name must not be empty".into(),
        ))
        .context("search failed");
        let (out, err) = reported(error);
        assert!(out.is_empty());
        assert!(err.starts_with("error: search failed"), "got {err}");
        assert!(err.contains("screen_name must not be empty"));
    }

    #[test]
    fn media_downloads_share_the_configured_timeout() {
        let yaml = "CONSUMER_KEY: a\nCONSUMER_SECRET: b\nACCESS_TOKEN: c\nACCESS_TOKEN_SECRET: d\n";
        let load = |extra: &str| {
            chirp_config::ApiConfigLoader::new()
                .with_yaml_str(&format!("{yaml}{extra}"))
                .load()
                .unwrap()
        };

        let timed = media_client(&load("TIMEOUT_SECS: 3\n")).unwrap();
        assert_eq!(timed.default_timeout, Duration::from_secs(3));

        let plain = media_client(&load("")).unwrap();
        assert_eq!(plain.default_timeout, Duration::from_secs(15));
    }

    #[test]
    fn timeline_defaults() {
        let args = parse(&["timeline"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config/api.yml"));
        assert!(!args.verbose);
        assert_eq!(
            args.command,
            Command::Timeline {
                count: None,
                media: MediaOpts {
                    images: false,
                    images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
                },
            }
        );
    }

    #[test]
    fn user_timeline_takes_screen_name_and_count() {
        let args = parse(&["--config", "other.yml", "user-timeline", "bob", "--count", "100"])
            .unwrap();
        assert_eq!(args.config, PathBuf::from("other.yml"));
        match args.command {
            Command::UserTimeline {
                screen_name, count, ..
            } => {
                assert_eq!(screen_name, "bob");
                assert_eq!(count, Some(100));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn search_requires_until() {
        assert!(parse(&["search", "alice"]).is_err());

        let args = parse(&["search", "alice", "--until", "2020-01-01", "--images"]).unwrap();
        match args.command {
            Command::Search { until, media, .. } => {
                assert_eq!(until, "2020-01-01");
                assert!(media.images);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn images_dir_needs_images() {
        assert!(parse(&["timeline", "--images-dir", "/tmp/x"]).is_err());
        let args = parse(&["timeline", "--images", "--images-dir", "/tmp/x"]).unwrap();
        match args.command {
            Command::Timeline { media, .. } => assert_eq!(media.images_dir, PathBuf::from("/tmp/x")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lists_take_no_media_flags() {
        assert!(parse(&["lists", "hinata", "--images"]).is_err());
        assert_eq!(
            parse(&["lists", "hinata"]).unwrap().command,
            Command::Lists {
                screen_name: "hinata".into()
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = parse(&["lists", "hinata", "--verbose", "--log-json"]).unwrap();
        assert!(args.verbose);
        assert!(args.log_json);
    }
}
