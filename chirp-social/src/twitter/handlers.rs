//! Handlers that receive decoded response bodies from [`TwitterClient`].
//!
//! A handler sees the JSON exactly as the API returned it; the ones here
//! decode the parts they need into [`crate::twitter::types`] and either print
//! them or download the media they reference.
//!
//! [`TwitterClient`]: crate::twitter::TwitterClient
use anyhow::{Context, anyhow, bail};
use async_trait::async_trait;
use chirp_http::{HttpClient, RequestOpts};
use serde_json::Value;
use std::io::{Stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::twitter::types::{ListMemberships, statuses_from_value};

/// Where [`ImageDownloader`] puts media unless told otherwise.
pub const DEFAULT_IMAGES_DIR: &str = "images/twitter";

const STATUS_SEPARATOR: &str = "*******************************************";

/// Receives the decoded body of every successful request.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn handle(&self, body: Value) -> anyhow::Result<()>;
}

#[async_trait]
impl<H: ResponseHandler + ?Sized> ResponseHandler for Box<H> {
    async fn handle(&self, body: Value) -> anyhow::Result<()> {
        (**self).handle(body).await
    }
}

/// Adapts a plain closure.
///
/// ```
/// use chirp_social::twitter::{FnHandler, ResponseHandler};
///
/// let handler = FnHandler(|body: serde_json::Value| -> anyhow::Result<()> {
///     println!("{body}");
///     Ok(())
/// });
/// # let _: &dyn ResponseHandler = &handler;
/// ```
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> ResponseHandler for FnHandler<F>
where
    F: Fn(Value) -> anyhow::Result<()> + Send + Sync,
{
    async fn handle(&self, body: Value) -> anyhow::Result<()> {
        (self.0)(body)
    }
}

fn lock<W>(out: &Mutex<W>) -> anyhow::Result<std::sync::MutexGuard<'_, W>> {
    out.lock().map_err(|_| anyhow!("output writer lock poisoned"))
}

/// Prints `name::text::created_at` for every status, followed by a separator line.
///
/// Accepts timeline arrays as well as search responses.
pub struct TimelineDisplay<W> {
    out: Mutex<W>,
}

impl TimelineDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TimelineDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> ResponseHandler for TimelineDisplay<W> {
    async fn handle(&self, body: Value) -> anyhow::Result<()> {
        let statuses = statuses_from_value(&body).context("response is not a timeline")?;
        let mut out = lock(&self.out)?;
        for status in &statuses {
            writeln!(
                out,
                "{}::{}::{}",
                status.user.name, status.text, status.created_at
            )?;
            writeln!(out, "{STATUS_SEPARATOR}")?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Prints the number of lists a user belongs to, then one list name per line.
pub struct ListDisplay<W> {
    out: Mutex<W>,
}

impl ListDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ListDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl<W: Write + Send> ResponseHandler for ListDisplay<W> {
    async fn handle(&self, body: Value) -> anyhow::Result<()> {
        let memberships: ListMemberships =
            serde_json::from_value(body).context("response is not a list membership page")?;
        let mut out = lock(&self.out)?;
        writeln!(out, "count: {}", memberships.lists.len())?;
        for list in &memberships.lists {
            writeln!(out, "{}", list.name)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Downloads every attached photo into `<base_dir>/<screen_name>/<basename>`
/// and prints each media URL to `W` as it goes.
///
/// A directory is created for every author seen, whether or not the status
/// carries media.
pub struct ImageDownloader<W = Stdout> {
    http: HttpClient,
    base_dir: PathBuf,
    out: Mutex<W>,
}

impl ImageDownloader<Stdout> {
    /// Media URLs are absolute, so `http` may be anchored anywhere.
    pub fn new(http: HttpClient, base_dir: impl Into<PathBuf>) -> Self {
        Self::with_output(http, base_dir, std::io::stdout())
    }
}

impl<W: Write + Send> ImageDownloader<W> {
    pub fn with_output(http: HttpClient, base_dir: impl Into<PathBuf>, out: W) -> Self {
        Self {
            http,
            base_dir: base_dir.into(),
            out: Mutex::new(out),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn announce(&self, media_url: &str) -> anyhow::Result<()> {
        let mut out = lock(&self.out)?;
        writeln!(out, "{media_url}")?;
        out.flush()?;
        Ok(())
    }

    async fn save(&self, dir: &Path, media_url: &str) -> anyhow::Result<PathBuf> {
        let file_name = media_file_name(media_url)?;
        let resp = self
            .http
            .get(
                media_url,
                RequestOpts {
                    allow_absolute: true,
                    ..Default::default()
                },
            )
            .await?;
        if !resp.is_ok() {
            bail!("downloading {media_url} failed: {}", resp.status);
        }

        let target = dir.join(file_name);
        tokio::fs::write(&target, &resp.body)
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;
        tracing::debug!(media_url, path = %target.display(), bytes = resp.body.len(), "media.saved");
        Ok(target)
    }
}

#[async_trait]
impl<W: Write + Send> ResponseHandler for ImageDownloader<W> {
    async fn handle(&self, body: Value) -> anyhow::Result<()> {
        let statuses = statuses_from_value(&body).context("response is not a timeline")?;
        for status in &statuses {
            let screen_name = &status.user.screen_name;
            if !is_safe_component(screen_name) {
                tracing::warn!(%screen_name, "media.skip_unsafe_screen_name");
                continue;
            }

            let dir = self.base_dir.join(screen_name);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("failed to create {}", dir.display()))?;

            for media in status.media() {
                self.announce(&media.media_url)?;
                self.save(&dir, &media.media_url).await?;
            }
        }
        Ok(())
    }
}

/// Last path segment of a media URL.
fn media_file_name(media_url: &str) -> anyhow::Result<String> {
    let url = url::Url::parse(media_url).with_context(|| format!("bad media URL: {media_url}"))?;
    let name = url
        .path_segments()
        .and_then(|mut segs| segs.next_back())
        .unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." {
        bail!("media URL has no file name: {media_url}");
    }
    Ok(name.to_string())
}

// Screen names are `[A-Za-z0-9_]{1,15}`.
fn is_safe_component(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
