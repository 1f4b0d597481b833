//! Reverse image search through a hosted copy of the replied media.
//!
//! The media is downloaded into the download directory, uploaded to the
//! media host, and the hosted URL is handed to a search engine. The local
//! copy is removed whatever the outcome.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use crate::telegraph::{MediaHost, PublishError};

#[derive(Debug, Error)]
pub enum ReverseSearchError {
    #[error("Media not found!")]
    NoMedia,

    #[error("Could not store media: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Upload(#[from] PublishError),

    #[error("Invalid media link: {0}")]
    InvalidLink(String),
}

/// Search engine that accepts an image URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEngine {
    Yandex,
    Google,
}

impl SearchEngine {
    /// Search URL for an image hosted at `media_link`.
    pub fn search_url(self, media_link: &str) -> Result<String, ReverseSearchError> {
        let url = match self {
            Self::Yandex => Url::parse_with_params(
                "https://yandex.com/images/search",
                &[("rpt", "imageview"), ("url", media_link)],
            ),
            Self::Google => Url::parse_with_params(
                "https://www.google.com/searchbyimage",
                &[("image_url", media_link)],
            ),
        };
        url.map(String::from)
            .map_err(|e| ReverseSearchError::InvalidLink(e.to_string()))
    }
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yandex => f.write_str("Yandex"),
            Self::Google => f.write_str("Google"),
        }
    }
}

/// A downloaded media file, deleted when dropped unless it was already
/// there before the download.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    owned: bool,
}

impl DownloadedFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: true,
        }
    }

    /// A file that is used in place and left on disk.
    #[must_use]
    pub fn existing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owned: false,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// Where the media of a replied message comes from.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Saves the media into `dir`.
    async fn download(&self, dir: &Path) -> Result<DownloadedFile, ReverseSearchError>;
}

/// Media source that copies a file from the local disk.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MediaSource for LocalFileSource {
    async fn download(&self, dir: &Path) -> Result<DownloadedFile, ReverseSearchError> {
        let Some(name) = self.path.file_name() else {
            return Err(ReverseSearchError::NoMedia);
        };
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(ReverseSearchError::NoMedia);
        }

        let target = dir.join(name);
        let source = tokio::fs::canonicalize(&self.path).await?;
        if tokio::fs::canonicalize(dir).await?.join(name) == source {
            debug!("{} is already in {}", source.display(), dir.display());
            return Ok(DownloadedFile::existing(source));
        }

        tokio::fs::copy(&self.path, &target).await?;
        Ok(DownloadedFile::new(target))
    }
}

/// Runs reverse searches against a media host.
pub struct ReverseSearch {
    host: Arc<dyn MediaHost>,
    down_path: PathBuf,
    media_base: String,
}

impl ReverseSearch {
    /// `media_base` is prefixed to the path fragment the host returns.
    #[must_use]
    pub fn new(
        host: Arc<dyn MediaHost>,
        down_path: impl Into<PathBuf>,
        media_base: impl Into<String>,
    ) -> Self {
        Self {
            host,
            down_path: down_path.into(),
            media_base: media_base.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Hosts the media and returns the search URL for `engine`.
    pub async fn search(
        &self,
        source: &dyn MediaSource,
        engine: SearchEngine,
    ) -> Result<String, ReverseSearchError> {
        tokio::fs::create_dir_all(&self.down_path).await?;
        let file = source.download(&self.down_path).await?;

        let fragment = self.host.upload(file.path()).await?;
        drop(file);

        let media_link = format!("{}{}", self.media_base, fragment);
        debug!("Media hosted at {}", media_link);
        engine.search_url(&media_link)
    }
}

impl fmt::Debug for ReverseSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReverseSearch")
            .field("down_path", &self.down_path)
            .field("media_base", &self.media_base)
            .finish_non_exhaustive()
    }
}

/// Scheme and host of `url`, used as the base of hosted media links.
#[must_use]
pub fn media_base(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let origin = url.origin();
    origin.is_tuple().then(|| origin.ascii_serialization())
}
