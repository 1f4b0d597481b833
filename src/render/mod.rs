//! Rendering of lookup results into chat captions and long-form pages.

mod airing;
mod anime;
mod character;
mod manga;
mod schedule;
mod template;
pub mod text;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

pub use anime::select_navigation;
pub use template::{ANIME_TEMPLATE, Template};

use crate::anilist::LookupResult;
use crate::telegraph::DocumentPublisher;

/// Errors raised while rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{0}")]
    MissingTemplateField(String),
}

/// Direction of a related-item link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prequel,
    Sequel,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prequel => f.write_str("Prequel"),
            Self::Sequel => f.write_str("Sequel"),
        }
    }
}

/// A related item reachable from the rendered one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLink {
    pub direction: Direction,
    pub target: i64,
    pub title: String,
}

/// HTML body meant for off-chat hosting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongFormDocument {
    pub title: String,
    pub html: String,
}

/// Everything a chat reply needs from one lookup.
#[derive(Debug, Clone, Default)]
pub struct RenderedMessage {
    /// HTML caption or message text.
    pub caption: String,
    pub document: Option<LongFormDocument>,
    /// Where the document was published, if publishing succeeded.
    pub document_url: Option<String>,
    pub media_url: Option<String>,
    pub navigation: Vec<NavigationLink>,
    /// Adult-rated item.
    pub restricted: bool,
    /// Query used by the download / search-elsewhere controls.
    pub download_query: Option<String>,
}

impl RenderedMessage {
    /// Caption length in characters, as counted against the caption limit.
    #[must_use]
    pub fn caption_len(&self) -> usize {
        self.caption.chars().count()
    }

    /// Whether the caption may be sent attached to an image.
    #[must_use]
    pub fn fits_caption(&self, limit: usize) -> bool {
        self.caption_len() <= limit
    }

    fn link(&self, direction: Direction) -> Option<&NavigationLink> {
        self.navigation.iter().find(|l| l.direction == direction)
    }

    /// Target of the prequel link, if any.
    #[must_use]
    pub fn prequel(&self) -> Option<&NavigationLink> {
        self.link(Direction::Prequel)
    }

    /// Target of the sequel link, if any.
    #[must_use]
    pub fn sequel(&self) -> Option<&NavigationLink> {
        self.link(Direction::Sequel)
    }
}

/// Turns lookup results into [`RenderedMessage`]s.
pub struct Renderer {
    publisher: Arc<dyn DocumentPublisher>,
    anime_template: Template,
}

impl Renderer {
    #[must_use]
    pub fn new(publisher: Arc<dyn DocumentPublisher>) -> Self {
        Self {
            publisher,
            anime_template: Template::default(),
        }
    }

    /// Replaces the anime caption template.
    #[must_use]
    pub fn with_anime_template(mut self, template: Template) -> Self {
        self.anime_template = template;
        self
    }

    /// Renders a result relative to the current time.
    pub async fn render(&self, result: &LookupResult) -> Result<RenderedMessage, RenderError> {
        self.render_at(result, Utc::now()).await
    }

    /// Renders a result with relative times computed from `now`.
    pub async fn render_at(
        &self,
        result: &LookupResult,
        now: DateTime<Utc>,
    ) -> Result<RenderedMessage, RenderError> {
        match result {
            LookupResult::Anime(media) => {
                let document = anime::document(media);
                let url = self.publish(&document).await;
                anime::render(media, &self.anime_template, document, url, now)
            }
            LookupResult::Airing(media) => Ok(airing::render(media, now)),
            LookupResult::Manga(manga) => Ok(manga::render(manga)),
            LookupResult::Character(character) => {
                let document = character::document(character);
                let url = self.publish(&document).await;
                Ok(character::render(character, document, url))
            }
            LookupResult::Schedule(entries) => {
                let Some(document) = schedule::document(entries, now) else {
                    return Ok(schedule::render_empty());
                };
                let url = self.publish(&document).await;
                Ok(schedule::render(entries.len(), document, url))
            }
        }
    }

    /// Publishes a document, returning `None` when the publisher fails.
    async fn publish(&self, document: &LongFormDocument) -> Option<String> {
        match self.publisher.publish(&document.title, &document.html).await {
            Ok(url) => {
                debug!("Published \"{}\" to {}", document.title, url);
                Some(url)
            }
            Err(e) => {
                warn!("Could not publish \"{}\": {}", document.title, e);
                None
            }
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("anime_template", &self.anime_template)
            .finish_non_exhaustive()
    }
}

/// Preview image AniList serves for any media id.
fn preview_image(id: i64) -> String {
    format!("https://img.anili.st/media/{id}")
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::telegraph::PublishError;

    /// Publisher that records documents and hands out fixed URLs.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        pub fail: bool,
        pub published: Mutex<Vec<LongFormDocument>>,
    }

    impl RecordingPublisher {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl DocumentPublisher for RecordingPublisher {
        async fn publish(&self, title: &str, html: &str) -> Result<String, PublishError> {
            if self.fail {
                return Err(PublishError::Api("PAGE_SAVE_FAILED".to_owned()));
            }
            let mut published = self.published.lock().await;
            published.push(LongFormDocument {
                title: title.to_owned(),
                html: html.to_owned(),
            });
            Ok(format!("https://telegra.ph/page-{}", published.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingPublisher;
    use super::*;

    #[test]
    fn test_caption_fallback_threshold() {
        let mut message = RenderedMessage {
            caption: "a".repeat(1024),
            ..RenderedMessage::default()
        };
        assert_eq!(message.caption_len(), 1024);
        assert!(message.fits_caption(1024));

        message.caption.push('b');
        assert!(!message.fits_caption(1024));
    }

    #[test]
    fn test_caption_len_counts_chars() {
        let message = RenderedMessage {
            caption: "🇯🇵".to_owned(),
            ..RenderedMessage::default()
        };
        assert_eq!(message.caption_len(), 2);
    }

    #[tokio::test]
    async fn test_schedule_without_entries() {
        let renderer = Renderer::new(Arc::new(RecordingPublisher::default()));
        let rendered = renderer
            .render(&LookupResult::Schedule(vec![]))
            .await
            .unwrap();
        assert!(rendered.document.is_none());
        assert!(rendered.caption.contains("No scheduled"));
    }
}
