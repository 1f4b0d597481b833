//! Interactive controls under anime results and their activation.
//!
//! Controls carry only the target identifier, so activation needs no
//! state from the render that produced them.

use std::fmt;
use std::sync::Arc;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, warn};

use crate::anilist::{LookupBackend, LookupError, LookupKind, LookupRequest};
use crate::render::{Direction, RenderError, RenderedMessage, Renderer};

/// Prefix of navigation callback data.
pub const CALLBACK_PREFIX: &str = "btn_";

/// Where restricted items are searched instead of downloaded.
const SEARCH_ELSEWHERE_URL: &str = "https://anilist.co/search/anime";

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Invalid callback data: {0}")]
    InvalidCallback(String),

    #[error("Only the owner can use these buttons")]
    NotOwner(i64),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// One button under a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Callback button re-rendering a related item.
    Navigate { direction: Direction, target: i64 },
    /// Inline-query button that searches the item for download.
    Download { query: String },
    /// Link button used for restricted items.
    SearchElsewhere { url: String },
}

impl Control {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Navigate { direction, .. } => direction.to_string(),
            Self::Download { .. } => "Download".to_owned(),
            Self::SearchElsewhere { .. } => "Search elsewhere".to_owned(),
        }
    }

    /// Callback data for navigation buttons.
    #[must_use]
    pub fn callback_data(&self) -> Option<String> {
        match self {
            Self::Navigate { target, .. } => Some(callback_data(*target)),
            _ => None,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate { target, .. } => write!(f, "[{}: {}]", self.label(), callback_data(*target)),
            Self::Download { query } => write!(f, "[{}: anime {query}]", self.label()),
            Self::SearchElsewhere { url } => write!(f, "[{}: {url}]", self.label()),
        }
    }
}

/// Button rows, top to bottom.
pub type Keyboard = Vec<Vec<Control>>;

/// Callback data for a navigation target.
#[must_use]
pub fn callback_data(target: i64) -> String {
    format!("{CALLBACK_PREFIX}{target}")
}

/// Extracts the target identifier from callback data.
pub fn parse_callback(data: &str) -> Result<i64, NavigationError> {
    data.strip_prefix(CALLBACK_PREFIX)
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| NavigationError::InvalidCallback(data.to_owned()))
}

/// Builds the keyboard for a rendered result.
///
/// Prequel and sequel share the first row. Restricted items get a
/// search-elsewhere link where others get a download button.
#[must_use]
pub fn build_controls(rendered: &RenderedMessage) -> Keyboard {
    let mut rows = Vec::new();

    let navigation: Vec<Control> = [rendered.prequel(), rendered.sequel()]
        .into_iter()
        .flatten()
        .map(|link| Control::Navigate {
            direction: link.direction,
            target: link.target,
        })
        .collect();
    if !navigation.is_empty() {
        rows.push(navigation);
    }

    if let Some(query) = &rendered.download_query {
        if rendered.restricted {
            match Url::parse_with_params(SEARCH_ELSEWHERE_URL, &[("search", query)]) {
                Ok(url) => rows.push(vec![Control::SearchElsewhere { url: url.into() }]),
                Err(e) => warn!("Could not build search link for \"{}\": {}", query, e),
            }
        } else {
            rows.push(vec![Control::Download {
                query: query.clone(),
            }]);
        }
    }

    rows
}

/// A button press on one of our controls.
#[derive(Debug, Clone)]
pub struct Callback {
    pub data: String,
    pub sender_id: i64,
}

/// Result of an activation, ready to replace the original message.
#[derive(Debug, Clone)]
pub struct Activation {
    pub rendered: RenderedMessage,
    pub controls: Keyboard,
}

/// Re-runs lookup and render for activated navigation controls.
pub struct NavigationController {
    backend: Arc<dyn LookupBackend>,
    renderer: Arc<Renderer>,
    owner_id: Option<i64>,
}

impl NavigationController {
    #[must_use]
    pub fn new(
        backend: Arc<dyn LookupBackend>,
        renderer: Arc<Renderer>,
        owner_id: Option<i64>,
    ) -> Self {
        Self {
            backend,
            renderer,
            owner_id,
        }
    }

    /// Handles a button press.
    pub async fn on_activate(&self, callback: &Callback) -> Result<Activation, NavigationError> {
        if let Some(owner) = self.owner_id
            && owner != callback.sender_id
        {
            return Err(NavigationError::NotOwner(callback.sender_id));
        }

        let target = parse_callback(&callback.data)?;
        debug!("Navigating to anime {}", target);

        let request = LookupRequest::by_id(LookupKind::Anime, target);
        let result = self.backend.lookup(&request).await?;
        let rendered = self.renderer.render(&result).await?;
        let controls = build_controls(&rendered);

        Ok(Activation { rendered, controls })
    }
}

impl fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavigationController")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::Mutex;

    use crate::anilist::{LookupBackend, LookupError, QueryDocument};

    /// Backend answering anime id lookups from a fixed table.
    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub media: HashMap<i64, Value>,
        pub calls: Mutex<Vec<Value>>,
    }

    impl FakeBackend {
        pub fn with_media(items: impl IntoIterator<Item = Value>) -> Self {
            Self {
                media: items
                    .into_iter()
                    .filter_map(|m| Some((m.get("id")?.as_i64()?, m)))
                    .collect(),
                calls: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl LookupBackend for FakeBackend {
        async fn fetch(&self, _: QueryDocument, variables: Value) -> Result<Value, LookupError> {
            self.calls.lock().await.push(variables.clone());

            let found = variables
                .get("id")
                .and_then(Value::as_i64)
                .and_then(|id| self.media.get(&id))
                .or_else(|| {
                    let search = variables.get("search")?.as_str()?;
                    self.media.values().find(|m| {
                        m.pointer("/title/romaji").and_then(Value::as_str) == Some(search)
                    })
                })
                .or_else(|| {
                    let mal = variables.get("idMal")?.as_i64()?;
                    self.media
                        .values()
                        .find(|m| m.get("idMal").and_then(Value::as_i64) == Some(mal))
                });

            match found {
                Some(media) => Ok(json!({ "Media": media })),
                None => Err(LookupError::Remote("Not Found.".to_owned())),
            }
        }
    }

    pub fn media(id: i64, title: &str, relations: &[(i64, &str)], adult: bool) -> Value {
        let edges: Vec<Value> = relations
            .iter()
            .map(|(target, kind)| {
                json!({"node": {"id": target, "title": {"romaji": format!("Anime {target}")}}, "relationType": kind})
            })
            .collect();
        json!({
            "id": id,
            "idMal": id + 1000,
            "title": {"romaji": title, "english": null, "native": null},
            "relations": {"edges": edges},
            "isAdult": adult
        })
    }
}
