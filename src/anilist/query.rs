//! Turns command text into lookup requests.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value, json};

use super::{LookupError, QueryDocument};

/// Flag that reinterprets a numeric query as a MyAnimeList id.
pub const MAL_ID_FLAG: &str = "-mid";

/// The four supported lookup kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Anime,
    Manga,
    AiringSchedule,
    Character,
}

impl LookupKind {
    /// GraphQL document used to fetch this kind.
    #[must_use]
    pub const fn document(self) -> QueryDocument {
        match self {
            Self::Anime | Self::AiringSchedule => QueryDocument::Anime,
            Self::Manga => QueryDocument::Manga,
            Self::Character => QueryDocument::Character,
        }
    }

    /// Whether the kind can be looked up by MyAnimeList id.
    const fn has_mal_namespace(self) -> bool {
        !matches!(self, Self::Character)
    }

    /// `MediaType` enum value sent with media queries.
    const fn media_type(self) -> Option<&'static str> {
        match self {
            Self::Anime | Self::AiringSchedule => Some("ANIME"),
            Self::Manga => Some("MANGA"),
            Self::Character => None,
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anime => "anime",
            Self::Manga => "manga",
            Self::AiringSchedule => "airing",
            Self::Character => "character",
        };
        f.write_str(name)
    }
}

/// Which catalog a numeric identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogNamespace {
    /// AniList's own id.
    #[default]
    Native,
    /// MyAnimeList id.
    Mal,
}

/// What the lookup searches by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTarget {
    Id { id: i64, namespace: CatalogNamespace },
    Search(String),
}

/// A fully-built lookup, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub kind: LookupKind,
    pub target: LookupTarget,
    pub flags: BTreeSet<String>,
}

impl LookupRequest {
    /// Builds a request from the user's text and flags.
    ///
    /// All-digit text becomes an identifier; the MAL flag moves that
    /// identifier into the MyAnimeList namespace without changing it.
    /// Characters have no such namespace, so the flag is rejected for them.
    pub fn build<S: AsRef<str>>(
        kind: LookupKind,
        text: &str,
        flags: &[S],
    ) -> Result<Self, LookupError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LookupError::EmptyQuery);
        }

        let flags: BTreeSet<String> = flags.iter().map(|f| f.as_ref().to_owned()).collect();

        let numeric = text
            .chars()
            .all(|c| c.is_ascii_digit())
            .then(|| text.parse::<i64>().ok())
            .flatten();

        let target = match numeric {
            Some(id) => {
                let namespace = if flags.contains(MAL_ID_FLAG) {
                    if !kind.has_mal_namespace() {
                        return Err(LookupError::NoMalNamespace(kind));
                    }
                    CatalogNamespace::Mal
                } else {
                    CatalogNamespace::Native
                };
                LookupTarget::Id { id, namespace }
            }
            None => LookupTarget::Search(text.to_owned()),
        };

        Ok(Self { kind, target, flags })
    }

    /// Request for a known AniList id, as used by navigation buttons.
    #[must_use]
    pub fn by_id(kind: LookupKind, id: i64) -> Self {
        Self {
            kind,
            target: LookupTarget::Id {
                id,
                namespace: CatalogNamespace::Native,
            },
            flags: BTreeSet::new(),
        }
    }

    /// Returns true when `flag` was given.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// GraphQL variables for this request.
    #[must_use]
    pub fn variables(&self) -> Value {
        let mut vars = Map::new();

        match &self.target {
            LookupTarget::Id {
                id,
                namespace: CatalogNamespace::Native,
            } => {
                vars.insert("id".to_owned(), json!(id));
            }
            LookupTarget::Id {
                id,
                namespace: CatalogNamespace::Mal,
            } => {
                vars.insert("idMal".to_owned(), json!(id));
            }
            LookupTarget::Search(text) => {
                vars.insert("search".to_owned(), json!(text));
            }
        }

        vars.insert("asHtml".to_owned(), json!(true));
        if let Some(media_type) = self.kind.media_type() {
            vars.insert("type".to_owned(), json!(media_type));
        }

        Value::Object(vars)
    }
}

/// Splits command arguments into flags and query text.
///
/// Tokens like `-mid` are flags; everything else is rejoined with single
/// spaces. A lone `-` or a negative number stays in the text.
#[must_use]
pub fn split_flags(args: &str) -> (Vec<String>, String) {
    let mut flags = Vec::new();
    let mut words = Vec::new();

    for token in args.split_whitespace() {
        let is_flag = token
            .strip_prefix('-')
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_alphabetic);

        if is_flag {
            flags.push(token.to_lowercase());
        } else {
            words.push(token);
        }
    }

    (flags, words.join(" "))
}
