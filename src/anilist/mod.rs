//! AniList lookups.
//!
//! Builds GraphQL requests from chat commands, performs the single
//! outbound call and decodes the payload into typed results.

mod client;
mod documents;
mod model;
mod query;

pub use client::{AniListClient, LookupBackend, decode, extract_data};
pub use documents::QueryDocument;
pub use model::{
    AiringEntry, Character, CharacterNode, CoverImage, Edges, FeaturedMedia, FuzzyDate, Image,
    LookupResult, Manga, Media, MediaType, Name, NextAiring, Nodes, RelatedMedia, RelationEdge,
    RelationType, ScheduledMedia, Studio, Title, Trailer,
};
pub use query::{
    CatalogNamespace, LookupKind, LookupRequest, LookupTarget, MAL_ID_FLAG, split_flags,
};

use thiserror::Error;

/// Errors produced while building, fetching or decoding a lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Nothing to search for")]
    EmptyQuery,

    #[error("A {0} has no MyAnimeList id")]
    NoMalNamespace(LookupKind),

    #[error("[{0}]")]
    Remote(String),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response shape: {0}")]
    MalformedPayload(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
