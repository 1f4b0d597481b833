//! Typed views of AniList payloads.
//!
//! AniList returns `null` for most optional fields, so collections and
//! nested objects decode `null` as their default value.

use serde::{Deserialize, Deserializer};

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A decoded lookup, tagged by kind.
#[derive(Debug, Clone)]
pub enum LookupResult {
    Anime(Box<Media>),
    Manga(Box<Manga>),
    Airing(Box<Media>),
    Character(Box<Character>),
    Schedule(Vec<AiringEntry>),
}

/// Title in its different scripts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Title {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FuzzyDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Trailer {
    pub id: Option<String>,
    pub site: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    Adaptation,
    Prequel,
    Sequel,
    Parent,
    SideStory,
    Character,
    Summary,
    Alternative,
    SpinOff,
    Other,
    Source,
    Compilation,
    Contains,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedMedia {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Title,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEdge {
    pub node: RelatedMedia,
    pub relation_type: Option<RelationType>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAiring {
    /// Unix timestamp of the broadcast.
    pub airing_at: i64,
    pub time_until_airing: i64,
    pub episode: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Name {
    pub full: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    pub large: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub extra_large: Option<String>,
}

/// A main character listed on an anime.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterNode {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: Name,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: Image,
    pub description: Option<String>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub name: String,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Edges<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_vec")]
    pub edges: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Nodes<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_vec")]
    pub nodes: Vec<T>,
}

impl<T> Default for Edges<T> {
    fn default() -> Self {
        Self { edges: Vec::new() }
    }
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

fn null_as_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Anime media, used by both the anime and the airing lookups.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i64,
    pub id_mal: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Title,
    pub format: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_date: FuzzyDate,
    pub episodes: Option<u32>,
    pub duration: Option<u32>,
    pub country_of_origin: Option<String>,
    pub source: Option<String>,
    pub trailer: Option<Trailer>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: Edges<RelationEdge>,
    pub banner_image: Option<String>,
    pub next_airing_episode: Option<NextAiring>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_adult: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub characters: Nodes<CharacterNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub studios: Nodes<Studio>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Title,
    pub format: Option<String>,
    pub country_of_origin: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub chapters: Option<u32>,
    pub volumes: Option<u32>,
    pub average_score: Option<u32>,
    pub site_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Anime,
    Manga,
    #[serde(other)]
    Unknown,
}

/// A media entry a character appears in.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturedMedia {
    pub id: i64,
    pub id_mal: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Title,
    #[serde(rename = "type")]
    pub media_type: Option<MediaType>,
    pub site_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover_image: CoverImage,
    pub banner_image: Option<String>,
    pub average_score: Option<u32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: Name,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: Image,
    pub description: Option<String>,
    pub site_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: Nodes<FeaturedMedia>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMedia {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: Title,
    pub duration: Option<u32>,
    pub average_score: Option<u32>,
    pub site_url: Option<String>,
}

/// One entry of the airing schedule page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiringEntry {
    pub id: i64,
    pub airing_at: i64,
    pub time_until_airing: i64,
    pub episode: u32,
    pub media_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub media: ScheduledMedia,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_media_nulls_become_defaults() {
        let media: Media = serde_json::from_value(json!({
            "id": 1,
            "title": {"romaji": "Cowboy Bebop", "english": null, "native": null},
            "relations": null,
            "characters": {"nodes": null},
            "studios": null,
            "isAdult": null,
            "startDate": null
        }))
        .unwrap();

        assert!(media.relations.edges.is_empty());
        assert!(media.characters.nodes.is_empty());
        assert!(media.studios.nodes.is_empty());
        assert!(!media.is_adult);
        assert_eq!(media.title.romaji.as_deref(), Some("Cowboy Bebop"));
        assert!(media.start_date.year.is_none());
    }

    #[test]
    fn test_unknown_relation_type() {
        let edge: RelationEdge = serde_json::from_value(json!({
            "node": {"id": 5, "title": {"romaji": "X"}},
            "relationType": "SOMETHING_NEW"
        }))
        .unwrap();
        assert_eq!(edge.relation_type, Some(RelationType::Unknown));

        let edge: RelationEdge = serde_json::from_value(json!({
            "node": {"id": 5, "title": null},
            "relationType": "SIDE_STORY"
        }))
        .unwrap();
        assert_eq!(edge.relation_type, Some(RelationType::SideStory));
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let result: Result<Media, _> = serde_json::from_value(json!({"title": {}}));
        assert!(result.is_err());
    }
}
