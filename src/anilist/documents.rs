//! GraphQL query documents sent to AniList.

/// Selects one of the query documents below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDocument {
    Anime,
    Manga,
    Character,
    AiringSchedule,
}

impl QueryDocument {
    /// Returns the document text.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Anime => ANIME_QUERY,
            Self::Manga => MANGA_QUERY,
            Self::Character => CHARACTER_QUERY,
            Self::AiringSchedule => AIRING_QUERY,
        }
    }
}

const ANIME_QUERY: &str = r"
query ($id: Int, $idMal: Int, $search: String, $type: MediaType, $asHtml: Boolean) {
    Media (id: $id, idMal: $idMal, search: $search, type: $type) {
        id
        idMal
        title { romaji english native }
        format
        status
        description (asHtml: $asHtml)
        startDate { year month day }
        episodes
        duration
        countryOfOrigin
        source (version: 2)
        trailer { id site thumbnail }
        relations {
            edges {
                node { id title { romaji english } }
                relationType
            }
        }
        bannerImage
        nextAiringEpisode { airingAt timeUntilAiring episode }
        isAdult
        characters (role: MAIN, page: 1, perPage: 10) {
            nodes {
                id
                name { full native }
                image { large }
                description (asHtml: $asHtml)
                siteUrl
            }
        }
        studios (isMain: true) {
            nodes { name siteUrl }
        }
        siteUrl
    }
}
";

const MANGA_QUERY: &str = r"
query ($id: Int, $idMal: Int, $search: String, $type: MediaType, $asHtml: Boolean) {
    Media (id: $id, idMal: $idMal, search: $search, type: $type) {
        id
        title { romaji english native }
        format
        countryOfOrigin
        source (version: 2)
        status
        description (asHtml: $asHtml)
        chapters
        volumes
        averageScore
        siteUrl
    }
}
";

const CHARACTER_QUERY: &str = r"
query ($id: Int, $search: String, $asHtml: Boolean) {
    Character (id: $id, search: $search) {
        id
        name { full native }
        image { large }
        description (asHtml: $asHtml)
        siteUrl
        media (page: 1, perPage: 25) {
            nodes {
                id
                idMal
                title { romaji english native }
                type
                siteUrl
                coverImage { extraLarge }
                bannerImage
                averageScore
                description (asHtml: $asHtml)
            }
        }
    }
}
";

const AIRING_QUERY: &str = r"
query ($id: Int, $mediaId: Int, $notYetAired: Boolean) {
    Page (page: 1, perPage: 50) {
        airingSchedules (id: $id, mediaId: $mediaId, notYetAired: $notYetAired) {
            id
            airingAt
            timeUntilAiring
            episode
            mediaId
            media {
                title { romaji english native }
                duration
                coverImage { extraLarge }
                bannerImage
                averageScore
                siteUrl
            }
        }
    }
}
";
