use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::text::{
    PLACEHOLDER, country_flag, display_title, escape_html, or_placeholder, relative_timestamp,
};
use super::{RenderedMessage, preview_image};
use crate::anilist::Media;

pub(super) fn render(media: &Media, now: DateTime<Utc>) -> RenderedMessage {
    let mut caption = format!(
        "[{}] <b>{}</b>\n   (<code>{}</code>)",
        country_flag(media.country_of_origin.as_deref()),
        escape_html(media.title.native.as_deref().unwrap_or(PLACEHOLDER)),
        escape_html(&display_title(&media.title)),
    );
    let _ = write!(
        caption,
        "\n\n<b>ID:</b> <code>{}</code>\n<b>Status:</b> <code>{}</code>\n<b>Source:</b> <code>{}</code>",
        media.id,
        escape_html(&or_placeholder(media.status.as_deref())),
        escape_html(&or_placeholder(media.source.as_deref())),
    );

    if let Some(next) = &media.next_airing_episode {
        let _ = write!(
            caption,
            "\n<b>Airing Episode:</b> <code>[{}/{}]</code>\n\n<code>{}</code>",
            next.episode,
            or_placeholder(media.episodes),
            relative_timestamp(next.airing_at, now),
        );
    }

    RenderedMessage {
        caption,
        media_url: Some(preview_image(media.id)),
        restricted: media.is_adult,
        ..RenderedMessage::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_airing_with_next_episode() {
        let media: Media = serde_json::from_value(json!({
            "id": 108_632,
            "title": {"romaji": "Kimetsu no Yaiba", "english": "Demon Slayer", "native": "鬼滅の刃"},
            "status": "RELEASING",
            "episodes": 11,
            "countryOfOrigin": "JP",
            "source": "MANGA",
            "nextAiringEpisode": {"airingAt": 1_700_007_200, "timeUntilAiring": 7200, "episode": 5}
        }))
        .unwrap();

        let rendered = render(&media, now());

        assert!(rendered.caption.starts_with("[🇯🇵] <b>鬼滅の刃</b>\n   (<code>Demon Slayer</code>)"));
        assert!(rendered.caption.contains("<code>[5/11]</code>"));
        assert!(rendered.caption.contains("<code>in 2 hours</code>"));
        assert_eq!(rendered.media_url.as_deref(), Some("https://img.anili.st/media/108632"));
        assert!(rendered.navigation.is_empty());
    }

    #[test]
    fn test_airing_finished_show() {
        let media: Media = serde_json::from_value(json!({
            "id": 1,
            "title": {"romaji": "Cowboy Bebop"},
            "status": "FINISHED"
        }))
        .unwrap();

        let rendered = render(&media, now());

        assert!(rendered.caption.contains("<b>Source:</b> <code>N/A</code>"));
        assert!(!rendered.caption.contains("Airing Episode"));
        assert!(rendered.caption.starts_with("[N/A] <b>N/A</b>"));
    }
}
