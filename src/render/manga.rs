use std::fmt::Write as _;

use super::text::{
    PLACEHOLDER, country_flag, escape_html, or_placeholder, plain_text, truncate_synopsis,
};
use super::{RenderedMessage, preview_image};
use crate::anilist::Manga;

pub(super) fn render(manga: &Manga) -> RenderedMessage {
    let title = &manga.title;
    let mut caption = format!(
        "[{}] <b>{}</b>",
        country_flag(manga.country_of_origin.as_deref()),
        escape_html(title.romaji.as_deref().unwrap_or(PLACEHOLDER)),
    );
    if let Some(english) = &title.english {
        let _ = write!(caption, "\n<i>{}</i>", escape_html(english));
    }
    let _ = write!(
        caption,
        "\n{}\n\n",
        escape_html(title.native.as_deref().unwrap_or(PLACEHOLDER))
    );

    let rows = [
        ("ID", manga.id.to_string()),
        ("STATUS", or_placeholder(manga.status.as_deref())),
        ("VOLUMES", or_placeholder(manga.volumes)),
        ("CHAPTERS", or_placeholder(manga.chapters)),
        ("SCORE", or_placeholder(manga.average_score)),
        ("FORMAT", or_placeholder(manga.format.as_deref())),
        ("SOURCE", or_placeholder(manga.source.as_deref())),
    ];
    for (label, value) in rows {
        let _ = writeln!(caption, "➤ <b>{label}:</b> <code>{}</code>", escape_html(&value));
    }

    let description = manga
        .description
        .as_deref()
        .map_or_else(|| PLACEHOLDER.to_owned(), |d| truncate_synopsis(&plain_text(d)));
    let _ = write!(
        caption,
        "\nDescription: <code>{}</code>",
        escape_html(&description)
    );
    if let Some(url) = &manga.site_url {
        let _ = write!(caption, "\n\nFor more info <a href='{url}'>click here</a>");
    }

    RenderedMessage {
        caption,
        media_url: Some(preview_image(manga.id)),
        ..RenderedMessage::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_manga_caption() {
        let manga: Manga = serde_json::from_value(json!({
            "id": 30_275,
            "title": {"romaji": "Ao Haru Ride", "english": "Blue Spring Ride", "native": "アオハライド"},
            "status": "FINISHED",
            "description": "Futaba <i>Yoshioka</i> is a girl.<br>",
            "chapters": 53,
            "volumes": 13,
            "averageScore": 78,
            "format": "MANGA",
            "countryOfOrigin": "JP",
            "source": "ORIGINAL",
            "siteUrl": "https://anilist.co/manga/30275"
        }))
        .unwrap();

        let rendered = render(&manga);

        assert!(rendered.caption.starts_with(
            "[🇯🇵] <b>Ao Haru Ride</b>\n<i>Blue Spring Ride</i>\nアオハライド\n\n"
        ));
        assert!(rendered.caption.contains("➤ <b>VOLUMES:</b> <code>13</code>"));
        assert!(rendered.caption.contains("➤ <b>SCORE:</b> <code>78</code>"));
        assert!(rendered.caption.contains("Futaba Yoshioka is a girl."));
        assert!(rendered.caption.contains("https://anilist.co/manga/30275"));
        assert_eq!(rendered.media_url.as_deref(), Some("https://img.anili.st/media/30275"));
    }

    #[test]
    fn test_manga_without_english_or_description() {
        let manga: Manga = serde_json::from_value(json!({
            "id": 2,
            "title": {"romaji": "Berserk", "english": null, "native": "ベルセルク"}
        }))
        .unwrap();

        let rendered = render(&manga);

        assert!(rendered.caption.starts_with("[N/A] <b>Berserk</b>\nベルセルク\n\n"));
        assert!(rendered.caption.contains("➤ <b>CHAPTERS:</b> <code>N/A</code>"));
        assert!(rendered.caption.contains("Description: <code>N/A</code>"));
    }
}
