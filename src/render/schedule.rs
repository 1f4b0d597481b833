use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::text::{display_title, escape_html, relative_timestamp};
use super::{LongFormDocument, RenderedMessage};
use crate::anilist::AiringEntry;

const DOCUMENT_TITLE: &str = "Scheduled Animes";

/// Builds the digest page, or `None` when nothing is scheduled.
pub(super) fn document(entries: &[AiringEntry], now: DateTime<Utc>) -> Option<LongFormDocument> {
    if entries.is_empty() {
        return None;
    }

    let mut body = String::new();
    for entry in entries {
        let _ = write!(
            body,
            "<p>[🇯🇵]{}</p> • <b>ID:</b> {}<br> • <b>Airing Episode:</b> {}<br> • <b>Next Airing:</b> {}<br>",
            escape_html(&display_title(&entry.media.title)),
            entry.media_id,
            entry.episode,
            relative_timestamp(entry.airing_at, now),
        );
        if let Some(site) = &entry.media.site_url {
            let _ = write!(body, " • <a href='{site}'>[Visit on anilist.co]</a>");
        }
        body.push_str("<br><br>");
    }

    Some(LongFormDocument {
        title: DOCUMENT_TITLE.to_owned(),
        html: format!(
            "<p>Showing [{0}/{0}] Scheduled Animes:</p><br><br>{body}",
            entries.len()
        ),
    })
}

pub(super) fn render(
    count: usize,
    document: LongFormDocument,
    document_url: Option<String>,
) -> RenderedMessage {
    let caption = match &document_url {
        Some(url) => format!("<a href=\"{url}\">Open in Telegraph</a> ({count} scheduled)"),
        None => format!("{count} scheduled animes found, but the page could not be published."),
    };

    RenderedMessage {
        caption,
        document: Some(document),
        document_url,
        ..RenderedMessage::default()
    }
}

pub(super) fn render_empty() -> RenderedMessage {
    RenderedMessage {
        caption: "No scheduled animes right now.".to_owned(),
        ..RenderedMessage::default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_schedule_document() {
        let entries: Vec<AiringEntry> = serde_json::from_value(json!([
            {"id": 1, "airingAt": 1_700_003_600, "timeUntilAiring": 3600, "episode": 4, "mediaId": 21,
             "media": {"title": {"romaji": "One Piece"}, "siteUrl": "https://anilist.co/anime/21"}},
            {"id": 2, "airingAt": 1_700_086_400, "timeUntilAiring": 86_400, "episode": 12, "mediaId": 22,
             "media": {"title": {"romaji": "Bleach", "english": "Bleach TYBW"}}}
        ]))
        .unwrap();
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let doc = document(&entries, now).unwrap();

        assert_eq!(doc.title, "Scheduled Animes");
        assert!(doc.html.starts_with("<p>Showing [2/2] Scheduled Animes:</p>"));
        assert!(doc.html.contains("[🇯🇵]One Piece</p> • <b>ID:</b> 21"));
        assert!(doc.html.contains("<b>Next Airing:</b> in an hour"));
        assert!(doc.html.contains("[🇯🇵]Bleach TYBW"));
        assert!(doc.html.contains("<b>Next Airing:</b> in a day"));
    }

    #[test]
    fn test_schedule_caption() {
        let doc = LongFormDocument {
            title: DOCUMENT_TITLE.to_owned(),
            html: String::new(),
        };
        let rendered = render(3, doc.clone(), Some("https://telegra.ph/x".to_owned()));
        assert!(rendered.caption.contains("https://telegra.ph/x"));

        let rendered = render(3, doc, None);
        assert!(rendered.caption.contains("could not be published"));
        assert!(document(&[], Utc::now()).is_none());
    }
}
