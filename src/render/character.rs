use std::fmt::Write as _;

use super::text::{PLACEHOLDER, display_title, escape_html, or_placeholder};
use super::{LongFormDocument, RenderedMessage};
use crate::anilist::{Character, FeaturedMedia, MediaType};

/// Featured media described in the long-form page.
const DOCUMENT_MEDIA: usize = 6;

pub(super) fn document(character: &Character) -> LongFormDocument {
    let name = character.name.full.as_deref().unwrap_or(PLACEHOLDER);
    let mut html = String::new();

    if let Some(image) = &character.image.large {
        let _ = write!(html, "<img src='{image}'/>");
    }
    let _ = write!(
        html,
        "<p>{}</p><p>About Character:</p>{}<br>",
        escape_html(character.name.native.as_deref().unwrap_or(PLACEHOLDER)),
        character.description.as_deref().unwrap_or(PLACEHOLDER),
    );

    let featured = &character.media.nodes;
    if !featured.is_empty() {
        html.push_str("<p>Top Featured Anime</p>");
        for media in featured.iter().take(DOCUMENT_MEDIA) {
            featured_block(&mut html, media);
        }
        html.push_str("<br><br>");
    }

    LongFormDocument {
        title: name.to_owned(),
        html,
    }
}

fn featured_block(html: &mut String, media: &FeaturedMedia) {
    html.push_str("<br>");
    if let Some(cover) = &media.cover_image.extra_large {
        let _ = write!(html, "<img src=\"{cover}\"/><br>");
    }
    let kind = match media.media_type {
        Some(MediaType::Manga) => "MANGA",
        Some(MediaType::Anime) => "ANIME",
        _ => PLACEHOLDER,
    };
    let _ = write!(
        html,
        "<p>{}</p>{}<br><a href=\"{}\">{kind}</a><br><b>Media ID:</b> {}<br><b>SCORE:</b> {}/100<br>{}<br>",
        escape_html(&display_title(&media.title)),
        escape_html(media.title.native.as_deref().unwrap_or(PLACEHOLDER)),
        media.site_url.as_deref().unwrap_or_default(),
        media.id,
        or_placeholder(media.average_score),
        media.description.as_deref().unwrap_or(PLACEHOLDER),
    );
}

/// Bullet list of featured titles of one media type.
fn featured_list(featured: &[FeaturedMedia], media_type: MediaType) -> String {
    featured
        .iter()
        .filter(|m| m.media_type == Some(media_type))
        .map(|m| format!("    • {}\n", escape_html(&display_title(&m.title))))
        .collect()
}

pub(super) fn render(
    character: &Character,
    document: LongFormDocument,
    document_url: Option<String>,
) -> RenderedMessage {
    let featured = &character.media.nodes;
    let anime = featured_list(featured, MediaType::Anime);
    let manga = featured_list(featured, MediaType::Manga);

    let mut featured_in = String::new();
    if !anime.is_empty() {
        let _ = write!(featured_in, "  <code>ANIMES</code>\n{anime}");
    }
    if !manga.is_empty() {
        let _ = write!(featured_in, "  <code>MANGAS</code>\n{manga}");
    }
    if featured_in.is_empty() {
        featured_in.push_str(PLACEHOLDER);
    }

    let mut caption = format!(
        "<i>{}</i>\n    (<code>{}</code>)\n<b>ID:</b> {}\n\n<b>Featured in:</b>\n{}",
        escape_html(character.name.native.as_deref().unwrap_or(PLACEHOLDER)),
        escape_html(character.name.full.as_deref().unwrap_or(PLACEHOLDER)),
        character.id,
        featured_in.trim_end(),
    );
    if let Some(url) = &document_url {
        let _ = write!(caption, "\n\n<a href=\"{url}\">About Character</a>");
    }
    if let Some(url) = &character.site_url {
        let _ = write!(caption, "\n<a href=\"{url}\">Visit Website</a>");
    }

    RenderedMessage {
        caption,
        document: Some(document),
        document_url,
        media_url: character.image.large.clone(),
        ..RenderedMessage::default()
    }
}
