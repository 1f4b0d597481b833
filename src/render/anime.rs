//! Anime caption, long-form page and relation links.

use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::text::{
    PLACEHOLDER, country_flag, display_title, escape_html, or_placeholder, ordinal,
    relative_timestamp, truncate_synopsis_html,
};
use super::{
    Direction, LongFormDocument, NavigationLink, RenderError, RenderedMessage, Template,
    preview_image,
};
use crate::anilist::{Media, RelationEdge, RelationType, Title};

/// Main characters listed in the caption.
const CAPTION_CHARACTERS: usize = 10;

/// Picks the first prequel and the first sequel, in source order.
#[must_use]
pub fn select_navigation(edges: &[RelationEdge]) -> Vec<NavigationLink> {
    [
        (RelationType::Prequel, Direction::Prequel),
        (RelationType::Sequel, Direction::Sequel),
    ]
    .into_iter()
    .filter_map(|(relation, direction)| {
        edges
            .iter()
            .find(|edge| edge.relation_type == Some(relation))
            .map(|edge| NavigationLink {
                direction,
                target: edge.node.id,
                title: display_title(&edge.node.title),
            })
    })
    .collect()
}

/// Title block: flag, display title, romaji when it differs, native script.
pub(super) fn name_block(title: &Title, country: Option<&str>) -> String {
    let shown = display_title(title);
    let mut block = format!("[{}] <b>{}</b>", country_flag(country), escape_html(&shown));

    if let Some(romaji) = title.romaji.as_deref().filter(|r| *r != shown) {
        let _ = write!(block, "\n<i>{}</i>", escape_html(romaji));
    }
    let _ = write!(
        block,
        "\n{}",
        escape_html(title.native.as_deref().unwrap_or(PLACEHOLDER))
    );
    block
}

pub(super) fn document(media: &Media) -> LongFormDocument {
    let flag = country_flag(media.country_of_origin.as_deref());
    let mut html = String::new();

    let _ = write!(
        html,
        "<img src='{}'/><p>[{}] {}</p><p>Synopsis:</p>{}<br>",
        preview_image(media.id),
        flag,
        escape_html(media.title.native.as_deref().unwrap_or(PLACEHOLDER)),
        truncate_synopsis_html(media.description.as_deref().unwrap_or(PLACEHOLDER)),
    );

    if !media.characters.nodes.is_empty() {
        html.push_str("<p>Main Characters:</p>");
        for character in &media.characters.nodes {
            let _ = write!(
                html,
                "<br><a href=\"{}\"><img src=\"{}\"/></a><br><p>{}</p>{} {}<br>\
                 <b>Character ID</b>: {}<br><p>About Character and Role:</p>{}<br><br>",
                character.site_url.as_deref().unwrap_or_default(),
                character.image.large.as_deref().unwrap_or_default(),
                escape_html(character.name.full.as_deref().unwrap_or(PLACEHOLDER)),
                flag,
                escape_html(character.name.native.as_deref().unwrap_or(PLACEHOLDER)),
                character.id,
                character.description.as_deref().unwrap_or(PLACEHOLDER),
            );
        }
        html.push_str("<br><br>");
    }

    let start = &media.start_date;
    let studios: String = media
        .studios
        .nodes
        .iter()
        .map(|s| {
            format!(
                "<a href='{}'>• {}</a> ",
                s.site_url.as_deref().unwrap_or_default(),
                escape_html(&s.name)
            )
        })
        .collect();

    let _ = write!(
        html,
        "<p>More Info:</p><b>Started On:</b> {}/{}/{}<br><b>Studios:</b> {}<br>",
        or_placeholder(start.day),
        or_placeholder(start.month),
        or_placeholder(start.year),
        if studios.is_empty() { PLACEHOLDER } else { studios.as_str() },
    );
    if let Some(mal_id) = media.id_mal {
        let _ = write!(
            html,
            "<a href='https://myanimelist.net/anime/{mal_id}'>View on MAL</a> "
        );
    }
    if let Some(url) = &media.site_url {
        let _ = write!(html, "<a href='{url}'>View on anilist.co</a>");
    }
    if let Some(banner) = &media.banner_image {
        let _ = write!(html, "<img src='{banner}'/>");
    }

    LongFormDocument {
        title: display_title(&media.title),
        html,
    }
}

pub(super) fn render(
    media: &Media,
    template: &Template,
    document: LongFormDocument,
    document_url: Option<String>,
    now: DateTime<Utc>,
) -> Result<RenderedMessage, RenderError> {
    let navigation = select_navigation(&media.relations.edges);

    let mut fields: HashMap<&str, String> = HashMap::new();
    fields.insert("name", name_block(&media.title, media.country_of_origin.as_deref()));
    fields.insert("id", media.id.to_string());
    fields.insert("mal_id", or_placeholder(media.id_mal));
    fields.insert("source", escape_html(&or_placeholder(media.source.as_deref())));
    fields.insert("format", escape_html(&or_placeholder(media.format.as_deref())));
    fields.insert(
        "duration",
        media
            .duration
            .map(|d| format!("\n➤ <b>DURATION:</b> <code>{d} min/ep</code>"))
            .unwrap_or_default(),
    );
    fields.insert("characters", characters_line(media));
    fields.insert("status", status_line(media, now));
    fields.insert(
        "adult",
        if media.is_adult { "Yes" } else { "No" }.to_owned(),
    );
    fields.insert("trailer", trailer_link(media));
    fields.insert(
        "synopsis_link",
        document_url
            .as_deref()
            .map(|url| format!("📖 <a href=\"{url}\">Synopsis &amp; More</a>"))
            .unwrap_or_default(),
    );
    fields.insert("relations", relations_block(&navigation));

    let caption = template.render(&fields)?;

    Ok(RenderedMessage {
        caption,
        document: Some(document),
        document_url,
        media_url: Some(preview_image(media.id)),
        navigation,
        restricted: media.is_adult,
        download_query: media.title.romaji.clone().or_else(|| media.title.english.clone()),
    })
}

fn characters_line(media: &Media) -> String {
    let names: Vec<String> = media
        .characters
        .nodes
        .iter()
        .take(CAPTION_CHARACTERS)
        .filter_map(|c| c.name.full.as_deref())
        .map(|name| format!("    • {}", escape_html(name)))
        .collect();

    if names.is_empty() {
        String::new()
    } else {
        format!("\n➤ <b>CHARACTERS:</b>\n{}", names.join("\n"))
    }
}

fn status_line(media: &Media, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "➤ <b>STATUS:</b> <code>{}</code>",
        escape_html(&or_placeholder(media.status.as_deref()))
    );
    if let Some(next) = &media.next_airing_episode {
        let _ = write!(
            line,
            "\n➤ <b>NEXT AIRING:</b> <code>{} | {} eps</code>",
            relative_timestamp(next.airing_at, now),
            ordinal(u64::from(next.episode))
        );
    }
    line
}

fn trailer_link(media: &Media) -> String {
    let Some(trailer) = &media.trailer else {
        return PLACEHOLDER.to_owned();
    };
    let (Some(id), Some(site)) = (trailer.id.as_deref(), trailer.site.as_deref()) else {
        return PLACEHOLDER.to_owned();
    };

    match site {
        "youtube" => format!("<a href=\"https://youtu.be/{id}\">Trailer</a>"),
        "dailymotion" => format!("<a href=\"https://www.dailymotion.com/video/{id}\">Trailer</a>"),
        _ => PLACEHOLDER.to_owned(),
    }
}

fn relations_block(links: &[NavigationLink]) -> String {
    links
        .iter()
        .map(|link| {
            let label = match link.direction {
                Direction::Prequel => "PREQUEL",
                Direction::Sequel => "SEQUEL",
            };
            format!("<b>{label}:</b> <code>{}</code>", escape_html(&link.title))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
