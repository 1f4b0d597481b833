//! Small text helpers shared by the renderers.

use std::fmt::Write as _;

use chrono::{DateTime, TimeDelta, Utc};
use html2text::render::text_renderer::TrivialDecorator;
use scraper::{ElementRef, Html};

use crate::anilist::Title;

/// Shown wherever a field has no value.
pub const PLACEHOLDER: &str = "N/A";

/// Character budget for synopsis text.
pub const SYNOPSIS_LIMIT: usize = 500;

/// Marker appended to truncated text.
pub const CONTINUATION: &str = "...";

/// Elements with no closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "wbr"];

/// Line width for plain-text rendering, wide enough that nothing wraps.
const PLAIN_TEXT_WIDTH: usize = 10_000;

/// English ordinal suffix for `n`.
#[must_use]
pub const fn ordinal_suffix(n: u64) -> &'static str {
    if matches!(n % 100, 11..=13) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// `n` followed by its ordinal suffix, e.g. `22nd`.
#[must_use]
pub fn ordinal(n: u64) -> String {
    format!("{n}{}", ordinal_suffix(n))
}

/// Cuts `text` to [`SYNOPSIS_LIMIT`] characters, marking the cut.
#[must_use]
pub fn truncate_synopsis(text: &str) -> String {
    truncate_chars(text, SYNOPSIS_LIMIT)
}

/// Keeps the first `max_chars` characters and appends `...` if anything was dropped.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{CONTINUATION}", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Flag emoji for an ISO 3166 alpha-2 country code.
///
/// Anything that is not two ASCII letters comes back unchanged, and a
/// missing code becomes the placeholder.
#[must_use]
pub fn country_flag(code: Option<&str>) -> String {
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return PLACEHOLDER.to_owned();
    };

    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return code.to_owned();
    }

    code.to_ascii_uppercase()
        .chars()
        .filter_map(|c| char::from_u32(0x1F1E6 + (u32::from(c) - u32::from('A'))))
        .collect()
}

/// Short display title: English, then romaji, then native.
#[must_use]
pub fn display_title(title: &Title) -> String {
    [&title.english, &title.romaji, &title.native]
        .into_iter()
        .flatten()
        .map(|t| t.trim())
        .find(|t| !t.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_owned()
}

/// Value of an optional field, or the placeholder.
#[must_use]
pub fn or_placeholder<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_owned(), |v| v.to_string())
}

/// Relative description of `at` as seen from `now`, like `in 3 days`.
#[must_use]
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = at - now;
    let future = delta > TimeDelta::zero();
    let span = delta.abs();

    if span < TimeDelta::seconds(1) {
        return "now".to_owned();
    }

    let amount = humanize_span(span);
    if future {
        format!("in {amount}")
    } else {
        format!("{amount} ago")
    }
}

/// Relative description of a unix timestamp as seen from `now`.
#[must_use]
pub fn relative_timestamp(timestamp: i64, now: DateTime<Utc>) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map_or_else(|| PLACEHOLDER.to_owned(), |at| relative_time(at, now))
}

fn humanize_span(span: TimeDelta) -> String {
    let seconds = span.num_seconds();
    let (count, unit) = match seconds {
        0..60 => (seconds, "second"),
        60..3_600 => (span.num_minutes(), "minute"),
        3_600..86_400 => (span.num_hours(), "hour"),
        86_400..2_592_000 => (span.num_days(), "day"),
        2_592_000..31_536_000 => (span.num_days() / 30, "month"),
        _ => (span.num_days() / 365, "year"),
    };

    match count {
        1 if unit == "hour" => "an hour".to_owned(),
        1 => format!("a {unit}"),
        _ => format!("{count} {unit}s"),
    }
}

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Cuts the visible text of an HTML fragment to [`SYNOPSIS_LIMIT`]
/// characters. Markup is kept around the cut and every open element is closed.
#[must_use]
pub fn truncate_synopsis_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len().min(SYNOPSIS_LIMIT * 2));
    let mut budget = SYNOPSIS_LIMIT;
    write_truncated(fragment.root_element(), &mut out, &mut budget);
    out
}

/// Writes `parent`'s children until the budget runs out; false once it has.
fn write_truncated(parent: ElementRef<'_>, out: &mut String, budget: &mut usize) -> bool {
    for child in parent.children() {
        if let Some(text) = child.value().as_text() {
            let text: &str = text;
            if let Some((cut, _)) = text.char_indices().nth(*budget) {
                out.push_str(&escape_html(&text[..cut]));
                out.push_str(CONTINUATION);
                return false;
            }
            *budget -= text.chars().count();
            out.push_str(&escape_html(text));
        } else if let Some(element) = ElementRef::wrap(child) {
            let name = element.value().name();
            let _ = write!(out, "<{name}");
            for (attr, value) in element.value().attrs() {
                let _ = write!(out, " {attr}=\"{}\"", escape_html(value));
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&name) {
                continue;
            }
            let complete = write_truncated(element, out, budget);
            let _ = write!(out, "</{name}>");
            if !complete {
                return false;
            }
        }
    }
    true
}

/// Plain text of an HTML description, with `<br>` as line breaks.
#[must_use]
pub fn plain_text(html: &str) -> String {
    let decorator = TrivialDecorator::new();
    let text = html2text::from_read_with_decorator(html.as_bytes(), PLAIN_TEXT_WIDTH, decorator);
    text.trim_end().to_owned()
}
