//! HTML to Telegraph node conversion.
//!
//! Telegraph pages are stored as a JSON tree of nodes. Only a fixed set of
//! tags is accepted; anything else is unwrapped and its children kept.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html};
use serde::Serialize;

const ALLOWED_TAGS: &[&str] = &[
    "a", "aside", "b", "blockquote", "br", "code", "em", "figcaption", "figure", "h3", "h4",
    "hr", "i", "iframe", "img", "li", "ol", "p", "pre", "s", "strong", "u", "ul", "video",
];

const ALLOWED_ATTRS: &[&str] = &["href", "src"];

/// A Telegraph content node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element(Element),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

/// Converts an HTML fragment into Telegraph nodes.
#[must_use]
pub fn html_to_nodes(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    let mut nodes = Vec::new();
    collect_children(fragment.root_element(), &mut nodes);
    nodes
}

fn collect_children(parent: ElementRef<'_>, out: &mut Vec<Node>) {
    for child in parent.children() {
        if let Some(text) = child.value().as_text() {
            push_text(out, text);
        } else if let Some(element) = ElementRef::wrap(child) {
            match telegraph_tag(element.value().name()) {
                Some(tag) => {
                    let mut children = Vec::new();
                    collect_children(element, &mut children);
                    out.push(Node::Element(Element {
                        tag: tag.to_owned(),
                        attrs: element
                            .value()
                            .attrs()
                            .filter(|(name, _)| ALLOWED_ATTRS.contains(name))
                            .map(|(name, value)| (name.to_owned(), value.to_owned()))
                            .collect(),
                        children,
                    }));
                }
                None => {
                    let mut children = Vec::new();
                    collect_children(element, &mut children);
                    for node in children {
                        match node {
                            Node::Text(text) => push_text(out, &text),
                            element @ Node::Element(_) => out.push(element),
                        }
                    }
                }
            }
        }
    }
}

/// Telegraph tag for an HTML tag name; `None` unwraps the element.
fn telegraph_tag(name: &str) -> Option<&str> {
    match name {
        "h1" | "h2" => Some("h3"),
        "h5" | "h6" => Some("h4"),
        other => ALLOWED_TAGS.iter().copied().find(|tag| *tag == other),
    }
}

/// Appends text, merging it into a trailing text node.
fn push_text(out: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Node::Text(text.to_owned()));
    }
}
