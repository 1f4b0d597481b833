//! Caption templates with `{name}` placeholders.
//!
//! `{{` and `}}` produce literal braces. A placeholder with no value
//! fails the render with [`RenderError::MissingTemplateField`].

use std::collections::HashMap;

use super::RenderError;

/// Default caption for anime lookups.
pub const ANIME_TEMPLATE: &str = "{name}

<b>ID | MAL ID:</b> <code>{id}</code> | <code>{mal_id}</code>
➤ <b>SOURCE:</b> <code>{source}</code>
➤ <b>TYPE:</b> <code>{format}</code>{duration}{characters}
{status}
➤ <b>ADULT RATED:</b> <code>{adult}</code>
🎬 {trailer}
{synopsis_link}

{relations}";

/// A parsed-on-render caption template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(ANIME_TEMPLATE)
    }
}

impl Template {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Substitutes every placeholder from `fields`.
    pub fn render(&self, fields: &HashMap<&str, String>) -> Result<String, RenderError> {
        let mut out = String::with_capacity(self.source.len() * 2);
        let mut chars = self.source.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c);
                    }

                    if !closed {
                        // Unterminated brace is literal text.
                        out.push('{');
                        out.push_str(&name);
                        continue;
                    }

                    let value = fields
                        .get(name.trim())
                        .ok_or_else(|| RenderError::MissingTemplateField(name.trim().to_owned()))?;
                    out.push_str(value);
                }
                _ => out.push(ch),
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_owned())).collect()
    }

    #[test]
    fn test_render_substitutes() {
        let template = Template::new("Hello {name}, episode {ep}!");
        let out = template
            .render(&fields(&[("name", "Subaru"), ("ep", "3")]))
            .unwrap();
        assert_eq!(out, "Hello Subaru, episode 3!");
    }

    #[test]
    fn test_render_missing_field() {
        let template = Template::new("{name} {studio}");
        let err = template.render(&fields(&[("name", "x")])).unwrap_err();
        assert!(matches!(err, RenderError::MissingTemplateField(ref f) if f == "studio"));
    }

    #[test]
    fn test_escaped_and_unterminated_braces() {
        let template = Template::new("{{literal}} {name} {oops");
        let out = template.render(&fields(&[("name", "ok")])).unwrap();
        assert_eq!(out, "{literal} ok {oops");
    }

    #[test]
    fn test_default_template_fields() {
        let names = [
            "name", "id", "mal_id", "source", "format", "duration", "characters", "status",
            "adult", "trailer", "synopsis_link", "relations",
        ];
        let all: HashMap<&str, String> = names.iter().map(|n| (*n, String::new())).collect();
        assert!(Template::default().render(&all).is_ok());
    }
}
