//! Replies handed back to the chat surface.

use std::fmt;

use crate::navigation::Keyboard;
use crate::render::RenderedMessage;

/// Zero-width space used as the text of a hidden preview link.
const HIDDEN_LINK_TEXT: char = '\u{200b}';

/// A message the surface should send, with HTML formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain message. `link_preview` asks for the first link to be previewed.
    Text {
        text: String,
        link_preview: bool,
        keyboard: Keyboard,
    },
    /// Image with a caption.
    Photo {
        media_url: String,
        caption: String,
        keyboard: Keyboard,
    },
    /// Replaces the image and caption of the message a control belongs to.
    ReplaceMedia {
        media_url: String,
        caption: String,
        keyboard: Keyboard,
    },
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            link_preview: false,
            keyboard: Keyboard::new(),
        }
    }

    /// Photo with caption, or text only when there is no image or the
    /// caption is longer than `caption_limit` characters.
    #[must_use]
    pub fn rendered(rendered: &RenderedMessage, keyboard: Keyboard, caption_limit: usize) -> Self {
        match &rendered.media_url {
            Some(url) if rendered.fits_caption(caption_limit) => Self::Photo {
                media_url: url.clone(),
                caption: rendered.caption.clone(),
                keyboard,
            },
            _ => Self::Text {
                text: rendered.caption.clone(),
                link_preview: false,
                keyboard,
            },
        }
    }

    /// Text with a hidden link to the image, so the chat shows it as a preview.
    #[must_use]
    pub fn web_preview(rendered: &RenderedMessage, keyboard: Keyboard) -> Self {
        let text = match &rendered.media_url {
            Some(url) => format!("<a href=\"{url}\">{HIDDEN_LINK_TEXT}</a>{}", rendered.caption),
            None => rendered.caption.clone(),
        };
        Self::Text {
            text,
            link_preview: rendered.media_url.is_some(),
            keyboard,
        }
    }

    /// Media replacement for an activated control, text when it cannot fit.
    #[must_use]
    pub fn replacement(
        rendered: &RenderedMessage,
        keyboard: Keyboard,
        caption_limit: usize,
    ) -> Self {
        match Self::rendered(rendered, keyboard, caption_limit) {
            Self::Photo {
                media_url,
                caption,
                keyboard,
            } => Self::ReplaceMedia {
                media_url,
                caption,
                keyboard,
            },
            other => other,
        }
    }

    /// Message text or caption.
    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text, .. } => text,
            Self::Photo { caption, .. } | Self::ReplaceMedia { caption, .. } => caption,
        }
    }

    #[must_use]
    pub fn keyboard(&self) -> &Keyboard {
        match self {
            Self::Text { keyboard, .. }
            | Self::Photo { keyboard, .. }
            | Self::ReplaceMedia { keyboard, .. } => keyboard,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photo { media_url, .. } => writeln!(f, "[photo {media_url}]")?,
            Self::ReplaceMedia { media_url, .. } => writeln!(f, "[replace with {media_url}]")?,
            Self::Text { .. } => {}
        }
        write!(f, "{}", self.body())?;
        for row in self.keyboard() {
            let buttons: Vec<String> = row.iter().map(ToString::to_string).collect();
            write!(f, "\n{}", buttons.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Control;

    fn rendered(caption_len: usize) -> RenderedMessage {
        RenderedMessage {
            caption: "x".repeat(caption_len),
            media_url: Some("https://img.anili.st/media/1".to_owned()),
            ..RenderedMessage::default()
        }
    }

    #[test]
    fn test_caption_at_limit_is_photo() {
        let reply = Reply::rendered(&rendered(1024), Keyboard::new(), 1024);
        assert!(matches!(reply, Reply::Photo { .. }));
    }

    #[test]
    fn test_caption_over_limit_is_text() {
        let keyboard = vec![vec![Control::Download { query: "q".to_owned() }]];
        let reply = Reply::rendered(&rendered(1025), keyboard.clone(), 1024);

        assert!(matches!(reply, Reply::Text { link_preview: false, .. }));
        assert_eq!(reply.body().len(), 1025);
        assert_eq!(reply.keyboard(), &keyboard);
    }

    #[test]
    fn test_no_image_is_text() {
        let message = RenderedMessage {
            caption: "hello".to_owned(),
            ..RenderedMessage::default()
        };
        assert_eq!(Reply::rendered(&message, Keyboard::new(), 1024), Reply::text("hello"));
    }

    #[test]
    fn test_web_preview() {
        let reply = Reply::web_preview(&rendered(3), Keyboard::new());
        assert_eq!(
            reply.body(),
            "<a href=\"https://img.anili.st/media/1\">\u{200b}</a>xxx"
        );
        assert!(matches!(reply, Reply::Text { link_preview: true, .. }));
    }

    #[test]
    fn test_replacement() {
        assert!(matches!(
            Reply::replacement(&rendered(10), Keyboard::new(), 1024),
            Reply::ReplaceMedia { .. }
        ));
        assert!(matches!(
            Reply::replacement(&rendered(2000), Keyboard::new(), 1024),
            Reply::Text { .. }
        ));
    }

    #[test]
    fn test_display_lists_buttons() {
        let keyboard = vec![vec![Control::Navigate {
            direction: crate::render::Direction::Sequel,
            target: 200,
        }]];
        let reply = Reply::rendered(&rendered(2), keyboard, 1024);
        assert_eq!(
            reply.to_string(),
            "[photo https://img.anili.st/media/1]\nxx\n[Sequel: btn_200]"
        );
    }
}
