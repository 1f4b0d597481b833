//! Configuration module for the userbot.
//!
//! Handles loading and validation of the bot settings, Telegram API
//! credentials and the phrase sets used by the bio rotator.

mod phrases;
mod settings;

pub use phrases::{PhraseBook, PhraseSet, ValidationError};
pub use settings::{BotSettings, ConfigError, TelegramConfig};

/// Maximum bio length for regular Telegram users.
pub const MAX_BIO_LENGTH_FREE: usize = 70;

/// Maximum bio length for Telegram Premium users.
pub const MAX_BIO_LENGTH_PREMIUM: usize = 140;

/// Maximum length of a photo caption.
pub const CAPTION_LIMIT: usize = 1024;
