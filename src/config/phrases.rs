//! Phrase sets for the bio rotator and their validation.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{MAX_BIO_LENGTH_FREE, MAX_BIO_LENGTH_PREMIUM};

/// Errors that can occur during phrase validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Phrase {index} of the {set} set exceeds maximum length: {length} > {max_length}")]
    TooLong {
        set: PhraseSet,
        index: usize,
        length: usize,
        max_length: usize,
    },

    #[error("Phrase {index} of the {set} set is empty")]
    Empty { set: PhraseSet, index: usize },

    #[error("The {0} phrase set is empty")]
    NoPhrases(PhraseSet),

    #[error("Failed to read phrase file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse phrase file: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Selects which list the rotator cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseSet {
    #[default]
    English,
    Music,
}

impl PhraseSet {
    /// Interprets the argument of the start command.
    ///
    /// Anything containing an `m` picks the music list.
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        if selector.to_lowercase().contains('m') {
            Self::Music
        } else {
            Self::English
        }
    }
}

impl fmt::Display for PhraseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => f.write_str("english"),
            Self::Music => f.write_str("music"),
        }
    }
}

/// All phrase lists the rotator can use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseBook {
    /// Quotes cycled by default.
    pub english: Vec<String>,

    /// Song lines cycled when the music set is selected.
    #[serde(default)]
    pub music: Vec<String>,

    /// Whether the user has Telegram Premium (affects max bio length).
    #[serde(default)]
    pub is_premium: bool,

    /// If true, detect Premium status from Telegram at startup.
    #[serde(default = "default_auto_detect")]
    pub auto_detect_premium: bool,
}

fn default_auto_detect() -> bool {
    true
}

impl PhraseBook {
    /// Loads phrases from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path)?;
        let book: Self = serde_json::from_str(&content)?;
        Ok(book)
    }

    /// Saves phrases to a JSON file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ValidationError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the phrases of one set.
    #[must_use]
    pub fn phrases(&self, set: PhraseSet) -> &[String] {
        match set {
            PhraseSet::English => &self.english,
            PhraseSet::Music => &self.music,
        }
    }

    /// Validates every phrase, stopping at the first error.
    ///
    /// The English set must be non-empty; the music set may be empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.english.is_empty() {
            return Err(ValidationError::NoPhrases(PhraseSet::English));
        }

        self.validate_all()
            .into_iter()
            .flat_map(|(_, results)| results)
            .find_map(Result::err)
            .map_or(Ok(()), Err)
    }

    /// Returns a validation result for every phrase, grouped by set.
    #[must_use]
    pub fn validate_all(&self) -> Vec<(PhraseSet, Vec<Result<(), ValidationError>>)> {
        let max_length = self.max_bio_length();

        [PhraseSet::English, PhraseSet::Music]
            .into_iter()
            .map(|set| {
                let results = self
                    .phrases(set)
                    .iter()
                    .enumerate()
                    .map(|(index, phrase)| check_phrase(set, index, phrase, max_length))
                    .collect();
                (set, results)
            })
            .collect()
    }

    /// Total number of phrases across all sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.english.len() + self.music.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates an example phrase book for users to reference.
    #[must_use]
    pub fn example() -> Self {
        Self {
            english: vec![
                "Stay hungry, stay foolish.".to_owned(),
                "Simplicity is the soul of efficiency.".to_owned(),
                "Talk is cheap. Show me the code.".to_owned(),
                "First, solve the problem. Then, write the code.".to_owned(),
            ],
            music: vec![
                "🎵 Now playing: Unravel - TK from Ling tosite Sigure".to_owned(),
                "🎵 Now playing: Gurenge - LiSA".to_owned(),
                "🎵 Now playing: Blue Bird - Ikimono-gakari".to_owned(),
            ],
            is_premium: false,
            auto_detect_premium: true,
        }
    }

    /// Updates the premium status (used after auto-detection).
    pub fn set_premium(&mut self, is_premium: bool) {
        self.is_premium = is_premium;
    }

    /// Returns the maximum bio length based on premium status.
    #[must_use]
    pub fn max_bio_length(&self) -> usize {
        if self.is_premium {
            MAX_BIO_LENGTH_PREMIUM
        } else {
            MAX_BIO_LENGTH_FREE
        }
    }
}

fn check_phrase(
    set: PhraseSet,
    index: usize,
    phrase: &str,
    max_length: usize,
) -> Result<(), ValidationError> {
    if phrase.trim().is_empty() {
        return Err(ValidationError::Empty { set, index });
    }

    let length = phrase.chars().count();
    if length > max_length {
        return Err(ValidationError::TooLong {
            set,
            index,
            length,
            max_length,
        });
    }

    Ok(())
}
