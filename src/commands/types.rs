//! Command types and definitions.

use std::fmt;

use super::Reply;
use crate::reverse::SearchEngine;

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Look up an anime. Arguments may carry `-mid` and `-wp`.
    Anime(String),

    /// Look up a manga.
    Manga(String),

    /// Show the airing status of an anime.
    Airing(String),

    /// Publish the not-yet-aired schedule.
    Scheduled,

    /// Look up a character.
    Character(String),

    /// Start bio rotation with a phrase-set selector, or `stop` it.
    AutoBio(String),

    /// Set the bio rotation interval in seconds.
    SetBioTimeout(String),

    /// Show the bio rotation interval.
    ViewBioTimeout,

    /// Reverse search the replied media.
    ReverseSearch(SearchEngine),

    /// Name history of the replied user; `-u` for usernames.
    History(String),

    /// Show help information.
    Help,
}

impl BotCommand {
    /// Parses a command from a message text.
    ///
    /// Returns `None` if the message is not a valid command.
    #[must_use]
    pub fn parse(text: &str, prefix: &str) -> Option<Self> {
        let text = text.trim();

        let after_prefix = text.strip_prefix(prefix)?;
        if after_prefix.starts_with(char::is_whitespace) {
            return None;
        }

        let (cmd, args) = match after_prefix.split_once(char::is_whitespace) {
            Some((cmd, args)) => (cmd.to_lowercase(), args.trim().to_owned()),
            None => (after_prefix.to_lowercase(), String::new()),
        };

        match cmd.as_str() {
            "anime" => Some(Self::Anime(args)),
            "manga" => Some(Self::Manga(args)),
            "airing" => Some(Self::Airing(args)),
            "scheduled" => Some(Self::Scheduled),
            "character" => Some(Self::Character(args)),
            "autobio" => Some(Self::AutoBio(args)),
            "sabto" => Some(Self::SetBioTimeout(args)),
            "vabto" => Some(Self::ViewBioTimeout),
            "yrs" => Some(Self::ReverseSearch(SearchEngine::Yandex)),
            "grs" => Some(Self::ReverseSearch(SearchEngine::Google)),
            "sg" => Some(Self::History(args)),
            "help" => Some(Self::Help),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Anime(_) => "anime",
            Self::Manga(_) => "manga",
            Self::Airing(_) => "airing",
            Self::Scheduled => "scheduled",
            Self::Character(_) => "character",
            Self::AutoBio(_) => "autobio",
            Self::SetBioTimeout(_) => "sabto",
            Self::ViewBioTimeout => "vabto",
            Self::ReverseSearch(SearchEngine::Yandex) => "yrs",
            Self::ReverseSearch(SearchEngine::Google) => "grs",
            Self::History(_) => "sg",
            Self::Help => "help",
        }
    }

    /// Returns all available commands with their usage and descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("anime [-mid] [-wp] <name | id>", "Search for an anime"),
            ("manga [-mid] <name | id>", "Search for a manga"),
            ("airing <name | id>", "Airing details of an anime"),
            ("scheduled", "List of scheduled animes"),
            ("character <name>", "Info about a character"),
            ("autobio [m | stop]", "Rotate your bio (m: music list)"),
            ("sabto <seconds>", "Set the bio rotation interval"),
            ("vabto", "Show the bio rotation interval"),
            ("yrs", "Yandex reverse search of the replied media"),
            ("grs", "Google reverse search of the replied media"),
            ("sg [-u]", "Name (or username) history of the replied user"),
            ("help", "Show this help message"),
        ]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anime(args)
            | Self::Manga(args)
            | Self::Airing(args)
            | Self::Character(args)
            | Self::AutoBio(args)
            | Self::SetBioTimeout(args)
            | Self::History(args)
                if !args.is_empty() =>
            {
                write!(f, "{} {args}", self.name())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Reply to deliver to the chat.
    pub reply: Reply,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub const fn success(reply: Reply) -> Self {
        Self {
            success: true,
            reply,
        }
    }

    /// Creates a successful plain-text result.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::success(Reply::text(text))
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reply: Reply::text(message),
        }
    }
}
