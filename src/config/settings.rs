//! Application settings and Telegram configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rotator::MIN_INTERVAL_SECS;

/// Telegram API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("session.db")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String) -> Self {
        Self {
            api_id,
            api_hash,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID` and `TG_API_HASH` to be set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            session_path,
        })
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Command prefix (trigger) for bot commands.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// AniList GraphQL endpoint.
    #[serde(default = "default_anilist_url")]
    pub anilist_url: String,

    /// Telegraph API base URL (account and page creation).
    #[serde(default = "default_telegraph_api_url")]
    pub telegraph_api_url: String,

    /// Telegraph media upload endpoint.
    #[serde(default = "default_telegraph_upload_url")]
    pub telegraph_upload_url: String,

    /// JSON file holding the rotator state.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Directory that downloaded media is written to.
    #[serde(default = "default_down_path")]
    pub down_path: PathBuf,

    /// Maximum caption length before falling back to a text reply.
    #[serde(default = "default_caption_limit")]
    pub caption_limit: usize,

    /// Only this user may press navigation buttons, when set.
    #[serde(default)]
    pub owner_id: Option<i64>,

    /// Optional file overriding the anime caption template.
    #[serde(default)]
    pub anime_template_path: Option<PathBuf>,

    /// Timeout for outbound HTTP requests in seconds.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Minimum interval between bio updates in seconds (rate limit protection).
    ///
    /// Never above the shortest rotation interval, so an update held back by
    /// the limiter is sent before the rotator's next flag check.
    #[serde(default = "default_min_update_interval")]
    pub min_update_interval_secs: u64,

    /// Existing Telegraph access token; a new account is created when unset.
    #[serde(default)]
    pub telegraph_token: Option<String>,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_command_prefix() -> String {
    ".".to_owned()
}

fn default_anilist_url() -> String {
    "https://graphql.anilist.co".to_owned()
}

fn default_telegraph_api_url() -> String {
    "https://api.telegra.ph".to_owned()
}

fn default_telegraph_upload_url() -> String {
    "https://telegra.ph/upload".to_owned()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("state.json")
}

fn default_down_path() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_caption_limit() -> usize {
    super::CAPTION_LIMIT
}

fn default_http_timeout() -> u64 {
    30
}

fn default_min_update_interval() -> u64 {
    60 // 1 minute minimum between updates
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: default_command_prefix(),
            anilist_url: default_anilist_url(),
            telegraph_api_url: default_telegraph_api_url(),
            telegraph_upload_url: default_telegraph_upload_url(),
            state_path: default_state_path(),
            down_path: default_down_path(),
            caption_limit: default_caption_limit(),
            owner_id: None,
            anime_template_path: None,
            http_timeout_secs: default_http_timeout(),
            min_update_interval_secs: default_min_update_interval(),
            telegraph_token: None,
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            command_prefix: std::env::var("COMMAND_PREFIX")
                .unwrap_or_else(|_| default_command_prefix()),
            anilist_url: std::env::var("ANILIST_URL").unwrap_or_else(|_| default_anilist_url()),
            telegraph_api_url: std::env::var("TELEGRAPH_API_URL")
                .unwrap_or_else(|_| default_telegraph_api_url()),
            telegraph_upload_url: std::env::var("TELEGRAPH_UPLOAD_URL")
                .unwrap_or_else(|_| default_telegraph_upload_url()),
            state_path: std::env::var("STATE_PATH")
                .map_or_else(|_| default_state_path(), PathBuf::from),
            down_path: std::env::var("DOWN_PATH")
                .map_or_else(|_| default_down_path(), PathBuf::from),
            caption_limit: parse_env("CAPTION_LIMIT").unwrap_or_else(default_caption_limit),
            owner_id: parse_env("OWNER_ID"),
            anime_template_path: std::env::var("ANIME_TEMPLATE_PATH").ok().map(PathBuf::from),
            http_timeout_secs: parse_env("HTTP_TIMEOUT_SECS").unwrap_or_else(default_http_timeout),
            min_update_interval_secs: parse_env("MIN_UPDATE_INTERVAL")
                .map_or_else(default_min_update_interval, clamp_update_interval),
            telegraph_token: std::env::var("TELEGRAPH_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| default_log_level()),
        }
    }

    /// HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn clamp_update_interval(secs: u64) -> u64 {
    if secs > MIN_INTERVAL_SECS {
        warn!(
            "MIN_UPDATE_INTERVAL {}s exceeds the shortest bio interval, using {}s",
            secs, MIN_INTERVAL_SECS
        );
    }
    secs.min(MIN_INTERVAL_SECS)
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,

    #[error("Failed to read template file: {0}")]
    Template(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BotSettings::default();
        assert_eq!(settings.command_prefix, ".");
        assert_eq!(settings.caption_limit, 1024);
        assert_eq!(settings.anilist_url, "https://graphql.anilist.co");
        assert_eq!(settings.min_update_interval_secs, 60);
        assert!(settings.owner_id.is_none());
        assert!(settings.telegraph_token.is_none());
    }

    #[test]
    fn test_update_interval_capped_at_rotation_minimum() {
        assert_eq!(clamp_update_interval(3600), MIN_INTERVAL_SECS);
        assert_eq!(clamp_update_interval(MIN_INTERVAL_SECS), MIN_INTERVAL_SECS);
        assert_eq!(clamp_update_interval(15), 15);
    }

    #[test]
    fn test_telegram_config_new() {
        let config = TelegramConfig::new(12345, "abc123".to_owned());
        assert_eq!(config.api_id, 12345);
        assert_eq!(config.api_hash, "abc123");
        assert_eq!(config.session_path, PathBuf::from("session.db"));
    }

    #[test]
    fn test_settings_deserialize_fills_defaults() {
        let settings: BotSettings = serde_json::from_str(r#"{"owner_id": 42}"#).unwrap();
        assert_eq!(settings.owner_id, Some(42));
        assert_eq!(settings.http_timeout(), Duration::from_secs(30));
        assert_eq!(settings.state_path, PathBuf::from("state.json"));
    }
}
