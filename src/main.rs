//! Anime Userbot - Main Entry Point
//!
//! Wires the `AniList`, Telegraph, rotator and history services into the
//! command handler and serves it on a console surface: each stdin line is
//! handled like a chat message sent by the owner.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use dialoguer::{Input, Password};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use anime_userbot::anilist::AniListClient;
use anime_userbot::commands::{CommandHandler, MessageContext};
use anime_userbot::config::{BotSettings, PhraseBook, TelegramConfig};
use anime_userbot::history::{HISTORY_BOT, HistoryBot, HistoryError};
use anime_userbot::navigation::{CALLBACK_PREFIX, Callback};
use anime_userbot::oplog::{OperationalLog, TracingLog};
use anime_userbot::render::{Renderer, Template};
use anime_userbot::reverse::{LocalFileSource, ReverseSearch, media_base};
use anime_userbot::rotator::{BioRotator, DryRunUpdater, ProfileUpdater};
use anime_userbot::storage::JsonFileStore;
use anime_userbot::telegram::{TelegramBot, TelegramError};
use anime_userbot::telegraph::TelegraphClient;

/// Media base used when the upload URL has no usable origin.
const DEFAULT_MEDIA_BASE: &str = "https://telegra.ph";

/// Separates a command from what it replies to on the console.
const REPLY_SEPARATOR: &str = " | ";

type ConsoleLines = Arc<Mutex<Lines<BufReader<Stdin>>>>;

/// Telegram userbot with AniList lookups and bio rotation.
#[derive(Parser, Debug)]
#[command(name = "anime_userbot")]
#[command(about = "AniList lookups, reverse image search and bio rotation for Telegram")]
#[command(version)]
struct Args {
    /// Path to the bio phrases JSON file.
    #[arg(short, long, default_value = "phrases.json")]
    phrases: String,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log bio updates instead of sending them to Telegram.
    #[arg(long)]
    dry_run: bool,

    /// Generate an example phrase file and exit.
    #[arg(long)]
    generate_phrases: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if args.generate_phrases {
        return generate_example_phrases();
    }

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let settings = BotSettings::from_env_with_defaults();
    let mut phrases = load_phrases(&args.phrases)?;

    let bot = if args.dry_run {
        info!("Dry run: bio updates are only logged");
        None
    } else {
        Some(Arc::new(connect_telegram(&settings, &mut phrases).await?))
    };

    phrases
        .validate()
        .context("Phrase file validation failed")?;
    info!(
        "Loaded {} phrases (premium: {}, max_length: {})",
        phrases.len(),
        phrases.is_premium,
        phrases.max_bio_length()
    );

    let updater: Arc<dyn ProfileUpdater> = match &bot {
        Some(bot) => Arc::clone(bot) as Arc<dyn ProfileUpdater>,
        None => Arc::new(DryRunUpdater),
    };

    let ops: Arc<dyn OperationalLog> = Arc::new(TracingLog);
    let store = JsonFileStore::open(&settings.state_path)
        .await
        .with_context(|| format!("Failed to open state file {}", settings.state_path.display()))?;
    let store = Arc::new(store);

    let backend = Arc::new(
        AniListClient::new(&settings.anilist_url, settings.http_timeout(), ops.clone())
            .context("Failed to create AniList client")?,
    );
    let mut telegraph = TelegraphClient::new(
        &settings.telegraph_api_url,
        &settings.telegraph_upload_url,
        settings.http_timeout(),
    )
    .context("Failed to create Telegraph client")?;
    if let Some(token) = &settings.telegraph_token {
        debug!("Using the configured Telegraph account");
        telegraph = telegraph.with_access_token(token);
    }
    let telegraph = Arc::new(telegraph);

    let mut renderer = Renderer::new(telegraph.clone());
    if let Some(path) = &settings.anime_template_path {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read anime template {}", path.display()))?;
        info!("Using anime template from {}", path.display());
        renderer = renderer.with_anime_template(Template::new(source));
    }

    let base = media_base(&settings.telegraph_upload_url)
        .unwrap_or_else(|| DEFAULT_MEDIA_BASE.to_owned());
    let reverse = Arc::new(ReverseSearch::new(telegraph, &settings.down_path, base));

    let rotator = Arc::new(BioRotator::new(Arc::new(phrases), updater, store, ops));
    if rotator
        .restore()
        .await
        .context("Failed to restore bio rotator state")?
    {
        info!("Bio rotator resumed from {}", settings.state_path.display());
    }

    let lines: ConsoleLines = Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines()));

    let handler = CommandHandler::new(
        settings.command_prefix.clone(),
        backend,
        Arc::new(renderer),
        rotator,
        reverse,
        Arc::new(ConsoleHistoryBot {
            lines: lines.clone(),
        }),
    )
    .with_owner(settings.owner_id)
    .with_caption_limit(settings.caption_limit);

    info!("Bot is running. Command prefix: {}", settings.command_prefix);
    println!(
        "Type commands like `{0}anime 98444` or `{0}help`. Press a button with `btn_<id>`.",
        settings.command_prefix
    );
    println!("Reply to a user or a file with `<command>{REPLY_SEPARATOR}<user id | path>`.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            line = next_line(&lines) => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    info!("Console closed, shutting down...");
                    break;
                };
                handle_line(&handler, &settings, line.trim()).await;
            }
        }
    }

    if let Some(bot) = bot {
        bot.disconnect();
    }

    Ok(())
}

async fn next_line(lines: &ConsoleLines) -> std::io::Result<Option<String>> {
    lines.lock().await.next_line().await
}

/// Handles one console line as a message or a button press.
async fn handle_line(handler: &CommandHandler, settings: &BotSettings, line: &str) {
    if line.is_empty() {
        return;
    }

    let result = if line.starts_with(CALLBACK_PREFIX) {
        let callback = Callback {
            data: line.to_owned(),
            sender_id: settings.owner_id.unwrap_or_default(),
        };
        handler.handle_callback(&callback).await
    } else {
        let (text, context) = split_reply(line);
        match handler.try_handle(text, &context).await {
            Some(result) => result,
            None => {
                debug!("Ignoring non-command line");
                return;
            }
        }
    };

    let marker = if result.success { "" } else { "✗ " };
    println!("{marker}{}\n", result.reply);
}

/// Splits `<command> | <user id | path>` into the command and its reply context.
fn split_reply(line: &str) -> (&str, MessageContext) {
    let Some((text, target)) = line.split_once(REPLY_SEPARATOR) else {
        return (line, MessageContext::default());
    };

    let target = target.trim();
    let context = match target.parse::<i64>() {
        Ok(user_id) => MessageContext {
            replied_user: Some(user_id),
            ..MessageContext::default()
        },
        Err(_) => MessageContext {
            replied_media: Some(Arc::new(LocalFileSource::new(target))),
            ..MessageContext::default()
        },
    };
    (text.trim(), context)
}

/// History bot relayed through the console: the query is printed and the
/// bot's responses are typed back, one per line, until an empty line.
struct ConsoleHistoryBot {
    lines: ConsoleLines,
}

#[async_trait]
impl HistoryBot for ConsoleHistoryBot {
    async fn search(&self, user_id: i64) -> Result<Vec<String>, HistoryError> {
        println!("→ {HISTORY_BOT}: /search_id {user_id}");
        println!("Paste the responses (\\n for line breaks), empty line to finish:");

        let mut lines = self.lines.lock().await;
        let mut responses = Vec::new();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => break,
                Ok(Some(line)) => responses.push(line.replace("\\n", "\n")),
                Ok(None) => break,
                Err(e) => return Err(HistoryError::Failed(e.to_string())),
            }
        }
        Ok(responses)
    }
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Loads the phrase file, falling back to the built-in phrases.
fn load_phrases(path: &str) -> Result<PhraseBook> {
    if !Path::new(path).exists() {
        warn!("{} not found, using the built-in phrases", path);
        return Ok(PhraseBook::example());
    }

    PhraseBook::load_from_file(path).with_context(|| format!("Failed to load phrases from {path}"))
}

/// Generates an example phrase file.
fn generate_example_phrases() -> Result<()> {
    let example = PhraseBook::example();
    example.save_to_file("phrases.example.json")?;

    println!("✓ Example phrases written to: phrases.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy phrases.example.json to phrases.json");
    println!("2. Edit the english and music lists to your liking");
    println!("3. Create a .env file with TG_API_ID and TG_API_HASH");
    println!("4. Run: anime_userbot");

    Ok(())
}

/// Connects, signs in if needed, and detects premium for the bio length limit.
async fn connect_telegram(settings: &BotSettings, phrases: &mut PhraseBook) -> Result<TelegramBot> {
    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let bot = TelegramBot::connect(&tg_config, settings.min_update_interval_secs)
        .await
        .context("Failed to connect to Telegram")?;

    if !bot.is_authorized().await.context("Failed to check authorization")? {
        authenticate(&bot, &tg_config).await?;
    }

    if phrases.auto_detect_premium {
        match bot.is_premium().await {
            Ok(is_premium) => {
                phrases.set_premium(is_premium);
                info!(
                    "Auto-detected premium status: {}",
                    if is_premium { "Premium" } else { "Free" }
                );
            }
            Err(e) => warn!("Failed to auto-detect premium status: {}. Using file value.", e),
        }
    }

    Ok(bot)
}

/// Handles Telegram authentication.
async fn authenticate(bot: &TelegramBot, config: &TelegramConfig) -> Result<()> {
    info!("Authentication required");

    let phone: String = Input::new()
        .with_prompt("Enter your phone number (with country code)")
        .interact_text()?;

    let token = bot
        .request_login_code(&phone, &config.api_hash)
        .await
        .context("Failed to request login code")?;

    info!("Login code sent to your Telegram app");

    let code: String = Input::new()
        .with_prompt("Enter the login code")
        .interact_text()?;

    match bot.sign_in(&token, &code).await {
        Ok(()) => Ok(()),
        Err(TelegramError::PasswordRequired(password_token)) => {
            info!("Two-factor authentication is enabled");
            info!("Password hint: {}", password_token.hint().unwrap_or("no hint"));

            let password: String = Password::new()
                .with_prompt("Enter your 2FA password")
                .interact()?;

            bot.check_password(password_token, &password)
                .await
                .context("2FA authentication failed")?;
            Ok(())
        }
        Err(e) => Err(e).context("Authentication failed"),
    }
}
