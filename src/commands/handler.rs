//! Command handler implementation.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::Reply;
use super::types::{BotCommand, CommandResult};
use crate::anilist::{
    LookupBackend, LookupError, LookupKind, LookupRequest, LookupResult, split_flags,
};
use crate::history::{self, HISTORY_BOT, HistoryBot, HistoryKind, HistoryOutcome};
use crate::navigation::{Callback, Keyboard, NavigationController, build_controls};
use crate::render::text::escape_html;
use crate::render::{RenderError, RenderedMessage, Renderer};
use crate::reverse::{MediaSource, ReverseSearch, ReverseSearchError, SearchEngine};
use crate::rotator::{BioRotator, RotatorError, StartOutcome};

/// Flag asking the anime command for a web-preview reply.
const WEB_PREVIEW_FLAG: &str = "-wp";

/// Flag asking `sg` for usernames instead of names.
const USERNAMES_FLAG: &str = "-u";

/// Failures of the lookup-then-render path.
#[derive(Debug, Error)]
enum LookupFailure {
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What the command message was replying to.
#[derive(Clone, Default)]
pub struct MessageContext {
    /// Author of the replied message.
    pub replied_user: Option<i64>,

    /// Media attached to the replied message.
    pub replied_media: Option<Arc<dyn MediaSource>>,
}

impl fmt::Debug for MessageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageContext")
            .field("replied_user", &self.replied_user)
            .field("replied_media", &self.replied_media.is_some())
            .finish()
    }
}

/// Parses commands and dispatches them to the services.
pub struct CommandHandler {
    /// Command prefix (e.g., ".").
    prefix: String,

    backend: Arc<dyn LookupBackend>,
    renderer: Arc<Renderer>,
    navigation: NavigationController,
    rotator: Arc<BioRotator>,
    reverse: Arc<ReverseSearch>,
    history: Arc<dyn HistoryBot>,

    /// Longest caption sent attached to an image.
    caption_limit: usize,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(
        prefix: String,
        backend: Arc<dyn LookupBackend>,
        renderer: Arc<Renderer>,
        rotator: Arc<BioRotator>,
        reverse: Arc<ReverseSearch>,
        history: Arc<dyn HistoryBot>,
    ) -> Self {
        let navigation = NavigationController::new(backend.clone(), renderer.clone(), None);
        Self {
            prefix,
            backend,
            renderer,
            navigation,
            rotator,
            reverse,
            history,
            caption_limit: crate::config::CAPTION_LIMIT,
        }
    }

    /// Restricts navigation buttons to `owner_id`.
    #[must_use]
    pub fn with_owner(mut self, owner_id: Option<i64>) -> Self {
        self.navigation =
            NavigationController::new(self.backend.clone(), self.renderer.clone(), owner_id);
        self
    }

    #[must_use]
    pub fn with_caption_limit(mut self, caption_limit: usize) -> Self {
        self.caption_limit = caption_limit;
        self
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(
        &self,
        message_text: &str,
        context: &MessageContext,
    ) -> Option<CommandResult> {
        let command = BotCommand::parse(message_text, &self.prefix)?;

        debug!("Handling command: {}", command);
        let result = self.execute(command, context).await;
        info!("Command result: success={}", result.success);

        Some(result)
    }

    /// Handles a press on one of the navigation buttons.
    pub async fn handle_callback(&self, callback: &Callback) -> CommandResult {
        match self.navigation.on_activate(callback).await {
            Ok(activation) => CommandResult::success(Reply::replacement(
                &activation.rendered,
                activation.controls,
                self.caption_limit,
            )),
            Err(e) => {
                warn!("Callback {} failed: {}", callback.data, e);
                CommandResult::error(e.to_string())
            }
        }
    }

    /// Executes a parsed command.
    async fn execute(&self, command: BotCommand, context: &MessageContext) -> CommandResult {
        match command {
            BotCommand::Anime(args) => self.handle_anime(&args).await,
            BotCommand::Manga(args) => self.handle_lookup(LookupKind::Manga, &args).await,
            BotCommand::Airing(args) => {
                self.handle_lookup(LookupKind::AiringSchedule, &args).await
            }
            BotCommand::Character(args) => self.handle_lookup(LookupKind::Character, &args).await,
            BotCommand::Scheduled => self.handle_scheduled().await,
            BotCommand::AutoBio(args) => self.handle_autobio(&args).await,
            BotCommand::SetBioTimeout(args) => self.handle_set_timeout(&args).await,
            BotCommand::ViewBioTimeout => self.handle_view_timeout().await,
            BotCommand::ReverseSearch(engine) => self.handle_reverse(engine, context).await,
            BotCommand::History(args) => self.handle_history(&args, context).await,
            BotCommand::Help => self.handle_help(),
        }
    }

    async fn lookup(
        &self,
        kind: LookupKind,
        args: &str,
    ) -> Result<(LookupRequest, RenderedMessage), LookupFailure> {
        let (flags, text) = split_flags(args);
        let request = LookupRequest::build(kind, &text, &flags)?;
        let result = self.backend.lookup(&request).await?;
        let rendered = self.renderer.render(&result).await?;
        Ok((request, rendered))
    }

    async fn handle_anime(&self, args: &str) -> CommandResult {
        let (request, rendered) = match self.lookup(LookupKind::Anime, args).await {
            Ok(found) => found,
            Err(e) => return CommandResult::error(e.to_string()),
        };

        if request.has_flag(WEB_PREVIEW_FLAG) {
            return CommandResult::success(Reply::web_preview(&rendered, Keyboard::new()));
        }

        let controls = build_controls(&rendered);
        CommandResult::success(Reply::rendered(&rendered, controls, self.caption_limit))
    }

    async fn handle_lookup(&self, kind: LookupKind, args: &str) -> CommandResult {
        match self.lookup(kind, args).await {
            Ok((_, rendered)) => CommandResult::success(Reply::rendered(
                &rendered,
                Keyboard::new(),
                self.caption_limit,
            )),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    async fn handle_scheduled(&self) -> CommandResult {
        let entries = match self.backend.scheduled().await {
            Ok(entries) => entries,
            Err(e) => return CommandResult::error(e.to_string()),
        };

        match self.renderer.render(&LookupResult::Schedule(entries)).await {
            Ok(rendered) => CommandResult::success(Reply::rendered(
                &rendered,
                Keyboard::new(),
                self.caption_limit,
            )),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    async fn handle_autobio(&self, args: &str) -> CommandResult {
        if args.trim().eq_ignore_ascii_case("stop") {
            return match self.rotator.stop().await {
                Ok(true) => CommandResult::message("Auto Bio Updation is <b>Stopped</b> Successfully..."),
                Ok(false) => CommandResult::error("Auto Bio Updation is not running."),
                Err(e) => CommandResult::error(e.to_string()),
            };
        }

        match self.rotator.start(args).await {
            Ok(StartOutcome::Started(set)) => CommandResult::message(format!(
                "Auto Bio Updation is <b>Started</b> Successfully with the {set} phrases..."
            )),
            Ok(StartOutcome::AlreadyRunning) => CommandResult::message(format!(
                "Auto Bio Updation is already running. Use <code>{}autobio stop</code> to stop it.",
                self.prefix
            )),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    async fn handle_set_timeout(&self, args: &str) -> CommandResult {
        let Ok(secs) = args.trim().parse::<u64>() else {
            return CommandResult::error(format!(
                "Usage: <code>{}sabto [timeout in seconds]</code>",
                self.prefix
            ));
        };

        match self.rotator.set_timeout(secs).await {
            Ok(()) => CommandResult::message(format!("Set auto bio timeout as {secs} seconds!")),
            Err(e @ RotatorError::TimeoutTooShort(_)) => CommandResult::error(e.to_string()),
            Err(e) => {
                warn!("Could not persist bio timeout: {}", e);
                CommandResult::error(e.to_string())
            }
        }
    }

    async fn handle_view_timeout(&self) -> CommandResult {
        let secs = self.rotator.timeout().await;
        CommandResult::message(format!("Bio will be updated after {secs} seconds!"))
    }

    async fn handle_reverse(&self, engine: SearchEngine, context: &MessageContext) -> CommandResult {
        let Some(source) = &context.replied_media else {
            return CommandResult::error(ReverseSearchError::NoMedia.to_string());
        };

        match self.reverse.search(source.as_ref(), engine).await {
            Ok(url) => CommandResult::message(format!(
                "<b><a href=\"{url}\">{engine} Search Results</a></b>"
            )),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    async fn handle_history(&self, args: &str, context: &MessageContext) -> CommandResult {
        let Some(user_id) = context.replied_user else {
            return CommandResult::error("Reply to a user to get their history.");
        };

        let (flags, _) = split_flags(args);
        let kind = if flags.iter().any(|f| f == USERNAMES_FLAG) {
            HistoryKind::Usernames
        } else {
            HistoryKind::Names
        };

        match history::lookup(self.history.as_ref(), user_id, kind).await {
            Ok(HistoryOutcome::History(text)) => {
                CommandResult::message(format!("<code>{}</code>", escape_html(&text)))
            }
            Ok(HistoryOutcome::NoRecords) => CommandResult::message(kind.empty_reply()),
            Ok(HistoryOutcome::Unanswered) => {
                CommandResult::error(format!("No answer from {HISTORY_BOT}."))
            }
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    fn handle_help(&self) -> CommandResult {
        let mut lines = vec!["<b>Available commands:</b>".to_owned()];
        for (usage, description) in BotCommand::all_commands() {
            lines.push(format!(
                "<code>{}{}</code> - {description}",
                self.prefix,
                escape_html(usage)
            ));
        }
        CommandResult::message(lines.join("\n"))
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler")
            .field("prefix", &self.prefix)
            .field("caption_limit", &self.caption_limit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;

    use super::*;
    use crate::config::PhraseBook;
    use crate::history::HistoryError;
    use crate::navigation::Control;
    use crate::navigation::testing::{FakeBackend, media};
    use crate::oplog::MemoryLog;
    use crate::render::Direction;
    use crate::render::testing::RecordingPublisher;
    use crate::reverse::LocalFileSource;
    use crate::rotator::DryRunUpdater;
    use crate::storage::MemoryStore;
    use crate::telegraph::{MediaHost, PublishError};

    struct FixedHost;

    #[async_trait]
    impl MediaHost for FixedHost {
        async fn upload(&self, _: &Path) -> Result<String, PublishError> {
            Ok("/file/abc.jpg".to_owned())
        }
    }

    struct CannedBot(Vec<&'static str>);

    #[async_trait]
    impl HistoryBot for CannedBot {
        async fn search(&self, _: i64) -> Result<Vec<String>, HistoryError> {
            Ok(self.0.iter().map(|l| (*l).to_owned()).collect())
        }
    }

    struct Fixture {
        handler: CommandHandler,
        _down_dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(FakeBackend::with_media([
            media(98444, "Gakusen Toshi Asterisk", &[(100, "PREQUEL"), (200, "SEQUEL")], false),
            media(200, "Gakusen Toshi Asterisk 2nd Season", &[(98444, "PREQUEL")], false),
            media(77, "Restricted Title", &[], true),
        ]));
        let renderer = Arc::new(Renderer::new(Arc::new(RecordingPublisher::default())));
        let rotator = Arc::new(BioRotator::new(
            Arc::new(PhraseBook::example()),
            Arc::new(DryRunUpdater),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryLog::new()),
        ));
        let down_dir = tempfile::tempdir().unwrap();
        let reverse = Arc::new(ReverseSearch::new(
            Arc::new(FixedHost),
            down_dir.path(),
            "https://telegra.ph",
        ));
        let history = Arc::new(CannedBot(vec![
            "Name History\n1. Alice",
            "Username History\n1. @alice",
        ]));

        Fixture {
            handler: CommandHandler::new(
                ".".to_owned(),
                backend,
                renderer,
                rotator,
                reverse,
                history,
            ),
            _down_dir: down_dir,
        }
    }

    async fn run(handler: &CommandHandler, text: &str) -> CommandResult {
        handler
            .try_handle(text, &MessageContext::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_not_a_command() {
        let f = fixture();
        assert!(
            f.handler
                .try_handle("hello", &MessageContext::default())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_anime_with_navigation() {
        let f = fixture();
        let result = run(&f.handler, ".anime 98444").await;

        assert!(result.success);
        assert!(matches!(result.reply, Reply::Photo { .. }));
        let keyboard = result.reply.keyboard();
        assert_eq!(
            keyboard[0],
            vec![
                Control::Navigate { direction: Direction::Prequel, target: 100 },
                Control::Navigate { direction: Direction::Sequel, target: 200 },
            ]
        );
        assert!(matches!(keyboard[1][0], Control::Download { .. }));
    }

    #[tokio::test]
    async fn test_anime_by_mal_id_and_search() {
        let f = fixture();
        assert!(run(&f.handler, ".anime -mid 99444").await.success);
        assert!(run(&f.handler, ".anime Gakusen Toshi Asterisk").await.success);
    }

    #[tokio::test]
    async fn test_character_rejects_mal_id() {
        let f = fixture();
        let result = run(&f.handler, ".character -mid 5").await;

        assert!(!result.success);
        assert_eq!(result.reply.body(), "A character has no MyAnimeList id");
    }

    #[tokio::test]
    async fn test_anime_web_preview() {
        let f = fixture();
        let result = run(&f.handler, ".anime -wp 98444").await;

        assert!(matches!(result.reply, Reply::Text { link_preview: true, .. }));
        assert!(result.reply.body().starts_with("<a href=\"https://"));
        assert!(result.reply.keyboard().is_empty());
    }

    #[tokio::test]
    async fn test_restricted_anime_gets_search_elsewhere() {
        let f = fixture();
        let result = run(&f.handler, ".anime 77").await;

        let keyboard = result.reply.keyboard();
        assert_eq!(keyboard.len(), 1);
        assert!(matches!(keyboard[0][0], Control::SearchElsewhere { .. }));
    }

    #[tokio::test]
    async fn test_lookup_errors_become_replies() {
        let f = fixture();

        let empty = run(&f.handler, ".anime").await;
        assert!(!empty.success);
        assert_eq!(empty.reply.body(), "Nothing to search for");

        let missing = run(&f.handler, ".anime 1").await;
        assert!(!missing.success);
        assert_eq!(missing.reply.body(), "[Not Found.]");

        let scheduled = run(&f.handler, ".scheduled").await;
        assert_eq!(scheduled.reply.body(), "[Not Found.]");
    }

    #[tokio::test]
    async fn test_callback_replaces_media() {
        let f = fixture();
        let callback = Callback {
            data: "btn_200".to_owned(),
            sender_id: 1,
        };

        let result = f.handler.handle_callback(&callback).await;

        assert!(result.success);
        assert!(matches!(result.reply, Reply::ReplaceMedia { .. }));
        assert_eq!(
            result.reply.keyboard()[0],
            vec![Control::Navigate { direction: Direction::Prequel, target: 98444 }]
        );
    }

    #[tokio::test]
    async fn test_callback_owner_only() {
        let f = fixture();
        let handler = f.handler.with_owner(Some(42));
        let callback = Callback {
            data: "btn_200".to_owned(),
            sender_id: 7,
        };

        assert!(!handler.handle_callback(&callback).await.success);
    }

    #[tokio::test]
    async fn test_autobio_start_again_and_stop() {
        let f = fixture();

        let started = run(&f.handler, ".autobio m").await;
        assert!(started.success);
        assert!(started.reply.body().contains("music"));

        let again = run(&f.handler, ".autobio").await;
        assert!(again.reply.body().contains("already running"));

        let stopped = run(&f.handler, ".autobio stop").await;
        assert!(stopped.success);
        assert!(stopped.reply.body().contains("Stopped"));

        assert!(!run(&f.handler, ".autobio stop").await.success);
    }

    #[tokio::test]
    async fn test_bio_timeout_commands() {
        let f = fixture();

        let short = run(&f.handler, ".sabto 59").await;
        assert!(!short.success);
        assert_eq!(short.reply.body(), "too short! (minimum 60 sec)");

        assert!(!run(&f.handler, ".sabto soon").await.success);

        let set = run(&f.handler, ".sabto 500").await;
        assert_eq!(set.reply.body(), "Set auto bio timeout as 500 seconds!");

        let view = run(&f.handler, ".vabto").await;
        assert_eq!(view.reply.body(), "Bio will be updated after 500 seconds!");
    }

    #[tokio::test]
    async fn test_reverse_search_needs_media() {
        let f = fixture();
        let result = run(&f.handler, ".yrs").await;
        assert!(!result.success);
        assert_eq!(result.reply.body(), "Media not found!");
    }

    #[tokio::test]
    async fn test_reverse_search_replies_with_link() {
        let f = fixture();
        let source_dir = tempfile::tempdir().unwrap();
        let path = source_dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg").unwrap();
        let context = MessageContext {
            replied_media: Some(Arc::new(LocalFileSource::new(path))),
            ..MessageContext::default()
        };

        let result = f.handler.try_handle(".grs", &context).await.unwrap();

        assert!(result.success);
        assert!(result.reply.body().contains(
            "https://www.google.com/searchbyimage?image_url=https%3A%2F%2Ftelegra.ph%2Ffile%2Fabc.jpg"
        ));
        assert!(result.reply.body().contains("Google Search Results"));
    }

    #[tokio::test]
    async fn test_history() {
        let f = fixture();
        let context = MessageContext {
            replied_user: Some(5),
            ..MessageContext::default()
        };

        let names = f.handler.try_handle(".sg", &context).await.unwrap();
        assert_eq!(names.reply.body(), "<code>Name History\n1. Alice</code>");

        let usernames = f.handler.try_handle(".sg -u", &context).await.unwrap();
        assert_eq!(usernames.reply.body(), "<code>Username History\n1. @alice</code>");

        assert!(!run(&f.handler, ".sg").await.success);
    }

    #[tokio::test]
    async fn test_help_lists_commands() {
        let f = fixture();
        let result = run(&f.handler, ".help").await;

        assert!(result.success);
        assert!(result.reply.body().contains("<code>.anime [-mid] [-wp] &lt;name | id&gt;</code>"));
        assert!(result.reply.body().contains("<code>.vabto</code>"));
    }
}
