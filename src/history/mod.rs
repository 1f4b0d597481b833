//! Name and username history from a third-party history bot.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// The bot asked for history.
pub const HISTORY_BOT: &str = "@Sangmatainfo_bot";

/// Reply sent when the bot knows nothing about the user.
const NO_RECORDS: &str = "No records found";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("First, unblock @Sangmatainfo_bot.")]
    Blocked,

    #[error("History lookup failed: {0}")]
    Failed(String),
}

/// Which history the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Names,
    Usernames,
}

impl HistoryKind {
    /// First line of the bot response carrying this history.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Names => "Name History",
            Self::Usernames => "Username History",
        }
    }

    /// Reply shown when there is no history.
    #[must_use]
    pub const fn empty_reply(self) -> &'static str {
        match self {
            Self::Names => "User never changed their name.",
            Self::Usernames => "User never changed their username.",
        }
    }
}

/// What the history bot said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    History(String),
    NoRecords,
    /// The bot answered, but not with the requested history.
    Unanswered,
}

/// A conversation with the history bot.
#[async_trait]
pub trait HistoryBot: Send + Sync {
    /// Asks about `user_id` and returns the bot's responses in order.
    async fn search(&self, user_id: i64) -> Result<Vec<String>, HistoryError>;
}

/// Picks the requested history out of the bot responses.
#[must_use]
pub fn pick_response(responses: &[String], kind: HistoryKind) -> HistoryOutcome {
    for response in responses {
        if response.starts_with(NO_RECORDS) {
            return HistoryOutcome::NoRecords;
        }
        if response.starts_with(kind.header()) {
            return HistoryOutcome::History(response.clone());
        }
    }
    HistoryOutcome::Unanswered
}

/// Asks the bot about `user_id` and picks the requested history.
pub async fn lookup(
    bot: &dyn HistoryBot,
    user_id: i64,
    kind: HistoryKind,
) -> Result<HistoryOutcome, HistoryError> {
    let responses = bot.search(user_id).await?;
    debug!("History bot sent {} responses for {}", responses.len(), user_id);
    Ok(pick_response(&responses, kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedBot(Result<Vec<&'static str>, ()>);

    #[async_trait]
    impl HistoryBot for CannedBot {
        async fn search(&self, _: i64) -> Result<Vec<String>, HistoryError> {
            match &self.0 {
                Ok(lines) => Ok(lines.iter().map(|l| (*l).to_owned()).collect()),
                Err(()) => Err(HistoryError::Blocked),
            }
        }
    }

    #[tokio::test]
    async fn test_picks_requested_history() {
        let bot = CannedBot(Ok(vec![
            "Name History\n1. Alice\n2. Alicia",
            "Username History\n1. @alice",
        ]));

        assert_eq!(
            lookup(&bot, 1, HistoryKind::Names).await.unwrap(),
            HistoryOutcome::History("Name History\n1. Alice\n2. Alicia".to_owned())
        );
        assert_eq!(
            lookup(&bot, 1, HistoryKind::Usernames).await.unwrap(),
            HistoryOutcome::History("Username History\n1. @alice".to_owned())
        );
    }

    #[tokio::test]
    async fn test_no_records() {
        let bot = CannedBot(Ok(vec!["No records found for 1"]));
        assert_eq!(
            lookup(&bot, 1, HistoryKind::Usernames).await.unwrap(),
            HistoryOutcome::NoRecords
        );
    }

    #[tokio::test]
    async fn test_unanswered_and_blocked() {
        let bot = CannedBot(Ok(vec!["Please wait..."]));
        assert_eq!(
            lookup(&bot, 1, HistoryKind::Names).await.unwrap(),
            HistoryOutcome::Unanswered
        );

        let err = lookup(&CannedBot(Err(())), 1, HistoryKind::Names)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "First, unblock @Sangmatainfo_bot.");
    }
}
