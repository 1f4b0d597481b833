//! Command handling module.
//!
//! Parses prefixed chat commands, runs them against the lookup, rotator,
//! reverse-search and history services, and returns a [`Reply`] for the
//! chat surface to deliver.

mod handler;
mod reply;
mod types;

pub use handler::{CommandHandler, MessageContext};
pub use reply::Reply;
pub use types::{BotCommand, CommandResult};
