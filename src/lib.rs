//! Anime Userbot Library
//!
//! Command plugins for a Telegram userbot.
//!
//! This crate provides the core functionality for:
//! - Looking up anime, manga, characters and airing schedules on `AniList`
//! - Rendering results into captions and Telegraph pages
//! - Prequel / sequel navigation buttons
//! - Rotating the profile bio in the background
//! - Reverse image search and name history lookups

pub mod anilist;
pub mod commands;
pub mod config;
pub mod history;
pub mod navigation;
pub mod oplog;
pub mod render;
pub mod reverse;
pub mod rotator;
pub mod storage;
pub mod telegram;
pub mod telegraph;

#[cfg(test)]
mod testing;
