//! Telegram client wrapper module.
//!
//! Provides login and the profile updater behind the bio rotator,
//! with rate limiting of profile updates.

mod client;
mod rate_limiter;

pub use client::{
    PwdToken as PasswordToken, TelegramBot, TelegramError, Token as LoginToken,
};
pub use rate_limiter::RateLimiter;
