//! Background bio rotation.
//!
//! Cycles a phrase list into the profile bio at a fixed interval. The
//! on/off flag and the interval are persisted so rotation resumes after
//! a restart.

mod runner;
mod state;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub use runner::{BioRotator, StartOutcome};
pub use state::{
    BioRotatorState, DEFAULT_INTERVAL_SECS, ENABLED_KEY, MIN_INTERVAL_SECS, TIMEOUT_KEY,
};

use crate::config::PhraseSet;
use crate::storage::StorageError;

/// Errors that can occur in the rotator.
#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("too short! (minimum 60 sec)")]
    TimeoutTooShort(u64),

    #[error("The {0} phrase set is empty")]
    NoPhrases(PhraseSet),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from a profile update.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Rate limited, retry in {} seconds", .0.as_secs())]
    RateLimited(Duration),

    #[error("Profile update failed: {0}")]
    Failed(String),
}

/// Writes the profile bio.
#[async_trait]
pub trait ProfileUpdater: Send + Sync {
    async fn update_bio(&self, text: &str) -> Result<(), ProfileError>;
}

/// Updater that only logs the bio it would set.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunUpdater;

#[async_trait]
impl ProfileUpdater for DryRunUpdater {
    async fn update_bio(&self, text: &str) -> Result<(), ProfileError> {
        info!("[DRY RUN] Would update bio to: {}", text);
        Ok(())
    }
}
