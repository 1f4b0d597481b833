//! Bio rotator commands and loop.
//!
//! The rotator has two states, stopped and running:
//! - start: persist `on`, bump the generation, spawn a loop for it
//! - stop: persist `off`; the loop exits before its next update
//! - set_timeout: persist the interval; the loop picks it up on its next sleep
//!
//! A loop only updates while its generation is current, so a loop left
//! sleeping by `stop` never runs alongside one spawned by a later `start`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::state::{enabled_document, timeout_document};
use super::{
    BioRotatorState, ENABLED_KEY, MIN_INTERVAL_SECS, ProfileError, ProfileUpdater, RotatorError,
    TIMEOUT_KEY,
};
use crate::config::{PhraseBook, PhraseSet};
use crate::oplog::OperationalLog;
use crate::storage::KeyValueStore;

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(PhraseSet),
    AlreadyRunning,
}

/// Everything the loop task needs.
#[derive(Clone)]
struct LoopContext {
    state: Arc<RwLock<BioRotatorState>>,
    phrases: Arc<PhraseBook>,
    updater: Arc<dyn ProfileUpdater>,
    ops: Arc<dyn OperationalLog>,
}

/// Periodically writes phrases into the profile bio.
pub struct BioRotator {
    context: LoopContext,
    store: Arc<dyn KeyValueStore>,
}

impl BioRotator {
    #[must_use]
    pub fn new(
        phrases: Arc<PhraseBook>,
        updater: Arc<dyn ProfileUpdater>,
        store: Arc<dyn KeyValueStore>,
        ops: Arc<dyn OperationalLog>,
    ) -> Self {
        Self {
            context: LoopContext {
                state: Arc::new(RwLock::new(BioRotatorState::default())),
                phrases,
                updater,
                ops,
            },
            store,
        }
    }

    /// Loads persisted state and resumes the loop if it was running.
    ///
    /// Returns whether the rotator is running afterwards.
    pub async fn restore(&self) -> Result<bool, RotatorError> {
        let loaded = BioRotatorState::load(self.store.as_ref()).await?;
        let mut state = self.context.state.write().await;
        state.enabled = loaded.enabled;
        state.interval_secs = loaded.interval_secs;

        if !state.enabled {
            debug!("Bio rotator restored as stopped");
            return Ok(false);
        }

        let set = state.phrase_set;
        if self.context.phrases.phrases(set).is_empty() {
            warn!("Bio rotator was running but the {} phrase set is empty", set);
            state.enabled = false;
            return Ok(false);
        }

        let generation = state.resume();
        drop(state);
        info!("Resuming bio rotator");
        self.spawn(generation);
        Ok(true)
    }

    /// Starts rotating the set chosen by `selector`.
    pub async fn start(&self, selector: &str) -> Result<StartOutcome, RotatorError> {
        let set = PhraseSet::from_selector(selector);
        let mut state = self.context.state.write().await;

        if state.enabled {
            return Ok(StartOutcome::AlreadyRunning);
        }
        if self.context.phrases.phrases(set).is_empty() {
            return Err(RotatorError::NoPhrases(set));
        }

        self.store.upsert(ENABLED_KEY, enabled_document(true)).await?;
        let generation = state.begin(set);
        drop(state);

        info!("Bio rotator started with the {} set", set);
        self.spawn(generation);
        Ok(StartOutcome::Started(set))
    }

    /// Stops rotating. Returns `false` if it was not running.
    pub async fn stop(&self) -> Result<bool, RotatorError> {
        let mut state = self.context.state.write().await;
        if !state.enabled {
            return Ok(false);
        }

        self.store.upsert(ENABLED_KEY, enabled_document(false)).await?;
        state.enabled = false;

        info!("Bio rotator stopped");
        Ok(true)
    }

    /// Sets the interval between updates, in seconds.
    pub async fn set_timeout(&self, secs: u64) -> Result<(), RotatorError> {
        if secs < MIN_INTERVAL_SECS {
            return Err(RotatorError::TimeoutTooShort(secs));
        }

        let mut state = self.context.state.write().await;
        self.store.upsert(TIMEOUT_KEY, timeout_document(secs)).await?;
        state.interval_secs = secs;

        info!("Bio interval set to {} seconds", secs);
        Ok(())
    }

    /// Current interval in seconds.
    pub async fn timeout(&self) -> u64 {
        self.context.state.read().await.interval_secs
    }

    pub async fn is_running(&self) -> bool {
        self.context.state.read().await.enabled
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> BioRotatorState {
        *self.context.state.read().await
    }

    fn spawn(&self, generation: u64) {
        let context = self.context.clone();
        tokio::spawn(async move { run(context, generation).await });
    }
}

impl std::fmt::Debug for BioRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BioRotator").finish_non_exhaustive()
    }
}

async fn run(context: LoopContext, generation: u64) {
    let set = context.state.read().await.phrase_set;
    let phrases = context.phrases.phrases(set).to_vec();
    debug!("Bio loop {} running over {} phrases", generation, phrases.len());

    // Rate-limit wait already served, deducted from the following interval.
    let mut served = Duration::ZERO;

    'rotation: loop {
        for phrase in &phrases {
            if !context.state.read().await.is_current(generation) {
                break 'rotation;
            }

            match context.updater.update_bio(phrase).await {
                Ok(()) => {
                    debug!("Bio updated to \"{}\"", phrase);
                    context.ops.log(&format!("Bio updated to \"{phrase}\"")).await;
                }
                Err(ProfileError::RateLimited(wait)) => {
                    warn!("Bio update rate limited for {} seconds", wait.as_secs());
                    context
                        .ops
                        .log(&format!("Bio update rate limited, waiting {} seconds", wait.as_secs()))
                        .await;
                    sleep(wait).await;
                    served = wait;
                }
                Err(e) => {
                    error!("Failed to update bio: {}", e);
                    context.ops.log(&format!("Bio update failed: {e}")).await;
                }
            }

            let interval = context.state.read().await.interval();
            sleep(interval.saturating_sub(served)).await;
            served = Duration::ZERO;
        }
    }

    debug!("Bio loop {} exited", generation);
}
