//! Rotator state and its persisted form.

use std::time::Duration;

use serde_json::{Value, json};
use tracing::warn;

use crate::config::PhraseSet;
use crate::storage::{KeyValueStore, StorageError};

/// Key of the `{"on": bool}` document.
pub const ENABLED_KEY: &str = "BIO_UPDATION";

/// Key of the `{"data": seconds}` document.
pub const TIMEOUT_KEY: &str = "AUTOBIO_TIMEOUT";

pub const DEFAULT_INTERVAL_SECS: u64 = 300;

pub const MIN_INTERVAL_SECS: u64 = 60;

/// State shared between the rotator commands and its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BioRotatorState {
    pub enabled: bool,
    pub interval_secs: u64,
    pub phrase_set: PhraseSet,
    /// Bumped on every start; a loop only runs while its generation is current.
    generation: u64,
}

impl Default for BioRotatorState {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: DEFAULT_INTERVAL_SECS,
            phrase_set: PhraseSet::default(),
            generation: 0,
        }
    }
}

impl BioRotatorState {
    /// Reads the persisted flag and interval. Missing keys keep their defaults.
    pub async fn load(store: &dyn KeyValueStore) -> Result<Self, StorageError> {
        let mut state = Self::default();

        if let Some(on) = store
            .get(ENABLED_KEY)
            .await?
            .and_then(|doc| doc.get("on").and_then(Value::as_bool))
        {
            state.enabled = on;
        }

        if let Some(secs) = store
            .get(TIMEOUT_KEY)
            .await?
            .and_then(|doc| doc.get("data").and_then(Value::as_u64))
        {
            if secs < MIN_INTERVAL_SECS {
                warn!("Stored bio interval {}s is below the minimum, using {}s", secs, MIN_INTERVAL_SECS);
            }
            state.interval_secs = secs.max(MIN_INTERVAL_SECS);
        }

        Ok(state)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Switches to running with `set` and returns the new generation.
    pub(super) const fn begin(&mut self, set: PhraseSet) -> u64 {
        self.enabled = true;
        self.phrase_set = set;
        self.generation += 1;
        self.generation
    }

    /// Claims a generation for a loop restored in the running state.
    pub(super) const fn resume(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether the loop of `generation` may keep running.
    #[must_use]
    pub const fn is_current(&self, generation: u64) -> bool {
        self.enabled && self.generation == generation
    }
}

pub(super) fn enabled_document(enabled: bool) -> Value {
    json!({ "on": enabled })
}

pub(super) fn timeout_document(secs: u64) -> Value {
    json!({ "data": secs })
}
