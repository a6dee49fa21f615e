//! Typed access to the participant's local progress.
//!
//! Layout per session id `S`:
//! - `participant:{S}` holds the JSON-encoded participant
//! - `qindex:{S}` holds the JSON-encoded current question index

use std::sync::Arc;

use quiz_core::model::{Participant, SessionId};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::repository::{KeyValueStore, StorageError};

#[must_use]
pub fn participant_key(session_id: &SessionId) -> String {
    format!("participant:{session_id}")
}

#[must_use]
pub fn question_index_key(session_id: &SessionId) -> String {
    format!("qindex:{session_id}")
}

/// What a reload can recover for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalProgress {
    pub participant: Option<Participant>,
    pub question_index: usize,
}

/// Per-session progress persistence over any `KeyValueStore`.
#[derive(Clone)]
pub struct ProgressStore {
    kv: Arc<dyn KeyValueStore>,
}

impl ProgressStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load everything stored for `session_id`.
    ///
    /// Unreadable or undecodable entries are logged and treated as absent, so
    /// a damaged entry means re-joining instead of failing to start.
    #[must_use]
    pub fn load(&self, session_id: &SessionId) -> LocalProgress {
        let participant = self
            .read::<Participant>(&participant_key(session_id))
            .unwrap_or_else(|err| {
                warn!(%session_id, error = %err, "discarding cached participant");
                None
            });
        let question_index = self
            .read::<usize>(&question_index_key(session_id))
            .unwrap_or_else(|err| {
                warn!(%session_id, error = %err, "discarding cached question index");
                None
            })
            .unwrap_or(0);

        LocalProgress {
            participant,
            question_index,
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the participant cannot be written.
    pub fn save_participant(
        &self,
        session_id: &SessionId,
        participant: &Participant,
    ) -> Result<(), StorageError> {
        debug!(%session_id, participant_id = %participant.id, "persisting participant");
        self.write(&participant_key(session_id), participant)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the index cannot be written.
    pub fn save_question_index(
        &self,
        session_id: &SessionId,
        index: usize,
    ) -> Result<(), StorageError> {
        debug!(%session_id, question_index = index, "persisting question index");
        self.write(&question_index_key(session_id), &index)
    }

    /// Forget everything stored for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either key cannot be removed.
    pub fn clear(&self, session_id: &SessionId) -> Result<(), StorageError> {
        self.kv.remove(&participant_key(session_id))?;
        self.kv.remove(&question_index_key(session_id))
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.kv.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.kv.set(key, &raw)
    }
}
