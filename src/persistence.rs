//! Resumable attempt state
//!
//! An in-progress attempt is written to durable local storage after every
//! state-affecting action so that a reload resumes where the learner left
//! off. Snapshots are keyed by quiz id and are last-write-wins: two sessions
//! on the same quiz overwrite each other.

use std::{
    collections::{BTreeSet, HashMap},
    fs, io,
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::{SystemTime, UNIX_EPOCH};

use crate::{
    constants::persistence::KEY_PREFIX,
    ids::{QuestionId, QuizId},
    quiz::{answer::AnswerStore, navigation::Position},
};

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the backing medium failed
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    /// The snapshot could not be encoded
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A string key-value store, the shape of browser local storage
pub trait Storage {
    /// Reads the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrites the value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes the value stored under `key`; deleting a missing key succeeds
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Storage kept in memory for the lifetime of the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage backed by one JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    /// Creates a storage rooted at `directory`; it is created on first write
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Percent-encodes the key, so distinct keys never share a file
    fn path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(staging, path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// The serialized in-progress attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Every stored answer, keyed by question id
    pub answers: AnswerStore,
    /// The cursor at the time of saving
    pub current_position: Position,
    /// Seconds left on the countdown; `null` without one
    pub time_remaining: Option<u32>,
    /// Milliseconds since the Unix epoch when this snapshot was written
    pub last_saved: u64,
    /// Question ids in attempt order, so a shuffled order survives a reload
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub question_order: Vec<QuestionId>,
    /// Question slots locked in test mode
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub locked_questions: BTreeSet<usize>,
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

/// Reads and writes the snapshot of one quiz
#[derive(Debug)]
pub struct Persistence<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> Persistence<S> {
    /// Creates the persistence layer for `quiz_id`
    pub fn new(storage: S, quiz_id: &QuizId) -> Self {
        Self {
            storage,
            key: format!("{KEY_PREFIX}{quiz_id}"),
        }
    }

    /// The storage key, `quiz-progress-{quizId}`
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Overwrites the stored snapshot
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if encoding or writing fails.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(snapshot)?;
        self.storage.set(&self.key, &encoded)
    }

    /// Reads the stored snapshot
    ///
    /// A missing, unreadable or corrupt snapshot yields `None`; it never
    /// prevents the attempt from starting fresh.
    pub fn load(&self) -> Option<Snapshot> {
        let encoded = match self.storage.get(&self.key) {
            Ok(encoded) => encoded?,
            Err(e) => {
                tracing::warn!(key = %self.key, "could not read snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&encoded) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(key = %self.key, "discarding corrupt snapshot: {e}");
                None
            }
        }
    }

    /// Deletes the stored snapshot
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` if the backend cannot be written.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }

    /// The underlying storage
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Gives the underlying storage back
    pub fn into_storage(self) -> S {
        self.storage
    }
}
