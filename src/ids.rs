//! Identifiers used by the attempt runtime
//!
//! Quiz and question identifiers are opaque strings issued by the authoring
//! subsystem. Attempt identifiers are UUIDs issued when an attempt is
//! started server-side and are required before any submission is dispatched.

use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use uuid::Uuid;

/// Identifier of a quiz, used to key the persisted snapshot
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Validate,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
#[garde(transparent)]
pub struct QuizId(#[garde(length(min = 1, max = crate::constants::quiz::MAX_ID_LENGTH))] String);

/// Identifier of a question, used to key answers and results
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Validate,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
#[garde(transparent)]
pub struct QuestionId(
    #[garde(length(min = 1, max = crate::constants::quiz::MAX_ID_LENGTH))] String,
);

impl QuizId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuizId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl QuestionId {
    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuestionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A unique identifier for one learner's attempt
///
/// Serialized as its hyphenated UUID string.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, DeserializeFromStr, SerializeDisplay,
)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random attempt ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    /// Creates a new random attempt ID (same as `new()`)
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AttemptId {
    type Err = uuid::Error;

    /// Parses an attempt ID from a UUID string
    ///
    /// # Errors
    ///
    /// Returns a `uuid::Error` if the string is not a valid UUID.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}
