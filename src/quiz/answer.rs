//! Per-question answers of an attempt
//!
//! The store is deliberately permissive: it never validates a value against
//! the question kind, so partially typed text and incomplete matchings can
//! be held mid-edit.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::ids::QuestionId;

/// A learner's answer to one question
///
/// Choice questions hold the selected option id, text questions hold the
/// typed text and matching questions hold a left-id to right-id mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::From)]
#[serde(untagged)]
pub enum AnswerValue {
    /// An option id or free text
    Scalar(String),
    /// Matching pairs: left id to chosen right id
    Matches(BTreeMap<String, String>),
}

impl AnswerValue {
    /// A scalar is answered when non-empty, a matching when it has a key
    pub fn is_answered(&self) -> bool {
        match self {
            Self::Scalar(value) => !value.is_empty(),
            Self::Matches(matches) => !matches.is_empty(),
        }
    }

    /// Returns the scalar text, if this is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Matches(_) => None,
        }
    }

    /// Reads the value as a matching
    ///
    /// Scoring services return matchings as a JSON-encoded string, so a
    /// scalar is parsed as JSON. Anything unparseable yields no matches.
    pub fn to_matches(&self) -> BTreeMap<String, String> {
        match self {
            Self::Matches(matches) => matches.clone(),
            Self::Scalar(encoded) => serde_json::from_str(encoded).unwrap_or_default(),
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_owned())
    }
}

/// Answers keyed by question id; absence means unanswered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: BTreeMap<QuestionId, AnswerValue>,
}

impl AnswerStore {
    /// Replaces the answer of a question wholesale
    ///
    /// Matchings are never merged: the caller passes the full mapping.
    pub fn set(&mut self, question_id: QuestionId, value: AnswerValue) {
        self.answers.insert(question_id, value);
    }

    /// Returns the stored answer of a question
    pub fn get(&self, question_id: &QuestionId) -> Option<&AnswerValue> {
        self.answers.get(question_id)
    }

    /// Whether the question holds a non-empty answer
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.answers
            .get(question_id)
            .is_some_and(AnswerValue::is_answered)
    }

    /// Keeps only the entries whose question id passes `keep`
    pub fn retain<F: FnMut(&QuestionId) -> bool>(&mut self, mut keep: F) {
        self.answers.retain(|question_id, _| keep(question_id));
    }

    /// Number of stored answers that count as answered
    pub fn answered_count(&self) -> usize {
        self.answers
            .values()
            .filter(|value| value.is_answered())
            .count()
    }

    /// Answered share of `total` questions, in percent
    pub fn progress_percent(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.;
        }
        (self.answered_count() as f64 * 100.) / total as f64
    }

    /// Iterates over every stored entry, answered or not
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.answers.iter()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether nothing has been stored yet
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Question ids, among `ids`, without an answer
    pub fn unanswered<'a, I>(&self, ids: I) -> Vec<&'a QuestionId>
    where
        I: IntoIterator<Item = &'a QuestionId>,
    {
        ids.into_iter()
            .filter(|id| !self.is_answered(id))
            .collect_vec()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn matches(pairs: &[(&str, &str)]) -> AnswerValue {
        AnswerValue::Matches(
            pairs
                .iter()
                .map(|(l, r)| ((*l).to_string(), (*r).to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_progress_counts_only_answered_entries() {
        let mut store = AnswerStore::default();
        store.set("q1".into(), "opt-a".into());
        store.set("q2".into(), matches(&[]));
        store.set("q3".into(), matches(&[("p1", "p2")]));

        assert_eq!(store.len(), 3);
        assert_eq!(store.answered_count(), 2);
        assert!((store.progress_percent(5) - 40.).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_scalar_is_unanswered() {
        let mut store = AnswerStore::default();
        store.set("q1".into(), "".into());
        assert!(!store.is_answered(&"q1".into()));
        assert!(!store.is_answered(&"missing".into()));
        store.set("q1".into(), "x".into());
        assert!(store.is_answered(&"q1".into()));
    }

    #[test]
    fn test_set_replaces_without_merging() {
        let mut store = AnswerStore::default();
        store.set("q1".into(), matches(&[("p1", "p1"), ("p2", "p1")]));
        store.set("q1".into(), matches(&[("p2", "p2")]));
        assert_eq!(store.get(&"q1".into()), Some(&matches(&[("p2", "p2")])));
    }

    #[test]
    fn test_progress_of_empty_quiz() {
        assert!(AnswerStore::default().progress_percent(0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_answer_value_json_shape() {
        let scalar: AnswerValue = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(scalar, AnswerValue::Scalar("abc".to_string()));
        let object: AnswerValue = serde_json::from_str(r#"{"p1":"p2"}"#).unwrap();
        assert_eq!(object, matches(&[("p1", "p2")]));
        assert_eq!(serde_json::to_string(&object).unwrap(), r#"{"p1":"p2"}"#);
    }

    #[test]
    fn test_to_matches_parses_encoded_string() {
        let encoded = AnswerValue::Scalar(r#"{"p1":"p1","p2":"p1"}"#.to_string());
        assert_eq!(encoded.to_matches().len(), 2);
        assert!(AnswerValue::Scalar("garbage".to_string()).to_matches().is_empty());
    }

    #[test]
    fn test_unanswered_lists_missing_ids() {
        let mut store = AnswerStore::default();
        store.set("q1".into(), "a".into());
        let ids: Vec<QuestionId> = vec!["q1".into(), "q2".into()];
        assert_eq!(store.unanswered(&ids), vec![&QuestionId::from("q2")]);
    }
}
