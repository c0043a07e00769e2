//! Submission payload and the scoring service's response
//!
//! The engine never scores anything itself. It encodes the stored answers
//! into a [`SubmissionRequest`], hands it to the host, and later receives a
//! [`SubmissionResult`] produced by the external scoring service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    answer::{AnswerStore, AnswerValue},
    config::{Question, QuestionKind, QuizQuestion},
};
use crate::ids::{AttemptId, QuestionId, QuizId};

/// The payload sent to the scoring service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    /// Encoded answers keyed by question id
    pub answers: BTreeMap<QuestionId, AnswerValue>,
}

impl SubmissionRequest {
    /// Encodes every stored answer for the scoring service
    ///
    /// True/false answers are stored as option ids but scored by literal
    /// text, so they are resolved against the question's options and
    /// lowercased ("True" becomes "true"). Every other kind passes through
    /// unchanged. Entries whose question is unknown are forwarded as stored.
    ///
    /// # Arguments
    ///
    /// * `questions` - The questions of the attempt
    /// * `answers` - The answers to encode
    pub fn from_answers(questions: &[QuizQuestion], answers: &AnswerStore) -> Self {
        let answers = answers
            .iter()
            .map(|(question_id, value)| {
                let encoded = questions
                    .iter()
                    .find(|question| question.question_id() == question_id)
                    .map_or_else(|| value.clone(), |question| encode(&question.question, value));
                (question_id.clone(), encoded)
            })
            .collect();
        Self { answers }
    }
}

fn encode(question: &Question, value: &AnswerValue) -> AnswerValue {
    match (question.kind, value) {
        (QuestionKind::TrueFalse, AnswerValue::Scalar(option_id)) => question
            .option(option_id)
            .map_or_else(|| value.clone(), |option| option.text.to_lowercase().into()),
        _ => value.clone(),
    }
}

/// One accepted answer of a question, as reported by the scoring service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectAnswer {
    /// Identifier of the accepted answer
    pub id: String,
    /// An option id, accepted text, or a left-to-right mapping (possibly JSON-encoded)
    pub content: AnswerValue,
}

/// The scored outcome of one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    /// Question this result belongs to
    pub question_id: QuestionId,
    /// The answer as the service received it; matchings may arrive JSON-encoded
    #[serde(default)]
    pub user_answer: Option<AnswerValue>,
    /// Every accepted answer
    #[serde(default)]
    pub correct_answers: Vec<CorrectAnswer>,
    /// Whether the whole question was answered correctly
    pub is_correct: bool,
    /// Points awarded
    pub points_earned: f64,
    /// Points available
    pub points_possible: f64,
}

/// The scored attempt returned by the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    /// The attempt that was scored
    pub attempt_id: AttemptId,
    /// The quiz that was attempted
    pub quiz_id: QuizId,
    /// Points earned in total
    pub score: f64,
    /// Points available in total
    pub total_points: f64,
    /// Score as a percentage of the total
    pub percentage: f64,
    /// Per-question outcomes
    pub results: Vec<QuestionResult>,
    /// Time spent on the attempt, in seconds
    pub time_spent_seconds: u64,
}

impl SubmissionResult {
    /// Finds the result of a question
    pub fn result(&self, question_id: &QuestionId) -> Option<&QuestionResult> {
        self.results
            .iter()
            .find(|result| &result.question_id == question_id)
    }
}

/// A failed submission, reported by the host
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionError {
    /// The scoring service could not be reached
    #[error("network error: {0}")]
    Network(String),
    /// The scoring service refused the submission
    #[error("the submission was rejected: {0}")]
    Rejected(String),
}
