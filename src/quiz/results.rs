//! Post-submission review
//!
//! Once the scoring service answers, the attempt hands its questions and the
//! [`SubmissionResult`] to a [`ResultsPresenter`]. The presenter walks the
//! questions one at a time (no transitions or explanations are re-shown)
//! and renders, per question kind, the learner's answer next to the correct
//! one.

use std::collections::BTreeMap;

use enum_map::EnumMap;
use itertools::Itertools;
use once_cell_serde::sync::OnceCell;
use serde::Serialize;
use serde_with::skip_serializing_none;

use super::{
    answer::AnswerValue,
    config::{Question, QuestionKind, QuizQuestion, Settings},
    submission::{CorrectAnswer, SubmissionResult},
};
use crate::{ids::QuestionId, timer::format_clock};

/// Content that may be withheld from the learner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PossiblyHidden<T> {
    /// Content is shown
    Visible(T),
    /// Content is withheld by the quiz settings
    Hidden,
}

/// One matched pair as shown in the review
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairReview {
    /// Text of the left item
    pub left: String,
    /// Text of the right item it was matched with
    pub right: String,
    /// Whether this single pair is right; absent for correct answers and
    /// when correct answers are hidden
    pub is_correct: Option<bool>,
}

/// An answer rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnswerDisplay {
    /// Nothing was given
    Blank,
    /// Option text or typed text; alternatives are joined by "or"
    Text(String),
    /// One line per matched pair
    Pairs(Vec<PairReview>),
}

/// The review of a single question
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionReview {
    /// Zero-based question slot
    pub index: usize,
    /// Number of questions in the review
    pub count: usize,
    /// Question id
    pub question_id: QuestionId,
    /// Question title
    pub title: String,
    /// Question body
    pub content: String,
    /// Optional illustration
    pub image_url: Option<String>,
    /// Human readable kind, e.g. "Multiple Choice"
    pub kind_label: String,
    /// Whether the whole question was answered correctly
    pub is_correct: bool,
    /// Points awarded
    pub points_earned: f64,
    /// Points available
    pub points_possible: f64,
    /// What the learner answered
    pub user_answer: AnswerDisplay,
    /// The accepted answer, unless hidden by the settings
    pub correct_answer: PossiblyHidden<AnswerDisplay>,
    /// Explanation text, if the question has one
    pub explanation: Option<String>,
}

/// Correct and total questions of one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindTally {
    /// Questions of this kind answered correctly
    pub correct: usize,
    /// Questions of this kind
    pub total: usize,
}

/// Per-kind line of the results summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindBreakdown {
    /// Question kind
    pub kind: QuestionKind,
    /// Human readable kind
    pub label: String,
    /// Tally for the kind
    #[serde(flatten)]
    pub tally: KindTally,
}

/// Headline numbers of a scored attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsSummary {
    /// Points earned
    pub score: f64,
    /// Points available
    pub total_points: f64,
    /// Score as a percentage
    pub percentage: f64,
    /// Percentage needed to pass
    pub passing_score: u32,
    /// Whether the percentage reaches the passing score
    pub passed: bool,
    /// Questions answered correctly
    pub correct_count: usize,
    /// Questions in the attempt
    pub question_count: usize,
    /// Time spent, formatted as a clock
    pub time_spent: String,
    /// Kinds present in the quiz, in declaration order
    pub breakdown: Vec<KindBreakdown>,
}

/// Screen state while reviewing a scored attempt
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub enum SyncMessage {
    /// The review screen
    Review {
        /// Headline numbers
        summary: ResultsSummary,
        /// The question on screen; absent for an empty quiz
        review: Option<QuestionReview>,
    },
}

/// Presents a scored attempt question by question
#[derive(Debug, Clone)]
pub struct ResultsPresenter {
    questions: Vec<QuizQuestion>,
    result: SubmissionResult,
    show_correct_answers: bool,
    passing_score: u32,
    index: usize,
    breakdown: OnceCell<EnumMap<QuestionKind, KindTally>>,
}

impl ResultsPresenter {
    /// Creates a presenter positioned on the first question
    ///
    /// # Arguments
    ///
    /// * `questions` - The questions in attempt order
    /// * `result` - The scored attempt
    /// * `settings` - Settings deciding visibility and the pass mark
    pub fn new(questions: Vec<QuizQuestion>, result: SubmissionResult, settings: &Settings) -> Self {
        Self {
            questions,
            result,
            show_correct_answers: settings.show_correct_answers,
            passing_score: settings.passing_score,
            index: 0,
            breakdown: OnceCell::new(),
        }
    }

    /// The scored attempt
    pub fn result(&self) -> &SubmissionResult {
        &self.result
    }

    /// Index of the question on screen
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of reviewable questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether there is nothing to review
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Moves to the next question, stopping at the last
    pub fn next(&mut self) -> bool {
        self.jump(self.index + 1)
    }

    /// Moves to the previous question, stopping at the first
    pub fn previous(&mut self) -> bool {
        self.index.checked_sub(1).is_some_and(|index| self.jump(index))
    }

    /// Moves to the first question
    pub fn first(&mut self) -> bool {
        self.jump(0)
    }

    /// Moves to the last question
    pub fn last(&mut self) -> bool {
        self.len().checked_sub(1).is_some_and(|index| self.jump(index))
    }

    /// Moves to question `index`; out of range requests are ignored
    ///
    /// # Returns
    ///
    /// `true` if the question on screen changed
    pub fn jump(&mut self, index: usize) -> bool {
        if index >= self.len() || index == self.index {
            return false;
        }
        self.index = index;
        true
    }

    /// Renders the review screen
    pub fn state_message(&self) -> SyncMessage {
        SyncMessage::Review {
            summary: self.summary(),
            review: self.current(),
        }
    }

    /// Review of the question on screen
    pub fn current(&self) -> Option<QuestionReview> {
        self.review(self.index)
    }

    /// Review of question `index`
    pub fn review(&self, index: usize) -> Option<QuestionReview> {
        let quiz_question = self.questions.get(index)?;
        let question = &quiz_question.question;
        let result = self.result.result(&question.id);
        if result.is_none() {
            tracing::debug!(question = %question.id, "no scored result for question");
        }
        let correct = result.map_or(&[][..], |result| result.correct_answers.as_slice());
        let correct_matches = matches_of(correct);

        let user_answer = match result.and_then(|result| result.user_answer.as_ref()) {
            Some(answer) => self.display_user_answer(question, answer, &correct_matches),
            None => AnswerDisplay::Blank,
        };
        let correct_answer = if self.show_correct_answers {
            PossiblyHidden::Visible(display_correct_answer(question, correct, &correct_matches))
        } else {
            PossiblyHidden::Hidden
        };

        Some(QuestionReview {
            index,
            count: self.len(),
            question_id: question.id.clone(),
            title: question.title.clone(),
            content: question.content.clone(),
            image_url: question.image_url.clone(),
            kind_label: question.kind.label(),
            is_correct: result.is_some_and(|result| result.is_correct),
            points_earned: result.map_or(0., |result| result.points_earned),
            points_possible: result.map_or(0., |result| result.points_possible),
            user_answer,
            correct_answer,
            explanation: quiz_question.explanation_text().map(ToOwned::to_owned),
        })
    }

    /// Headline numbers of the attempt
    pub fn summary(&self) -> ResultsSummary {
        let breakdown = self.breakdown();
        ResultsSummary {
            score: self.result.score,
            total_points: self.result.total_points,
            percentage: self.result.percentage,
            passing_score: self.passing_score,
            passed: self.result.percentage >= f64::from(self.passing_score),
            correct_count: breakdown.values().map(|tally| tally.correct).sum(),
            question_count: self.len(),
            time_spent: format_clock(self.result.time_spent_seconds),
            breakdown: breakdown
                .iter()
                .filter(|(_, tally)| tally.total > 0)
                .map(|(kind, tally)| KindBreakdown {
                    kind,
                    label: kind.label(),
                    tally: *tally,
                })
                .collect_vec(),
        }
    }

    /// Correct and total questions per kind, computed on first use
    pub fn breakdown(&self) -> &EnumMap<QuestionKind, KindTally> {
        self.breakdown.get_or_init(|| {
            let mut breakdown: EnumMap<QuestionKind, KindTally> = EnumMap::default();
            for quiz_question in &self.questions {
                let tally = &mut breakdown[quiz_question.question.kind];
                tally.total += 1;
                if self
                    .result
                    .result(quiz_question.question_id())
                    .is_some_and(|result| result.is_correct)
                {
                    tally.correct += 1;
                }
            }
            breakdown
        })
    }

    fn display_user_answer(
        &self,
        question: &Question,
        answer: &AnswerValue,
        correct_matches: &BTreeMap<String, String>,
    ) -> AnswerDisplay {
        if question.kind == QuestionKind::MatchingPairs {
            let matches = answer.to_matches();
            return pair_lines(question, &matches, |left, right| {
                self.show_correct_answers
                    .then(|| correct_matches.get(left).is_some_and(|correct| correct == right))
            });
        }
        match answer.as_scalar() {
            Some("") | None => AnswerDisplay::Blank,
            Some(value) if question.kind.is_choice() => AnswerDisplay::Text(choice_text(question, value)),
            Some(value) => AnswerDisplay::Text(value.to_owned()),
        }
    }
}

/// Merges every accepted mapping of a matching question
fn matches_of(correct: &[CorrectAnswer]) -> BTreeMap<String, String> {
    correct
        .iter()
        .flat_map(|answer| answer.content.to_matches())
        .collect()
}

fn display_correct_answer(
    question: &Question,
    correct: &[CorrectAnswer],
    correct_matches: &BTreeMap<String, String>,
) -> AnswerDisplay {
    if question.kind == QuestionKind::MatchingPairs {
        return pair_lines(question, correct_matches, |_, _| None);
    }
    let text = correct
        .iter()
        .filter_map(|answer| answer.content.as_scalar())
        .filter(|value| !value.is_empty())
        .map(|value| {
            if question.kind.is_choice() {
                choice_text(question, value)
            } else {
                value.to_owned()
            }
        })
        .join(" or ");
    if text.is_empty() {
        AnswerDisplay::Blank
    } else {
        AnswerDisplay::Text(text)
    }
}

/// Resolves a choice answer to option text: by id, then by text, else verbatim
fn choice_text(question: &Question, value: &str) -> String {
    question
        .option(value)
        .or_else(|| {
            question
                .options
                .iter()
                .find(|option| option.text.eq_ignore_ascii_case(value))
        })
        .map_or_else(|| value.to_owned(), |option| option.text.clone())
}

/// Renders a left-id to right-id mapping in the question's pair order
fn pair_lines<F>(question: &Question, matches: &BTreeMap<String, String>, judge: F) -> AnswerDisplay
where
    F: Fn(&str, &str) -> Option<bool>,
{
    if matches.is_empty() {
        return AnswerDisplay::Blank;
    }
    let lines = matches
        .iter()
        .sorted_by_key(|(left, _)| {
            question
                .pairs
                .iter()
                .position(|pair| &pair.id == *left)
                .unwrap_or(usize::MAX)
        })
        .map(|(left, right)| PairReview {
            left: question
                .pair(left)
                .map_or_else(|| left.clone(), |pair| pair.left.clone()),
            right: question
                .pair(right)
                .map_or_else(|| right.clone(), |pair| pair.right.clone()),
            is_correct: judge(left.as_str(), right.as_str()),
        })
        .collect_vec();
    AnswerDisplay::Pairs(lines)
}

/// Builds a result for tests and fixtures
#[cfg(test)]
pub(crate) fn question_result(
    question_id: &str,
    user_answer: Option<AnswerValue>,
    correct: Vec<AnswerValue>,
    is_correct: bool,
) -> super::submission::QuestionResult {
    super::submission::QuestionResult {
        question_id: question_id.into(),
        user_answer,
        correct_answers: correct
            .into_iter()
            .enumerate()
            .map(|(i, content)| CorrectAnswer {
                id: format!("c{i}"),
                content,
            })
            .collect(),
        is_correct,
        points_earned: if is_correct { 1. } else { 0. },
        points_possible: 1.,
    }
}
