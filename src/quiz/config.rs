//! Quiz definition consumed by the attempt runtime
//!
//! These structures are produced by the authoring subsystem and are
//! read-only to the engine. They are validated once when an attempt is
//! mounted; nothing here is trusted for scoring, only for display.

use std::collections::HashSet;

use enum_map::Enum;
use garde::Validate;
use heck::ToTitleCase;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::{
    constants::{question, quiz, settings},
    ids::{QuestionId, QuizId},
};

/// The kind of a question, which decides how its answer is stored,
/// encoded for submission and presented in review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Single selection among options; the answer is an option id
    MultipleChoice,
    /// Two options ("True"/"False"); the answer is an option id
    TrueFalse,
    /// Left items matched to right items; the answer is a mapping
    MatchingPairs,
    /// Free text of any length
    FreeText,
    /// A short typed answer
    ShortAnswer,
    /// A long typed answer
    LongAnswer,
    /// Source code typed by the learner
    Coding,
}

impl QuestionKind {
    /// Returns the wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::MatchingPairs => "matching_pairs",
            Self::FreeText => "free_text",
            Self::ShortAnswer => "short_answer",
            Self::LongAnswer => "long_answer",
            Self::Coding => "coding",
        }
    }

    /// Returns a human readable label, e.g. "Multiple Choice"
    pub fn label(self) -> String {
        self.as_str().to_title_case()
    }

    /// Whether the answer is an option id
    pub fn is_choice(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::TrueFalse)
    }
}

/// A selectable option of a choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AnswerOption {
    /// Identifier stored as the learner's answer
    #[garde(length(min = 1, max = quiz::MAX_ID_LENGTH))]
    pub id: String,
    /// Display text
    #[garde(length(chars, max = question::MAX_OPTION_LENGTH))]
    pub text: String,
}

/// One left/right pair of a matching question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct MatchingPair {
    /// Identifier used on both sides of the learner's mapping
    #[garde(length(min = 1, max = quiz::MAX_ID_LENGTH))]
    pub id: String,
    /// Text shown in the left column
    #[garde(length(chars, max = question::MAX_OPTION_LENGTH))]
    pub left: String,
    /// Text shown in the right column
    #[garde(length(chars, max = question::MAX_OPTION_LENGTH))]
    pub right: String,
}

/// The question entity itself
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Identifier keying answers and results
    #[garde(dive)]
    pub id: QuestionId,
    /// Short title of the question
    #[garde(length(chars, max = question::MAX_TITLE_LENGTH))]
    pub title: String,
    /// Body of the question
    #[garde(length(chars, max = question::MAX_CONTENT_LENGTH))]
    #[serde(default)]
    pub content: String,
    /// Kind of the question
    #[garde(skip)]
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Optional illustration
    #[garde(length(max = question::MAX_IMAGE_URL_LENGTH))]
    pub image_url: Option<String>,
    /// Options for choice questions
    #[garde(length(max = question::MAX_OPTION_COUNT), dive)]
    #[serde(default)]
    pub options: Vec<AnswerOption>,
    /// Pairs for matching questions
    #[garde(length(max = question::MAX_PAIR_COUNT), dive)]
    #[serde(default)]
    pub pairs: Vec<MatchingPair>,
}

impl Question {
    /// Finds the option with the given id
    pub fn option(&self, id: &str) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == id)
    }

    /// Finds the matching pair with the given id
    pub fn pair(&self, id: &str) -> Option<&MatchingPair> {
        self.pairs.iter().find(|pair| pair.id == id)
    }
}

/// A question placed in a quiz, with its ordering and explanation
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizQuestion {
    /// Identifier of the placement
    #[garde(length(max = quiz::MAX_ID_LENGTH))]
    pub id: String,
    /// Authoring order
    #[garde(skip)]
    #[serde(default)]
    pub order: u32,
    /// Feedback shown once the question is answered
    #[garde(length(chars, max = question::MAX_EXPLANATION_LENGTH))]
    pub explanation: Option<String>,
    /// The question itself
    #[garde(dive)]
    pub question: Question,
}

impl QuizQuestion {
    /// Returns the question id
    pub fn question_id(&self) -> &QuestionId {
        &self.question.id
    }

    /// Returns the explanation if it has visible text
    pub fn explanation_text(&self) -> Option<&str> {
        self.explanation
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// An informational block shown before the question at `position`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QuizTransition {
    /// Identifier of the transition
    #[garde(length(max = quiz::MAX_ID_LENGTH))]
    pub id: String,
    /// Zero-based index of the question this transition precedes
    #[garde(skip)]
    pub position: usize,
    /// Text to display
    #[garde(length(chars, max = quiz::MAX_TRANSITION_LENGTH))]
    pub content: String,
}

/// Attempt-wide settings authored with the quiz
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Countdown length in minutes; no countdown when absent
    #[garde(range(min = settings::MIN_TIME_LIMIT_MINUTES, max = settings::MAX_TIME_LIMIT_MINUTES))]
    pub time_limit_minutes: Option<u32>,
    /// Shuffle question order once per attempt
    #[garde(skip)]
    pub randomize_questions: bool,
    /// Reveal correct answers in the review
    #[garde(skip)]
    pub show_correct_answers: bool,
    /// Attempts allowed per learner
    #[garde(range(min = settings::MIN_MAX_ATTEMPTS))]
    pub max_attempts: u32,
    /// Percentage needed to pass
    #[garde(range(max = settings::MAX_PASSING_SCORE))]
    pub passing_score: u32,
    /// Forbid any backward movement while in test mode
    #[garde(skip)]
    pub exam_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_limit_minutes: None,
            randomize_questions: false,
            show_correct_answers: true,
            max_attempts: 1,
            passing_score: 70,
            exam_mode: false,
        }
    }
}

impl Settings {
    /// Configured countdown in seconds, if any
    pub fn time_limit_seconds(&self) -> Option<u32> {
        self.time_limit_minutes.map(|minutes| minutes * 60)
    }
}

type ValidationResult = garde::Result;

/// Rejects quizzes where two questions share an id, since answers are keyed by it
fn validate_unique_question_ids(questions: &Vec<QuizQuestion>, _ctx: &()) -> ValidationResult {
    let mut seen = HashSet::new();
    match questions
        .iter()
        .find(|question| !seen.insert(question.question_id()))
    {
        Some(duplicate) => Err(garde::Error::new(format!(
            "duplicate question id {}",
            duplicate.question_id()
        ))),
        None => Ok(()),
    }
}

/// A complete quiz: questions, transitions and settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Quiz {
    /// Identifier keying the persisted snapshot
    #[garde(dive)]
    pub id: QuizId,
    /// Title shown above the attempt
    #[garde(length(chars, max = quiz::MAX_TITLE_LENGTH))]
    #[serde(default)]
    pub title: String,
    /// Ordered questions
    #[garde(length(max = quiz::MAX_QUESTION_COUNT), dive, custom(validate_unique_question_ids))]
    pub questions: Vec<QuizQuestion>,
    /// Informational blocks interleaved with the questions
    #[garde(length(max = quiz::MAX_TRANSITION_COUNT), dive)]
    #[serde(default)]
    pub transitions: Vec<QuizTransition>,
    /// Attempt settings
    #[garde(dive)]
    #[serde(default)]
    pub settings: Settings,
}

impl Quiz {
    /// Returns the number of questions in this quiz
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Checks if this quiz contains any questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Finds a question by its id
    pub fn question(&self, id: &QuestionId) -> Option<&QuizQuestion> {
        self.questions
            .iter()
            .find(|question| question.question_id() == id)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn question(id: &str, kind: QuestionKind) -> QuizQuestion {
        let options = match kind {
            QuestionKind::TrueFalse => vec![
                AnswerOption {
                    id: format!("{id}-t"),
                    text: "True".to_string(),
                },
                AnswerOption {
                    id: format!("{id}-f"),
                    text: "False".to_string(),
                },
            ],
            QuestionKind::MultipleChoice => vec![
                AnswerOption {
                    id: format!("{id}-a"),
                    text: "Alpha".to_string(),
                },
                AnswerOption {
                    id: format!("{id}-b"),
                    text: "Beta".to_string(),
                },
            ],
            _ => Vec::new(),
        };
        let pairs = if kind == QuestionKind::MatchingPairs {
            vec![
                MatchingPair {
                    id: "p1".to_string(),
                    left: "Rust".to_string(),
                    right: "Ferris".to_string(),
                },
                MatchingPair {
                    id: "p2".to_string(),
                    left: "Go".to_string(),
                    right: "Gopher".to_string(),
                },
            ]
        } else {
            Vec::new()
        };
        QuizQuestion {
            id: format!("qq-{id}"),
            order: 0,
            explanation: None,
            question: Question {
                id: QuestionId::from(id),
                title: format!("Question {id}"),
                content: String::new(),
                kind,
                image_url: None,
                options,
                pairs,
            },
        }
    }

    pub(crate) fn quiz(questions: Vec<QuizQuestion>) -> Quiz {
        Quiz {
            id: QuizId::from("quiz-1"),
            title: "Test Quiz".to_string(),
            questions,
            transitions: Vec::new(),
            settings: Settings::default(),
        }
    }

    pub(crate) fn transition(position: usize) -> QuizTransition {
        QuizTransition {
            id: format!("t{position}"),
            position,
            content: format!("Before question {position}"),
        }
    }

    #[test]
    fn test_quiz_validation() {
        let quiz = quiz(vec![
            question("q1", QuestionKind::MultipleChoice),
            question("q2", QuestionKind::FreeText),
        ]);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn test_duplicate_question_ids_are_rejected() {
        let quiz = quiz(vec![
            question("q1", QuestionKind::MultipleChoice),
            question("q1", QuestionKind::FreeText),
        ]);
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_time_limit_bounds() {
        let mut quiz = quiz(vec![question("q1", QuestionKind::Coding)]);
        quiz.settings.time_limit_minutes = Some(0);
        assert!(quiz.validate().is_err());
        quiz.settings.time_limit_minutes = Some(settings::MAX_TIME_LIMIT_MINUTES + 1);
        assert!(quiz.validate().is_err());
        quiz.settings.time_limit_minutes = Some(30);
        assert!(quiz.validate().is_ok());
        assert_eq!(quiz.settings.time_limit_seconds(), Some(1800));
    }

    #[test]
    fn test_passing_score_bounds() {
        let mut quiz = quiz(vec![question("q1", QuestionKind::Coding)]);
        quiz.settings.passing_score = 101;
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn test_too_many_options() {
        let mut q = question("q1", QuestionKind::MultipleChoice);
        q.question.options = vec![
            AnswerOption {
                id: "o".to_string(),
                text: "Option".to_string(),
            };
            question::MAX_OPTION_COUNT + 1
        ];
        assert!(quiz(vec![q]).validate().is_err());
    }

    #[test]
    fn test_explanation_text_ignores_blank() {
        let mut q = question("q1", QuestionKind::FreeText);
        assert_eq!(q.explanation_text(), None);
        q.explanation = Some("   ".to_string());
        assert_eq!(q.explanation_text(), None);
        q.explanation = Some("Because.".to_string());
        assert_eq!(q.explanation_text(), Some("Because."));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "id": "quiz-9",
            "questions": [{
                "id": "qq1",
                "order": 1,
                "explanation": "Water is wet.",
                "question": {
                    "id": "q1",
                    "title": "Is water wet?",
                    "content": "",
                    "type": "true_false",
                    "imageUrl": "https://example.com/water.png",
                    "options": [{"id": "o1", "text": "True"}, {"id": "o2", "text": "False"}]
                }
            }],
            "transitions": [{"id": "t0", "position": 0, "content": "Welcome"}],
            "settings": {"timeLimitMinutes": 5, "randomizeQuestions": true, "examMode": true}
        }"#;
        let quiz: Quiz = serde_json::from_str(json).unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz.questions[0].question.kind, QuestionKind::TrueFalse);
        assert_eq!(
            quiz.questions[0].question.image_url.as_deref(),
            Some("https://example.com/water.png")
        );
        assert_eq!(quiz.settings.time_limit_minutes, Some(5));
        assert!(quiz.settings.randomize_questions);
        assert!(quiz.settings.exam_mode);
        assert!(quiz.settings.show_correct_answers);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn test_kind_label() {
        assert_eq!(QuestionKind::MultipleChoice.label(), "Multiple Choice");
        assert_eq!(QuestionKind::TrueFalse.label(), "True False");
        assert!(QuestionKind::TrueFalse.is_choice());
        assert!(!QuestionKind::Coding.is_choice());
    }
}
