//! Configuration constants for the quiz attempt runtime
//!
//! This module contains the validation limits applied to an incoming quiz,
//! the timer cadence and the storage key layout used when persisting an
//! in-progress attempt.

/// Quiz-level limits
pub mod quiz {
    /// Maximum length of a quiz title in characters
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum number of questions in a single quiz
    pub const MAX_QUESTION_COUNT: usize = 500;
    /// Maximum number of transitions in a single quiz
    pub const MAX_TRANSITION_COUNT: usize = 500;
    /// Maximum length of a transition's content
    pub const MAX_TRANSITION_LENGTH: usize = 10_000;
    /// Maximum length of any identifier (quiz, question, option, pair)
    pub const MAX_ID_LENGTH: usize = 128;
}

/// Question-level limits
pub mod question {
    /// Maximum length of a question title
    pub const MAX_TITLE_LENGTH: usize = 500;
    /// Maximum length of a question body
    pub const MAX_CONTENT_LENGTH: usize = 20_000;
    /// Maximum length of a post-answer explanation
    pub const MAX_EXPLANATION_LENGTH: usize = 10_000;
    /// Maximum number of options for a choice question
    pub const MAX_OPTION_COUNT: usize = 26;
    /// Maximum number of pairs for a matching question
    pub const MAX_PAIR_COUNT: usize = 26;
    /// Maximum length of option text or a pair side
    pub const MAX_OPTION_LENGTH: usize = 1_000;
    /// Maximum length of an image URL
    pub const MAX_IMAGE_URL_LENGTH: usize = 2_048;
}

/// Attempt settings limits
pub mod settings {
    /// Minimum time limit in minutes when one is set
    pub const MIN_TIME_LIMIT_MINUTES: u32 = 1;
    /// Maximum time limit in minutes (one day)
    pub const MAX_TIME_LIMIT_MINUTES: u32 = 24 * 60;
    /// Minimum allowed attempts per learner
    pub const MIN_MAX_ATTEMPTS: u32 = 1;
    /// Maximum passing score in percent
    pub const MAX_PASSING_SCORE: u32 = 100;
}

/// Countdown timer constants
pub mod timer {
    /// Seconds between two countdown ticks
    pub const TICK_SECONDS: u64 = 1;
}

/// Local persistence constants
pub mod persistence {
    /// Prefix of the storage key; the quiz id is appended
    pub const KEY_PREFIX: &str = "quiz-progress-";
}
