//! The quiz data model and the pure machinery built on it
//!
//! Everything here is free of I/O: configuration, answers, navigation rules,
//! the submission encoding and the post-submission review.

pub mod answer;
pub mod config;
pub mod navigation;
pub mod results;
pub mod submission;
