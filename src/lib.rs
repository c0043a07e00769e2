//! # Quiz Attempt Library
//!
//! This library provides the runtime of a single learner's quiz attempt.
//! It sequences the learner through transitions, questions and
//! explanations under the active navigation mode, tracks answers, runs the
//! countdown that can force submission, persists in-progress state for
//! resume-on-reload, encodes the submission payload and presents the scored
//! review.
//!
//! The library performs no I/O of its own beyond the [`persistence::Storage`]
//! it is given. The host drives an [`attempt::Attempt`] through handler
//! calls, delivers scheduled [`AlarmMessage`]s back to it, and receives
//! output through a [`session::Tunnel`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use serde::{Deserialize, Serialize};

pub mod attempt;
pub mod constants;
pub mod ids;
pub mod persistence;
pub mod quiz;
pub mod session;
pub mod timer;

/// Messages describing the whole screen
///
/// A sync message carries everything the view needs to re-render, so a
/// host can always recover from a missed update by requesting one.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Screens shown while the attempt is taken or submitted
    Attempt(attempt::SyncMessage),
    /// The scored review
    Results(quiz::results::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages announcing a single event
///
/// Update messages notify the learner of something that happened, such as
/// the countdown moving or a submission failing, without re-sending the
/// whole screen.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, derive_more::From)]
pub enum UpdateMessage {
    /// Attempt lifecycle events
    Attempt(attempt::UpdateMessage),
    /// Countdown events
    Timer(timer::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// The host schedules these with the requested delay and delivers them
/// back through [`attempt::Attempt::receive_alarm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown alarms
    Timer(timer::AlarmMessage),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_update_message_to_message() {
        let message = UpdateMessage::Timer(timer::UpdateMessage::remaining(75));
        let json = message.to_message();

        assert!(json.contains("Timer"));
        assert!(json.contains("TimeRemaining"));
        assert!(json.contains("01:15"));
    }

    #[test]
    fn test_sync_message_to_message() {
        let message = SyncMessage::Attempt(attempt::SyncMessage::Loading);
        assert_eq!(message.to_message(), r#"{"Attempt":"Loading"}"#);
    }

    #[test]
    fn test_alarm_message_round_trip() {
        let alarm: AlarmMessage = timer::AlarmMessage::Tick { generation: 4 }.into();
        let json = serde_json::to_string(&alarm).unwrap();
        assert_eq!(serde_json::from_str::<AlarmMessage>(&json).unwrap(), alarm);
    }
}
