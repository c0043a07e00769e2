//! Communication with the host environment
//!
//! This module defines the trait for tunneling messages between the attempt
//! engine and whatever renders it. The tunnel abstraction keeps the engine
//! free of any UI toolkit or network client while giving it one consistent
//! outbound interface.

use super::{SyncMessage, UpdateMessage, ids::AttemptId, quiz::submission::SubmissionRequest};

/// Trait for sending messages out of a running attempt
///
/// Implementations might drive a terminal UI, a web view, or a test
/// recorder. The engine is single-threaded, so none of these methods is
/// expected to block.
pub trait Tunnel {
    /// Sends a one-off notification to the learner
    ///
    /// Update messages describe events (time is up, submission failed)
    /// rather than the whole screen.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends the full screen state so the view can re-render
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);

    /// Hands the submission payload to the external scoring service
    ///
    /// The host performs the request and reports the outcome back through
    /// [`crate::attempt::Attempt::receive_submission`]. Only one request is
    /// ever in flight per attempt.
    ///
    /// # Arguments
    ///
    /// * `attempt_id` - The attempt being submitted
    /// * `request` - The encoded answers
    fn dispatch_submission(&self, attempt_id: AttemptId, request: &SubmissionRequest);

    /// Closes the tunnel
    ///
    /// Called once when the attempt is disposed.
    fn close(self);
}
