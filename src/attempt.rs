//! The attempt orchestrator
//!
//! An [`Attempt`] owns every piece of one learner's run through a quiz: the
//! answers, the navigation cursor, the countdown and the persisted snapshot.
//! The host drives it with handler calls (`next`, `set_answer`, `submit`,
//! ...), delivers scheduled alarms through [`Attempt::receive_alarm`] and
//! reports the scoring service's answer through
//! [`Attempt::receive_submission`]. Everything the learner should see goes
//! out through the [`Tunnel`].
//!
//! The attempt moves through three phases:
//!
//! 1. **Taking**: navigation and answering, with the snapshot written after
//!    every change
//! 2. **Submitting**: the snapshot is cleared and the payload is in flight
//! 3. **Reviewing**: the scored review is on screen

use std::collections::{BTreeSet, HashMap};

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;
use web_time::Duration;

use crate::{
    ids::{AttemptId, QuestionId},
    persistence::{Persistence, Snapshot, Storage, now_millis},
    quiz::{
        answer::{AnswerStore, AnswerValue},
        config::{Question, Quiz, QuizQuestion},
        navigation::{Mode, Move, Navigator, Position, Sequence, Step},
        results::ResultsPresenter,
        submission::{SubmissionError, SubmissionRequest, SubmissionResult},
    },
    session::Tunnel,
    timer::{self, TickOutcome, TimerController, format_clock},
};

/// Errors returned by attempt operations
#[derive(Error, Debug)]
pub enum Error {
    /// The quiz failed validation and cannot be attempted
    #[error("the quiz is invalid: {0}")]
    InvalidQuiz(#[from] garde::Report),
    /// No attempt id is known; the learner has to restart the attempt
    #[error("no attempt id is known, restart the attempt")]
    MissingAttempt,
    /// A submission is already in flight
    #[error("a submission is already in flight")]
    AlreadySubmitting,
    /// The attempt has already been scored
    #[error("the attempt is no longer being taken")]
    NotTaking,
}

/// Per-attempt options supplied by the host at mount
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MountOptions {
    /// Identifier of the attempt, issued by the backend when it started
    pub attempt_id: Option<AttemptId>,
    /// Whether this is a test (locked answers) rather than practice
    pub test_mode: bool,
    /// Seed for the question shuffle; random when absent
    pub seed: Option<u64>,
}

/// Lifecycle phase of an attempt
#[derive(Debug, Clone)]
pub enum Phase {
    /// The learner is navigating and answering
    Taking,
    /// The payload has been handed to the scoring service
    Submitting,
    /// The scored review is on screen
    Reviewing(Box<ResultsPresenter>),
}

/// Keyboard shortcuts understood by the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    /// Jump to the first step
    Home,
    /// Jump to the last step
    End,
    /// Step back
    ArrowLeft,
    /// Step forward
    ArrowRight,
}

/// Where keyboard focus was when a key was pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Focus {
    /// A text input, text area or code editor; shortcuts move its caret instead
    TextEntry,
    /// Anywhere else
    Elsewhere,
}

/// Attempt lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// The learner moved past the end; ask before submitting
    ConfirmSubmit {
        /// Questions still without an answer
        unanswered: usize,
        /// Ready-to-show confirmation text
        message: String,
    },
    /// The submission has been dispatched
    Submitting,
    /// The scoring service failed; the learner may submit again
    SubmissionFailed {
        /// Human readable reason
        reason: String,
    },
    /// The attempt cannot be submitted and has to be restarted
    RestartRequired,
}

/// Answered share and countdown shown above every step
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Questions with an answer
    pub answered: usize,
    /// Questions in the quiz
    pub total: usize,
    /// Answered share in percent
    pub percent: f64,
    /// Seconds left, when a time limit applies
    pub time_remaining: Option<u32>,
    /// Seconds left as a clock
    pub clock: Option<String>,
}

/// Which navigation affordances are enabled
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Controls {
    /// Previous would move
    pub previous: bool,
    /// First would move
    pub first: bool,
    /// Last would move
    pub last: bool,
    /// Next opens the submit confirmation
    pub submit: bool,
}

/// One question in the sidebar
#[derive(Debug, Clone, Serialize)]
pub struct SidebarEntry {
    /// Question slot
    pub index: usize,
    /// Question title
    pub title: String,
    /// Whether it has an answer
    pub answered: bool,
    /// Whether it was locked in test mode
    pub locked: bool,
    /// Whether clicking it would jump there
    pub reachable: bool,
    /// Whether the cursor is on this slot
    pub current: bool,
}

/// Everything shown around the current step
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Title of the quiz
    pub quiz_title: String,
    /// The cursor
    pub position: Position,
    /// Active navigation mode
    pub mode: Mode,
    /// Answered share and countdown
    pub progress: Progress,
    /// Enabled affordances
    pub controls: Controls,
    /// One entry per question
    pub sidebar: Vec<SidebarEntry>,
}

/// Screens shown while an attempt is taken or submitted
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all_fields = "camelCase")]
pub enum SyncMessage {
    /// The quiz has no questions yet
    Loading,
    /// An informational block
    Transition {
        /// Surrounding state
        frame: Frame,
        /// Text of the transition
        content: String,
    },
    /// A question to answer
    Question {
        /// Surrounding state
        frame: Frame,
        /// The question
        question: Question,
        /// The stored answer, if any
        answer: Option<AnswerValue>,
        /// Whether editing is locked
        locked: bool,
    },
    /// Feedback after answering
    Explanation {
        /// Surrounding state
        frame: Frame,
        /// Title of the explained question
        question_title: String,
        /// The explanation text
        explanation: String,
    },
    /// The payload is with the scoring service
    Submitting {
        /// Progress at the time of submission
        progress: Progress,
    },
}

/// One learner's run through a quiz
#[derive(Debug)]
pub struct Attempt<T: Tunnel, S: Storage> {
    /// The quiz, with questions in attempt order
    quiz: Quiz,
    answers: AnswerStore,
    navigator: Navigator,
    timer: TimerController,
    persistence: Persistence<S>,
    tunnel: T,
    attempt_id: Option<AttemptId>,
    phase: Phase,
}

/// Reorders `questions` to a persisted order
///
/// Returns `false`, leaving `questions` untouched, unless `order` is a
/// permutation of the question ids.
fn restore_order(questions: &mut [QuizQuestion], order: &[QuestionId]) -> bool {
    let rank: HashMap<&QuestionId, usize> = order
        .iter()
        .enumerate()
        .map(|(rank, question_id)| (question_id, rank))
        .collect();
    if rank.len() != questions.len()
        || order.len() != questions.len()
        || questions
            .iter()
            .any(|question| !rank.contains_key(question.question_id()))
    {
        return false;
    }
    questions.sort_by_key(|question| {
        rank.get(question.question_id())
            .copied()
            .unwrap_or(usize::MAX)
    });
    true
}

/// Ids of the questions a snapshot locked
///
/// Slot indices refer to the snapshot's own order, or to the quiz's list
/// order when the snapshot recorded none.
fn locked_question_ids(questions: &[QuizQuestion], snapshot: &Snapshot) -> Vec<QuestionId> {
    snapshot
        .locked_questions
        .iter()
        .filter_map(|&index| {
            if snapshot.question_order.is_empty() {
                questions.get(index).map(|question| question.question_id().clone())
            } else {
                snapshot.question_order.get(index).cloned()
            }
        })
        .collect_vec()
}

/// Slot indices of `locked_ids` in the current question order
fn relock(questions: &[QuizQuestion], locked_ids: &[QuestionId]) -> BTreeSet<usize> {
    questions
        .iter()
        .positions(|question| locked_ids.contains(question.question_id()))
        .collect()
}

/// Where a reshuffled resume starts: the first question not yet locked
///
/// `None` without locks, leaving the cursor at the first step.
fn first_unlocked(len: usize, locked: &BTreeSet<usize>) -> Option<Position> {
    if locked.is_empty() {
        return None;
    }
    (0..len)
        .find(|index| !locked.contains(index))
        .or_else(|| locked.last().copied())
        .map(|index| Position::Question { index })
}

fn shuffle(questions: &mut [QuizQuestion], seed: Option<u64>) {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed).shuffle(questions),
        None => fastrand::shuffle(questions),
    }
}

impl<T: Tunnel, S: Storage> Attempt<T, S> {
    /// Validates the quiz, restores any snapshot and starts the attempt
    ///
    /// A snapshot whose shuffled order no longer matches the quiz keeps its
    /// answers, time and locked questions but restarts at the first step, or
    /// at the first unlocked question when some are locked. If the restored
    /// countdown is already at zero the attempt is submitted immediately.
    ///
    /// # Arguments
    ///
    /// * `quiz` - The quiz to attempt
    /// * `options` - Attempt id, mode and shuffle seed
    /// * `storage` - Where the snapshot lives
    /// * `tunnel` - Where output goes
    /// * `schedule_message` - Function to schedule the first countdown tick
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidQuiz` if the quiz fails validation.
    pub fn mount<F: FnMut(crate::AlarmMessage, Duration)>(
        mut quiz: Quiz,
        options: MountOptions,
        storage: S,
        tunnel: T,
        schedule_message: F,
    ) -> Result<Self, Error> {
        quiz.validate()?;

        let mode = Mode::new(options.test_mode, quiz.settings.exam_mode);
        let persistence = Persistence::new(storage, &quiz.id);
        let snapshot = persistence.load();

        let mut reshuffled = false;
        let mut locked_ids = Vec::new();
        if quiz.settings.randomize_questions {
            let restored = snapshot.as_ref().is_some_and(|snapshot| {
                restore_order(&mut quiz.questions, &snapshot.question_order)
            });
            if !restored {
                if let Some(snapshot) = &snapshot {
                    locked_ids = locked_question_ids(&quiz.questions, snapshot);
                }
                shuffle(&mut quiz.questions, options.seed);
                reshuffled = true;
            }
        }

        let resumed = snapshot.is_some();
        let (mut answers, position, locked, restored_time) = match snapshot {
            Some(snapshot) if reshuffled => {
                let locked = relock(&quiz.questions, &locked_ids);
                (
                    snapshot.answers,
                    first_unlocked(quiz.len(), &locked),
                    locked,
                    Some(snapshot.time_remaining),
                )
            }
            Some(snapshot) => (
                snapshot.answers,
                Some(snapshot.current_position),
                snapshot.locked_questions,
                Some(snapshot.time_remaining),
            ),
            None => (AnswerStore::default(), None, BTreeSet::new(), None),
        };
        answers.retain(|question_id| quiz.question(question_id).is_some());

        let navigator = Navigator::restore(
            mode,
            &Sequence::new(&quiz.questions, &quiz.transitions, &answers),
            position,
            locked,
        );
        let timer = TimerController::configure(&quiz.settings, restored_time, mode);

        tracing::info!(
            quiz = %quiz.id,
            ?mode,
            resumed,
            questions = quiz.len(),
            "mounted attempt"
        );

        let mut attempt = Self {
            quiz,
            answers,
            navigator,
            timer,
            persistence,
            tunnel,
            attempt_id: options.attempt_id,
            phase: Phase::Taking,
        };

        if attempt.timer.expire_if_elapsed() {
            attempt.time_up();
        } else {
            attempt.timer.start(schedule_message);
            attempt.persist();
            attempt.send_state();
        }

        Ok(attempt)
    }

    /// Moves forward; past the end this asks for submit confirmation
    pub fn next(&mut self) -> Move {
        self.dispatch("next", Navigator::next, ResultsPresenter::next)
    }

    /// Moves back one step
    pub fn previous(&mut self) -> Move {
        self.dispatch("previous", Navigator::previous, ResultsPresenter::previous)
    }

    /// Jumps to the first step
    pub fn first(&mut self) -> Move {
        self.dispatch("first", Navigator::first, ResultsPresenter::first)
    }

    /// Jumps to the last step
    pub fn last(&mut self) -> Move {
        self.dispatch("last", Navigator::last, ResultsPresenter::last)
    }

    /// Jumps straight to question `index`
    pub fn jump_to_question(&mut self, index: usize) -> Move {
        self.dispatch(
            "jump",
            |navigator, sequence| navigator.jump(sequence, index),
            |presenter| presenter.jump(index),
        )
    }

    /// Handles a keyboard shortcut
    ///
    /// Home, End, ← and → map to first, last, previous and next. Keys
    /// pressed inside a text-entry control are left to that control.
    pub fn handle_key(&mut self, key: Key, focus: Focus) -> Move {
        if focus == Focus::TextEntry {
            return Move::Ignored;
        }
        match key {
            Key::Home => self.first(),
            Key::End => self.last(),
            Key::ArrowLeft => self.previous(),
            Key::ArrowRight => self.next(),
        }
    }

    /// Replaces the answer of a question
    ///
    /// Ignored outside the taking phase, once time is up, for unknown
    /// question ids and for questions locked in test mode.
    ///
    /// # Returns
    ///
    /// `true` if the answer was stored
    pub fn set_answer(&mut self, question_id: QuestionId, value: AnswerValue) -> bool {
        if !matches!(self.phase, Phase::Taking) {
            tracing::debug!(question = %question_id, "answer ignored outside of taking");
            return false;
        }
        if self.timer.is_expired() {
            tracing::debug!(question = %question_id, "answer ignored after time is up");
            return false;
        }
        let Some(index) = self
            .quiz
            .questions
            .iter()
            .position(|question| question.question_id() == &question_id)
        else {
            tracing::debug!(question = %question_id, "answer for unknown question ignored");
            return false;
        };
        if self.navigator.is_locked(index) {
            tracing::debug!(question = %question_id, "answer for locked question ignored");
            return false;
        }

        self.answers.set(question_id, value);
        self.navigator.reconcile(&Sequence::new(
            &self.quiz.questions,
            &self.quiz.transitions,
            &self.answers,
        ));
        self.persist();
        self.send_state();
        true
    }

    /// Submits the attempt at the learner's request
    ///
    /// # Errors
    ///
    /// * `Error::AlreadySubmitting` while a submission is in flight
    /// * `Error::NotTaking` once the attempt has been scored
    /// * `Error::MissingAttempt` if no attempt id is known; the snapshot is
    ///   left in place
    pub fn submit(&mut self) -> Result<(), Error> {
        self.begin_submission()
    }

    /// Handles a scheduled alarm
    ///
    /// # Arguments
    ///
    /// * `message` - The alarm that fired
    /// * `schedule_message` - Function to schedule the following alarm
    pub fn receive_alarm<F: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: crate::AlarmMessage,
        schedule_message: F,
    ) {
        let crate::AlarmMessage::Timer(message) = message;
        if !matches!(self.phase, Phase::Taking) {
            return;
        }
        match self.timer.receive_alarm(message, schedule_message) {
            TickOutcome::Ticked(remaining) => {
                self.persist();
                self.tunnel
                    .send_message(&timer::UpdateMessage::remaining(remaining).into());
            }
            TickOutcome::Expired => self.time_up(),
            TickOutcome::Ignored => {}
        }
    }

    /// Handles the scoring service's answer
    ///
    /// A result opens the review. A result scored for another attempt or
    /// quiz is ignored and the submission stays in flight. A failure returns
    /// to taking with the in-memory answers intact; the countdown is not
    /// restarted, and once time is up only [`Attempt::submit`] is accepted.
    pub fn receive_submission(&mut self, outcome: Result<SubmissionResult, SubmissionError>) {
        if !matches!(self.phase, Phase::Submitting) {
            tracing::debug!("submission outcome ignored, nothing in flight");
            return;
        }
        match outcome {
            Ok(result)
                if self.attempt_id != Some(result.attempt_id) || result.quiz_id != self.quiz.id =>
            {
                tracing::warn!(
                    quiz = %self.quiz.id,
                    result_quiz = %result.quiz_id,
                    result_attempt = %result.attempt_id,
                    "result for another attempt ignored"
                );
                return;
            }
            Ok(result) => {
                tracing::info!(
                    attempt = %result.attempt_id,
                    percentage = result.percentage,
                    "attempt scored"
                );
                self.phase = Phase::Reviewing(Box::new(ResultsPresenter::new(
                    self.quiz.questions.clone(),
                    result,
                    &self.quiz.settings,
                )));
            }
            Err(e) => {
                tracing::warn!(quiz = %self.quiz.id, "submission failed: {e}");
                self.phase = Phase::Taking;
                self.tunnel.send_message(
                    &UpdateMessage::SubmissionFailed {
                        reason: e.to_string(),
                    }
                    .into(),
                );
            }
        }
        self.send_state();
    }

    /// Sets the attempt id once the backend has issued it
    pub fn set_attempt_id(&mut self, attempt_id: AttemptId) {
        self.attempt_id = Some(attempt_id);
    }

    /// Renders the current screen
    pub fn state_message(&self) -> crate::SyncMessage {
        match &self.phase {
            Phase::Reviewing(presenter) => presenter.state_message().into(),
            Phase::Submitting => SyncMessage::Submitting {
                progress: self.progress(),
            }
            .into(),
            Phase::Taking => self.taking_state().into(),
        }
    }

    /// Stops the countdown, closes the tunnel and hands the storage back
    ///
    /// Ticks still queued by the host become stale. An unsubmitted
    /// snapshot stays in storage for the next mount.
    pub fn dispose(mut self) -> S {
        tracing::debug!(quiz = %self.quiz.id, "disposing attempt");
        self.timer.stop();
        self.tunnel.close();
        self.persistence.into_storage()
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The cursor; `None` while the quiz has no questions
    pub fn position(&self) -> Option<Position> {
        self.navigator.position()
    }

    /// Active navigation mode
    pub fn mode(&self) -> Mode {
        self.navigator.mode()
    }

    /// Stored answers
    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Questions in attempt order
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.quiz.questions
    }

    /// Seconds left, when a time limit applies
    pub fn time_remaining(&self) -> Option<u32> {
        self.timer.remaining()
    }

    /// Known attempt id
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    /// The storage holding the snapshot
    pub fn storage(&self) -> &S {
        self.persistence.storage()
    }

    fn dispatch<N, R>(&mut self, action: &'static str, taking: N, reviewing: R) -> Move
    where
        N: FnOnce(&mut Navigator, &Sequence<'_>) -> Move,
        R: FnOnce(&mut ResultsPresenter) -> bool,
    {
        match self.phase {
            Phase::Taking if self.timer.is_expired() => {
                tracing::debug!(action, "navigation ignored after time is up");
                Move::Ignored
            }
            Phase::Taking => self.navigate(action, taking),
            Phase::Reviewing(_) => self.review(reviewing),
            Phase::Submitting => {
                tracing::debug!(action, "navigation ignored while submitting");
                Move::Ignored
            }
        }
    }

    fn navigate<N>(&mut self, action: &'static str, step: N) -> Move
    where
        N: FnOnce(&mut Navigator, &Sequence<'_>) -> Move,
    {
        let sequence = Sequence::new(&self.quiz.questions, &self.quiz.transitions, &self.answers);
        let outcome = step(&mut self.navigator, &sequence);
        match outcome {
            Move::Moved(to) => {
                tracing::debug!(action, ?to, "moved");
                self.persist();
                self.send_state();
            }
            Move::ConfirmSubmit => self.confirm_submit(),
            Move::Ignored => {
                tracing::debug!(action, mode = ?self.navigator.mode(), "navigation ignored");
            }
        }
        outcome
    }

    fn review<R>(&mut self, step: R) -> Move
    where
        R: FnOnce(&mut ResultsPresenter) -> bool,
    {
        let Phase::Reviewing(presenter) = &mut self.phase else {
            return Move::Ignored;
        };
        if !step(&mut **presenter) {
            return Move::Ignored;
        }
        let index = presenter.index();
        self.send_state();
        Move::Moved(Position::Question { index })
    }

    fn confirm_submit(&self) {
        let unanswered = self
            .answers
            .unanswered(self.quiz.questions.iter().map(QuizQuestion::question_id))
            .len();
        let message = if unanswered == 0 {
            "All questions are answered.".to_owned()
        } else {
            format!(
                "You have {unanswered} unanswered {}.",
                pluralizer::pluralize(
                    "question",
                    isize::try_from(unanswered).unwrap_or(isize::MAX),
                    false
                )
            )
        };
        self.tunnel.send_message(
            &UpdateMessage::ConfirmSubmit {
                unanswered,
                message,
            }
            .into(),
        );
    }

    fn time_up(&mut self) {
        tracing::warn!(quiz = %self.quiz.id, "time is up, submitting");
        self.persist();
        self.tunnel.send_message(&timer::UpdateMessage::TimeUp.into());
        if let Err(e) = self.begin_submission() {
            tracing::warn!(quiz = %self.quiz.id, "forced submission failed: {e}");
            self.send_state();
        }
    }

    /// The one guarded path shared by learner and countdown submissions
    fn begin_submission(&mut self) -> Result<(), Error> {
        match self.phase {
            Phase::Taking => {}
            Phase::Submitting => return Err(Error::AlreadySubmitting),
            Phase::Reviewing(_) => return Err(Error::NotTaking),
        }
        let Some(attempt_id) = self.attempt_id else {
            tracing::warn!(quiz = %self.quiz.id, "cannot submit without an attempt id");
            self.tunnel
                .send_message(&UpdateMessage::RestartRequired.into());
            return Err(Error::MissingAttempt);
        };

        self.timer.stop();
        // cleared before dispatch so a reload cannot resume an attempt about to be scored
        if let Err(e) = self.persistence.clear() {
            tracing::warn!(key = self.persistence.key(), "could not clear snapshot: {e}");
        }
        let request = SubmissionRequest::from_answers(&self.quiz.questions, &self.answers);
        self.phase = Phase::Submitting;

        tracing::info!(
            attempt = %attempt_id,
            answered = self.answers.answered_count(),
            questions = self.quiz.len(),
            "dispatching submission"
        );
        self.tunnel.send_message(&UpdateMessage::Submitting.into());
        self.send_state();
        self.tunnel.dispatch_submission(attempt_id, &request);
        Ok(())
    }

    fn persist(&mut self) {
        if !matches!(self.phase, Phase::Taking) {
            return;
        }
        let Some(position) = self.navigator.position() else {
            return;
        };
        let snapshot = Snapshot {
            answers: self.answers.clone(),
            current_position: position,
            time_remaining: self.timer.remaining(),
            last_saved: now_millis(),
            question_order: if self.quiz.settings.randomize_questions {
                self.quiz
                    .questions
                    .iter()
                    .map(|question| question.question_id().clone())
                    .collect_vec()
            } else {
                Vec::new()
            },
            locked_questions: self.navigator.locked().clone(),
        };
        if let Err(e) = self.persistence.save(&snapshot) {
            tracing::warn!(key = self.persistence.key(), "could not save snapshot: {e}");
        }
    }

    fn send_state(&self) {
        self.tunnel.send_state(&self.state_message());
    }

    fn progress(&self) -> Progress {
        let total = self.quiz.len();
        let time_remaining = self.timer.remaining();
        Progress {
            answered: self.answers.answered_count(),
            total,
            percent: self.answers.progress_percent(total),
            time_remaining,
            clock: time_remaining.map(|seconds| format_clock(u64::from(seconds))),
        }
    }

    fn taking_state(&self) -> SyncMessage {
        let Some(position) = self.navigator.position() else {
            return SyncMessage::Loading;
        };
        let sequence = Sequence::new(&self.quiz.questions, &self.quiz.transitions, &self.answers);
        let open = !self.timer.is_expired();
        let frame = Frame {
            quiz_title: self.quiz.title.clone(),
            position,
            mode: self.navigator.mode(),
            progress: self.progress(),
            controls: Controls {
                previous: open && self.navigator.can_previous(&sequence),
                first: open && self.navigator.can_first(&sequence),
                last: open && self.navigator.can_last(&sequence),
                submit: sequence.next(position) == Step::End,
            },
            sidebar: self
                .quiz
                .questions
                .iter()
                .enumerate()
                .map(|(index, question)| SidebarEntry {
                    index,
                    title: question.question.title.clone(),
                    answered: self.answers.is_answered(question.question_id()),
                    locked: self.navigator.is_locked(index),
                    reachable: open && self.navigator.can_jump(&sequence, index),
                    current: position.index() == index,
                })
                .collect_vec(),
        };

        match position {
            Position::Transition { index } => SyncMessage::Transition {
                frame,
                content: sequence
                    .transition(index)
                    .map(|transition| transition.content.clone())
                    .unwrap_or_default(),
            },
            Position::Question { index } => match self.quiz.questions.get(index) {
                Some(question) => SyncMessage::Question {
                    frame,
                    question: question.question.clone(),
                    answer: self.answers.get(question.question_id()).cloned(),
                    locked: self.navigator.is_locked(index) || self.timer.is_expired(),
                },
                None => SyncMessage::Loading,
            },
            Position::Explanation { index } => SyncMessage::Explanation {
                frame,
                question_title: self
                    .quiz
                    .questions
                    .get(index)
                    .map(|question| question.question.title.clone())
                    .unwrap_or_default(),
                explanation: sequence.explanation(index).unwrap_or_default().to_owned(),
            },
        }
    }
}
