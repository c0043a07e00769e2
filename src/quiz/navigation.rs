//! Navigation through the transition / question / explanation sequence
//!
//! The sequence a learner walks is never stored. [`Sequence`] derives it on
//! every call from the quiz data and the current answers: whether a slot
//! opens with a transition, and whether an explanation step is reachable
//! because its question is now answered. [`Navigator`] owns the single
//! cursor and applies the mode rules on top of that derivation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{
    answer::AnswerStore,
    config::{QuizQuestion, QuizTransition},
};

/// The cursor into the sequence; `index` always names a question slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Position {
    /// The informational block preceding question `index`
    Transition {
        /// Question slot the transition precedes
        index: usize,
    },
    /// Question `index` itself
    Question {
        /// Question slot
        index: usize,
    },
    /// The explanation shown after question `index` was answered
    Explanation {
        /// Question slot the explanation belongs to
        index: usize,
    },
}

impl Position {
    /// The question slot this position refers to
    pub fn index(self) -> usize {
        match self {
            Self::Transition { index } | Self::Question { index } | Self::Explanation { index } => {
                index
            }
        }
    }

    /// Sort key in sequence order: slot first, then transition < question < explanation
    fn order_key(self) -> (usize, u8) {
        match self {
            Self::Transition { index } => (index, 0),
            Self::Question { index } => (index, 1),
            Self::Explanation { index } => (index, 2),
        }
    }

    /// Whether `self` comes strictly before `other` in the sequence
    pub fn precedes(self, other: Self) -> bool {
        self.order_key() < other.order_key()
    }
}

/// How strictly navigation is constrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Free movement in every direction
    #[default]
    Practice,
    /// Questions moved past are locked and cannot be revisited
    Test,
    /// Test mode that additionally forbids any backward movement
    Exam,
}

impl Mode {
    /// Resolves the mode from the attempt's test flag and the quiz's exam setting
    ///
    /// Exam mode only takes effect while test-taking.
    pub fn new(test_mode: bool, exam_mode: bool) -> Self {
        match (test_mode, exam_mode) {
            (true, true) => Self::Exam,
            (true, false) => Self::Test,
            (false, _) => Self::Practice,
        }
    }

    /// Whether passed questions become locked
    pub fn locks_answers(self) -> bool {
        matches!(self, Self::Test | Self::Exam)
    }

    /// Whether backward movement is forbidden
    pub fn forbids_backward(self) -> bool {
        matches!(self, Self::Exam)
    }
}

/// Result of asking the sequence for the step after a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move to this position
    Move(Position),
    /// Past the final step: the caller opens the submit confirmation
    End,
}

/// Pure view over the data that decides which steps exist
#[derive(Debug, Clone, Copy)]
pub struct Sequence<'a> {
    questions: &'a [QuizQuestion],
    transitions: &'a [QuizTransition],
    answers: &'a AnswerStore,
}

impl<'a> Sequence<'a> {
    /// Creates a view over questions (in attempt order), transitions and answers
    pub fn new(
        questions: &'a [QuizQuestion],
        transitions: &'a [QuizTransition],
        answers: &'a AnswerStore,
    ) -> Self {
        Self {
            questions,
            transitions,
            answers,
        }
    }

    /// Number of question slots
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether there are no question slots
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// The transition preceding question `index`, if any
    pub fn transition(&self, index: usize) -> Option<&'a QuizTransition> {
        if index >= self.len() {
            return None;
        }
        self.transitions
            .iter()
            .find(|transition| transition.position == index)
    }

    /// The explanation of question `index`, if it is reachable right now
    pub fn explanation(&self, index: usize) -> Option<&'a str> {
        let question = self.questions.get(index)?;
        if self.answers.is_answered(question.question_id()) {
            question.explanation_text()
        } else {
            None
        }
    }

    /// The first step of slot `index`
    fn entry(&self, index: usize) -> Position {
        if self.transition(index).is_some() {
            Position::Transition { index }
        } else {
            Position::Question { index }
        }
    }

    /// The final step of slot `index`
    fn exit(&self, index: usize) -> Position {
        if self.explanation(index).is_some() {
            Position::Explanation { index }
        } else {
            Position::Question { index }
        }
    }

    /// The very first step: the leading transition or question 0
    pub fn first(&self) -> Option<Position> {
        (!self.is_empty()).then(|| self.entry(0))
    }

    /// The very last step: the trailing explanation or the last question
    pub fn last(&self) -> Option<Position> {
        self.len().checked_sub(1).map(|index| self.exit(index))
    }

    /// The step following `position`
    pub fn next(&self, position: Position) -> Step {
        match position {
            Position::Transition { index } => Step::Move(Position::Question { index }),
            Position::Question { index } if self.explanation(index).is_some() => {
                Step::Move(Position::Explanation { index })
            }
            Position::Question { index } | Position::Explanation { index } => {
                if index + 1 < self.len() {
                    Step::Move(self.entry(index + 1))
                } else {
                    Step::End
                }
            }
        }
    }

    /// The step preceding `position`, or `None` at the very start
    pub fn previous(&self, position: Position) -> Option<Position> {
        match position {
            Position::Explanation { index } => Some(Position::Question { index }),
            Position::Question { index } if self.transition(index).is_some() => {
                Some(Position::Transition { index })
            }
            Position::Question { index } | Position::Transition { index } => {
                index.checked_sub(1).map(|index| self.exit(index))
            }
        }
    }

    /// Whether `position` exists in the sequence as currently derived
    pub fn contains(&self, position: Position) -> bool {
        match position {
            Position::Transition { index } => self.transition(index).is_some(),
            Position::Question { index } => index < self.len(),
            Position::Explanation { index } => self.explanation(index).is_some(),
        }
    }
}

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// The cursor moved to this position
    Moved(Position),
    /// The learner asked to go past the end; open the submit confirmation
    ConfirmSubmit,
    /// The request was not allowed or had nothing to do
    Ignored,
}

/// The single cursor of an attempt together with the locked questions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigator {
    position: Option<Position>,
    locked: BTreeSet<usize>,
    mode: Mode,
}

impl Navigator {
    /// Creates a navigator at the first step of the sequence
    pub fn new(mode: Mode, sequence: &Sequence<'_>) -> Self {
        Self::restore(mode, sequence, None, BTreeSet::new())
    }

    /// Recreates a navigator from persisted state
    ///
    /// A position that does not exist in the derived sequence falls back to
    /// the first step. Locked slots only survive in locking modes.
    pub fn restore(
        mode: Mode,
        sequence: &Sequence<'_>,
        position: Option<Position>,
        locked: BTreeSet<usize>,
    ) -> Self {
        let locked = if mode.locks_answers() {
            locked
                .into_iter()
                .filter(|index| *index < sequence.len())
                .collect()
        } else {
            BTreeSet::new()
        };
        Self {
            position: position
                .filter(|position| sequence.contains(*position))
                .or_else(|| sequence.first()),
            locked,
            mode,
        }
    }

    /// Current position; `None` while the quiz has no questions
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Active mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Question slots moved past in a locking mode
    pub fn locked(&self) -> &BTreeSet<usize> {
        &self.locked
    }

    /// Whether question `index` is locked against revisits and edits
    pub fn is_locked(&self, index: usize) -> bool {
        self.mode.locks_answers() && self.locked.contains(&index)
    }

    /// Moves forward one step
    pub fn next(&mut self, sequence: &Sequence<'_>) -> Move {
        let Some(current) = self.position else {
            return Move::Ignored;
        };
        match sequence.next(current) {
            Step::Move(to) => self.commit(current, to),
            Step::End => Move::ConfirmSubmit,
        }
    }

    /// Moves back one step, unless the mode or a locked slot forbids it
    pub fn previous(&mut self, sequence: &Sequence<'_>) -> Move {
        match self.position.and_then(|current| self.previous_target(current, sequence)) {
            Some(to) => {
                self.position = Some(to);
                Move::Moved(to)
            }
            None => Move::Ignored,
        }
    }

    /// Jumps to the very first step
    pub fn first(&mut self, sequence: &Sequence<'_>) -> Move {
        match self.position.and_then(|current| self.first_target(current, sequence)) {
            Some(to) => {
                self.position = Some(to);
                Move::Moved(to)
            }
            None => Move::Ignored,
        }
    }

    /// Jumps to the very last step
    pub fn last(&mut self, sequence: &Sequence<'_>) -> Move {
        let (Some(current), Some(to)) = (self.position, sequence.last()) else {
            return Move::Ignored;
        };
        if !self.can_last(sequence) {
            return Move::Ignored;
        }
        self.commit(current, to)
    }

    /// Jumps straight to question `index` (sidebar click)
    pub fn jump(&mut self, sequence: &Sequence<'_>, index: usize) -> Move {
        let Some(current) = self.position else {
            return Move::Ignored;
        };
        if !self.can_jump(sequence, index) {
            return Move::Ignored;
        }
        let to = Position::Question { index };
        if to == current {
            return Move::Ignored;
        }
        self.commit(current, to)
    }

    /// Whether [`Navigator::previous`] would move
    pub fn can_previous(&self, sequence: &Sequence<'_>) -> bool {
        self.position
            .and_then(|current| self.previous_target(current, sequence))
            .is_some()
    }

    /// Whether [`Navigator::first`] would move
    pub fn can_first(&self, sequence: &Sequence<'_>) -> bool {
        self.position
            .and_then(|current| self.first_target(current, sequence))
            .is_some()
    }

    /// Whether [`Navigator::last`] would move
    pub fn can_last(&self, sequence: &Sequence<'_>) -> bool {
        match (self.position, sequence.last()) {
            (Some(current), Some(to)) => {
                to != current && !(self.mode.forbids_backward() && to.precedes(current))
            }
            _ => false,
        }
    }

    /// Whether question `index` may be jumped to
    pub fn can_jump(&self, sequence: &Sequence<'_>, index: usize) -> bool {
        let Some(current) = self.position else {
            return false;
        };
        index < sequence.len()
            && !self.is_locked(index)
            && !(self.mode.forbids_backward() && Position::Question { index }.precedes(current))
    }

    /// Re-derives the cursor after the answers changed
    ///
    /// Clearing the answer of a question whose explanation is on screen makes
    /// that explanation unreachable; the cursor falls back to the question.
    pub fn reconcile(&mut self, sequence: &Sequence<'_>) {
        if let Some(position) = self.position
            && !sequence.contains(position)
        {
            self.position = Some(Position::Question {
                index: position.index(),
            });
        }
    }

    fn previous_target(&self, current: Position, sequence: &Sequence<'_>) -> Option<Position> {
        if self.mode.forbids_backward() {
            return None;
        }
        sequence
            .previous(current)
            .filter(|to| !self.is_locked(to.index()))
    }

    fn first_target(&self, current: Position, sequence: &Sequence<'_>) -> Option<Position> {
        if self.mode.forbids_backward() {
            return None;
        }
        sequence
            .first()
            .filter(|to| *to != current && !self.is_locked(to.index()))
    }

    /// Moves the cursor, locking the departed slot when moving forward in a locking mode
    fn commit(&mut self, from: Position, to: Position) -> Move {
        if self.mode.locks_answers() && to.index() > from.index() {
            self.locked.insert(from.index());
        }
        self.position = Some(to);
        Move::Moved(to)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::quiz::config::{
        QuestionKind,
        tests::{question, transition},
    };

    fn questions(count: usize) -> Vec<QuizQuestion> {
        (0..count)
            .map(|i| question(&format!("q{i}"), QuestionKind::ShortAnswer))
            .collect()
    }

    fn q(index: usize) -> Position {
        Position::Question { index }
    }

    fn t(index: usize) -> Position {
        Position::Transition { index }
    }

    fn e(index: usize) -> Position {
        Position::Explanation { index }
    }

    /// Walks `next` from the first step until the end, collecting every position
    fn walk(navigator: &mut Navigator, sequence: &Sequence<'_>) -> Vec<Position> {
        let mut visited = vec![navigator.position().unwrap()];
        loop {
            match navigator.next(sequence) {
                Move::Moved(to) => visited.push(to),
                Move::ConfirmSubmit => return visited,
                Move::Ignored => panic!("next was ignored"),
            }
        }
    }

    #[test]
    fn test_position_json_shape() {
        let json = serde_json::to_string(&q(2)).unwrap();
        assert_eq!(json, r#"{"kind":"question","index":2}"#);
        let parsed: Position = serde_json::from_str(r#"{"kind":"explanation","index":1}"#).unwrap();
        assert_eq!(parsed, e(1));
    }

    #[test]
    fn test_mode_resolution() {
        assert_eq!(Mode::new(false, true), Mode::Practice);
        assert_eq!(Mode::new(true, false), Mode::Test);
        assert_eq!(Mode::new(true, true), Mode::Exam);
    }

    #[test]
    fn test_next_visits_full_interleaving() {
        let mut qs = questions(4);
        qs[1].explanation = Some("Because.".to_string());
        qs[2].explanation = Some("Unanswered, never shown.".to_string());
        qs[3].explanation = Some("Last one.".to_string());
        let transitions = vec![transition(0), transition(2)];
        let mut answers = AnswerStore::default();
        answers.set("q1".into(), "x".into());
        answers.set("q3".into(), "y".into());
        let sequence = Sequence::new(&qs, &transitions, &answers);

        let mut navigator = Navigator::new(Mode::Practice, &sequence);
        let visited = walk(&mut navigator, &sequence);

        assert_eq!(visited, vec![t(0), q(0), q(1), e(1), t(2), q(2), q(3), e(3)]);
        assert!(visited.iter().all(|p| p.index() < qs.len()));
    }

    #[test]
    fn test_explanation_appears_once_answered() {
        let mut qs = questions(2);
        qs[0].explanation = Some("Because.".to_string());
        let mut answers = AnswerStore::default();

        let mut navigator = {
            let sequence = Sequence::new(&qs, &[], &answers);
            let mut navigator = Navigator::new(Mode::Practice, &sequence);
            assert_eq!(navigator.next(&sequence), Move::Moved(q(1)));
            assert_eq!(navigator.previous(&sequence), Move::Moved(q(0)));
            navigator
        };

        answers.set("q0".into(), "answer".into());
        let sequence = Sequence::new(&qs, &[], &answers);
        assert_eq!(navigator.next(&sequence), Move::Moved(e(0)));
        assert_eq!(navigator.next(&sequence), Move::Moved(q(1)));
    }

    #[test]
    fn test_previous_mirrors_next() {
        let mut qs = questions(3);
        qs[0].explanation = Some("Zero.".to_string());
        let transitions = vec![transition(0), transition(1)];
        let mut answers = AnswerStore::default();
        answers.set("q0".into(), "a".into());
        let sequence = Sequence::new(&qs, &transitions, &answers);

        let mut navigator = Navigator::restore(Mode::Practice, &sequence, Some(q(2)), BTreeSet::new());
        let mut visited = vec![q(2)];
        while let Move::Moved(to) = navigator.previous(&sequence) {
            visited.push(to);
        }
        assert_eq!(visited, vec![q(2), q(1), t(1), e(0), q(0), t(0)]);
    }

    #[test]
    fn test_last_question_routes_to_confirmation() {
        let qs = questions(1);
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Practice, &sequence);
        assert_eq!(navigator.next(&sequence), Move::ConfirmSubmit);
        assert_eq!(navigator.position(), Some(q(0)));
    }

    #[test]
    fn test_exam_mode_is_monotonic() {
        let qs = questions(4);
        let transitions = vec![transition(0)];
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &transitions, &answers);
        let mut navigator = Navigator::new(Mode::Exam, &sequence);

        navigator.next(&sequence);
        navigator.next(&sequence);
        navigator.next(&sequence);
        let current = navigator.position();
        assert_eq!(current, Some(q(2)));

        assert_eq!(navigator.previous(&sequence), Move::Ignored);
        assert_eq!(navigator.first(&sequence), Move::Ignored);
        assert_eq!(navigator.jump(&sequence, 0), Move::Ignored);
        assert_eq!(navigator.jump(&sequence, 1), Move::Ignored);
        assert_eq!(navigator.position(), current);
        assert!(!navigator.can_previous(&sequence));
        assert!(!navigator.can_first(&sequence));

        assert_eq!(navigator.jump(&sequence, 3), Move::Moved(q(3)));
    }

    #[test]
    fn test_exam_mode_cannot_leave_explanation_backwards() {
        let mut qs = questions(2);
        qs[0].explanation = Some("Zero.".to_string());
        let mut answers = AnswerStore::default();
        answers.set("q0".into(), "a".into());
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Exam, &sequence);

        assert_eq!(navigator.next(&sequence), Move::Moved(e(0)));
        assert_eq!(navigator.jump(&sequence, 0), Move::Ignored);
        assert_eq!(navigator.previous(&sequence), Move::Ignored);
    }

    #[test]
    fn test_test_mode_locks_passed_questions() {
        let qs = questions(3);
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Test, &sequence);

        assert_eq!(navigator.next(&sequence), Move::Moved(q(1)));
        assert!(navigator.is_locked(0));
        assert_eq!(navigator.previous(&sequence), Move::Ignored);
        assert_eq!(navigator.first(&sequence), Move::Ignored);
        assert_eq!(navigator.jump(&sequence, 0), Move::Ignored);

        assert_eq!(navigator.jump(&sequence, 2), Move::Moved(q(2)));
        assert!(navigator.is_locked(1));
        assert_eq!(navigator.previous(&sequence), Move::Ignored);
    }

    #[test]
    fn test_test_mode_allows_backward_to_unlocked() {
        let qs = questions(4);
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Test, &sequence);

        assert_eq!(navigator.jump(&sequence, 3), Move::Moved(q(3)));
        assert_eq!(navigator.previous(&sequence), Move::Moved(q(2)));
        assert_eq!(navigator.jump(&sequence, 1), Move::Moved(q(1)));
        assert_eq!(navigator.jump(&sequence, 0), Move::Ignored);
    }

    #[test]
    fn test_practice_mode_never_locks() {
        let qs = questions(3);
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Practice, &sequence);

        navigator.next(&sequence);
        navigator.next(&sequence);
        assert!(navigator.locked().is_empty());
        assert_eq!(navigator.first(&sequence), Move::Moved(q(0)));
        assert_eq!(navigator.first(&sequence), Move::Ignored);
        assert_eq!(navigator.last(&sequence), Move::Moved(q(2)));
    }

    #[test]
    fn test_last_prefers_trailing_explanation() {
        let mut qs = questions(2);
        qs[1].explanation = Some("One.".to_string());
        let mut answers = AnswerStore::default();
        answers.set("q1".into(), "a".into());
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Practice, &sequence);
        assert_eq!(navigator.last(&sequence), Move::Moved(e(1)));
    }

    #[test]
    fn test_empty_quiz_is_inert() {
        let qs: Vec<QuizQuestion> = Vec::new();
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &[], &answers);
        let mut navigator = Navigator::new(Mode::Practice, &sequence);
        assert_eq!(navigator.position(), None);
        assert_eq!(navigator.next(&sequence), Move::Ignored);
        assert_eq!(navigator.previous(&sequence), Move::Ignored);
        assert_eq!(navigator.first(&sequence), Move::Ignored);
        assert_eq!(navigator.last(&sequence), Move::Ignored);
        assert_eq!(navigator.jump(&sequence, 0), Move::Ignored);
    }

    #[test]
    fn test_restore_rejects_positions_outside_sequence() {
        let mut qs = questions(3);
        qs[1].explanation = Some("One.".to_string());
        let transitions = vec![transition(0)];
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &transitions, &answers);

        for stale in [q(7), t(1), e(1)] {
            let navigator = Navigator::restore(Mode::Test, &sequence, Some(stale), BTreeSet::new());
            assert_eq!(navigator.position(), Some(t(0)));
        }

        let locked = BTreeSet::from([0, 9]);
        let navigator = Navigator::restore(Mode::Test, &sequence, Some(q(2)), locked.clone());
        assert_eq!(navigator.position(), Some(q(2)));
        assert_eq!(navigator.locked(), &BTreeSet::from([0]));

        let navigator = Navigator::restore(Mode::Practice, &sequence, Some(q(2)), locked);
        assert!(navigator.locked().is_empty());
    }

    #[test]
    fn test_reconcile_drops_unreachable_explanation() {
        let mut qs = questions(1);
        qs[0].explanation = Some("Zero.".to_string());
        let mut answers = AnswerStore::default();
        answers.set("q0".into(), "a".into());
        let mut navigator = {
            let sequence = Sequence::new(&qs, &[], &answers);
            let mut navigator = Navigator::new(Mode::Practice, &sequence);
            navigator.next(&sequence);
            navigator
        };
        assert_eq!(navigator.position(), Some(e(0)));

        answers.set("q0".into(), "".into());
        navigator.reconcile(&Sequence::new(&qs, &[], &answers));
        assert_eq!(navigator.position(), Some(q(0)));
    }

    #[test]
    fn test_transition_beyond_last_question_is_ignored() {
        let qs = questions(2);
        let transitions = vec![transition(2)];
        let answers = AnswerStore::default();
        let sequence = Sequence::new(&qs, &transitions, &answers);
        assert!(sequence.transition(2).is_none());
        let mut navigator = Navigator::new(Mode::Practice, &sequence);
        navigator.next(&sequence);
        assert_eq!(navigator.next(&sequence), Move::ConfirmSubmit);
    }
}
