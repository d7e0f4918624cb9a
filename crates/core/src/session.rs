use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::{QuizAction, QuizError};
use crate::model::{AnswerKey, AnswerKeyIssue, QuestionRecord};
use crate::parser::answer_key_issues;
use crate::remediation::Remediation;

//
// ─── POSITION ──────────────────────────────────────────────────────────────────
//

/// Where an attempt currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Zero-based index of the question on screen.
    Question(usize),
    Completed,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Question(index) => write!(f, "question {}", index + 1),
            Position::Completed => f.write_str("completed quiz"),
        }
    }
}

//
// ─── DISCLOSURE ────────────────────────────────────────────────────────────────
//

/// Outcome of answering a question, as shown to the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disclosure {
    pub index: usize,
    pub selected: AnswerKey,
    pub expected: AnswerKey,
    pub correct: bool,
    /// `false` when the question had already been revealed and nothing changed.
    pub newly_revealed: bool,
}

/// How an option of a revealed question should be marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    /// The right answer, not chosen by the learner.
    Correct,
    ChosenCorrect,
    ChosenIncorrect,
}

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub position: Position,
    pub score: usize,
    pub is_complete: bool,
}

/// Final tally of a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub score: usize,
    pub total: usize,
    pub missed: usize,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One interactive pass through a parsed quiz.
///
/// Answers are final: the first selection on a question reveals it and is
/// scored exactly once. Later selections, and navigation back and forth, never
/// touch the score or the missed list.
///
/// The session does no locking; callers dispatch one event at a time.
#[derive(Clone, PartialEq, Eq)]
pub struct QuizSession {
    questions: Vec<QuestionRecord>,
    position: Position,
    answers: BTreeMap<usize, AnswerKey>,
    revealed: BTreeSet<usize>,
    score: usize,
    missed: Vec<usize>,
    key_issues: Vec<(usize, AnswerKeyIssue)>,
}

impl QuizSession {
    /// Start an attempt over `questions`, positioned on the first one.
    ///
    /// Questions whose answer key matches none of their options are kept and
    /// logged; they are reported by [`QuizSession::key_issues`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<QuestionRecord>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        let key_issues = answer_key_issues(&questions);
        for (index, issue) in &key_issues {
            warn!(question = index + 1, %issue, "question cannot be answered correctly");
        }
        info!(questions = questions.len(), "quiz session started");

        Ok(Self {
            questions,
            position: Position::Question(0),
            answers: BTreeMap::new(),
            revealed: BTreeSet::new(),
            score: 0,
            missed: Vec::new(),
            key_issues,
        })
    }

    /// Discard this attempt's answers and begin again on the same questions.
    pub fn restart(&mut self) {
        self.position = Position::Question(0);
        self.answers.clear();
        self.revealed.clear();
        self.score = 0;
        self.missed.clear();
        info!(questions = self.questions.len(), "quiz session restarted");
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.position {
            Position::Question(index) => Some(index),
            Position::Completed => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.current_index()
            .and_then(|index| self.questions.get(index))
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.score
    }

    /// Questions answered incorrectly, in the order they were missed.
    pub fn missed(&self) -> impl Iterator<Item = &QuestionRecord> + '_ {
        self.missed
            .iter()
            .filter_map(|&index| self.questions.get(index))
    }

    #[must_use]
    pub fn missed_count(&self) -> usize {
        self.missed.len()
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&AnswerKey> {
        self.answers.get(&index)
    }

    #[must_use]
    pub fn is_revealed(&self, index: usize) -> bool {
        self.revealed.contains(&index)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.position == Position::Completed
    }

    #[must_use]
    pub fn key_issues(&self) -> &[(usize, AnswerKeyIssue)] {
        &self.key_issues
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress {
            total: self.questions.len(),
            answered: self.revealed.len(),
            position: self.position,
            score: self.score,
            is_complete: self.is_complete(),
        }
    }

    /// Choose `label` on the current question and reveal the result.
    ///
    /// Selecting again on a revealed question returns the original disclosure
    /// with `newly_revealed` unset and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` once the quiz is completed.
    /// Returns `QuizError::UnknownOption` if `label` is not an option of the
    /// current question.
    pub fn select_answer(&mut self, label: &str) -> Result<Disclosure, QuizError> {
        let invalid = QuizError::invalid(QuizAction::SelectAnswer, self.position);
        let Some(index) = self.current_index() else {
            return Err(invalid);
        };
        if let Some(existing) = self.disclosure(index) {
            return Ok(existing);
        }

        let question = self.questions.get(index).ok_or(invalid)?;
        let option = question
            .option(label)
            .ok_or_else(|| QuizError::UnknownOption {
                position: index + 1,
                label: label.to_string(),
            })?;
        let selected = option.composite_key(index + 1);
        let correct = question.is_correct(&selected);
        let expected = question.answer_key.clone();

        self.answers.insert(index, selected.clone());
        self.revealed.insert(index);
        if correct {
            self.score += 1;
        } else if !self.missed.contains(&index) {
            self.missed.push(index);
        }
        debug!(question = index + 1, %selected, correct, "answer revealed");

        Ok(Disclosure {
            index,
            selected,
            expected,
            correct,
            newly_revealed: true,
        })
    }

    /// Result of a previously revealed question.
    #[must_use]
    pub fn disclosure(&self, index: usize) -> Option<Disclosure> {
        if !self.revealed.contains(&index) {
            return None;
        }
        let selected = self.answers.get(&index)?;
        let question = self.questions.get(index)?;
        Some(Disclosure {
            index,
            selected: selected.clone(),
            expected: question.answer_key.clone(),
            correct: question.is_correct(selected),
            newly_revealed: false,
        })
    }

    /// Per-option marks for a revealed question, in option order.
    #[must_use]
    pub fn option_marks(&self, index: usize) -> Option<Vec<OptionMark>> {
        let disclosure = self.disclosure(index)?;
        let question = self.questions.get(index)?;
        let marks = question
            .options
            .iter()
            .map(|option| {
                let key = option.composite_key(index + 1);
                let chosen = key == disclosure.selected;
                match (chosen, question.is_correct(&key)) {
                    (true, true) => OptionMark::ChosenCorrect,
                    (true, false) => OptionMark::ChosenIncorrect,
                    (false, true) => OptionMark::Correct,
                    (false, false) => OptionMark::Plain,
                }
            })
            .collect();
        Some(marks)
    }

    /// Move past the current question, completing the quiz after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` if the current question has
    /// not been revealed or the quiz is already completed.
    pub fn advance(&mut self) -> Result<Position, QuizError> {
        let index = match self.position {
            Position::Question(index) if self.revealed.contains(&index) => index,
            other => return Err(QuizError::invalid(QuizAction::Advance, other)),
        };

        self.position = if index + 1 >= self.questions.len() {
            info!(
                score = self.score,
                total = self.questions.len(),
                missed = self.missed.len(),
                "quiz completed"
            );
            Position::Completed
        } else {
            Position::Question(index + 1)
        };
        Ok(self.position)
    }

    /// Step back to the previous question. Answers stay as they were.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` on the first question or
    /// after completion.
    pub fn retreat(&mut self) -> Result<Position, QuizError> {
        match self.position {
            Position::Question(index) if index > 0 => {
                self.position = Position::Question(index - 1);
                Ok(self.position)
            }
            other => Err(QuizError::invalid(QuizAction::Retreat, other)),
        }
    }

    /// Package the missed questions for a follow-up tutoring request.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` before completion.
    pub fn build_remediation(&self) -> Result<Remediation, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::invalid(
                QuizAction::BuildRemediation,
                self.position,
            ));
        }
        Ok(Remediation::from_missed(self.missed()))
    }

    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` before completion.
    pub fn summary(&self) -> Result<QuizSummary, QuizError> {
        if !self.is_complete() {
            return Err(QuizError::invalid(QuizAction::Summarize, self.position));
        }
        Ok(QuizSummary {
            score: self.score,
            total: self.questions.len(),
            missed: self.missed.len(),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("answers", &self.answers)
            .field("score", &self.score)
            .field("missed", &self.missed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_quiz;

    const ARITHMETIC: &str = "((1. What is 2+2?*A) 3*B) 4*C) 5))/box(1B)";
    const THREE_QUESTIONS: &str = "\
((1. What is 2+2?*A) 3*B) 4*C) 5))/box(1B)
((2. Capital of France?*A) Paris*B) Rome*C) Madrid))/box(2A)
((3. Largest planet?*A) Mars*B) Venus*C) Jupiter))/box(3C)";

    fn session(raw: &str) -> QuizSession {
        QuizSession::new(parse_quiz(raw)).unwrap()
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = QuizSession::new(Vec::new()).unwrap_err();
        assert!(matches!(err, QuizError::Empty));
    }

    #[test]
    fn correct_answer_scores_and_completes() {
        let mut session = session(ARITHMETIC);

        let disclosure = session.select_answer("B").unwrap();
        assert!(disclosure.correct);
        assert!(disclosure.newly_revealed);
        assert_eq!(session.score(), 1);
        assert_eq!(session.missed_count(), 0);

        assert_eq!(session.advance().unwrap(), Position::Completed);
        assert!(session.is_complete());
        assert_eq!(
            session.build_remediation().unwrap(),
            Remediation::NothingToRemediate
        );
    }

    #[test]
    fn wrong_answer_is_missed_and_remediated() {
        let mut session = session(ARITHMETIC);

        let disclosure = session.select_answer("a").unwrap();
        assert!(!disclosure.correct);
        assert_eq!(disclosure.selected.as_str(), "1A");
        assert_eq!(disclosure.expected.as_str(), "1B");
        assert_eq!(session.score(), 0);
        let missed: Vec<_> = session.missed().collect();
        assert_eq!(missed, vec![&session.questions()[0]]);

        session.advance().unwrap();
        let remediation = session.build_remediation().unwrap();
        let brief = remediation.brief().expect("missed question needs a brief");
        assert_eq!(
            brief.render(),
            "What is 2+2?\nOptions:\nA) 3\nB) 4\nC) 5"
        );
    }

    #[test]
    fn repeated_selection_is_scored_once() {
        let mut session = session(ARITHMETIC);

        session.select_answer("A").unwrap();
        for label in ["A", "B", "A", "C"] {
            let again = session.select_answer(label).unwrap();
            assert!(!again.newly_revealed);
            assert_eq!(again.selected.as_str(), "1A");
        }

        assert_eq!(session.score(), 0);
        assert_eq!(session.missed_count(), 1);
        assert_eq!(session.answer(0).map(AnswerKey::as_str), Some("1A"));
    }

    #[test]
    fn unknown_option_changes_nothing() {
        let mut session = session(ARITHMETIC);
        let before = session.clone();

        let err = session.select_answer("Z").unwrap_err();
        assert!(matches!(err, QuizError::UnknownOption { position: 1, .. }));
        assert_eq!(session, before);
    }

    #[test]
    fn advance_requires_reveal() {
        let mut session = session(THREE_QUESTIONS);
        let before = session.clone();

        let err = session.advance().unwrap_err();
        assert!(matches!(
            err,
            QuizError::InvalidStateTransition {
                action: QuizAction::Advance,
                position: Position::Question(0),
            }
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn retreat_on_first_question_is_invalid() {
        let mut session = session(THREE_QUESTIONS);
        let err = session.retreat().unwrap_err();
        assert!(matches!(err, QuizError::InvalidStateTransition { .. }));
        assert_eq!(session.position(), Position::Question(0));
    }

    #[test]
    fn retreat_then_advance_restores_state() {
        let mut session = session(THREE_QUESTIONS);
        session.select_answer("B").unwrap();
        session.advance().unwrap();
        session.select_answer("C").unwrap();
        let before = session.clone();

        session.retreat().unwrap();
        assert_eq!(session.position(), Position::Question(0));
        assert!(session.is_revealed(0));
        session.advance().unwrap();

        assert_eq!(session, before);
    }

    #[test]
    fn revisiting_does_not_rescore() {
        let mut session = session(THREE_QUESTIONS);
        session.select_answer("B").unwrap();
        session.advance().unwrap();
        session.retreat().unwrap();

        let again = session.select_answer("A").unwrap();
        assert!(again.correct);
        assert!(!again.newly_revealed);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn score_and_missed_cover_every_question() {
        let mut session = session(THREE_QUESTIONS);
        for label in ["B", "C", "A"] {
            session.select_answer(label).unwrap();
            session.select_answer(label).unwrap();
            session.advance().unwrap();
        }

        let summary = session.summary().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.missed, 2);
        assert_eq!(summary.score + summary.missed, summary.total);

        let prompts: Vec<_> = session.missed().map(|q| q.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["Capital of France?", "Largest planet?"]);
    }

    #[test]
    fn completed_session_rejects_interaction() {
        let mut session = session(ARITHMETIC);
        session.select_answer("B").unwrap();
        session.advance().unwrap();

        assert!(session.select_answer("A").is_err());
        assert!(session.advance().is_err());
        assert!(session.retreat().is_err());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn remediation_and_summary_wait_for_completion() {
        let mut session = session(ARITHMETIC);
        session.select_answer("A").unwrap();

        assert!(matches!(
            session.build_remediation().unwrap_err(),
            QuizError::InvalidStateTransition {
                action: QuizAction::BuildRemediation,
                ..
            }
        ));
        assert!(session.summary().is_err());
    }

    #[test]
    fn option_marks_show_choice_and_answer() {
        let mut session = session(ARITHMETIC);
        assert!(session.option_marks(0).is_none());

        session.select_answer("C").unwrap();
        assert_eq!(
            session.option_marks(0).unwrap(),
            vec![
                OptionMark::Plain,
                OptionMark::Correct,
                OptionMark::ChosenIncorrect,
            ]
        );
    }

    #[test]
    fn restart_discards_attempt() {
        let mut session = session(THREE_QUESTIONS);
        session.select_answer("A").unwrap();
        session.advance().unwrap();

        session.restart();

        assert_eq!(session.position(), Position::Question(0));
        assert_eq!(session.score(), 0);
        assert_eq!(session.missed_count(), 0);
        assert!(!session.is_revealed(0));
        assert!(session.answer(0).is_none());
    }

    #[test]
    fn mismatched_key_is_kept_and_reported() {
        let mut session = session("((1. Q?*A) yes*B) no))/box(2A)");
        assert_eq!(session.key_issues().len(), 1);

        let disclosure = session.select_answer("A").unwrap();
        assert!(!disclosure.correct);
        assert_eq!(session.missed_count(), 1);
    }

    #[test]
    fn progress_tracks_answers() {
        let mut session = session(THREE_QUESTIONS);
        session.select_answer("B").unwrap();
        session.advance().unwrap();

        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.position, Position::Question(1));
        assert_eq!(progress.score, 1);
        assert!(!progress.is_complete);
    }
}
