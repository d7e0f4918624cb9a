use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::AnswerKey;

//
// ─── OPTION ────────────────────────────────────────────────────────────────────
//

/// One selectable answer of a question, e.g. `B) 4`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub label: String,
    pub text: String,
}

impl OptionRecord {
    #[must_use]
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Key produced by selecting this option on the question at `position`.
    #[must_use]
    pub fn composite_key(&self, position: usize) -> AnswerKey {
        AnswerKey::compose(position, &self.label)
    }

    /// Case-insensitive label comparison.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.label.trim().to_uppercase() == label.trim().to_uppercase()
    }
}

impl fmt::Display for OptionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}) {}", self.label, self.text)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question extracted from generated quiz text.
///
/// `answer_key` is kept exactly as the generator supplied it. It is expected to
/// equal the composite key of one option at the question's position, but that
/// is not guaranteed; see [`QuestionRecord::answer_key_issue`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub prompt: String,
    pub options: Vec<OptionRecord>,
    pub answer_key: AnswerKey,
}

impl QuestionRecord {
    #[must_use]
    pub fn new(prompt: impl Into<String>, options: Vec<OptionRecord>, answer_key: AnswerKey) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            answer_key,
        }
    }

    /// First option carrying `label`, compared case-insensitively.
    #[must_use]
    pub fn option(&self, label: &str) -> Option<&OptionRecord> {
        self.options.iter().find(|option| option.has_label(label))
    }

    /// Option whose composite key at `position` equals the answer key.
    #[must_use]
    pub fn correct_option(&self, position: usize) -> Option<&OptionRecord> {
        self.options
            .iter()
            .find(|option| option.composite_key(position) == self.answer_key)
    }

    #[must_use]
    pub fn is_correct(&self, selected: &AnswerKey) -> bool {
        *selected == self.answer_key
    }

    /// Reports a defect in the answer key at `position`.
    ///
    /// Returns `None` when exactly one option matches the key.
    #[must_use]
    pub fn answer_key_issue(&self, position: usize) -> Option<AnswerKeyIssue> {
        let matches = self
            .options
            .iter()
            .filter(|option| option.composite_key(position) == self.answer_key)
            .count();
        match matches {
            1 => return None,
            0 => {}
            count => {
                return Some(AnswerKeyIssue::AmbiguousLabel {
                    key: self.answer_key.clone(),
                    count,
                });
            }
        }

        let label_known = self.option(self.answer_key.label()).is_some();
        if label_known && self.answer_key.position() != Some(position) {
            Some(AnswerKeyIssue::PositionMismatch {
                position,
                key: self.answer_key.clone(),
            })
        } else {
            Some(AnswerKeyIssue::UnknownLabel {
                key: self.answer_key.clone(),
            })
        }
    }
}

/// Data-quality defect in a question's answer key.
///
/// A question with an issue is still playable. With `PositionMismatch` or
/// `UnknownLabel` every selection is scored as a miss; with `AmbiguousLabel`
/// only the first option carrying the label can be chosen.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKeyIssue {
    #[error("answer key {key} does not match question position {position}")]
    PositionMismatch { position: usize, key: AnswerKey },

    #[error("answer key {key} names no option of its question")]
    UnknownLabel { key: AnswerKey },

    #[error("answer key {key} matches {count} options of its question")]
    AmbiguousLabel { key: AnswerKey, count: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
