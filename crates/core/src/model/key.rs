use serde::{Deserialize, Serialize};
use std::fmt;

/// Composite answer identifier: the 1-based question position followed by an
/// uppercase option label, e.g. `2C`.
///
/// The same shape identifies both the correct answer carried by a question and
/// the answer a learner selected, so correctness is plain equality.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey(String);

impl AnswerKey {
    /// Composes the key produced by choosing `label` on the question at `position`.
    #[must_use]
    pub fn compose(position: usize, label: &str) -> Self {
        Self(format!("{position}{}", label.trim().to_uppercase()))
    }

    /// Builds a key from the contents of a `/box(...)` marker.
    #[must_use]
    pub fn from_marker(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric position prefix, if the key starts with one.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.0[..self.label_start()].parse().ok()
    }

    /// Label suffix following the position prefix.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.0[self.label_start()..]
    }

    fn label_start(&self) -> usize {
        self.0
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.0.len())
    }
}

impl fmt::Debug for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnswerKey({})", self.0)
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_uppercases_label() {
        let key = AnswerKey::compose(3, "b");
        assert_eq!(key.as_str(), "3B");
        assert_eq!(key, AnswerKey::from_marker("3b"));
    }

    #[test]
    fn splits_position_and_label() {
        let key = AnswerKey::from_marker("12D");
        assert_eq!(key.position(), Some(12));
        assert_eq!(key.label(), "D");
    }

    #[test]
    fn key_without_digits_has_no_position() {
        let key = AnswerKey::from_marker("C");
        assert_eq!(key.position(), None);
        assert_eq!(key.label(), "C");
    }
}
