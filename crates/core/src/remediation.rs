//! Packaging of missed questions for a follow-up tutoring request.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{OptionRecord, QuestionRecord};

/// A missed question with the options the learner saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationItem {
    pub question: String,
    pub options: Vec<OptionRecord>,
}

impl From<&QuestionRecord> for RemediationItem {
    fn from(record: &QuestionRecord) -> Self {
        Self {
            question: record.prompt.clone(),
            options: record.options.clone(),
        }
    }
}

impl fmt::Display for RemediationItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\nOptions:", self.question)?;
        for option in &self.options {
            write!(f, "\n{option}")?;
        }
        Ok(())
    }
}

/// Non-empty, ordered set of missed questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationBrief {
    items: Vec<RemediationItem>,
}

impl RemediationBrief {
    /// Returns `None` when there is nothing to include.
    pub fn from_questions<'a>(
        questions: impl IntoIterator<Item = &'a QuestionRecord>,
    ) -> Option<Self> {
        let items: Vec<RemediationItem> = questions.into_iter().map(RemediationItem::from).collect();
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    #[must_use]
    pub fn items(&self) -> &[RemediationItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always `false`; a brief is only built from at least one question.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Plain-text form sent to the tutor: one block per question, separated
    /// by a blank line.
    #[must_use]
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// What a completed attempt hands to the continuation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Remediation {
    NothingToRemediate,
    Brief(RemediationBrief),
}

impl Remediation {
    pub fn from_missed<'a>(missed: impl IntoIterator<Item = &'a QuestionRecord>) -> Self {
        RemediationBrief::from_questions(missed).map_or(Self::NothingToRemediate, Self::Brief)
    }

    #[must_use]
    pub fn brief(&self) -> Option<&RemediationBrief> {
        match self {
            Remediation::NothingToRemediate => None,
            Remediation::Brief(brief) => Some(brief),
        }
    }

    #[must_use]
    pub fn is_needed(&self) -> bool {
        matches!(self, Remediation::Brief(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKey;

    fn question(prompt: &str, options: &[(&str, &str)]) -> QuestionRecord {
        QuestionRecord::new(
            prompt,
            options
                .iter()
                .map(|(label, text)| OptionRecord::new(*label, *text))
                .collect(),
            AnswerKey::from_marker("1A"),
        )
    }

    #[test]
    fn no_missed_questions_means_nothing_to_remediate() {
        let remediation = Remediation::from_missed(std::iter::empty());
        assert_eq!(remediation, Remediation::NothingToRemediate);
        assert!(!remediation.is_needed());
    }

    #[test]
    fn brief_joins_questions_with_blank_line() {
        let missed = [
            question("Capital of France?", &[("A", "Paris"), ("B", "Rome")]),
            question("Largest planet?", &[("A", "Mars"), ("B", "Jupiter")]),
        ];

        let remediation = Remediation::from_missed(&missed);
        let brief = remediation.brief().unwrap();

        assert_eq!(brief.len(), 2);
        assert_eq!(
            brief.render(),
            "Capital of France?\nOptions:\nA) Paris\nB) Rome\n\nLargest planet?\nOptions:\nA) Mars\nB) Jupiter"
        );
    }

    #[test]
    fn brief_serializes_with_kind_tag() {
        let missed = [question("Q?", &[("A", "x")])];
        let json = serde_json::to_value(Remediation::from_missed(&missed)).unwrap();

        assert_eq!(json["kind"], "brief");
        assert_eq!(json["items"][0]["question"], "Q?");
        assert_eq!(json["items"][0]["options"][0]["label"], "A");

        let none = serde_json::to_value(Remediation::NothingToRemediate).unwrap();
        assert_eq!(none["kind"], "nothing_to_remediate");
    }
}
