use std::fmt;

use thiserror::Error;

use crate::session::Position;

/// Session operations that are guarded by a precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAction {
    SelectAnswer,
    Advance,
    Retreat,
    BuildRemediation,
    Summarize,
}

impl fmt::Display for QuizAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuizAction::SelectAnswer => "select an answer",
            QuizAction::Advance => "advance",
            QuizAction::Retreat => "go back",
            QuizAction::BuildRemediation => "build remediation",
            QuizAction::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("cannot {action} at {position}")]
    InvalidStateTransition {
        action: QuizAction,
        position: Position,
    },

    #[error("question {position} has no option labelled {label:?}")]
    UnknownOption { position: usize, label: String },
}

impl QuizError {
    pub(crate) fn invalid(action: QuizAction, position: Position) -> Self {
        Self::InvalidStateTransition { action, position }
    }
}
