//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::QuizError;

/// Errors emitted by a `QuizSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizSourceError {
    #[error("quiz generator returned an empty response")]
    EmptyResponse,
    #[error("quiz generator request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by a `TutoringService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TutoringError {
    #[error("tutor returned an empty response")]
    EmptyResponse,
    #[error("tutoring request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while loading a quiz attempt.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizLoadError {
    #[error("failed to load questions")]
    NoQuestions,
    #[error("a newer quiz attempt replaced this one")]
    Superseded,
    #[error(transparent)]
    Source(#[from] QuizSourceError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted while handing a completed attempt to tutoring.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContinueError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Tutoring(#[from] TutoringError),
}
