#![forbid(unsafe_code)]

pub mod chat;
pub mod config;
pub mod error;
pub mod quiz_loop;
pub mod quiz_source;
pub mod tutoring;

pub use chat::{ChatRole, ChatTurn};
pub use config::ServiceConfig;
pub use error::{ContinueError, QuizLoadError, QuizSourceError, TutoringError};
pub use quiz_loop::{AttemptTicket, ContinueOutcome, QuizLoopService};
pub use quiz_source::{HttpQuizSource, QuizRequest, QuizSource};
pub use tutoring::{
    EvaluationRequest, HttpTutoringService, TutoringReply, TutoringRequest, TutoringService,
};
