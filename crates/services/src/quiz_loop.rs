use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quiz_core::{QuizSession, Remediation, parse_quiz};
use tracing::{debug, info, warn};

use crate::error::{ContinueError, QuizLoadError};
use crate::quiz_source::{QuizRequest, QuizSource};
use crate::tutoring::{EvaluationRequest, TutoringReply, TutoringRequest, TutoringService};

/// Identifies one load of a quiz. Only the most recently issued ticket may
/// produce a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttemptTicket(u64);

/// What happens after a completed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinueOutcome {
    /// Every question was answered correctly.
    NothingToRemediate,
    /// Missed questions were handed to the tutor.
    Tutoring(TutoringReply),
}

/// Orchestrates quiz loading and the hand-off to tutoring.
#[derive(Clone)]
pub struct QuizLoopService {
    source: Arc<dyn QuizSource>,
    tutoring: Arc<dyn TutoringService>,
    latest_attempt: Arc<AtomicU64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(source: Arc<dyn QuizSource>, tutoring: Arc<dyn TutoringService>) -> Self {
        Self {
            source,
            tutoring,
            latest_attempt: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Issue a ticket for a new attempt, superseding any load still in flight.
    pub fn begin_attempt(&self) -> AttemptTicket {
        AttemptTicket(self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn is_current(&self, ticket: AttemptTicket) -> bool {
        self.latest_attempt.load(Ordering::SeqCst) == ticket.0
    }

    /// Fetch, parse and start a quiz for `ticket`.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoadError::Superseded` if another attempt began while the
    /// quiz was being fetched, `QuizLoadError::NoQuestions` if the generated
    /// text holds no usable question, and `QuizLoadError::Source` for fetch
    /// failures.
    pub async fn start_quiz(
        &self,
        ticket: AttemptTicket,
        request: &QuizRequest,
    ) -> Result<QuizSession, QuizLoadError> {
        let fetched = self.source.fetch_quiz(request).await;
        if !self.is_current(ticket) {
            debug!(?ticket, "discarding quiz for superseded attempt");
            return Err(QuizLoadError::Superseded);
        }
        let raw = fetched?;

        let questions = parse_quiz(&raw);
        if questions.is_empty() {
            warn!(bytes = raw.len(), "generated quiz contained no questions");
            return Err(QuizLoadError::NoQuestions);
        }

        Ok(QuizSession::new(questions)?)
    }

    /// Hand a completed attempt to tutoring when anything was missed.
    ///
    /// # Errors
    ///
    /// Returns `ContinueError::Quiz` if the session is not completed and
    /// `ContinueError::Tutoring` if the tutor cannot be reached.
    pub async fn finish(
        &self,
        session: &QuizSession,
        topic: Option<&str>,
    ) -> Result<ContinueOutcome, ContinueError> {
        match session.build_remediation()? {
            Remediation::NothingToRemediate => {
                info!("quiz passed without misses");
                Ok(ContinueOutcome::NothingToRemediate)
            }
            Remediation::Brief(brief) => {
                info!(missed = brief.len(), "requesting tutoring for missed questions");
                let request = TutoringRequest::new(topic.map(str::to_owned), brief);
                let reply = self.tutoring.request_tutoring(&request).await?;
                Ok(ContinueOutcome::Tutoring(reply))
            }
        }
    }

    /// Start a follow-up quiz aimed at the questions missed in `session`.
    ///
    /// Returns `None` when nothing was missed.
    ///
    /// # Errors
    ///
    /// Returns `QuizLoadError::Quiz` if `session` is not completed, otherwise
    /// the same errors as [`QuizLoopService::start_quiz`].
    pub async fn start_follow_up(
        &self,
        ticket: AttemptTicket,
        session: &QuizSession,
        website_url: &str,
        topic: &str,
    ) -> Result<Option<QuizSession>, QuizLoadError> {
        let Remediation::Brief(brief) = session.build_remediation()? else {
            return Ok(None);
        };
        info!(missed = brief.len(), "requesting follow-up quiz on missed questions");
        let request = QuizRequest::from_mistakes(website_url, topic, &brief);
        self.start_quiz(ticket, &request).await.map(Some)
    }

    /// Ask the tutor which areas the missed questions point to.
    ///
    /// Returns `None` when nothing was missed.
    ///
    /// # Errors
    ///
    /// Returns `ContinueError::Quiz` if the session is not completed and
    /// `ContinueError::Tutoring` if the tutor cannot be reached.
    pub async fn evaluate(
        &self,
        session: &QuizSession,
        website_url: &str,
        topic: &str,
    ) -> Result<Option<String>, ContinueError> {
        let Remediation::Brief(brief) = session.build_remediation()? else {
            return Ok(None);
        };
        let request = EvaluationRequest::new(website_url, topic, brief);
        Ok(Some(self.tutoring.evaluate_mistakes(&request).await?))
    }
}
