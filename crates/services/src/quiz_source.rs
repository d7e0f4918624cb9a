use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use quiz_core::RemediationBrief;

use crate::chat::ChatTurn;
use crate::config::ServiceConfig;
use crate::error::QuizSourceError;

const CONVERSATION_QUIZ_PATH: &str = "newcontent/take_quiz";
const WEBSITE_QUIZ_PATH: &str = "quiz/create_from_web";
const MISTAKES_QUIZ_PATH: &str = "quiz/recreate_from_web";

/// What the generator should build a quiz from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizRequest {
    /// Quiz on the material covered in a tutoring conversation.
    FromConversation { chat_history: Vec<ChatTurn> },
    /// Quiz on a web page about `topic`.
    FromWebsite { website_url: String, topic: String },
    /// Follow-up quiz on a web page, weighted towards previously missed questions.
    FromMistakes {
        website_url: String,
        topic: String,
        wrong_answers: String,
    },
}

impl QuizRequest {
    #[must_use]
    pub fn from_mistakes(
        website_url: impl Into<String>,
        topic: impl Into<String>,
        brief: &RemediationBrief,
    ) -> Self {
        Self::FromMistakes {
            website_url: website_url.into(),
            topic: topic.into(),
            wrong_answers: brief.render(),
        }
    }
}

/// Supplier of raw quiz text.
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch generated quiz text for `request`.
    ///
    /// # Errors
    ///
    /// Returns `QuizSourceError` when the generator cannot be reached or
    /// returns nothing.
    async fn fetch_quiz(&self, request: &QuizRequest) -> Result<String, QuizSourceError>;
}

/// `QuizSource` backed by the learning backend's HTTP API.
#[derive(Clone)]
pub struct HttpQuizSource {
    client: Client,
    config: ServiceConfig,
}

impl HttpQuizSource {
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ServiceConfig::from_env())
    }
}

#[async_trait]
impl QuizSource for HttpQuizSource {
    async fn fetch_quiz(&self, request: &QuizRequest) -> Result<String, QuizSourceError> {
        let (url, body) = match request {
            QuizRequest::FromConversation { chat_history } => (
                self.config.endpoint(CONVERSATION_QUIZ_PATH),
                QuizBody::Conversation { chat_history },
            ),
            QuizRequest::FromWebsite { website_url, topic } => (
                self.config.endpoint(WEBSITE_QUIZ_PATH),
                QuizBody::Website { website_url, topic },
            ),
            QuizRequest::FromMistakes {
                website_url,
                topic,
                wrong_answers,
            } => (
                self.config.endpoint(MISTAKES_QUIZ_PATH),
                QuizBody::Mistakes {
                    website_url,
                    wrong_answers,
                    topic,
                },
            ),
        };
        debug!(%url, "requesting generated quiz");

        let response = self.client.post(url).json(&body).send().await?;
        check_status(response.status())?;

        let text = quiz_text(response.json().await?)?;
        debug!(bytes = text.len(), "quiz text received");
        Ok(text)
    }
}

fn check_status(status: StatusCode) -> Result<(), QuizSourceError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(QuizSourceError::HttpStatus(status))
    }
}

fn quiz_text(body: QuizResponse) -> Result<String, QuizSourceError> {
    body.response
        .filter(|text| !text.trim().is_empty())
        .ok_or(QuizSourceError::EmptyResponse)
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum QuizBody<'a> {
    Conversation {
        chat_history: &'a [ChatTurn],
    },
    Website {
        website_url: &'a str,
        topic: &'a str,
    },
    Mistakes {
        website_url: &'a str,
        wrong_answers: &'a str,
        topic: &'a str,
    },
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    response: Option<String>,
}
