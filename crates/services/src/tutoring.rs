use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use quiz_core::RemediationBrief;

use crate::chat::ChatTurn;
use crate::config::ServiceConfig;
use crate::error::TutoringError;

const CHAT_PATH: &str = "newcontent/chat";
const EVALUATE_PATH: &str = "quiz/evaluate";

/// Opening instruction sent ahead of the missed questions.
pub const MENTOR_INSTRUCTION: &str = "You are a mentor who teaches step-by-step, interactively and adaptively. \
Use the provided context to explain the topic clearly. Also generate a question after each time you are \
teaching something. I didn't understand the following questions, I got them wrong.";

/// Follow-up tutoring for the questions a learner missed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutoringRequest {
    pub topic: Option<String>,
    pub brief: RemediationBrief,
}

impl TutoringRequest {
    #[must_use]
    pub fn new(topic: Option<String>, brief: RemediationBrief) -> Self {
        Self { topic, brief }
    }

    /// Conversation that opens the tutoring exchange.
    #[must_use]
    pub fn chat_history(&self) -> Vec<ChatTurn> {
        vec![
            ChatTurn::human(MENTOR_INSTRUCTION),
            ChatTurn::human(self.brief.render()),
        ]
    }
}

/// The tutor's answer and the conversation to continue from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TutoringReply {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

/// Request for the areas a learner should focus on, given a web source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRequest {
    pub website_url: String,
    pub topic: String,
    pub brief: RemediationBrief,
}

impl EvaluationRequest {
    #[must_use]
    pub fn new(
        website_url: impl Into<String>,
        topic: impl Into<String>,
        brief: RemediationBrief,
    ) -> Self {
        Self {
            website_url: website_url.into(),
            topic: topic.into(),
            brief,
        }
    }
}

#[async_trait]
pub trait TutoringService: Send + Sync {
    /// Start a tutoring conversation about the missed questions.
    ///
    /// # Errors
    ///
    /// Returns `TutoringError` when the tutor cannot be reached.
    async fn request_tutoring(
        &self,
        request: &TutoringRequest,
    ) -> Result<TutoringReply, TutoringError>;

    /// Ask which areas the missed questions point to.
    ///
    /// # Errors
    ///
    /// Returns `TutoringError` when the tutor cannot be reached or says nothing.
    async fn evaluate_mistakes(
        &self,
        request: &EvaluationRequest,
    ) -> Result<String, TutoringError>;
}

/// `TutoringService` backed by the learning backend's chat endpoint.
#[derive(Clone)]
pub struct HttpTutoringService {
    client: Client,
    config: ServiceConfig,
}

impl HttpTutoringService {
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
impl TutoringService for HttpTutoringService {
    async fn request_tutoring(
        &self,
        request: &TutoringRequest,
    ) -> Result<TutoringReply, TutoringError> {
        let url = self.config.endpoint(CHAT_PATH);
        let chat_history = request.chat_history();
        let payload = ChatRequest {
            prompt: "",
            topic: request.topic.as_deref(),
            chat_history: &chat_history,
        };
        debug!(%url, missed = request.brief.len(), "requesting tutoring");

        let response = self.client.post(url).json(&payload).send().await?;
        check_status(response.status())?;

        Ok(response.json().await?)
    }

    async fn evaluate_mistakes(
        &self,
        request: &EvaluationRequest,
    ) -> Result<String, TutoringError> {
        let url = self.config.endpoint(EVALUATE_PATH);
        let wrong_answers = request.brief.render();
        let payload = EvaluationBody {
            website_url: &request.website_url,
            wrong_answers: &wrong_answers,
            topic: &request.topic,
        };
        debug!(%url, missed = request.brief.len(), "requesting mistake evaluation");

        let response = self.client.post(url).json(&payload).send().await?;
        check_status(response.status())?;

        evaluation_text(response.json().await?)
    }
}

fn check_status(status: StatusCode) -> Result<(), TutoringError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TutoringError::HttpStatus(status))
    }
}

fn evaluation_text(body: EvaluationResponse) -> Result<String, TutoringError> {
    body.response
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(TutoringError::EmptyResponse)
}

#[derive(Debug, Serialize)]
struct EvaluationBody<'a> {
    website_url: &'a str,
    wrong_answers: &'a str,
    topic: &'a str,
}

#[derive(Debug, Deserialize)]
struct EvaluationResponse {
    response: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    topic: Option<&'a str>,
    chat_history: &'a [ChatTurn],
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::{AnswerKey, OptionRecord, QuestionRecord};

    fn brief() -> RemediationBrief {
        let missed = QuestionRecord::new(
            "What is 2+2?",
            vec![OptionRecord::new("A", "3"), OptionRecord::new("B", "4")],
            AnswerKey::from_marker("1B"),
        );
        RemediationBrief::from_questions([&missed]).unwrap()
    }

    #[test]
    fn chat_history_opens_with_instruction_then_brief() {
        let request = TutoringRequest::new(Some("Arithmetic".into()), brief());
        let history = request.chat_history();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatTurn::human(MENTOR_INSTRUCTION));
        assert_eq!(
            history[1].content,
            "What is 2+2?\nOptions:\nA) 3\nB) 4"
        );
    }

    #[test]
    fn payload_uses_empty_prompt() {
        let request = TutoringRequest::new(None, brief());
        let history = request.chat_history();
        let payload = serde_json::to_value(ChatRequest {
            prompt: "",
            topic: request.topic.as_deref(),
            chat_history: &history,
        })
        .unwrap();

        assert_eq!(payload["prompt"], "");
        assert!(payload["topic"].is_null());
        assert_eq!(payload["chat_history"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn failing_status_is_http_status_error() {
        assert!(check_status(StatusCode::CREATED).is_ok());
        assert!(matches!(
            check_status(StatusCode::BAD_REQUEST),
            Err(TutoringError::HttpStatus(StatusCode::BAD_REQUEST))
        ));
    }

    #[test]
    fn evaluation_text_requires_content() {
        let blank: EvaluationResponse = serde_json::from_str(r#"{"response":"  "}"#).unwrap();
        assert!(matches!(
            evaluation_text(blank),
            Err(TutoringError::EmptyResponse)
        ));

        let present: EvaluationResponse =
            serde_json::from_str(r#"{"response":" - Review addition\n"}"#).unwrap();
        assert_eq!(evaluation_text(present).unwrap(), "- Review addition");
    }

    #[test]
    fn evaluation_body_sends_rendered_brief() {
        let request = EvaluationRequest::new("https://example.org", "Arithmetic", brief());
        let wrong_answers = request.brief.render();
        let body = serde_json::to_value(EvaluationBody {
            website_url: &request.website_url,
            wrong_answers: &wrong_answers,
            topic: &request.topic,
        })
        .unwrap();

        assert_eq!(body["wrong_answers"], "What is 2+2?\nOptions:\nA) 3\nB) 4");
        assert_eq!(body["website_url"], "https://example.org");
    }

    #[test]
    fn reply_tolerates_missing_fields() {
        let reply: TutoringReply =
            serde_json::from_str(r#"{"chat_history":[{"role":"ai","content":"Let's start."}]}"#)
                .unwrap();
        assert_eq!(reply.response, "");
        assert_eq!(reply.chat_history, vec![ChatTurn::ai("Let's start.")]);
    }
}
