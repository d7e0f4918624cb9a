use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Location of the learning backend that generates quizzes and tutors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub topic: Option<String>,
}

impl ServiceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            topic: None,
        }
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        let topic: String = topic.into();
        self.topic = Some(topic).filter(|t| !t.trim().is_empty());
        self
    }

    /// Reads `LEARN_API_BASE_URL` and `LEARN_QUIZ_TOPIC`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("LEARN_API_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let config = Self::new(base_url);
        match env::var("LEARN_QUIZ_TOPIC") {
            Ok(topic) => config.with_topic(topic),
            Err(_) => config,
        }
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let config = ServiceConfig::new("http://backend:8000/");
        assert_eq!(
            config.endpoint("/newcontent/take_quiz"),
            "http://backend:8000/newcontent/take_quiz"
        );
    }

    #[test]
    fn blank_topic_is_ignored() {
        let config = ServiceConfig::default().with_topic("  ");
        assert_eq!(config.topic, None);
        assert_eq!(
            ServiceConfig::default().with_topic("Ownership").topic.as_deref(),
            Some("Ownership")
        );
    }
}
