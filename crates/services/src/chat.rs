use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn, as the learning backend names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
}

/// One turn of a tutoring conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Human,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Ai,
            content: content.into(),
        }
    }
}
