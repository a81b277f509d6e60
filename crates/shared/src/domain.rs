use serde::{Deserialize, Serialize};

use crate::protocol::ChatReply;

/// Who produced a chat entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub origin: MessageOrigin,
    #[serde(default)]
    pub sources: Vec<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: MessageOrigin::User,
            sources: Vec::new(),
        }
    }

    pub fn bot(text: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            text: text.into(),
            origin: MessageOrigin::Bot,
            sources,
        }
    }
}

impl From<ChatReply> for ChatMessage {
    fn from(reply: ChatReply) -> Self {
        Self::bot(reply.answer, reply.sources)
    }
}
