//! Conversation turn types

use serde::{Deserialize, Serialize};

/// Who produced a turn. The wire name for the assistant side is "model",
/// matching both the Gemini contents format and the stored rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Locally generated monotonic token for turns not yet persisted;
    /// replaced by the storage-assigned id when loaded from durable storage.
    pub id: String,
    pub role: Role,
    pub content: String,
    /// External movie ids referenced by this turn; empty until finalized.
    pub movie_ids: Vec<i64>,
    /// True only while the model response is still being produced.
    pub in_progress: bool,
}

impl Turn {
    pub fn user(id: String, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            movie_ids: Vec::new(),
            in_progress: false,
        }
    }

    /// Placeholder model turn, filled in as the response streams.
    pub fn placeholder(id: String) -> Self {
        Self {
            id,
            role: Role::Model,
            content: String::new(),
            movie_ids: Vec::new(),
            in_progress: true,
        }
    }
}
