//! Message and result types shared by every backend

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message; serialized as `{"role": .., "content": ..}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Token counters, when the backend reports them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: Option<i64>,
    pub completion_tokens: Option<i64>,
}

impl TokenUsage {
    /// `None` when neither counter was reported
    pub fn from_counts(prompt_tokens: Option<i64>, completion_tokens: Option<i64>) -> Option<Self> {
        if prompt_tokens.is_none() && completion_tokens.is_none() {
            None
        } else {
            Some(Self {
                prompt_tokens,
                completion_tokens,
            })
        }
    }
}

/// Successful generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Name of the adapter that produced `text`
    pub backend: String,
    pub usage: Option<TokenUsage>,
}
