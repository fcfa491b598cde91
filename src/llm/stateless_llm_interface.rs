use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One chat message in OpenAI wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// A single-turn completion: persona instruction, user content and sampling budget
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn messages(&self) -> Vec<Message> {
        vec![
            Message {
                role: "system".to_string(),
                content: self.system.clone(),
            },
            Message {
                role: "user".to_string(),
                content: self.user.clone(),
            },
        ]
    }
}

/// Failures from the provider. Handlers collapse all of these into one opaque error.
#[derive(Debug, Error)]
pub enum LLMError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed ({status}): {body}")]
    Authentication { status: u16, body: String },

    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("provider returned no completion")]
    EmptyCompletion,
}

/// Interface for a stateless language model
/// Stateless means nothing is remembered between calls; every request carries its own instruction
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Run one chat completion and return the text of the first choice
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, LLMError>;
}
