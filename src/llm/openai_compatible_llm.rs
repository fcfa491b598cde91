use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::stateless_llm_interface::{CompletionRequest, LLMError, Message, StatelessLLMInterface};

/// OpenAI compatible LLM implementation
/// Talks to `{base_url}/chat/completions` directly with a bearer key
pub struct OpenAICompatibleLLM {
    client: Client,
    model: String,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAICompatibleLLM {
    pub fn new(
        model: String,
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}, timeout={:?}",
            model, base_url, timeout
        );
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    async fn chat_completion(&self, request: CompletionRequest) -> Result<String, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: request.messages(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        debug!(
            "Sending chat completion: model={}, max_tokens={}, temperature={}",
            self.model, request.max_tokens, request.temperature
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;
        first_choice_text(parsed)
    }
}

fn network_error(err: reqwest::Error) -> LLMError {
    if err.is_timeout() {
        LLMError::Network(format!("request timed out: {}", err))
    } else {
        LLMError::Network(err.to_string())
    }
}

fn classify_status(status: u16, body: String) -> LLMError {
    match status {
        401 | 403 => LLMError::Authentication { status, body },
        429 => LLMError::Quota(body),
        _ => LLMError::Status { status, body },
    }
}

fn first_choice_text(response: ChatCompletionResponse) -> Result<String, LLMError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(LLMError::EmptyCompletion)
}
