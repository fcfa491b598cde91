use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::llm::{LLMError, StatelessLLMInterface};
use crate::translate::interface::{
    supported_languages, DetectRequest, DetectResponse, TranslateRequest, TranslateResponse,
};
use crate::translate::languages;
use crate::translate::prompt;

/// Fixed confidence label reported with every detection.
pub const DETECTION_CONFIDENCE: &str = "high";

/// Runs validated requests against the LLM and shapes the payloads.
#[derive(Clone)]
pub struct TranslationService {
    llm: Arc<dyn StatelessLLMInterface>,
}

impl TranslationService {
    pub fn new(llm: Arc<dyn StatelessLLMInterface>) -> Self {
        Self { llm }
    }

    pub async fn translate(
        &self,
        request: TranslateRequest,
    ) -> Result<TranslateResponse, ApiError> {
        debug!("Translating {} -> {}", request.source, request.target);
        let completion =
            prompt::translation_request(&request.message, &request.source, &request.target);
        let translated_message = self
            .llm
            .chat_completion(completion)
            .await
            .map_err(|e| external("Translation", e))?;

        Ok(TranslateResponse {
            original_message: request.message,
            source_language: request.source,
            target_language: request.target,
            translated_message,
            supported_languages: supported_languages(),
        })
    }

    pub async fn detect(&self, request: DetectRequest) -> Result<DetectResponse, ApiError> {
        let raw = self
            .llm
            .chat_completion(prompt::detection_request(&request.message))
            .await
            .map_err(|e| external("Language detection", e))?;

        let code = normalize_code(&raw);
        debug!("Detected language code: {} (raw={:?})", code, raw);

        Ok(DetectResponse {
            original_message: request.message,
            detected_language_name: languages::display_name(&code).to_string(),
            detected_language_code: code,
            confidence: DETECTION_CONFIDENCE.to_string(),
            supported_languages: supported_languages(),
        })
    }
}

fn external(operation: &'static str, err: LLMError) -> ApiError {
    ApiError::ExternalService {
        operation,
        detail: err.to_string(),
    }
}

/// Models sometimes wrap the code in quotes or add a trailing period.
fn normalize_code(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}
