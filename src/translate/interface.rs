//! Typed requests, parsed at the HTTP boundary, and the JSON payloads returned to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ApiError;
use crate::settings::LimitsConfig;
use crate::translate::input::{self, QueryPairs};
use crate::translate::languages::{self, AUTO_DETECT};

/// A translation request whose message is validated and sanitized and whose
/// languages are resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub message: String,
    /// Registry code, or [`AUTO_DETECT`]
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectRequest {
    pub message: String,
}

/// Longest requested code echoed back in an unsupported-language error.
const MAX_ECHOED_CODE_CHARS: usize = 8;

fn first_param<'a>(pairs: &'a QueryPairs, name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

impl TranslateRequest {
    pub fn from_query(pairs: &QueryPairs, limits: &LimitsConfig) -> Result<Self, ApiError> {
        let max = limits.translate_max_chars;
        let raw = input::single_param(pairs, "message", max)?;
        let message = input::clean_message(raw, max)?;

        // Unknown or absent source falls back to auto-detection
        let source = first_param(pairs, "source")
            .and_then(languages::lookup)
            .map(|l| l.code)
            .unwrap_or(AUTO_DETECT)
            .to_string();

        let requested = first_param(pairs, "target").unwrap_or(limits.default_target.as_str());
        let target = languages::lookup(requested)
            .map(|l| l.code.to_string())
            .ok_or_else(|| unsupported_target(requested))?;

        Ok(Self {
            message,
            source,
            target,
        })
    }
}

fn unsupported_target(code: &str) -> ApiError {
    let mut echoed: String = code.chars().take(MAX_ECHOED_CODE_CHARS).collect();
    if code.chars().count() > MAX_ECHOED_CODE_CHARS {
        echoed.push_str("...");
    }
    ApiError::UnsupportedLanguage {
        code: echoed,
        supported: languages::supported_codes(),
    }
}

impl DetectRequest {
    pub fn from_query(pairs: &QueryPairs, limits: &LimitsConfig) -> Result<Self, ApiError> {
        let max = limits.detect_max_chars;
        let raw = input::single_param(pairs, "message", max)?;
        Ok(Self {
            message: input::clean_message(raw, max)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub original_message: String,
    pub source_language: String,
    pub target_language: String,
    pub translated_message: String,
    pub supported_languages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub original_message: String,
    pub detected_language_code: String,
    pub detected_language_name: String,
    pub confidence: String,
    pub supported_languages: BTreeMap<String, String>,
}

pub fn supported_languages() -> BTreeMap<String, String> {
    languages::supported_languages()
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}
