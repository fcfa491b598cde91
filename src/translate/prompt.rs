use crate::llm::CompletionRequest;
use crate::translate::languages::{self, AUTO_DETECT};

const TRANSLATION_MAX_TOKENS: u32 = 1000;
const TRANSLATION_TEMPERATURE: f32 = 0.3;
const DETECTION_MAX_TOKENS: u32 = 10;
const DETECTION_TEMPERATURE: f32 = 0.1;

const DETECTION_INSTRUCTION: &str = "You are a language identification expert. \
    Identify the language of the text provided by the user. \
    Respond with ONLY the two-letter ISO 639-1 code of that language (for example: en, ko, ja), \
    in lowercase, with no punctuation or explanation.";

/// Build the completion request for a translation.
///
/// `source` is either a registry code or [`AUTO_DETECT`]; `target` must already be a registry code.
pub fn translation_request(text: &str, source: &str, target: &str) -> CompletionRequest {
    let target_name = languages::display_name(target);

    let direction = match languages::lookup(source) {
        Some(lang) if source != AUTO_DETECT => format!(
            "Translate the given text from {} ({}) into {} ({}).",
            lang.name, lang.code, target_name, target
        ),
        _ => format!(
            "Detect the language of the given text and translate it into {} ({}).",
            target_name, target
        ),
    };

    let system = format!(
        "You are a professional translator. {direction} \
         Preserve the meaning and nuance of the original as closely as possible \
         while keeping the translation natural and grammatical in {target_name}. \
         Output only the translated text."
    );

    CompletionRequest {
        system,
        user: format!("Translate the following text into {target_name}: \"{text}\""),
        max_tokens: TRANSLATION_MAX_TOKENS,
        temperature: TRANSLATION_TEMPERATURE,
    }
}

/// Build the completion request asking for a bare ISO 639-1 code.
pub fn detection_request(text: &str) -> CompletionRequest {
    CompletionRequest {
        system: DETECTION_INSTRUCTION.to_string(),
        user: text.to_string(),
        max_tokens: DETECTION_MAX_TOKENS,
        temperature: DETECTION_TEMPERATURE,
    }
}
