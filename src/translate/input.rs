//! Boundary validation of the `message` query parameter and markup stripping.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("A message is required. Provide the 'message' query parameter.")]
    Missing,

    #[error("The message must be a string of at most {max} characters.")]
    TooLong { max: usize },

    /// Not a single textual value, e.g. the parameter was repeated.
    #[error("The message must be a string of at most {max} characters.")]
    WrongType { max: usize },

    #[error("The message is not valid.")]
    InvalidAfterSanitize,
}

/// Raw query pairs as decoded from the URL, before any validation.
pub type QueryPairs = Vec<(String, String)>;

/// Split and percent-decode a raw query string.
///
/// `+` decodes to a space. Any component that does not decode to valid UTF-8 is
/// a `WrongType` failure rather than being replaced lossily.
pub fn parse_query(raw: Option<&str>, max: usize) -> Result<QueryPairs, InputError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            Ok((decode_component(key, max)?, decode_component(value, max)?))
        })
        .collect()
}

fn decode_component(component: &str, max: usize) -> Result<String, InputError> {
    urlencoding::decode(&component.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|_| InputError::WrongType { max })
}

/// Return the single value of `name`, if present. Repeated keys are a type error.
pub fn single_param<'a>(
    pairs: &'a QueryPairs,
    name: &str,
    max: usize,
) -> Result<Option<&'a str>, InputError> {
    let mut values = pairs.iter().filter(|(k, _)| k == name).map(|(_, v)| v);
    let first = values.next();
    if values.next().is_some() {
        return Err(InputError::WrongType { max });
    }
    Ok(first.map(String::as_str))
}

/// Check presence and length of the raw message. Length counts chars, not bytes.
pub fn validate_message(raw: Option<&str>, max: usize) -> Result<&str, InputError> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => return Err(InputError::Missing),
    };

    if raw.chars().count() > max {
        return Err(InputError::TooLong { max });
    }
    Ok(raw)
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

/// Script and style elements together with their bodies.
fn executable_element_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</\s*(script|style)\s*>")
            .expect("element pattern is valid")
    })
}

/// Drop script/style elements whole, then strip every remaining `<...>` and trim.
pub fn sanitize(text: &str) -> String {
    let without_elements = executable_element_pattern().replace_all(text, "");
    tag_pattern()
        .replace_all(&without_elements, "")
        .trim()
        .to_string()
}

/// Validate then sanitize. The returned text is what every response echoes back.
pub fn clean_message(raw: Option<&str>, max: usize) -> Result<String, InputError> {
    let raw = validate_message(raw, max)?;
    let sanitized = sanitize(raw);
    if sanitized.is_empty() {
        return Err(InputError::InvalidAfterSanitize);
    }
    Ok(sanitized)
}
