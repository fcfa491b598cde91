use axum::extract::{RawQuery, State};
use axum::Json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::translate::input::{self, QueryPairs};
use crate::translate::{DetectRequest, DetectResponse, TranslateRequest, TranslateResponse};

/// `GET /translate?message=&source=&target=`
pub async fn translate(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<TranslateResponse>, ApiError> {
    let limits = &state.config.limits;
    let pairs = query_pairs(query.as_deref(), limits.translate_max_chars)
        .map_err(|e| rejected("/translate", e))?;
    let request =
        TranslateRequest::from_query(&pairs, limits).map_err(|e| rejected("/translate", e))?;

    let response = state
        .translator
        .translate(request)
        .await
        .map_err(|e| failed("/translate", e))?;

    info!(
        "Translated {} chars {} -> {}",
        response.original_message.chars().count(),
        response.source_language,
        response.target_language
    );
    Ok(Json(response))
}

/// `GET /detectLanguage?message=`
pub async fn detect_language(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<DetectResponse>, ApiError> {
    let limits = &state.config.limits;
    let pairs = query_pairs(query.as_deref(), limits.detect_max_chars)
        .map_err(|e| rejected("/detectLanguage", e))?;
    let request =
        DetectRequest::from_query(&pairs, limits).map_err(|e| rejected("/detectLanguage", e))?;

    let response = state
        .translator
        .detect(request)
        .await
        .map_err(|e| failed("/detectLanguage", e))?;

    info!("Detected language: {}", response.detected_language_code);
    Ok(Json(response))
}

/// An undecodable query string means the message is not usable text.
fn query_pairs(query: Option<&str>, max: usize) -> Result<QueryPairs, ApiError> {
    Ok(input::parse_query(query, max)?)
}

fn rejected(endpoint: &str, err: ApiError) -> ApiError {
    warn!(endpoint = endpoint, "Validation failed: {}", err);
    err
}

/// Record the full failure for operators; the caller only sees the redacted message.
fn failed(endpoint: &str, err: ApiError) -> ApiError {
    error!(
        request_id = %Uuid::new_v4(),
        endpoint = endpoint,
        timestamp = %chrono::Utc::now().to_rfc3339(),
        error = %err,
        "External service call failed"
    );
    err
}
