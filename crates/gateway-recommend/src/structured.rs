//! Parsing of structured recommendations out of model text.
//!
//! Models wrap JSON in prose or markdown fences. [`extract_json_blob`]
//! narrows the text to one candidate object, [`parse_recommendation`]
//! validates it all-or-nothing: nothing is coerced or defaulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Why a model answer could not be used
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No `{ ... }` candidate in the text
    #[error("No JSON object found in model output")]
    NoJsonFound,

    /// The candidate is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON with the wrong shape
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),
}

/// Validated recommendation returned by a model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredRecommendation {
    /// Dietary goal the advice targets
    pub goal: String,
    /// Advice about the current meal
    pub meal_suggestion: String,
    /// Advice for the next meal
    pub next_meal_suggestion: String,
    /// Behavioural advice
    pub behavior_suggestion: String,
    /// Optional warning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_alert: Option<String>,
}

/// Locate the JSON object in a model answer.
///
/// Tried in order: the whole trimmed text when it is brace-delimited, the
/// body of the first non-empty ```` ```json ```` fence, then the span from
/// the first `{` to the last `}`.
///
/// # Errors
/// Returns [`ParseError::NoJsonFound`] when none of these apply
pub fn extract_json_blob(text: &str) -> Result<&str, ParseError> {
    let raw = text.trim();
    if raw.starts_with('{') && raw.ends_with('}') {
        return Ok(raw);
    }

    if let Some(start) = raw.find(JSON_FENCE) {
        let body_start = start + JSON_FENCE.len();
        if let Some(len) = raw[body_start..].find(FENCE) {
            let candidate = raw[body_start..body_start + len].trim();
            if !candidate.is_empty() {
                return Ok(candidate);
            }
        }
    }

    match (raw.find('{'), raw.rfind('}')) {
        (Some(first), Some(last)) if last > first => Ok(&raw[first..=last]),
        _ => Err(ParseError::NoJsonFound),
    }
}

/// Extract and validate a recommendation from a model answer.
///
/// Unknown keys are ignored; `risk_alert` may be absent or null.
///
/// # Errors
/// Returns a [`ParseError`] describing the first problem found
pub fn parse_recommendation(text: &str) -> Result<StructuredRecommendation, ParseError> {
    let blob = extract_json_blob(text)?;
    let value: Value =
        serde_json::from_str(blob).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    if !value.is_object() {
        return Err(ParseError::SchemaValidation(
            "expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ParseError::SchemaValidation(e.to_string()))
}
