//! Cleanup of model text into validated records.
//!
//! Models are asked for raw JSON but frequently wrap it in a markdown fence,
//! sometimes tagged `json`. The fence is removed before parsing.

use serde::de::DeserializeOwned;
use serde_json::Value;

const FENCE: &str = "```";

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Model output is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Model output does not match the expected schema: {0}")]
    Schema(String),
}

/// A record the model is asked to produce. `Raw` is the permissive wire
/// shape, `from_raw` validates and converts it.
pub trait ModelSchema: Sized {
    type Raw: DeserializeOwned;

    fn from_raw(raw: Self::Raw) -> Result<Self, NormalizeError>;
}

pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let mut body = &trimmed[start + FENCE.len()..];
    if body
        .get(..4)
        .is_some_and(|tag| tag.eq_ignore_ascii_case("json"))
    {
        body = &body[4..];
    }

    match body.find(FENCE) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Strips any code fence and parses the remainder as JSON.
pub fn normalize(text: &str) -> Result<Value, NormalizeError> {
    serde_json::from_str(strip_code_fence(text)).map_err(NormalizeError::Parse)
}

pub fn parse_model_json<T: ModelSchema>(text: &str) -> Result<T, NormalizeError> {
    let value = normalize(text)?;
    let raw: T::Raw =
        serde_json::from_value(value).map_err(|e| NormalizeError::Schema(e.to_string()))?;
    T::from_raw(raw)
}
