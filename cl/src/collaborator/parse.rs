//! Parsing of model replies that are supposed to be a JSON object
//!
//! Models in JSON mode usually comply, but fenced blocks and a sentence of
//! preamble still show up; both are tolerated.

use serde_json::Value;
use tracing::debug;

use super::CollaboratorError;

/// Pull the first JSON object out of a model reply
pub fn extract_json_object(reply: &str) -> Result<Value, CollaboratorError> {
    let trimmed = strip_code_fence(reply.trim());

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            debug!(start, end, "extract_json_object: parsing embedded object");
            match serde_json::from_str::<Value>(&trimmed[start..=end]) {
                Ok(value @ Value::Object(_)) => Ok(value),
                Ok(_) => Err(CollaboratorError::Parse("reply is not a JSON object".to_string())),
                Err(e) => Err(CollaboratorError::Parse(e.to_string())),
            }
        }
        _ => Err(CollaboratorError::Parse(format!(
            "no JSON object in reply: {}",
            preview(trimmed)
        ))),
    }
}

/// Non-empty string field of a parsed reply
pub(crate) fn string_field(value: &Value, field: &'static str) -> Result<String, CollaboratorError> {
    let text = value
        .get(field)
        .and_then(Value::as_str)
        .ok_or(CollaboratorError::MissingField(field))?
        .trim();

    if text.is_empty() {
        return Err(CollaboratorError::Empty(field));
    }
    Ok(text.to_string())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the first newline
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn preview(text: &str) -> String {
    const MAX: usize = 80;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    }
}
