//! Decoding model answers into result records

use serde_json::{Map, Value};

use crate::error::{ModelError, ValidationError};
use crate::schema::{self, FieldSource, FieldValue, Record, Schema};

impl FieldSource for Map<String, Value> {
    fn lookup(&self, name: &str) -> FieldValue<'_> {
        match self.get(name) {
            None => FieldValue::Missing,
            Some(Value::String(s)) => FieldValue::Text(s),
            Some(other) => FieldValue::Other(json_kind(other)),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build a record from a JSON value, validating it against the record's schema
pub fn record_from_value<R: Record>(value: &Value) -> Result<R, ValidationError> {
    let object = as_object(R::schema(), value)?;
    schema::validate(R::schema(), object).map(R::from_fields)
}

fn as_object<'a>(schema: &'static Schema, value: &'a Value) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or(ValidationError::NotAnObject {
        schema: schema.name,
        found: json_kind(value),
    })
}

/// Pull the JSON object out of a model answer.
///
/// Models often wrap the object in a Markdown fence or add a sentence around
/// it, so when the whole text is not an object the span from the first `{` to
/// the last `}` is tried.
pub fn extract_json_object(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ModelError::EmptyResponse);
    }

    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&trimmed[start..=end])
                .map_err(|e| ModelError::malformed(format!("invalid JSON object: {}", e)))
        }
        _ => Err(ModelError::malformed("no JSON object found in response")),
    }
}

/// Decode and validate a model answer as the result record `R`
pub fn decode_output<R: Record>(text: &str) -> Result<R, ModelError> {
    let value = extract_json_object(text)?;
    record_from_value(&value).map_err(ModelError::InvalidOutput)
}
