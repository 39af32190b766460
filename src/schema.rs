//! Generic argument-schema validation
//!
//! Tool argument schemas are plain JSON values shaped like a JSON Schema
//! object (`type`, `properties`, `required`). Validation happens before
//! dispatch so a bad tool call becomes a structured rejection instead of a
//! runtime fault inside the tool.

use serde_json::Value;

use crate::error::{QuestorError, Result};

/// Validate `args` against an object-shaped schema.
///
/// Checks, in order: args must be a JSON object, every `required` key must
/// be present, every provided key must be declared under `properties` (when
/// any are declared), and each declared type must match. An empty or null
/// schema accepts any object.
pub fn validate_args(schema: &Value, args: &Value) -> Result<()> {
    let args_map = args
        .as_object()
        .ok_or_else(|| QuestorError::SchemaMismatch("arguments must be a JSON object".to_string()))?;

    let Some(schema_map) = schema.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema_map.get("required").and_then(|r| r.as_array()) {
        for key in required.iter().filter_map(|k| k.as_str()) {
            if !args_map.contains_key(key) {
                return Err(QuestorError::SchemaMismatch(format!(
                    "missing required argument '{}'",
                    key
                )));
            }
        }
    }

    let properties = schema_map.get("properties").and_then(|p| p.as_object());

    if let Some(props) = properties {
        for (key, value) in args_map {
            let Some(prop) = props.get(key) else {
                if props.is_empty() {
                    continue;
                }
                return Err(QuestorError::SchemaMismatch(format!("unknown argument '{}'", key)));
            };

            if let Some(expected) = prop.get("type").and_then(|t| t.as_str()) {
                if !type_matches(expected, value) {
                    return Err(QuestorError::SchemaMismatch(format!(
                        "argument '{}' should be of type '{}'",
                        key, expected
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Check a JSON value against a JSON Schema primitive type name.
fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // Unknown type names are not enforced
        _ => true,
    }
}
