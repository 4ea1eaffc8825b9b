//! Validate tool call arguments against a tool spec before execution.

use super::types::{ParameterKind, ToolSpec};

/// Validate an argument bag against `spec`.
///
/// Checks that the bag is an object, that every required parameter is
/// present, and that declared parameters carry the declared JSON type.
/// Extra keys are tolerated. Returns the first violation found.
pub fn validate_arguments(args: &serde_json::Value, spec: &ToolSpec) -> Result<(), String> {
    let obj = match args.as_object() {
        Some(obj) => obj,
        None if args.is_null() && spec.required().is_empty() => return Ok(()),
        None => {
            return Err(format!(
                "expected object arguments, got {}",
                json_type_name(args)
            ))
        }
    };

    for name in spec.required() {
        if !obj.contains_key(name) {
            return Err(format!("missing required field '{name}'"));
        }
    }

    for param in spec.parameters() {
        let Some(value) = obj.get(&param.name) else {
            continue;
        };
        if !value_matches_kind(value, param.kind) {
            return Err(format!(
                "field '{}' expected type '{}', got {}",
                param.name,
                param.kind,
                json_type_name(value)
            ));
        }
    }

    Ok(())
}

fn value_matches_kind(value: &serde_json::Value, kind: ParameterKind) -> bool {
    match kind {
        ParameterKind::String => value.is_string(),
        ParameterKind::Number => value.is_number(),
        ParameterKind::Integer => value.is_i64() || value.is_u64(),
        ParameterKind::Boolean => value.is_boolean(),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
