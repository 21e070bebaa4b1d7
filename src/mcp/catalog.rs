use crate::errors::{ErrorCode, McpError};
use crate::utils::suggest::suggest;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

static TOOL_CATALOG: Lazy<Vec<ToolDef>> = Lazy::new(|| {
    let raw = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tool_catalog.json"));
    serde_json::from_str(raw).expect("tool_catalog.json must be valid JSON")
});

static TOOL_MAP: Lazy<HashMap<String, ToolDef>> = Lazy::new(|| {
    TOOL_CATALOG
        .iter()
        .cloned()
        .map(|tool| (tool.name.clone(), tool))
        .collect()
});

static TOOL_VALIDATORS: Lazy<HashMap<String, JSONSchema>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for tool in TOOL_CATALOG.iter() {
        if let Ok(schema) = JSONSchema::compile(&tool.input_schema) {
            map.insert(tool.name.clone(), schema);
        }
    }
    map
});

pub fn tool_catalog() -> &'static Vec<ToolDef> {
    &TOOL_CATALOG
}

pub fn tool_by_name(name: &str) -> Option<&'static ToolDef> {
    TOOL_MAP.get(name)
}

pub fn validate_tool_args(tool_name: &str, args: &Value) -> Result<(), McpError> {
    let Some(tool) = tool_by_name(tool_name) else {
        return Ok(());
    };
    let Some(schema) = TOOL_VALIDATORS.get(tool_name) else {
        return Ok(());
    };
    if let Err(errors) = schema.validate(args) {
        let message = format_schema_errors(tool_name, errors, &tool.input_schema);
        return Err(McpError::new(ErrorCode::InvalidParams, message));
    }
    Ok(())
}

fn format_schema_errors(
    tool_name: &str,
    errors: jsonschema::ErrorIterator,
    schema: &Value,
) -> String {
    let mut lines = vec![format!("Invalid arguments for {}", tool_name)];
    let mut did_you_means = Vec::new();

    for err in errors.take(10) {
        let instance_path = if err.instance_path.to_string().is_empty() {
            "(root)".to_string()
        } else {
            err.instance_path.to_string()
        };
        match &err.kind {
            jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
                for unknown in unexpected {
                    lines.push(format!("- {}: unknown field '{}'", instance_path, unknown));
                    let known: Vec<String> = schema
                        .get("properties")
                        .and_then(|v| v.as_object())
                        .map(|map| map.keys().cloned().collect())
                        .unwrap_or_default();
                    let suggestions = suggest(unknown, &known, 3);
                    if !suggestions.is_empty() {
                        did_you_means
                            .push(format!("field '{}': {}", unknown, suggestions.join(", ")));
                    }
                }
            }
            jsonschema::error::ValidationErrorKind::Required { property } => {
                let prop = property
                    .as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| property.to_string());
                lines.push(format!(
                    "- {}: missing required field '{}'",
                    instance_path, prop
                ));
            }
            jsonschema::error::ValidationErrorKind::Enum { options } => {
                let allowed: Vec<String> = options
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| {
                                v.as_str()
                                    .map(|s| s.to_string())
                                    .unwrap_or_else(|| v.to_string())
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                lines.push(format!(
                    "- {}: expected one of {}",
                    instance_path,
                    allowed.join(", ")
                ));
            }
            _ => {
                lines.push(format!("- {}: {}", instance_path, err));
            }
        }
    }

    if !did_you_means.is_empty() {
        lines.push(format!("Did you mean: {}", did_you_means.join(" | ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_parses_and_every_tool_has_a_compiled_validator() {
        for tool in tool_catalog().iter() {
            assert!(
                TOOL_VALIDATORS.contains_key(&tool.name),
                "schema for {} must compile",
                tool.name
            );
        }
    }

    #[test]
    fn validation_rejects_unknown_fields() {
        let err = validate_tool_args("document_get", &json!({"documentId": "d1", "bogus": 1}))
            .unwrap_err();
        assert!(err.message.contains("unknown field 'bogus'"));
    }

    #[test]
    fn validation_reports_missing_required_fields() {
        let err = validate_tool_args("document_get", &json!({})).unwrap_err();
        assert!(err.message.contains("missing required field 'documentId'"));
    }

    #[test]
    fn unknown_tools_pass_through_for_the_executor_to_reject() {
        assert!(validate_tool_args("no_such_tool", &json!({})).is_ok());
    }
}
