pub mod documents;
pub mod files;
pub mod labels;
pub mod templates;
pub mod user;
pub mod webhooks;

use crate::errors::ToolError;
use serde_json::{Map, Value};

pub(crate) fn forward_optional_fields(args: &Value, body: &mut Map<String, Value>, keys: &[&str]) {
    for key in keys {
        if let Some(value) = args.get(*key).filter(|v| !v.is_null()) {
            body.insert((*key).to_string(), value.clone());
        }
    }
}

pub(crate) fn require_field(args: &Value, key: &str) -> Result<Value, ToolError> {
    args.get(key)
        .filter(|v| !v.is_null())
        .cloned()
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", key)))
}

pub(crate) fn unknown_tool_error(family: &str, tool: &str) -> ToolError {
    ToolError::internal(format!("Tool {} is not wired to the {} manager", tool, family))
}
