use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status_code: u16,
    pub error_body: Value,
    message: String,
}

impl ApiError {
    pub fn new(status_code: u16, error_body: Value) -> Self {
        let message = format_message(status_code, &error_body);
        Self {
            status_code,
            error_body,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn status_prefix(status_code: u16) -> String {
    match status_code {
        400 => "Bad Request - Validation failed".to_string(),
        401 => "Unauthorized - Invalid email or API key".to_string(),
        403 => "Forbidden - Insufficient permissions or usage limit exceeded".to_string(),
        404 => "Not Found - Resource does not exist".to_string(),
        429 => "Rate Limit Exceeded".to_string(),
        other => format!("HTTP {}", other),
    }
}

fn format_message(status_code: u16, error_body: &Value) -> String {
    let prefix = status_prefix(status_code);
    if let Some(detail) = error_body.get("message").and_then(|v| v.as_str()) {
        return format!("{}: {}", prefix, detail);
    }
    format!("{}: {}", prefix, error_body)
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_uses_known_status_prefix_and_body_message() {
        let err = ApiError::new(401, serde_json::json!({"message": "bad key"}));
        assert_eq!(
            err.message(),
            "Unauthorized - Invalid email or API key: bad key"
        );
    }

    #[test]
    fn message_serializes_body_when_message_field_is_absent() {
        let err = ApiError::new(500, serde_json::json!({"code": "OOPS"}));
        assert_eq!(err.message(), r#"HTTP 500: {"code":"OOPS"}"#);
    }

    #[test]
    fn message_serializes_non_string_message_field_as_payload() {
        let err = ApiError::new(400, serde_json::json!({"message": 17}));
        assert_eq!(
            err.message(),
            r#"Bad Request - Validation failed: {"message":17}"#
        );
    }

    #[test]
    fn message_handles_raw_text_body() {
        let err = ApiError::new(502, Value::String("upstream down".to_string()));
        assert_eq!(err.message(), "HTTP 502: \"upstream down\"");
    }
}
