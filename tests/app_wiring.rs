mod common;

use common::ENV_LOCK;
use modusign_mcp::app::{App, Config};
use modusign_mcp::errors::ToolErrorKind;
use modusign_mcp::mcp::catalog::tool_catalog;
use serde_json::json;

fn test_config() -> Config {
    Config {
        email: "user@example.com".to_string(),
        api_key: "secret".to_string(),
        base_url: Some("http://127.0.0.1:1".to_string()),
    }
}

fn restore_env(key: &str, previous: Option<String>) {
    match previous {
        Some(value) => std::env::set_var(key, value),
        None => std::env::remove_var(key),
    }
}

#[tokio::test]
async fn every_catalog_tool_has_a_registered_handler() {
    let app = App::with_config(test_config()).expect("app must wire");
    for tool in tool_catalog().iter() {
        assert!(
            app.tool_executor.has_handler(&tool.name),
            "tool {} must have a handler",
            tool.name
        );
    }
}

#[tokio::test]
async fn unknown_tools_are_rejected_with_a_suggestion() {
    let app = App::with_config(test_config()).expect("app must wire");
    let err = app
        .tool_executor
        .execute("documnet_list", json!({}))
        .await
        .expect_err("must fail");
    assert_eq!(err.kind, ToolErrorKind::InvalidParams);
    assert!(err.message.contains("Unknown tool"));
    assert!(err.hint.as_deref().unwrap_or("").contains("document_list"));
}

#[tokio::test]
async fn missing_credentials_are_a_fatal_configuration_error() {
    let _guard = ENV_LOCK.lock().await;
    let prev_email = std::env::var("MODUSIGN_EMAIL").ok();
    let prev_key = std::env::var("MODUSIGN_API_KEY").ok();

    std::env::remove_var("MODUSIGN_EMAIL");
    std::env::remove_var("MODUSIGN_API_KEY");

    let err = Config::from_env().expect_err("must fail without credentials");
    assert!(err.message.contains("MODUSIGN_EMAIL"));
    assert!(err
        .hint
        .as_deref()
        .unwrap_or("")
        .contains("MODUSIGN_API_KEY"));

    restore_env("MODUSIGN_EMAIL", prev_email);
    restore_env("MODUSIGN_API_KEY", prev_key);
}

#[tokio::test]
async fn invalid_base_url_is_rejected_at_construction() {
    let config = Config {
        base_url: Some("not a url".to_string()),
        ..test_config()
    };
    let err = App::with_config(config).expect_err("must fail");
    assert!(err.message.contains("Invalid base URL"));
}

#[tokio::test]
async fn handlers_reject_invalid_arguments_before_any_request() {
    let app = App::with_config(test_config()).expect("app must wire");
    let err = app
        .tool_executor
        .execute("document_get", json!({}))
        .await
        .expect_err("must fail");
    assert_eq!(err.kind, ToolErrorKind::InvalidParams);
    assert!(err.message.contains("documentId"));
}
