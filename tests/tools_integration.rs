mod common;

use modusign_mcp::app::{App, Config};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(server_uri: &str) -> App {
    App::with_config(Config {
        email: common::TEST_EMAIL.to_string(),
        api_key: common::TEST_API_KEY.to_string(),
        base_url: Some(server_uri.to_string()),
    })
    .expect("app must wire")
}

#[tokio::test]
async fn document_list_builds_the_filter_expression_from_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(query_param("limit", "20"))
        .and(query_param(
            "filter",
            "status eq 'ON_GOING' and contains(title, 'O''Brien')",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let result = app
        .tool_executor
        .execute(
            "document_list",
            json!({"limit": 20, "status": "ON_GOING", "titleContains": "O'Brien"}),
        )
        .await
        .expect("must succeed");
    assert_eq!(result["documents"], json!([]));
}

#[tokio::test]
async fn document_list_omits_the_filter_param_when_no_criteria_are_set() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    app.tool_executor
        .execute("document_list", json!({}))
        .await
        .expect("must succeed");

    let requests = server.received_requests().await.expect("recorded");
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].url.query().unwrap_or("").contains("filter"),
        "no filter param may be sent when no criteria are supplied"
    );
}

#[tokio::test]
async fn document_create_sends_the_resolved_ref_and_annotates_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(body_partial_json(json!({
            "title": "Contract",
            "file": {"fileId": "f1", "token": "t1"},
            "participants": [{"type": "SIGNER"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let result = app
        .tool_executor
        .execute(
            "document_create",
            json!({
                "title": "Contract",
                "file": {"type": "FILE_REF", "value": {"fileId": "f1", "token": "t1"}},
                "participants": [{
                    "type": "SIGNER",
                    "role": "signer",
                    "name": "Kim Modu",
                    "signingOrder": 1,
                    "signingMethod": {"type": "EMAIL", "value": "kim@example.com"}
                }]
            }),
        )
        .await
        .expect("must succeed");
    assert_eq!(result["id"], "doc-1");
    assert_eq!(
        result["uploadedFileRef"],
        json!({"fileId": "f1", "token": "t1"})
    );
}

#[tokio::test]
async fn document_create_uploads_attachments_before_the_document_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"fileId": "att", "token": "at"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(body_partial_json(json!({
            "requesterAttachments": [{"fileId": "att", "token": "at"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "doc-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let result = app
        .tool_executor
        .execute(
            "document_create",
            json!({
                "title": "Contract",
                "file": {"type": "FILE_REF", "value": {"fileId": "f1", "token": "t1"}},
                "requesterAttachments": [
                    {"type": "BASE64", "base64": "aGk=", "extension": "pdf"}
                ],
                "participants": [{
                    "type": "SIGNER",
                    "role": "signer",
                    "name": "Kim Modu",
                    "signingOrder": 1,
                    "signingMethod": {"type": "EMAIL", "value": "kim@example.com"}
                }]
            }),
        )
        .await
        .expect("must succeed");
    assert_eq!(result["id"], "doc-2");
}

#[tokio::test]
async fn file_upload_returns_the_canonical_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"file": {"fileId": "f7", "token": "t7"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let result = app
        .tool_executor
        .execute(
            "file_upload",
            json!({"fileBase64": "aGVsbG8=", "fileName": "contract.pdf", "type": "document"}),
        )
        .await
        .expect("must succeed");
    assert_eq!(result, json!({"fileId": "f7", "token": "t7"}));
}

#[tokio::test]
async fn denied_responses_surface_with_a_credential_hint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "invalid key"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = app_for(&server.uri());
    let err = app
        .tool_executor
        .execute("user_get_me", json!({}))
        .await
        .expect_err("must fail");
    assert!(err.message.contains("Unauthorized"));
    assert!(err
        .hint
        .as_deref()
        .unwrap_or("")
        .contains("MODUSIGN_API_KEY"));
}
