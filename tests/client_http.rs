mod common;

use common::{test_client, TEST_AUTH_HEADER};
use modusign_mcp::errors::ClientError;
use modusign_mcp::services::modusign_client::Query;
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn requests_carry_the_basic_auth_header_and_query_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents"))
        .and(header("Authorization", TEST_AUTH_HEADER))
        .and(query_param("offset", "5"))
        .and(query_param("filter", "status eq 'DRAFT'"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let mut query = Query::new();
    query.push("offset", Some(5u64));
    query.push("limit", None::<u64>);
    query.push("filter", Some("status eq 'DRAFT'"));
    let result = client.get("/documents", Some(query)).await.expect("ok");
    assert_eq!(result["count"], 0);
}

#[tokio::test]
async fn a_throttled_response_is_retried_after_the_advertised_delay() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(429).insert_header("X-Retry-After", "2"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "tester"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let started = Instant::now();
    let result = client.get("/user", None).await.expect("retried call");
    assert!(
        started.elapsed() >= Duration::from_secs(2),
        "retry must wait out the advertised delay"
    );
    assert_eq!(result["name"], "tester");
}

#[tokio::test]
async fn exhausting_the_retry_budget_surfaces_the_final_429() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "1")
                .set_body_json(json!({"message": "slow down"})),
        )
        .expect(4)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let started = Instant::now();
    let err = client.get("/user", None).await.expect_err("must fail");
    assert!(
        started.elapsed() >= Duration::from_secs(3),
        "three sequential waits must pass before giving up"
    );
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status_code, 429);
            assert_eq!(api.message(), "Rate Limit Exceeded: slow down");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn no_content_responses_decode_to_an_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/labels/l1"))
        .respond_with(ResponseTemplate::new(204).set_body_string("ignored"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.delete("/labels/l1").await.expect("ok");
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn non_json_success_responses_decode_to_an_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/documents/d1/embedded-view"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("<html></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .get("/documents/d1/embedded-view", None)
        .await
        .expect("ok");
    assert_eq!(result, json!({}));
}

#[tokio::test]
async fn json_error_bodies_are_classified_with_the_status_table() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "title is too long"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .post("/documents", Some(json!({"title": "x"})))
        .await
        .expect_err("must fail");
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status_code, 400);
            assert_eq!(
                api.message(),
                "Bad Request - Validation failed: title is too long"
            );
            assert_eq!(api.error_body["message"], "title is too long");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn unparseable_error_bodies_fall_back_to_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.get("/user", None).await.expect_err("must fail");
    match err {
        ClientError::Api(api) => {
            assert_eq!(api.status_code, 502);
            assert_eq!(api.error_body, json!("Bad Gateway"));
            assert_eq!(api.message(), "HTTP 502: \"Bad Gateway\"");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn json_bodies_set_the_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/labels/l1"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .put("/labels/l1", Some(json!({"name": "renamed"})))
        .await
        .expect("ok");
    assert_eq!(result["ok"], true);
}
