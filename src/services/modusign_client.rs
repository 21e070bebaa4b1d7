use crate::constants::{api, retry};
use crate::errors::{ApiError, ClientError, ToolError};
use crate::services::logger::Logger;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct Query {
    entries: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

#[derive(Debug, Clone)]
pub struct MultipartPayload {
    file_name: String,
    bytes: Bytes,
    fields: Vec<(String, String)>,
}

impl MultipartPayload {
    pub fn new(file_name: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    // Rebuilt per attempt: reqwest forms are consumed on send and a 429
    // may require reissuing the identical request.
    fn to_form(&self) -> reqwest::multipart::Form {
        let mut form = reqwest::multipart::Form::new();
        let part = reqwest::multipart::Part::stream(reqwest::Body::from(self.bytes.clone()))
            .file_name(self.file_name.clone());
        form = form.part("file", part);
        for (key, value) in &self.fields {
            form = form.text(key.clone(), value.clone());
        }
        form
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartPayload),
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Option<Query>,
    pub body: Option<RequestBody>,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub status: Option<String>,
    pub title_contains: Option<String>,
    pub created_at_from: Option<String>,
    pub created_at_to: Option<String>,
    pub label_ids: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct ModusignClient {
    logger: Logger,
    client: Client,
    base_url: String,
    auth_header: HeaderValue,
}

impl ModusignClient {
    pub fn new(
        logger: Logger,
        email: &str,
        api_key: &str,
        base_url: Option<&str>,
    ) -> Result<Self, ToolError> {
        let client = Client::builder()
            .user_agent(api::USER_AGENT)
            .build()
            .map_err(|err| ToolError::internal(format!("Failed to build HTTP client: {}", err)))?;
        let credentials = BASE64.encode(format!("{}:{}", email, api_key));
        let mut auth_header = HeaderValue::from_str(&format!("Basic {}", credentials))
            .map_err(|_| ToolError::invalid_params("Credentials contain invalid characters"))?;
        auth_header.set_sensitive(true);
        Ok(Self {
            logger: logger.child("client"),
            client,
            base_url: normalize_base_url(base_url.unwrap_or(api::DEFAULT_BASE_URL))?,
            auth_header,
        })
    }

    pub fn build_odata_filter(filter: &DocumentFilter) -> Option<String> {
        let mut clauses = Vec::new();
        if let Some(status) = &filter.status {
            clauses.push(format!("status eq '{}'", status));
        }
        if let Some(title) = &filter.title_contains {
            clauses.push(format!("contains(title, '{}')", title.replace('\'', "''")));
        }
        if let Some(from) = &filter.created_at_from {
            clauses.push(format!("createdAt ge '{}'", from));
        }
        if let Some(to) = &filter.created_at_to {
            clauses.push(format!("createdAt le '{}'", to));
        }
        if let Some(label_ids) = filter.label_ids.as_deref().filter(|ids| !ids.is_empty()) {
            let ids = label_ids
                .iter()
                .map(|id| format!("'{}'", id))
                .collect::<Vec<_>>()
                .join(", ");
            clauses.push(format!("labelIds in ({})", ids));
        }
        if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" and "))
        }
    }

    pub async fn get(&self, path: &str, query: Option<Query>) -> Result<Value, ClientError> {
        self.request(
            Method::GET,
            path,
            RequestOptions {
                query,
                ..Default::default()
            },
        )
        .await
    }

    pub async fn post(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        self.request(
            Method::POST,
            path,
            RequestOptions {
                body: body.map(RequestBody::Json),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn put(&self, path: &str, body: Option<Value>) -> Result<Value, ClientError> {
        self.request(
            Method::PUT,
            path,
            RequestOptions {
                body: body.map(RequestBody::Json),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.request(Method::DELETE, path, RequestOptions::default())
            .await
    }

    pub async fn post_multipart(
        &self,
        path: &str,
        payload: MultipartPayload,
    ) -> Result<Value, ClientError> {
        self.request(
            Method::POST,
            path,
            RequestOptions {
                body: Some(RequestBody::Multipart(payload)),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries_remaining = retry::MAX_RETRIES;

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(query) = options.query.as_ref().filter(|q| !q.is_empty()) {
                request = request.query(query.entries());
            }

            let mut headers = HeaderMap::new();
            for (key, value) in &options.headers {
                if let (Ok(name), Ok(value)) = (
                    HeaderName::from_bytes(key.as_bytes()),
                    HeaderValue::from_str(value),
                ) {
                    headers.insert(name, value);
                }
            }
            headers.insert(AUTHORIZATION, self.auth_header.clone());
            request = request.headers(headers);

            match &options.body {
                Some(RequestBody::Json(value)) => {
                    request = request.json(value);
                }
                Some(RequestBody::Multipart(payload)) => {
                    request = request.multipart(payload.to_form());
                }
                None => {}
            }

            self.logger.debug(
                "request",
                Some(&serde_json::json!({"method": method.as_str(), "path": path})),
            );
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && retries_remaining > 0 {
                let delay = retry_after_seconds(response.headers());
                self.logger.warn(
                    "throttled",
                    Some(&serde_json::json!({"path": path, "retry_after_secs": delay})),
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                retries_remaining -= 1;
                continue;
            }

            if !status.is_success() {
                let body = decode_error_body(response).await;
                return Err(ClientError::Api(ApiError::new(status.as_u16(), body)));
            }

            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("application/json"))
                .unwrap_or(false);
            if status == StatusCode::NO_CONTENT || !is_json {
                return Ok(Value::Object(Default::default()));
            }

            return response.json().await.map_err(ClientError::Transport);
        }
    }
}

fn normalize_base_url(raw: &str) -> Result<String, ToolError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ToolError::invalid_params("Base URL must not be empty")
            .with_hint("Set MODUSIGN_BASE_URL to a valid URL, or unset it for the default."));
    }
    let mut url = Url::parse(raw).map_err(|_| {
        ToolError::invalid_params(format!("Invalid base URL: {}", raw))
            .with_hint("Expected a valid URL, e.g. \"https://api.modusign.co.kr\".")
    })?;
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}

fn retry_after_seconds(headers: &HeaderMap) -> u64 {
    headers
        .get("X-Retry-After")
        .or_else(|| headers.get("Retry-After"))
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(retry::DEFAULT_RETRY_AFTER_SECS)
}

async fn decode_error_body(response: reqwest::Response) -> Value {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_is_absent_when_no_criteria_are_set() {
        assert_eq!(
            ModusignClient::build_odata_filter(&DocumentFilter::default()),
            None
        );
    }

    #[test]
    fn filter_joins_clauses_in_fixed_order() {
        let filter = DocumentFilter {
            status: Some("COMPLETED".to_string()),
            title_contains: Some("contract".to_string()),
            created_at_from: Some("2024-01-01T00:00:00+09:00".to_string()),
            created_at_to: Some("2024-12-31T23:59:59+09:00".to_string()),
            label_ids: Some(vec!["l1".to_string(), "l2".to_string()]),
        };
        assert_eq!(
            ModusignClient::build_odata_filter(&filter).as_deref(),
            Some(
                "status eq 'COMPLETED' and contains(title, 'contract') and \
                 createdAt ge '2024-01-01T00:00:00+09:00' and \
                 createdAt le '2024-12-31T23:59:59+09:00' and \
                 labelIds in ('l1', 'l2')"
            )
        );
    }

    #[test]
    fn filter_escapes_single_quotes_by_doubling() {
        let filter = DocumentFilter {
            title_contains: Some("O'Brien".to_string()),
            ..Default::default()
        };
        assert_eq!(
            ModusignClient::build_odata_filter(&filter).as_deref(),
            Some("contains(title, 'O''Brien')")
        );
    }

    #[test]
    fn filter_skips_empty_label_id_lists() {
        let filter = DocumentFilter {
            label_ids: Some(Vec::new()),
            ..Default::default()
        };
        assert_eq!(ModusignClient::build_odata_filter(&filter), None);
    }

    #[test]
    fn query_skips_absent_values_and_stringifies_present_ones() {
        let mut query = Query::new();
        query.push("offset", Some(5u64));
        query.push("limit", None::<u64>);
        query.push("filter", Some("status eq 'DRAFT'"));
        assert_eq!(
            query.entries(),
            &[
                ("offset".to_string(), "5".to_string()),
                ("filter".to_string(), "status eq 'DRAFT'".to_string()),
            ]
        );
    }

    #[test]
    fn retry_after_prefers_the_vendor_header_and_defaults_to_one_second() {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from_static("7"));
        headers.insert("X-Retry-After", HeaderValue::from_static("2"));
        assert_eq!(retry_after_seconds(&headers), 2);

        let mut generic = HeaderMap::new();
        generic.insert("Retry-After", HeaderValue::from_static("7"));
        assert_eq!(retry_after_seconds(&generic), 7);

        assert_eq!(retry_after_seconds(&HeaderMap::new()), 1);

        let mut garbage = HeaderMap::new();
        garbage.insert("X-Retry-After", HeaderValue::from_static("soon"));
        assert_eq!(retry_after_seconds(&garbage), 1);
    }

    #[test]
    fn base_url_is_normalized_without_trailing_slash_query_or_fragment() {
        assert_eq!(
            normalize_base_url("https://api.modusign.co.kr/").unwrap(),
            "https://api.modusign.co.kr"
        );
        assert_eq!(
            normalize_base_url("https://staging.example.com/api/?x=1#top").unwrap(),
            "https://staging.example.com/api"
        );
        assert!(normalize_base_url("not a url").is_err());
    }
}
