use crate::errors::ToolError;
use crate::managers::{forward_optional_fields, require_field, unknown_tool_error};
use crate::services::logger::Logger;
use crate::services::modusign_client::{ModusignClient, Query};
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TOOLS: &[&str] = &[
    "webhook_list",
    "webhook_create",
    "webhook_get",
    "webhook_update",
    "webhook_delete",
];

#[derive(Clone)]
pub struct WebhookManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
}

#[async_trait]
impl ToolHandler for WebhookManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "webhook_list" => self.list(&args).await,
            "webhook_create" => self.create(&args).await,
            "webhook_get" => self.get(&args).await,
            "webhook_update" => self.update(&args).await,
            "webhook_delete" => self.delete(&args).await,
            other => Err(unknown_tool_error("webhook", other)),
        }
    }
}

impl WebhookManager {
    pub fn new(logger: Logger, validation: Validation, client: Arc<ModusignClient>) -> Self {
        Self {
            logger: logger.child("webhooks"),
            validation,
            client,
        }
    }

    fn webhook_id(&self, args: &Value) -> Result<String, ToolError> {
        self.validation.ensure_string(args.get("webhookId"), "webhookId")
    }

    async fn list(&self, args: &Value) -> Result<Value, ToolError> {
        let mut query = Query::new();
        query.push(
            "offset",
            self.validation.ensure_optional_u64(args.get("offset"), "offset")?,
        );
        query.push(
            "limit",
            self.validation.ensure_optional_u64(args.get("limit"), "limit")?,
        );
        Ok(self.client.get("/webhooks", Some(query)).await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("create", None);
        let url = self.validation.ensure_string(args.get("url"), "url")?;
        let events = require_field(args, "events")?;
        let mut body = Map::new();
        body.insert("url".to_string(), Value::String(url));
        body.insert("events".to_string(), events);
        forward_optional_fields(args, &mut body, &["description"]);
        Ok(self
            .client
            .post("/webhooks", Some(Value::Object(body)))
            .await?)
    }

    async fn get(&self, args: &Value) -> Result<Value, ToolError> {
        let webhook_id = self.webhook_id(args)?;
        Ok(self
            .client
            .get(&format!("/webhooks/{}", webhook_id), None)
            .await?)
    }

    async fn update(&self, args: &Value) -> Result<Value, ToolError> {
        let webhook_id = self.webhook_id(args)?;
        let mut body = Map::new();
        forward_optional_fields(args, &mut body, &["url", "events", "description"]);
        Ok(self
            .client
            .put(&format!("/webhooks/{}", webhook_id), Some(Value::Object(body)))
            .await?)
    }

    async fn delete(&self, args: &Value) -> Result<Value, ToolError> {
        let webhook_id = self.webhook_id(args)?;
        Ok(self
            .client
            .delete(&format!("/webhooks/{}", webhook_id))
            .await?)
    }
}
