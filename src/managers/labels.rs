use crate::errors::ToolError;
use crate::managers::{forward_optional_fields, unknown_tool_error};
use crate::services::logger::Logger;
use crate::services::modusign_client::{ModusignClient, Query};
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TOOLS: &[&str] = &["label_list", "label_create", "label_update", "label_delete"];

#[derive(Clone)]
pub struct LabelManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
}

#[async_trait]
impl ToolHandler for LabelManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "label_list" => self.list(&args).await,
            "label_create" => self.create(&args).await,
            "label_update" => self.update(&args).await,
            "label_delete" => self.delete(&args).await,
            other => Err(unknown_tool_error("label", other)),
        }
    }
}

impl LabelManager {
    pub fn new(logger: Logger, validation: Validation, client: Arc<ModusignClient>) -> Self {
        Self {
            logger: logger.child("labels"),
            validation,
            client,
        }
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
        Ok(self.client.get("/labels", Some(query)).await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("create", None);
        let name = self.validation.ensure_string(args.get("name"), "name")?;
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(name));
        forward_optional_fields(args, &mut body, &["color"]);
        Ok(self.client.post("/labels", Some(Value::Object(body))).await?)
    }

    async fn update(&self, args: &Value) -> Result<Value, ToolError> {
        let label_id = self.validation.ensure_string(args.get("labelId"), "labelId")?;
        let mut body = Map::new();
        forward_optional_fields(args, &mut body, &["name", "color"]);
        Ok(self
            .client
            .put(&format!("/labels/{}", label_id), Some(Value::Object(body)))
            .await?)
    }

    async fn delete(&self, args: &Value) -> Result<Value, ToolError> {
        let label_id = self.validation.ensure_string(args.get("labelId"), "labelId")?;
        Ok(self.client.delete(&format!("/labels/{}", label_id)).await?)
    }
}
