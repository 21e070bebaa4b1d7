use crate::errors::ToolError;
use crate::managers::unknown_tool_error;
use crate::services::logger::Logger;
use crate::services::modusign_client::{ModusignClient, Query};
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const TOOLS: &[&str] = &["template_list", "template_get"];

#[derive(Clone)]
pub struct TemplateManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
}

#[async_trait]
impl ToolHandler for TemplateManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "template_list" => self.list(&args).await,
            "template_get" => self.get(&args).await,
            other => Err(unknown_tool_error("template", other)),
        }
    }
}

impl TemplateManager {
    pub fn new(logger: Logger, validation: Validation, client: Arc<ModusignClient>) -> Self {
        Self {
            logger: logger.child("templates"),
            validation,
            client,
        }
    }

    async fn list(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("list", None);
        let mut query = Query::new();
        query.push(
            "offset",
            self.validation.ensure_optional_u64(args.get("offset"), "offset")?,
        );
        query.push(
            "limit",
            self.validation.ensure_optional_u64(args.get("limit"), "limit")?,
        );
        Ok(self.client.get("/templates", Some(query)).await?)
    }

    async fn get(&self, args: &Value) -> Result<Value, ToolError> {
        let template_id = self
            .validation
            .ensure_string(args.get("templateId"), "templateId")?;
        Ok(self
            .client
            .get(&format!("/templates/{}", template_id), None)
            .await?)
    }
}
