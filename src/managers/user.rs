use crate::errors::ToolError;
use crate::managers::unknown_tool_error;
use crate::services::logger::Logger;
use crate::services::modusign_client::{ModusignClient, Query};
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const TOOLS: &[&str] = &["user_get_me", "subscription_get", "usage_list"];

#[derive(Clone)]
pub struct UserManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
}

#[async_trait]
impl ToolHandler for UserManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "user_get_me" => {
                self.logger.debug("me", None);
                Ok(self.client.get("/user", None).await?)
            }
            "subscription_get" => Ok(self.client.get("/subscription", None).await?),
            "usage_list" => self.usages(&args).await,
            other => Err(unknown_tool_error("user", other)),
        }
    }
}

impl UserManager {
    pub fn new(logger: Logger, validation: Validation, client: Arc<ModusignClient>) -> Self {
        Self {
            logger: logger.child("user"),
            validation,
            client,
        }
    }

    async fn usages(&self, args: &Value) -> Result<Value, ToolError> {
        let mut query = Query::new();
        query.push(
            "offset",
            self.validation.ensure_optional_u64(args.get("offset"), "offset")?,
        );
        query.push(
            "limit",
            self.validation.ensure_optional_u64(args.get("limit"), "limit")?,
        );
        Ok(self.client.get("/usages", Some(query)).await?)
    }
}
