use crate::errors::ToolError;
use crate::services::logger::Logger;
use crate::utils::suggest::suggest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolExecutor {
    logger: Logger,
    handlers: Arc<HashMap<String, Arc<dyn ToolHandler>>>,
}

impl ToolExecutor {
    pub fn new(logger: Logger, handlers: HashMap<String, Arc<dyn ToolHandler>>) -> Self {
        Self {
            logger: logger.child("executor"),
            handlers: Arc::new(handlers),
        }
    }

    pub fn has_handler(&self, tool: &str) -> bool {
        self.handlers.contains_key(tool)
    }

    pub async fn execute(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        let Some(handler) = self.handlers.get(tool) else {
            let candidates: Vec<String> = self.handlers.keys().cloned().collect();
            let suggestions = suggest(tool, &candidates, 6);
            let hint = if suggestions.is_empty() {
                "Call tools/list for the full tool list.".to_string()
            } else {
                format!("Did you mean: {}", suggestions.join(", "))
            };
            return Err(
                ToolError::invalid_params(format!("Unknown tool: {}", tool)).with_hint(hint)
            );
        };
        self.logger.debug(tool, None);
        handler.handle(tool, args).await
    }
}
