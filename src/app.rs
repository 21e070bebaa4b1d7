use crate::constants::env as env_keys;
use crate::errors::ToolError;
use crate::managers;
use crate::managers::documents::DocumentManager;
use crate::managers::files::FileManager;
use crate::managers::labels::LabelManager;
use crate::managers::templates::TemplateManager;
use crate::managers::user::UserManager;
use crate::managers::webhooks::WebhookManager;
use crate::mcp::catalog::tool_catalog;
use crate::services::file_ref::{FileRefResolver, LocalFileAccess};
use crate::services::logger::Logger;
use crate::services::modusign_client::ModusignClient;
use crate::services::tool_executor::{ToolExecutor, ToolHandler};
use crate::services::validation::Validation;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    pub email: String,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ToolError> {
        let email = require_env(env_keys::EMAIL)?;
        let api_key = require_env(env_keys::API_KEY)?;
        let base_url = std::env::var(env_keys::BASE_URL)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Ok(Self {
            email,
            api_key,
            base_url,
        })
    }
}

fn require_env(key: &str) -> Result<String, ToolError> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ToolError::invalid_params(format!("{} environment variable is required", key)).with_hint(
                "Set MODUSIGN_EMAIL and MODUSIGN_API_KEY in the MCP client configuration. \
                 Get an API key from https://app.modusign.co.kr/settings/api",
            )
        })
}

pub struct App {
    pub logger: Logger,
    pub tool_executor: Arc<ToolExecutor>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl App {
    pub fn initialize() -> Result<Self, ToolError> {
        Self::with_config(Config::from_env()?)
    }

    pub fn with_config(config: Config) -> Result<Self, ToolError> {
        let logger = Logger::new("modusign");
        let validation = Validation::new();

        let client = Arc::new(ModusignClient::new(
            logger.clone(),
            &config.email,
            &config.api_key,
            config.base_url.as_deref(),
        )?);
        let resolver = Arc::new(FileRefResolver::new(
            client.clone(),
            Arc::new(LocalFileAccess),
        ));

        let mut handlers: HashMap<String, Arc<dyn ToolHandler>> = HashMap::new();
        register(
            &mut handlers,
            managers::documents::TOOLS,
            Arc::new(DocumentManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
                resolver.clone(),
            )),
        );
        register(
            &mut handlers,
            managers::templates::TOOLS,
            Arc::new(TemplateManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );
        register(
            &mut handlers,
            managers::files::TOOLS,
            Arc::new(FileManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
                resolver.clone(),
            )),
        );
        register(
            &mut handlers,
            managers::labels::TOOLS,
            Arc::new(LabelManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );
        register(
            &mut handlers,
            managers::webhooks::TOOLS,
            Arc::new(WebhookManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );
        register(
            &mut handlers,
            managers::user::TOOLS,
            Arc::new(UserManager::new(
                logger.clone(),
                validation.clone(),
                client.clone(),
            )),
        );

        Self::validate_tool_wiring(&handlers)?;
        let tool_executor = Arc::new(ToolExecutor::new(logger.clone(), handlers));
        Ok(Self {
            logger,
            tool_executor,
        })
    }

    fn validate_tool_wiring(
        handlers: &HashMap<String, Arc<dyn ToolHandler>>,
    ) -> Result<(), ToolError> {
        let mut missing: Vec<String> = tool_catalog()
            .iter()
            .filter(|tool| !handlers.contains_key(&tool.name))
            .map(|tool| tool.name.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint(
                "This is a server wiring bug: every tool in tool_catalog.json must have a \
                 registered manager.",
            )
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }
}

fn register(
    handlers: &mut HashMap<String, Arc<dyn ToolHandler>>,
    tools: &[&str],
    handler: Arc<dyn ToolHandler>,
) {
    for tool in tools {
        handlers.insert((*tool).to_string(), handler.clone());
    }
}
