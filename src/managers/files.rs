use crate::errors::ToolError;
use crate::managers::{require_field, unknown_tool_error};
use crate::services::file_ref::{FileInput, FileRefResolver, UploadType};
use crate::services::logger::Logger;
use crate::services::modusign_client::ModusignClient;
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const TOOLS: &[&str] = &["file_upload", "file_merge"];

#[derive(Clone)]
pub struct FileManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
    resolver: Arc<FileRefResolver>,
}

#[async_trait]
impl ToolHandler for FileManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "file_upload" => self.upload(&args).await,
            "file_merge" => self.merge(&args).await,
            other => Err(unknown_tool_error("file", other)),
        }
    }
}

impl FileManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        client: Arc<ModusignClient>,
        resolver: Arc<FileRefResolver>,
    ) -> Self {
        Self {
            logger: logger.child("files"),
            validation,
            client,
            resolver,
        }
    }

    async fn upload(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("upload", None);
        let base64 = self
            .validation
            .ensure_string(args.get("fileBase64"), "fileBase64")?;
        let file_name = self
            .validation
            .ensure_string(args.get("fileName"), "fileName")?;
        let upload_type =
            UploadType::parse(&self.validation.ensure_string(args.get("type"), "type")?)?;
        let input = FileInput::Base64 {
            base64,
            file_name: Some(file_name),
            extension: None,
        };
        let file_ref = self.resolver.resolve(&input, upload_type, "file").await?;
        Ok(serde_json::to_value(&file_ref)?)
    }

    async fn merge(&self, args: &Value) -> Result<Value, ToolError> {
        let files = require_field(args, "files")?;
        let count = files.as_array().map(|f| f.len()).unwrap_or(0);
        if count < 2 {
            return Err(ToolError::invalid_params(
                "files must contain at least 2 uploaded file references",
            ));
        }
        Ok(self
            .client
            .post("/files/merge", Some(serde_json::json!({"files": files})))
            .await?)
    }
}
