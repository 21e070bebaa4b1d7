use crate::errors::ToolError;
use crate::managers::{forward_optional_fields, require_field, unknown_tool_error};
use crate::services::file_ref::{FileRef, FileRefResolver, UploadType};
use crate::services::logger::Logger;
use crate::services::modusign_client::{DocumentFilter, ModusignClient, Query};
use crate::services::tool_executor::ToolHandler;
use crate::services::validation::Validation;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

pub const TOOLS: &[&str] = &[
    "document_list",
    "document_get",
    "document_create",
    "document_create_from_template",
    "document_create_embedded_draft",
    "document_create_embedded_draft_from_template",
    "document_cancel",
    "document_request_correction",
    "document_remind",
    "document_change_due_date",
    "document_update_metadata",
    "document_add_label",
    "document_remove_label",
    "document_get_history",
    "document_get_requester_inputs",
    "document_get_participant_fields",
    "document_get_attachments",
    "document_forward",
    "document_get_embedded_view",
    "document_get_signing_url",
];

#[derive(Clone)]
pub struct DocumentManager {
    logger: Logger,
    validation: Validation,
    client: Arc<ModusignClient>,
    resolver: Arc<FileRefResolver>,
}

#[async_trait]
impl ToolHandler for DocumentManager {
    async fn handle(&self, tool: &str, args: Value) -> Result<Value, ToolError> {
        match tool {
            "document_list" => self.list(&args).await,
            "document_get" => self.get(&args).await,
            "document_create" => self.create(&args).await,
            "document_create_from_template" => self.create_from_template(&args).await,
            "document_create_embedded_draft" => self.create_embedded_draft(&args).await,
            "document_create_embedded_draft_from_template" => {
                self.create_embedded_draft_from_template(&args).await
            }
            "document_cancel" => self.cancel(&args).await,
            "document_request_correction" => self.request_correction(&args).await,
            "document_remind" => self.remind(&args).await,
            "document_change_due_date" => self.change_due_date(&args).await,
            "document_update_metadata" => self.update_metadata(&args).await,
            "document_add_label" => self.add_label(&args).await,
            "document_remove_label" => self.remove_label(&args).await,
            "document_get_history" => self.get_subresource(&args, "histories").await,
            "document_get_requester_inputs" => {
                self.get_subresource(&args, "requester-inputs").await
            }
            "document_get_participant_fields" => {
                self.get_subresource(&args, "participant-fields").await
            }
            "document_get_attachments" => self.get_subresource(&args, "attachments").await,
            "document_forward" => self.forward(&args).await,
            "document_get_embedded_view" => self.get_subresource(&args, "embedded-view").await,
            "document_get_signing_url" => self.get_signing_url(&args).await,
            other => Err(unknown_tool_error("document", other)),
        }
    }
}

impl DocumentManager {
    pub fn new(
        logger: Logger,
        validation: Validation,
        client: Arc<ModusignClient>,
        resolver: Arc<FileRefResolver>,
    ) -> Self {
        Self {
            logger: logger.child("documents"),
            validation,
            client,
            resolver,
        }
    }

    fn document_id(&self, args: &Value) -> Result<String, ToolError> {
        self.validation.ensure_string(args.get("documentId"), "documentId")
    }

    async fn list(&self, args: &Value) -> Result<Value, ToolError> {
        let filter = ModusignClient::build_odata_filter(&DocumentFilter {
            status: self
                .validation
                .ensure_optional_string(args.get("status"), "status")?,
            title_contains: self
                .validation
                .ensure_optional_string(args.get("titleContains"), "titleContains")?,
            created_at_from: self
                .validation
                .ensure_optional_string(args.get("createdAtFrom"), "createdAtFrom")?,
            created_at_to: self
                .validation
                .ensure_optional_string(args.get("createdAtTo"), "createdAtTo")?,
            label_ids: self
                .validation
                .ensure_optional_string_array(args.get("labelIds"), "labelIds")?,
        });

        let mut query = Query::new();
        query.push(
            "offset",
            self.validation.ensure_optional_u64(args.get("offset"), "offset")?,
        );
        query.push(
            "limit",
            self.validation.ensure_optional_u64(args.get("limit"), "limit")?,
        );
        query.push("filter", filter);
        query.push(
            "orderBy",
            self.validation
                .ensure_optional_string(args.get("orderBy"), "orderBy")?,
        );
        if let Some(metadatas) = args.get("metadatas").and_then(|v| v.as_object()) {
            if !metadatas.is_empty() {
                query.push("metadatas", Some(serde_json::to_string(metadatas)?));
            }
        }

        Ok(self.client.get("/documents", Some(query)).await?)
    }

    async fn get(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        Ok(self
            .client
            .get(&format!("/documents/{}", document_id), None)
            .await?)
    }

    async fn create(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("create", None);
        let title = self.validation.ensure_string(args.get("title"), "title")?;
        let file_input = FileRefResolver::parse_input(&require_field(args, "file")?)?;
        let participants = require_field(args, "participants")?;
        let attachments = args.get("requesterAttachments").and_then(|v| v.as_array());

        let (file_ref, attachment_refs) = tokio::try_join!(
            self.resolver
                .resolve(&file_input, UploadType::Document, "document"),
            self.resolver.resolve_attachments(attachments)
        )?;

        let body = self.document_body(
            args,
            &title,
            &file_ref,
            attachment_refs,
            participants,
            &[],
        )?;
        let result = self.client.post("/documents", Some(body)).await?;
        annotate_uploaded_ref(result, &file_ref)
    }

    async fn create_from_template(&self, args: &Value) -> Result<Value, ToolError> {
        let template_id = self
            .validation
            .ensure_string(args.get("templateId"), "templateId")?;
        let document = require_field(args, "document")?;
        let body = serde_json::json!({"templateId": template_id, "document": document});
        Ok(self
            .client
            .post("/documents/request-with-template", Some(body))
            .await?)
    }

    async fn create_embedded_draft(&self, args: &Value) -> Result<Value, ToolError> {
        self.logger.debug("create_embedded_draft", None);
        let title = self.validation.ensure_string(args.get("title"), "title")?;
        let file_input = FileRefResolver::parse_input(&require_field(args, "file")?)?;
        let participants = require_field(args, "participants")?;
        let attachments = args.get("requesterAttachments").and_then(|v| v.as_array());

        let (file_ref, attachment_refs) = tokio::try_join!(
            self.resolver
                .resolve(&file_input, UploadType::Document, "embedded-draft"),
            self.resolver.resolve_attachments(attachments)
        )?;

        let body = self.document_body(
            args,
            &title,
            &file_ref,
            attachment_refs,
            participants,
            &["redirectUrl"],
        )?;
        let result = self.client.post("/embedded-drafts", Some(body)).await?;
        annotate_uploaded_ref(result, &file_ref)
    }

    async fn create_embedded_draft_from_template(&self, args: &Value) -> Result<Value, ToolError> {
        let template_id = self
            .validation
            .ensure_string(args.get("templateId"), "templateId")?;
        let document = require_field(args, "document")?;
        let mut body = Map::new();
        body.insert("templateId".to_string(), Value::String(template_id));
        body.insert("document".to_string(), document);
        forward_optional_fields(args, &mut body, &["redirectUrl"]);
        Ok(self
            .client
            .post("/embedded-drafts/create-with-template", Some(Value::Object(body)))
            .await?)
    }

    async fn cancel(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        Ok(self
            .client
            .post(
                &format!("/documents/{}/cancel", document_id),
                Some(Value::Object(Default::default())),
            )
            .await?)
    }

    async fn request_correction(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let participant_id = self
            .validation
            .ensure_string(args.get("participantId"), "participantId")?;
        let message = self.validation.ensure_string(args.get("message"), "message")?;
        let body = serde_json::json!({"participantId": participant_id, "message": message});
        Ok(self
            .client
            .post(
                &format!("/documents/{}/request-correction", document_id),
                Some(body),
            )
            .await?)
    }

    async fn remind(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        Ok(self
            .client
            .post(&format!("/documents/{}/remind-signing", document_id), None)
            .await?)
    }

    async fn change_due_date(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let datetime = self
            .validation
            .ensure_string(args.get("datetime"), "datetime")?;
        Ok(self
            .client
            .put(
                &format!("/documents/{}/change-signing-due", document_id),
                Some(serde_json::json!({"datetime": datetime})),
            )
            .await?)
    }

    async fn update_metadata(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let metadatas = require_field(args, "metadatas")?;
        Ok(self
            .client
            .put(
                &format!("/documents/{}/metadatas", document_id),
                Some(serde_json::json!({"metadatas": metadatas})),
            )
            .await?)
    }

    async fn add_label(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let label_id = self.validation.ensure_string(args.get("labelId"), "labelId")?;
        Ok(self
            .client
            .post(
                &format!("/documents/{}/labels/{}", document_id, label_id),
                None,
            )
            .await?)
    }

    async fn remove_label(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let label_id = self.validation.ensure_string(args.get("labelId"), "labelId")?;
        Ok(self
            .client
            .delete(&format!("/documents/{}/labels/{}", document_id, label_id))
            .await?)
    }

    async fn get_subresource(&self, args: &Value, subresource: &str) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        Ok(self
            .client
            .get(&format!("/documents/{}/{}", document_id, subresource), None)
            .await?)
    }

    async fn forward(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let contacts = require_field(args, "contacts")?;
        let mut body = Map::new();
        body.insert("contacts".to_string(), contacts);
        forward_optional_fields(args, &mut body, &["message"]);
        Ok(self
            .client
            .post(
                &format!("/documents/{}/forward", document_id),
                Some(Value::Object(body)),
            )
            .await?)
    }

    async fn get_signing_url(&self, args: &Value) -> Result<Value, ToolError> {
        let document_id = self.document_id(args)?;
        let participant_id = self
            .validation
            .ensure_string(args.get("participantId"), "participantId")?;
        Ok(self
            .client
            .get(
                &format!(
                    "/documents/{}/participants/{}/embedded-view",
                    document_id, participant_id
                ),
                None,
            )
            .await?)
    }

    fn document_body(
        &self,
        args: &Value,
        title: &str,
        file_ref: &FileRef,
        attachment_refs: Option<Vec<Value>>,
        participants: Value,
        extra_optional: &[&str],
    ) -> Result<Value, ToolError> {
        let mut body = Map::new();
        body.insert("title".to_string(), Value::String(title.to_string()));
        body.insert("file".to_string(), serde_json::to_value(file_ref)?);
        if let Some(refs) = attachment_refs {
            body.insert("requesterAttachments".to_string(), Value::Array(refs));
        }
        body.insert("participants".to_string(), participants);
        forward_optional_fields(args, &mut body, &["metadatas", "labelIds"]);
        forward_optional_fields(args, &mut body, extra_optional);
        Ok(Value::Object(body))
    }
}

fn annotate_uploaded_ref(result: Value, file_ref: &FileRef) -> Result<Value, ToolError> {
    let mut out = result.as_object().cloned().unwrap_or_default();
    out.insert("uploadedFileRef".to_string(), serde_json::to_value(file_ref)?);
    Ok(Value::Object(out))
}
