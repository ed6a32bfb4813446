use crate::model::field::FieldDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Payload of `POST /api/templates/save`. A missing `id` creates a template.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaveTemplateRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub html_body: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Catalog listing entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TemplateSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub price_cents: i64,
    pub fields: Vec<FieldDefinition>,
}

/// Query of `GET /api/templates`. Each present filter must match exactly.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TemplateFilter {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
}

/// Fill-in form submission: raw values as typed, keyed by placeholder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateDocumentRequest {
    pub template_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub values: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CreatedDocument {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PreviewResponse {
    pub html: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CheckoutResponse {
    pub init_point: String,
}

/// Output format of the paid download.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Docx,
    Pdf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub format: DownloadFormat,
}
