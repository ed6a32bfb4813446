//! # Template Save Service
//!
//! Backs `POST /api/templates/save`. The editor sends the template metadata,
//! its HTML body and the field configuration the author has edited so far.
//!
//! ## Workflow
//!
//! 1.  **Validation**: the submitted Field Definitions must have keys that
//!     follow the placeholder grammar and are unique. Unknown field types never
//!     get this far: the closed `FieldType` enum rejects them while the JSON
//!     body is deserialized.
//! 2.  **Reconciliation**: placeholders are extracted from the HTML body and
//!     every key without a definition gets a default one appended. Definitions
//!     whose token disappeared from the markup are kept.
//! 3.  **Persistence**: the template is stored; an uploaded binary file
//!     reference survives edits of the metadata.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::TemplateStore;
use actix_web::{web, HttpResponse};
use common::engine::{extract, reconcile};
use common::model::field::validate_fields;
use common::model::template::Template;
use common::requests::SaveTemplateRequest;
use log::info;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<SaveTemplateRequest>,
) -> AppResult<HttpResponse> {
    let template = save_template(state.templates.as_ref(), payload.into_inner())?;
    info!(
        "Template {} saved with {} field(s)",
        template.id,
        template.fields.len()
    );
    Ok(HttpResponse::Ok().json(template))
}

pub fn save_template(store: &dyn TemplateStore, request: SaveTemplateRequest) -> AppResult<Template> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Template name must not be empty".to_string()));
    }
    if request.price_cents < 0 {
        return Err(AppError::Validation("Template price must not be negative".to_string()));
    }
    validate_fields(&request.fields)?;

    let existing = match request.id.as_deref() {
        Some(id) => match store.get_template(id) {
            Ok(t) => Some(t),
            Err(AppError::NotFound(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let html_body = request.html_body.filter(|body| !body.trim().is_empty());
    let fields = match &html_body {
        Some(body) => reconcile(&request.fields, &extract(body)),
        None => request.fields,
    };

    let template = Template {
        id: request
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: request.name,
        description: request.description,
        category_id: request.category_id,
        subcategory_id: request.subcategory_id,
        price_cents: request.price_cents,
        html_body,
        file_ref: existing.and_then(|t| t.file_ref),
        fields,
    };
    store.save_template(&template)?;
    Ok(template)
}
