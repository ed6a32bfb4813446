use crate::error::AppResult;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::engine::form::fill_form;
use common::requests::{CreateDocumentRequest, CreatedDocument};
use log::info;

/// `POST /api/documents`: validates and formats the submitted values against
/// the template's Field Definitions, then stores a `draft` document.
pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateDocumentRequest>,
) -> AppResult<HttpResponse> {
    let request = payload.into_inner();
    let template = state.templates.get_template(&request.template_id)?;
    let data = fill_form(&template.fields, &request.values, state.format_policy)?;

    let id = state
        .documents
        .create_document(&template.id, request.user_id.as_deref(), &data)?;
    info!("Document {} created from template {}", id, template.id);
    Ok(HttpResponse::Created().json(CreatedDocument { id }))
}
