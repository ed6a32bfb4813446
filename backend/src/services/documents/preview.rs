use crate::error::AppResult;
use crate::services::documents::load;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::PreviewResponse;

/// `GET /api/documents/{document_id}/preview`: the filled HTML for in-browser
/// display. Available in any status.
pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (document, template) = load(&state, &document_id)?;
    let state = state.into_inner();
    let html = web::block(move || {
        state
            .pipeline
            .preview_html(&template, state.files.as_ref(), &document)
    })
    .await??;
    Ok(HttpResponse::Ok().json(PreviewResponse { html }))
}
