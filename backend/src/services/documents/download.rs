use crate::error::AppResult;
use crate::services::documents::{disposition, load};
use crate::state::AppState;
use actix_web::http::header::DispositionType;
use actix_web::{web, HttpResponse};
use common::requests::DownloadQuery;
use log::info;

/// `GET /api/documents/{document_id}/download?format=docx|pdf`
///
/// Returns `403` while the document is a draft; otherwise the final document
/// as an attachment named after the template.
pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
    query: web::Query<DownloadQuery>,
) -> AppResult<HttpResponse> {
    let (document, template) = load(&state, &document_id)?;
    let format = query.format;
    let state = state.into_inner();
    let final_document = web::block(move || {
        state
            .pipeline
            .final_document(&template, state.files.as_ref(), &document, format)
    })
    .await??;

    info!("Serving {} for document {}", final_document.filename, document_id);
    Ok(HttpResponse::Ok()
        .content_type(final_document.content_type)
        .insert_header(disposition(
            DispositionType::Attachment,
            &final_document.filename,
        ))
        .body(final_document.bytes))
}
