//! # Watermarked PDF Preview
//!
//! Backs `GET /api/documents/{document_id}/pdf`. The filled HTML is wrapped in
//! the A4 page shell with the watermark layer on top and printed by the
//! configured PDF engine. The response is served inline so the browser shows
//! it in place; there is no attachment variant of the preview.

use crate::error::AppResult;
use crate::render::PDF_CONTENT_TYPE;
use crate::services::documents::{disposition, load};
use crate::state::AppState;
use actix_web::http::header::DispositionType;
use actix_web::{web, HttpResponse};

const PREVIEW_FILENAME: &str = "preview.pdf";

pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (document, template) = load(&state, &document_id)?;
    let state = state.into_inner();
    let bytes = web::block(move || {
        state
            .pipeline
            .watermarked_pdf(&template, state.files.as_ref(), &document)
    })
    .await??;

    Ok(HttpResponse::Ok()
        .content_type(PDF_CONTENT_TYPE)
        .insert_header(disposition(DispositionType::Inline, PREVIEW_FILENAME))
        .body(bytes))
}
