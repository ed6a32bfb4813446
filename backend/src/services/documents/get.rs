use crate::error::AppResult;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let document = state.documents.get_document(&document_id)?;
    Ok(HttpResponse::Ok().json(document))
}
