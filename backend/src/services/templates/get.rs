use crate::error::AppResult;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Actix web handler for the `GET /api/templates/{template_id}` endpoint.
///
/// Returns `200 OK` with the full `Template` (body, file reference and field
/// configuration) or `404` when no template has that id.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let template = state.templates.get_template(&template_id)?;
    Ok(HttpResponse::Ok().json(template))
}
