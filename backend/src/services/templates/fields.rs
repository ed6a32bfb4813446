use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::info;

/// `DELETE /api/templates/{template_id}/fields/{key}`
///
/// Removing a token from the markup never removes its definition; the author
/// does it here.
pub async fn process(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (template_id, key) = path.into_inner();
    let mut template = state.templates.get_template(&template_id)?;

    let Some(index) = template.fields.iter().position(|f| f.key == key) else {
        return Err(AppError::NotFound(format!("Field '{}'", key)));
    };
    template.fields.remove(index);
    state.templates.save_template(&template)?;

    info!("Field {} removed from template {}", key, template_id);
    Ok(HttpResponse::Ok().json(template))
}
