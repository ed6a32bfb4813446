use crate::error::AppResult;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::{TemplateFilter, TemplateSummary};

/// `GET /api/templates?category=&subcategory=`
pub async fn process(
    state: web::Data<AppState>,
    filter: web::Query<TemplateFilter>,
) -> AppResult<HttpResponse> {
    let summaries: Vec<TemplateSummary> = state
        .templates
        .list_templates(&filter)?
        .into_iter()
        .map(|t| TemplateSummary {
            id: t.id,
            name: t.name,
            description: t.description,
            category_id: t.category_id,
            subcategory_id: t.subcategory_id,
            price_cents: t.price_cents,
            fields: t.fields,
        })
        .collect();
    Ok(HttpResponse::Ok().json(summaries))
}
