use crate::error::{AppError, AppResult};
use crate::payment::CheckoutRequest;
use crate::services::documents::load;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::CheckoutResponse;
use log::info;

/// `POST /api/documents/{document_id}/checkout`: creates a one-item payment
/// preference whose external reference is the document id, so the payment
/// webhook can find the document again. A paid document answers `409`.
pub async fn process(
    state: web::Data<AppState>,
    document_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (document, template) = load(&state, &document_id)?;
    if document.is_paid() {
        return Err(AppError::Conflict(format!(
            "Document {} is already paid",
            document.id
        )));
    }
    let request = CheckoutRequest {
        document_id: document.id,
        title: template.name.clone(),
        unit_price: template.unit_price(),
    };
    let init_point = state.payments.create_checkout(&request).await?;
    info!("Checkout created for document {}", request.document_id);
    Ok(HttpResponse::Ok().json(CheckoutResponse { init_point }))
}
