//! # Mercado Pago Notification Handler
//!
//! Backs `POST /api/webhooks/mercadopago`. The provider sends notifications in
//! two shapes: query parameters (`topic`/`id`, or `type`/`data.id`) and a JSON
//! body (`{"type": "payment", "data": {"id": ...}}`). Only payment
//! notifications matter here.
//!
//! The notification itself is not trusted: the payment is looked up through
//! the gateway, and only an `approved` payment with an external reference
//! moves that document to `paid`. Re-delivery of the same notification is a
//! no-op in the store.

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::document::PaymentTransition;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    topic: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<String>,
    #[serde(rename = "data.id")]
    data_id: Option<String>,
}

/// Id of the payment a notification refers to, or `None` for anything that is
/// not a payment notification.
fn payment_id(query: &NotificationQuery, body: &[u8]) -> Option<String> {
    let topic = query.topic.as_deref().or(query.kind.as_deref());
    let id = query.id.as_deref().or(query.data_id.as_deref());
    if let (Some(topic), Some(id)) = (topic, id) {
        return (topic == "payment").then(|| id.to_string());
    }

    let json: Value = serde_json::from_slice(body).ok()?;
    let topic = json
        .get("type")
        .or_else(|| json.get("topic"))
        .and_then(Value::as_str)?;
    if topic != "payment" {
        return None;
    }
    match json.get("data").and_then(|d| d.get("id")) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub async fn process(
    state: web::Data<AppState>,
    query: web::Query<NotificationQuery>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let ok = HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }));

    let Some(payment_id) = payment_id(&query, &body) else {
        warn!("Ignoring non-payment notification {:?}", query.into_inner());
        return Ok(ok);
    };

    let payment = state.payments.fetch_payment(&payment_id).await?;
    if !payment.is_approved() {
        info!("Payment {} is {}; nothing to do", payment.id, payment.status);
        return Ok(ok);
    }
    let Some(document_id) = payment.external_reference.clone() else {
        warn!("Approved payment {} has no external reference", payment.id);
        return Ok(ok);
    };

    // the store write may wait on the SQLite busy timeout
    let documents = state.documents.clone();
    let (id, payment_ref) = (document_id.clone(), payment.id.clone());
    match web::block(move || documents.mark_paid(&id, &payment_ref)).await? {
        Ok(PaymentTransition::Applied) => {}
        Ok(PaymentTransition::AlreadyPaid) => {
            warn!("Document {} was already paid; notification replayed", document_id);
        }
        Err(AppError::NotFound(_)) => {
            warn!(
                "Approved payment {} references unknown document {}",
                payment.id, document_id
            );
        }
        Err(e) => return Err(e),
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(topic: Option<&str>, id: Option<&str>) -> NotificationQuery {
        NotificationQuery {
            topic: topic.map(str::to_string),
            id: id.map(str::to_string),
            ..NotificationQuery::default()
        }
    }

    #[test]
    fn test_payment_id_sources() {
        assert_eq!(
            payment_id(&query(Some("payment"), Some("9")), b""),
            Some("9".to_string())
        );
        assert_eq!(payment_id(&query(Some("merchant_order"), Some("9")), b""), None);
        assert_eq!(
            payment_id(
                &NotificationQuery::default(),
                br#"{"type":"payment","data":{"id":123}}"#
            ),
            Some("123".to_string())
        );
        assert_eq!(payment_id(&NotificationQuery::default(), b"not json"), None);
    }
}
