//! Inbound notifications from the payment provider.

mod mercadopago;

use actix_web::web::{post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/webhooks";

/// *   **`POST /mercadopago`**: payment notification. An approved payment marks
///     the document named by its external reference as `paid`.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/mercadopago", post().to(mercadopago::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::PaymentInfo;
    use crate::services::testing::{env, TestEnv};
    use crate::store::{DocumentStore, TemplateStore};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::model::document::{DataMapping, DocumentStatus};
    use common::model::template::Template;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    macro_rules! app {
        ($env:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($env.state.clone()))
                    .service(configure_routes()),
            )
            .await
        };
    }

    fn seed_document(env: &TestEnv) -> String {
        env.store
            .save_template(&Template {
                id: "t".into(),
                name: "T".into(),
                description: None,
                category_id: None,
                subcategory_id: None,
                price_cents: 100,
                html_body: Some("<p>{a}</p>".into()),
                file_ref: None,
                fields: Vec::new(),
            })
            .unwrap();
        env.store
            .create_document("t", None, &DataMapping::new())
            .unwrap()
    }

    #[actix_web::test]
    async fn test_approved_payment_marks_document_paid() {
        let env = env();
        let id = seed_document(&env);
        env.gateway.approve("777", &id);
        let app = app!(env);

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/webhooks/mercadopago?topic=payment&id=777")
                .to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, json!({"status": "ok"}));
        }

        let doc = env.store.get_document(&id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Paid);
        assert_eq!(doc.payment_ref.as_deref(), Some("777"));
    }

    #[actix_web::test]
    async fn test_json_body_notification() {
        let env = env();
        let id = seed_document(&env);
        env.gateway.approve("42", &id);
        let app = app!(env);

        let req = test::TestRequest::post()
            .uri("/api/webhooks/mercadopago")
            .set_json(json!({"type": "payment", "data": {"id": "42"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(env.store.get_document(&id).unwrap().is_paid());
    }

    #[actix_web::test]
    async fn test_pending_and_foreign_notifications_are_ignored() {
        let env = env();
        let id = seed_document(&env);
        env.gateway.payments.lock().unwrap().insert(
            "1".into(),
            PaymentInfo {
                id: "1".into(),
                status: "pending".into(),
                external_reference: Some(id.clone()),
            },
        );
        env.gateway.approve("2", "no-such-document");
        let app = app!(env);

        for uri in [
            "/api/webhooks/mercadopago?type=payment&data.id=1",
            "/api/webhooks/mercadopago?topic=merchant_order&id=1",
            "/api/webhooks/mercadopago?topic=payment&id=2",
            "/api/webhooks/mercadopago",
        ] {
            let req = test::TestRequest::post().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        }
        assert!(!env.store.get_document(&id).unwrap().is_paid());
    }

    #[actix_web::test]
    async fn test_lookup_failure_is_an_error() {
        let env = env();
        let app = app!(env);
        let req = test::TestRequest::post()
            .uri("/api/webhooks/mercadopago?topic=payment&id=unknown")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
