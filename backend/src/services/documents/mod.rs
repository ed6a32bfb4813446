//! # Document Service Module
//!
//! Buyer side of the system: a filled form becomes a `draft` Document, which
//! can be previewed (HTML and watermarked PDF), paid for through a checkout,
//! and downloaded once the payment webhook has marked it `paid`.
//!
//! Rendering is CPU-bound (and the Chromium engine blocks on a child process),
//! so every render runs on `web::block`.

mod checkout;
mod create;
mod download;
mod get;
mod pdf;
mod preview;

use crate::error::AppResult;
use crate::state::AppState;
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::document::Document;
use common::model::template::Template;

const API_PATH: &str = "/api/documents";

/// Configures and returns the Actix `Scope` for document routes.
///
/// *   **`POST /`**: fill-in form submission, returns `{id}` with `201`.
/// *   **`GET /{document_id}`**: the document record.
/// *   **`GET /{document_id}/preview`**: `{html}` preview.
/// *   **`GET /{document_id}/pdf`**: watermarked PDF, inline.
/// *   **`GET /{document_id}/download?format=docx|pdf`**: final document, `403`
///     until paid.
/// *   **`POST /{document_id}/checkout`**: payment preference, returns
///     `{init_point}`; `409` once the document is paid.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/{document_id}", get().to(get::process))
        .route("/{document_id}/preview", get().to(preview::process))
        .route("/{document_id}/pdf", get().to(pdf::process))
        .route("/{document_id}/download", get().to(download::process))
        .route("/{document_id}/checkout", post().to(checkout::process))
}

/// Loads a document together with the template it was filled from.
fn load(state: &AppState, document_id: &str) -> AppResult<(Document, Template)> {
    let document = state.documents.get_document(document_id)?;
    let template = state.templates.get_template(&document.template_id)?;
    Ok((document, template))
}

/// `Content-Disposition` carrying both an ASCII fallback name and the UTF-8
/// original.
fn disposition(kind: DispositionType, filename: &str) -> ContentDisposition {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    let mut parameters = vec![DispositionParam::Filename(fallback)];
    if !filename.is_ascii() {
        parameters.push(DispositionParam::FilenameExt(ExtendedValue {
            charset: Charset::Ext("UTF-8".to_string()),
            language_tag: None,
            value: filename.as_bytes().to_vec(),
        }));
    }
    ContentDisposition {
        disposition: kind,
        parameters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::json_config;
    use crate::services::testing::{env, TestEnv};
    use crate::store::{DocumentStore, TemplateStore};
    use actix_web::http::header::CONTENT_DISPOSITION;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::model::document::{DataMapping, DocumentStatus};
    use common::model::field::{FieldDefinition, FieldType};
    use common::requests::{CheckoutResponse, CreatedDocument, PreviewResponse};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    macro_rules! app {
        ($env:expr) => {
            test::init_service(
                App::new()
                    .app_data(json_config())
                    .app_data(web::Data::new($env.state.clone()))
                    .service(configure_routes()),
            )
            .await
        };
    }

    fn seed_template(env: &TestEnv) {
        let template = Template {
            id: "contrato".into(),
            name: "Contrato de Locação".into(),
            description: None,
            category_id: None,
            subcategory_id: None,
            price_cents: 4990,
            html_body: Some("<p>Olá {nome}, valor {valor}</p>".into()),
            file_ref: None,
            fields: vec![
                FieldDefinition::with_defaults("nome"),
                FieldDefinition {
                    key: "valor".into(),
                    label: "Valor".into(),
                    field_type: FieldType::Monetary,
                    required: true,
                },
            ],
        };
        env.store.save_template(&template).unwrap();
    }

    fn seed_document(env: &TestEnv) -> String {
        seed_template(env);
        let data: DataMapping = [("nome", "Ana"), ("valor", "1,50")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.store.create_document("contrato", None, &data).unwrap()
    }

    #[actix_web::test]
    async fn test_create_formats_values() {
        let env = env();
        seed_template(&env);
        let app = app!(env);

        let req = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(json!({
                "template_id": "contrato",
                "user_id": "u1",
                "values": {"nome": " Ana ", "valor": "150", "extra": "ignored"}
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: CreatedDocument = test::read_body_json(resp).await;

        let doc = env.store.get_document(&created.id).unwrap();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.user_id.as_deref(), Some("u1"));
        let expected: DataMapping = [("nome", "Ana"), ("valor", "1,50")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(doc.data, expected);
    }

    #[actix_web::test]
    async fn test_create_reports_missing_required_fields() {
        let env = env();
        seed_template(&env);
        let app = app!(env);

        let req = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(json!({"template_id": "contrato", "values": {"nome": ""}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("nome") && message.contains("valor"), "{}", message);

        let req = test::TestRequest::post()
            .uri("/api/documents")
            .set_json(json!({"template_id": "nope", "values": {}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_get_and_preview() {
        let env = env();
        let id = seed_document(&env);
        let app = app!(env);

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}", id))
            .to_request();
        let doc: Document = test::call_and_read_body_json(&app, req).await;
        assert_eq!(doc.template_id, "contrato");

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}/preview", id))
            .to_request();
        let preview: PreviewResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(preview.html, "<p>Olá Ana, valor 1,50</p>");

        let req = test::TestRequest::get()
            .uri("/api/documents/unknown/preview")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_pdf_preview_is_inline_and_watermarked() {
        let env = env();
        let id = seed_document(&env);
        let app = app!(env);

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}/pdf", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/pdf"
        );
        let disposition = resp.headers().get(CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.starts_with("inline"));
        assert!(disposition.contains("preview.pdf"));

        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
        let pages = env.engine.pages.lock().unwrap();
        assert_eq!(pages[0].watermark.as_deref(), Some("PRÉ VISUALIZAÇÃO"));
    }

    #[actix_web::test]
    async fn test_download_requires_payment_then_succeeds() {
        let env = env();
        let id = seed_document(&env);
        let app = app!(env);

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}/download", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        env.store.mark_paid(&id, "pay-1").unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}/download", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers().get(CONTENT_DISPOSITION).unwrap().to_str().unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains(".docx"));
        let body = test::read_body(resp).await;
        assert_eq!(
            crate::render::docx::tests::package_text(&body).unwrap(),
            "Olá Ana, valor 1,50"
        );

        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{}/download?format=pdf", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            "application/pdf"
        );
    }

    #[actix_web::test]
    async fn test_checkout_uses_document_as_reference() {
        let env = env();
        let id = seed_document(&env);
        let app = app!(env);

        let req = test::TestRequest::post()
            .uri(&format!("/api/documents/{}/checkout", id))
            .to_request();
        let resp: CheckoutResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.init_point, format!("https://pay.example/checkout/{}", id));

        let checkouts = env.gateway.checkouts.lock().unwrap();
        assert_eq!(checkouts[0].document_id, id);
        assert_eq!(checkouts[0].title, "Contrato de Locação");
        assert_eq!(checkouts[0].unit_price, 49.9);
    }

    #[actix_web::test]
    async fn test_checkout_refused_once_paid() {
        let env = env();
        let id = seed_document(&env);
        env.store.mark_paid(&id, "pay-1").unwrap();
        let app = app!(env);

        let req = test::TestRequest::post()
            .uri(&format!("/api/documents/{}/checkout", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(env.gateway.checkouts.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_disposition_keeps_utf8_name() {
        let header = disposition(DispositionType::Attachment, "Locação.docx").to_string();
        assert!(header.starts_with("attachment"));
        assert!(header.contains("filename=\"Loca__o.docx\""));
        assert!(header.contains("filename*=UTF-8''Loca%C3%A7%C3%A3o.docx"));
    }
}
