use crate::error::{AppError, AppResult};
use crate::render::{docx, RenderError};
use crate::state::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::engine::{extract, reconcile};
use futures_util::StreamExt;
use log::info;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// `POST /api/templates/{template_id}/file`: stores a `.docx` as the
/// template's binary source and reconciles the placeholders found in its text.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut template = state.templates.get_template(&template_id)?;
    let package = read_docx_part(payload).await?;

    let text = docx::substitutable_text(&package).map_err(|e| match e {
        RenderError::MalformedTemplate(msg) => {
            AppError::Validation(format!("Not a valid .docx package: {}", msg))
        }
        other => other.into(),
    })?;
    template.fields = reconcile(&template.fields, &extract(&text));
    template.file_ref = Some(state.files.write(&package, "docx")?);
    state.templates.save_template(&template)?;

    info!(
        "Template {} now uses file {}",
        template.id,
        template.file_ref.as_deref().unwrap_or_default()
    );
    Ok(HttpResponse::Ok().json(template))
}

/// Collects the `file` part, which must carry a `.docx` file name.
async fn read_docx_part(mut payload: Multipart) -> AppResult<Vec<u8>> {
    let mut package: Option<Vec<u8>> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::Validation(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !filename.to_lowercase().ends_with(".docx") {
            return Err(AppError::Validation("The file must end with .docx".to_string()));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| AppError::Validation(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(AppError::Validation("The file is too large".to_string()));
            }
            bytes.extend_from_slice(&chunk);
        }
        package = Some(bytes);
    }

    package.ok_or_else(|| AppError::Validation("Missing file".to_string()))
}
