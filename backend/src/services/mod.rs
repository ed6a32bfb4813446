//! HTTP surface, one sub-module per resource. Each exposes a
//! `configure_routes() -> Scope` that `main.rs` mounts on the app.

pub mod documents;
pub mod templates;
pub mod webhooks;

use crate::error::AppError;
use actix_web::web;

/// Maximum JSON body accepted by the API.
const JSON_LIMIT: usize = 10 * 1024 * 1024;

/// JSON extractor settings shared by every route: a 10 MB limit and
/// deserialization failures (unknown field types included) reported as `400`
/// with a JSON error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}
