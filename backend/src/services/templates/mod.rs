//! # Template Catalog Service
//!
//! Authoring side of the system: templates are created and edited here, their
//! `{key}` placeholders are discovered and reconciled into Field Definitions,
//! and binary `.docx` templates are uploaded.
//!
//! ## Sub-modules:
//! - `list`: catalog listing.
//! - `get`: a single template with its field configuration.
//! - `save`: create/update from the editor, reconciling placeholders.
//! - `upload`: `.docx` upload for binary templates.
//! - `fields`: explicit deletion of a Field Definition.

mod fields;
mod get;
mod list;
mod save;
mod upload;

use actix_web::web::{delete, get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`GET /`**: `list::process`. Catalog entries ordered by name, narrowed
///     by the optional `category` and `subcategory` query parameters.
/// *   **`POST /save`**: `save::process`. Creates or updates a template from a
///     `SaveTemplateRequest`. Placeholders found in the HTML body are appended
///     to the submitted field list as default Field Definitions; existing
///     definitions are never changed or dropped.
/// *   **`GET /{template_id}`**: `get::process`. The full template.
/// *   **`POST /{template_id}/file`**: `upload::process`. Multipart `.docx`
///     upload (`file` part) that becomes the template's binary source.
/// *   **`DELETE /{template_id}/fields/{key}`**: `fields::process`. Removes one
///     Field Definition; the only way a definition disappears.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/save", post().to(save::process))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}/file", post().to(upload::process))
        .route("/{template_id}/fields/{key}", delete().to(fields::process))
}
