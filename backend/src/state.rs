//! Shared application state, built once in `main.rs` and injected into every
//! handler as `web::Data<AppState>`.
//!
//! Everything in here is either immutable or internally synchronised, so the
//! struct is cheap to clone per worker.

use crate::payment::PaymentGateway;
use crate::render::RenderPipeline;
use crate::store::{DocumentStore, FileStore, TemplateStore};
use common::engine::FormatPolicy;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub documents: Arc<dyn DocumentStore>,
    pub files: Arc<dyn FileStore>,
    pub pipeline: RenderPipeline,
    pub payments: Arc<dyn PaymentGateway>,
    /// How the fill-in form stores monetary values.
    pub format_policy: FormatPolicy,
}
