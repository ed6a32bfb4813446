//! Storage collaborators: templates, documents and binary template files.
//!
//! Handlers only see these traits; the server wires in the SQLite and disk
//! implementations at startup.

mod files;
mod sqlite;

pub use files::DiskFileStore;
pub use sqlite::SqliteStore;

use crate::error::AppResult;
use common::model::document::{DataMapping, Document, PaymentTransition};
use common::model::template::Template;
use common::requests::TemplateFilter;

pub trait TemplateStore: Send + Sync {
    fn get_template(&self, id: &str) -> AppResult<Template>;

    /// Templates matching every filter present, ordered by name.
    fn list_templates(&self, filter: &TemplateFilter) -> AppResult<Vec<Template>>;

    /// Inserts or replaces the template record.
    fn save_template(&self, template: &Template) -> AppResult<()>;
}

pub trait DocumentStore: Send + Sync {
    /// Persists a new `draft` document and returns its id.
    fn create_document(
        &self,
        template_id: &str,
        user_id: Option<&str>,
        data: &DataMapping,
    ) -> AppResult<String>;

    fn get_document(&self, id: &str) -> AppResult<Document>;

    /// Applies a payment approval. Safe to call repeatedly for the same document.
    fn mark_paid(&self, id: &str, payment_ref: &str) -> AppResult<PaymentTransition>;
}

pub trait FileStore: Send + Sync {
    fn read(&self, file_ref: &str) -> AppResult<Vec<u8>>;

    /// Stores `bytes` and returns the reference to read them back.
    fn write(&self, bytes: &[u8], extension: &str) -> AppResult<String>;
}
