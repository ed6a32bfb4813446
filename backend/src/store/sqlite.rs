use crate::error::{AppError, AppResult};
use crate::store::{DocumentStore, TemplateStore};
use chrono::{DateTime, Utc};
use common::model::document::{DataMapping, Document, DocumentStatus, PaymentTransition};
use common::model::field::FieldDefinition;
use common::model::template::Template;
use common::requests::TemplateFilter;
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS templates (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    description   TEXT,
    category_id   TEXT,
    subcategory_id TEXT,
    price_cents   INTEGER NOT NULL DEFAULT 0,
    html_body     TEXT,
    file_ref      TEXT,
    fields_config TEXT NOT NULL DEFAULT '[]'
);
CREATE TABLE IF NOT EXISTS documents (
    id          TEXT PRIMARY KEY,
    template_id TEXT NOT NULL REFERENCES templates(id),
    user_id     TEXT,
    data        TEXT NOT NULL DEFAULT '{}',
    status      TEXT NOT NULL DEFAULT 'draft',
    payment_ref TEXT,
    created_at  TEXT NOT NULL
);
";

/// SQLite-backed template and document store.
///
/// A connection is opened per operation, so the store is cheap to share across
/// actix workers.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> AppResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }
}

fn corrupt(what: &str, e: impl std::fmt::Display) -> AppError {
    AppError::UpstreamUnavailable(format!("corrupt {} record: {}", what, e))
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<(Template, String)> {
    Ok((
        Template {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category_id: row.get(3)?,
            subcategory_id: row.get(4)?,
            price_cents: row.get(5)?,
            html_body: row.get(6)?,
            file_ref: row.get(7)?,
            fields: Vec::new(),
        },
        row.get(8)?,
    ))
}

fn with_fields((mut template, fields_json): (Template, String)) -> AppResult<Template> {
    template.fields = serde_json::from_str::<Vec<FieldDefinition>>(&fields_json)
        .map_err(|e| corrupt("template", e))?;
    Ok(template)
}

fn query_document(conn: &Connection, id: &str) -> AppResult<Document> {
    let row = conn
        .query_row(
            "SELECT id, template_id, user_id, data, status, payment_ref, created_at
             FROM documents WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;

    let Some((id, template_id, user_id, data, status, payment_ref, created_at)) = row else {
        return Err(AppError::NotFound("Document".to_string()));
    };

    Ok(Document {
        id,
        template_id,
        user_id,
        data: serde_json::from_str::<DataMapping>(&data).map_err(|e| corrupt("document", e))?,
        status: status
            .parse::<DocumentStatus>()
            .map_err(|e| corrupt("document", e))?,
        payment_ref,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| corrupt("document", e))?
            .with_timezone(&Utc),
    })
}

impl TemplateStore for SqliteStore {
    fn get_template(&self, id: &str) -> AppResult<Template> {
        let conn = self.connect()?;
        let row = conn
            .query_row(
                "SELECT id, name, description, category_id, subcategory_id, price_cents,
                        html_body, file_ref, fields_config
                 FROM templates WHERE id = ?1",
                params![id],
                template_from_row,
            )
            .optional()?;
        match row {
            Some(row) => with_fields(row),
            None => Err(AppError::NotFound("Template".to_string())),
        }
    }

    fn list_templates(&self, filter: &TemplateFilter) -> AppResult<Vec<Template>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, category_id, subcategory_id, price_cents,
                    html_body, file_ref, fields_config
             FROM templates
             WHERE (?1 IS NULL OR category_id = ?1)
               AND (?2 IS NULL OR subcategory_id = ?2)
             ORDER BY name, id",
        )?;
        let rows = stmt
            .query_map(params![&filter.category, &filter.subcategory], template_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(with_fields).collect()
    }

    fn save_template(&self, template: &Template) -> AppResult<()> {
        let fields_json =
            serde_json::to_string(&template.fields).map_err(|e| corrupt("template", e))?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT OR REPLACE INTO templates
                 (id, name, description, category_id, subcategory_id, price_cents,
                  html_body, file_ref, fields_config)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &template.id,
                &template.name,
                &template.description,
                &template.category_id,
                &template.subcategory_id,
                template.price_cents,
                &template.html_body,
                &template.file_ref,
                fields_json,
            ],
        )?;
        Ok(())
    }
}

impl DocumentStore for SqliteStore {
    fn create_document(
        &self,
        template_id: &str,
        user_id: Option<&str>,
        data: &DataMapping,
    ) -> AppResult<String> {
        let doc = Document::new_draft(
            Uuid::new_v4().to_string(),
            template_id.to_string(),
            user_id.map(str::to_string),
            data.clone(),
            Utc::now(),
        );
        let data_json = serde_json::to_string(&doc.data).map_err(|e| corrupt("document", e))?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO documents (id, template_id, user_id, data, status, payment_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
            params![
                &doc.id,
                &doc.template_id,
                &doc.user_id,
                data_json,
                doc.status.as_str(),
                doc.created_at.to_rfc3339(),
            ],
        )?;
        Ok(doc.id)
    }

    fn get_document(&self, id: &str) -> AppResult<Document> {
        let conn = self.connect()?;
        query_document(&conn, id)
    }

    fn mark_paid(&self, id: &str, payment_ref: &str) -> AppResult<PaymentTransition> {
        let mut conn = self.connect()?;
        // IMMEDIATE takes the write lock up front so concurrent webhooks serialize here.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut doc = query_document(&tx, id)?;
        let transition = doc.mark_paid(payment_ref);
        match transition {
            PaymentTransition::Applied => {
                tx.execute(
                    "UPDATE documents SET status = ?1, payment_ref = ?2 WHERE id = ?3",
                    params![doc.status.as_str(), &doc.payment_ref, id],
                )?;
                info!("Document {} marked as paid (payment {})", id, payment_ref);
            }
            PaymentTransition::AlreadyPaid => {
                if doc.payment_ref.as_deref() != Some(payment_ref) {
                    warn!(
                        "Document {} already paid with {:?}; ignoring payment {}",
                        id, doc.payment_ref, payment_ref
                    );
                }
            }
        }
        tx.commit()?;
        Ok(transition)
    }
}
