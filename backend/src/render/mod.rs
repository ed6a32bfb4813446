//! Render pipeline: preview HTML, watermarked PDF and the paid final document,
//! all produced from one template plus a document's data mapping.

pub mod blocks;
pub mod docx;
pub mod pdf;
pub mod shell;

use crate::error::{AppError, AppResult};
use crate::store::FileStore;
use common::engine::substitute;
use common::model::document::{DataMapping, Document};
use common::model::template::{Template, TemplateSource};
use common::requests::DownloadFormat;
use log::debug;
use self::pdf::PdfEngine;
use self::shell::PageShell;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    /// The office package could not be read or rewritten.
    #[error("{0}")]
    MalformedTemplate(String),

    #[error("template has neither an HTML body nor a file")]
    MissingSource,

    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("PDF rendering timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A template ready to be filled, in whichever representation it carries.
#[derive(Debug, Clone)]
pub enum TemplateRenderer {
    Html { body: String },
    Binary { package: Vec<u8> },
}

impl TemplateRenderer {
    /// Selects the variant from the populated template fields, loading the
    /// package bytes for binary templates.
    pub fn for_template(template: &Template, files: &dyn FileStore) -> AppResult<Self> {
        match template.source() {
            Some(TemplateSource::Html(body)) => Ok(TemplateRenderer::Html {
                body: body.to_string(),
            }),
            Some(TemplateSource::Binary(file_ref)) => Ok(TemplateRenderer::Binary {
                package: files.read(file_ref)?,
            }),
            None => Err(RenderError::MissingSource.into()),
        }
    }

    /// Filled HTML. Binary packages are filled first, then converted.
    pub fn filled_html(&self, data: &DataMapping) -> Result<String, RenderError> {
        match self {
            TemplateRenderer::Html { body } => Ok(substitute::render(body, data)),
            TemplateRenderer::Binary { package } => {
                let filled = docx::fill_package(package, data)?;
                Ok(blocks::to_html(&docx::package_blocks(&filled)?))
            }
        }
    }

    pub fn filled_docx(&self, data: &DataMapping) -> Result<Vec<u8>, RenderError> {
        match self {
            TemplateRenderer::Html { body } => {
                let html = substitute::render(body, data);
                docx::build_package(&blocks::parse_html(&html))
            }
            TemplateRenderer::Binary { package } => docx::fill_package(package, data),
        }
    }
}

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalDocument {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Turns a template name into a download file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | ':' | '*' | '?' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        "documento".to_string()
    } else {
        stem.to_string()
    }
}

/// Watermarked previews and final PDFs may use different engines; see
/// [`pdf::preview_engine`].
#[derive(Clone)]
pub struct RenderPipeline {
    preview_engine: Arc<dyn PdfEngine>,
    document_engine: Arc<dyn PdfEngine>,
    watermark_text: String,
}

impl RenderPipeline {
    /// A pipeline printing everything with `engine`.
    pub fn new(engine: Arc<dyn PdfEngine>, watermark_text: impl Into<String>) -> Self {
        RenderPipeline {
            preview_engine: engine.clone(),
            document_engine: engine,
            watermark_text: watermark_text.into(),
        }
    }

    /// Prints the paid, unwatermarked PDF with `engine` instead.
    pub fn with_document_engine(mut self, engine: Arc<dyn PdfEngine>) -> Self {
        self.document_engine = engine;
        self
    }

    pub fn preview_html(
        &self,
        template: &Template,
        files: &dyn FileStore,
        document: &Document,
    ) -> AppResult<String> {
        let renderer = TemplateRenderer::for_template(template, files)?;
        Ok(renderer.filled_html(&document.data)?)
    }

    /// The preview HTML under the watermark, printed to PDF.
    pub fn watermarked_pdf(
        &self,
        template: &Template,
        files: &dyn FileStore,
        document: &Document,
    ) -> AppResult<Vec<u8>> {
        let html = self.preview_html(template, files, document)?;
        let page = PageShell::new(template.name.as_str(), html)
            .with_watermark(self.watermark_text.as_str());
        debug!("Rendering watermarked PDF for document {}", document.id);
        Ok(self.preview_engine.render(&page)?)
    }

    /// The unwatermarked deliverable. Fails with `PaymentRequired` before any
    /// rendering work when the document is not paid.
    pub fn final_document(
        &self,
        template: &Template,
        files: &dyn FileStore,
        document: &Document,
        format: DownloadFormat,
    ) -> AppResult<FinalDocument> {
        if !document.is_paid() {
            return Err(AppError::PaymentRequired);
        }
        let renderer = TemplateRenderer::for_template(template, files)?;
        let stem = file_stem(&template.name);
        let final_document = match format {
            DownloadFormat::Docx => FinalDocument {
                filename: format!("{}.docx", stem),
                content_type: docx::CONTENT_TYPE,
                bytes: renderer.filled_docx(&document.data)?,
            },
            DownloadFormat::Pdf => {
                let page = PageShell::new(template.name.as_str(), renderer.filled_html(&document.data)?);
                FinalDocument {
                    filename: format!("{}.pdf", stem),
                    content_type: PDF_CONTENT_TYPE,
                    bytes: self.document_engine.render(&page)?,
                }
            }
        };
        Ok(final_document)
    }
}
