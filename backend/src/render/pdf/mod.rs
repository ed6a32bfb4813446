//! PDF engines.
//!
//! Both engines take the same [`PageShell`]. The built-in one lays the content
//! out in-process with genpdf; the Chromium one prints the shell HTML with a
//! headless browser for pixel-faithful output.
//!
//! Watermarked previews always go through Chromium: the shell's watermark is a
//! centred, rotated layer above the content, which genpdf cannot draw (page
//! decorations are painted before the content and text cannot be rotated).

mod builtin;
mod chromium;

pub use builtin::BuiltinEngine;
pub use chromium::ChromiumEngine;

use crate::config::{Config, PdfEngineKind};
use crate::render::shell::PageShell;
use crate::render::RenderError;
use std::sync::Arc;

pub trait PdfEngine: Send + Sync {
    fn render(&self, page: &PageShell) -> Result<Vec<u8>, RenderError>;
}

/// Engine for watermarked previews.
pub fn preview_engine(config: &Config) -> Arc<dyn PdfEngine> {
    Arc::new(ChromiumEngine::new(
        config.chromium_path.clone(),
        config.pdf_timeout,
    ))
}

/// Engine for the paid, unwatermarked PDF, as selected in the configuration.
pub fn document_engine(config: &Config) -> Arc<dyn PdfEngine> {
    match config.pdf_engine {
        PdfEngineKind::Builtin => Arc::new(BuiltinEngine::new(
            config.fonts_dir.clone(),
            config.font_family.clone(),
        )),
        PdfEngineKind::Chromium => Arc::new(ChromiumEngine::new(
            config.chromium_path.clone(),
            config.pdf_timeout,
        )),
    }
}
