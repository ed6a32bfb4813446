use crate::render::blocks::{self, Align, Block, BlockKind, Run};
use crate::render::pdf::PdfEngine;
use crate::render::shell::PageShell;
use crate::render::RenderError;
use genpdf::elements::{Break, LinearLayout, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Document, SimplePageDecorator};
use std::path::PathBuf;

const BODY_FONT_SIZE: u8 = 11;
const MARGIN_MM: u8 = 20;

/// In-process PDF layout with genpdf, for unwatermarked pages only.
///
/// Fonts are loaded from `fonts_dir` as `<family>-Regular.ttf`,
/// `<family>-Bold.ttf`, `<family>-Italic.ttf` and `<family>-BoldItalic.ttf`.
#[derive(Debug, Clone)]
pub struct BuiltinEngine {
    fonts_dir: PathBuf,
    family: String,
}

impl BuiltinEngine {
    pub fn new(fonts_dir: PathBuf, family: String) -> Self {
        BuiltinEngine { fonts_dir, family }
    }

    fn configure_document(&self, page: &PageShell) -> Result<Document, RenderError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.family, None)
            .map_err(|e| RenderError::Pdf(format!("loading font '{}': {}", self.family, e)))?;
        let mut doc = Document::new(font_family);
        doc.set_title(page.title.clone());
        doc.set_paper_size(genpdf::PaperSize::A4);
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_line_spacing(1.25);
        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(MARGIN_MM);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

impl PdfEngine for BuiltinEngine {
    fn render(&self, page: &PageShell) -> Result<Vec<u8>, RenderError> {
        if page.watermark.is_some() {
            return Err(RenderError::Pdf(
                "the built-in engine cannot layer a watermark over the content".to_string(),
            ));
        }
        let mut doc = self.configure_document(page)?;
        for block in blocks::parse_html(&page.content_html) {
            push_block(&mut doc, &block);
        }
        let mut out = Vec::new();
        doc.render(&mut out)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(out)
    }
}

fn run_style(run: &Run, base: Style) -> Style {
    match (run.bold, run.italic) {
        (true, true) => base.bold().italic(),
        (true, false) => base.bold(),
        (false, true) => base.italic(),
        (false, false) => base,
    }
}

fn alignment(align: Align) -> Alignment {
    match align {
        Align::Center => Alignment::Center,
        Align::Right => Alignment::Right,
        // genpdf has no justified text
        Align::Left | Align::Justify => Alignment::Left,
    }
}

/// Splits runs at hard breaks: each returned line becomes one paragraph.
fn lines(runs: &[Run]) -> Vec<Vec<Run>> {
    let mut out: Vec<Vec<Run>> = vec![Vec::new()];
    for run in runs {
        for (i, piece) in run.text.split('\n').enumerate() {
            if i > 0 {
                out.push(Vec::new());
            }
            if !piece.is_empty() {
                if let Some(line) = out.last_mut() {
                    line.push(Run {
                        text: piece.to_string(),
                        ..run.clone()
                    });
                }
            }
        }
    }
    out
}

fn push_block(doc: &mut Document, block: &Block) {
    if block.is_empty() {
        doc.push(Break::new(1));
        return;
    }
    let base = match block.kind {
        BlockKind::Heading(level) => Style::new().bold().with_font_size(heading_size(level)),
        _ => Style::new(),
    };
    let mut layout = LinearLayout::vertical();
    for (i, line) in lines(&block.runs).into_iter().enumerate() {
        let mut p = Paragraph::new("");
        if i == 0 {
            if let Some(marker) = block.marker() {
                p.push(StyledString::new(marker, base));
            }
        }
        for run in &line {
            p.push(StyledString::new(run.text.clone(), run_style(run, base)));
        }
        p.set_alignment(alignment(block.align));
        layout.push(p);
    }
    doc.push(layout);
    if matches!(block.kind, BlockKind::Paragraph | BlockKind::Heading(_)) {
        doc.push(Break::new(0.5));
    }
}

fn heading_size(level: u8) -> u8 {
    match level {
        1 => 18,
        2 => 15,
        3 => 13,
        _ => 12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lines_split_on_hard_breaks() {
        let runs = vec![
            Run { text: "a\nb".into(), bold: true, italic: false },
            Run { text: "c".into(), bold: false, italic: false },
        ];
        let split = lines(&runs);
        assert_eq!(split.len(), 2);
        assert_eq!(split[0], vec![Run { text: "a".into(), bold: true, italic: false }]);
        assert_eq!(
            split[1],
            vec![
                Run { text: "b".into(), bold: true, italic: false },
                Run { text: "c".into(), bold: false, italic: false },
            ]
        );
    }

    #[test]
    fn test_watermarked_pages_are_refused() {
        let engine = BuiltinEngine::new(PathBuf::from("/nonexistent/fonts"), "Nope".into());
        let page = PageShell::new("t", "<p>x</p>").with_watermark("PRÉ VISUALIZAÇÃO");
        match engine.render(&page) {
            Err(RenderError::Pdf(msg)) => assert!(msg.contains("watermark")),
            other => panic!("expected a refusal, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_missing_fonts_fail_cleanly() {
        let engine = BuiltinEngine::new(PathBuf::from("/nonexistent/fonts"), "Nope".into());
        let result = engine.render(&PageShell::new("t", "<p>x</p>"));
        assert!(matches!(result, Err(RenderError::Pdf(_))));
    }
}
