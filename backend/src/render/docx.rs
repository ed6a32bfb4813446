//! Office Open XML (`.docx`) packages.
//!
//! - [`fill_package`] substitutes `{key}` tokens inside an uploaded package.
//!   Word often splits a token over several runs (`{no` + `me}`), so text is
//!   matched per paragraph and the replacement lands in the run where the token
//!   starts.
//! - [`package_blocks`] reads a package back into the block model, used for the
//!   HTML preview.
//! - [`substitutable_text`] gathers the text of every part tokens are replaced
//!   in, used for placeholder discovery.
//! - [`build_package`] writes a fresh package from blocks, used for the Word
//!   download of HTML templates.

use crate::render::blocks::{Align, Block, BlockKind, Run};
use crate::render::RenderError;
use common::engine::placeholder::tokens;
use common::model::document::DataMapping;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::sync::LazyLock;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

const MAIN_PART: &str = "word/document.xml";

static PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$")
        .expect("part pattern is valid")
});

fn malformed(e: impl std::fmt::Display) -> RenderError {
    RenderError::MalformedTemplate(e.to_string())
}

fn open_archive(package: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>, RenderError> {
    ZipArchive::new(Cursor::new(package)).map_err(malformed)
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, RenderError> {
    let mut file = archive.by_name(name).map_err(malformed)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml).map_err(malformed)?;
    Ok(xml)
}

/// Escapes a value for a `<w:t>` body; newlines become Word line breaks.
fn text_xml(value: &str) -> String {
    escape(value)
        .replace('\n', r#"</w:t><w:br/><w:t xml:space="preserve">"#)
}

/// Byte range of one `<w:t>` element's text within the paragraph text.
struct TextNode {
    start: usize,
    end: usize,
}

fn is_text_tag(name: QName<'_>) -> bool {
    name.as_ref() == b"w:t"
}

/// Writes `text` as the body of a `<w:t xml:space="preserve">` element whose
/// end tag is written by the caller. Newlines become `<w:br/>`.
fn write_text_node(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), RenderError> {
    let preserve = || BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]);
    writer.write_event(Event::Start(preserve())).map_err(malformed)?;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            writer
                .write_event(Event::End(BytesEnd::new("w:t")))
                .map_err(malformed)?;
            writer
                .write_event(Event::Empty(BytesStart::new("w:br")))
                .map_err(malformed)?;
            writer.write_event(Event::Start(preserve())).map_err(malformed)?;
        }
        if !line.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(line)))
                .map_err(malformed)?;
        }
    }
    Ok(())
}

/// Writes one buffered `<w:p>` element, substituting its tokens. Paragraphs
/// without tokens are written back event for event.
fn write_paragraph(
    writer: &mut Writer<Vec<u8>>,
    events: Vec<Event<'_>>,
    data: &DataMapping,
) -> Result<(), RenderError> {
    let mut nodes = Vec::new();
    let mut combined = String::new();
    let mut in_text = false;
    for event in &events {
        match event {
            Event::Start(e) if is_text_tag(e.name()) => {
                in_text = true;
                nodes.push(TextNode {
                    start: combined.len(),
                    end: combined.len(),
                });
            }
            Event::End(e) if is_text_tag(e.name()) => in_text = false,
            Event::Text(t) if in_text => {
                combined.push_str(&t.unescape().map_err(malformed)?);
                if let Some(node) = nodes.last_mut() {
                    node.end = combined.len();
                }
            }
            _ => {}
        }
    }

    let found = tokens(&combined);
    if found.is_empty() {
        for event in events {
            writer.write_event(event).map_err(malformed)?;
        }
        return Ok(());
    }

    let owner = |pos: usize| {
        nodes
            .iter()
            .position(|n| n.start <= pos && pos < n.end)
            .unwrap_or(0)
    };
    let mut outputs = vec![String::new(); nodes.len()];
    let copy_span = |outputs: &mut Vec<String>, from: usize, to: usize| {
        for (i, node) in nodes.iter().enumerate() {
            let (s, e) = (from.max(node.start), to.min(node.end));
            if s < e {
                outputs[i].push_str(&combined[s..e]);
            }
        }
    };

    let mut cursor = 0;
    for token in &found {
        copy_span(&mut outputs, cursor, token.start);
        let value = data.get(token.key).map(String::as_str).unwrap_or_default();
        outputs[owner(token.start)].push_str(value);
        cursor = token.end;
    }
    copy_span(&mut outputs, cursor, combined.len());

    let mut outputs = outputs.into_iter();
    in_text = false;
    for event in events {
        match event {
            Event::Start(e) if is_text_tag(e.name()) => {
                in_text = true;
                write_text_node(writer, &outputs.next().unwrap_or_default())?;
            }
            Event::End(e) if is_text_tag(e.name()) => {
                in_text = false;
                writer.write_event(Event::End(e)).map_err(malformed)?;
            }
            Event::Text(_) if in_text => {}
            other => writer.write_event(other).map_err(malformed)?,
        }
    }
    Ok(())
}

/// Streams one XML part, buffering each outermost `<w:p>` so its text can be
/// matched as a whole. Everything else is copied through untouched.
fn fill_part(xml: &str, data: &DataMapping) -> Result<String, RenderError> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut paragraph = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(malformed)?;
        let (opens, closes) = match &event {
            Event::Start(e) => (e.name().as_ref() == b"w:p", false),
            Event::End(e) => (false, e.name().as_ref() == b"w:p"),
            Event::Eof => break,
            _ => (false, false),
        };
        if opens {
            depth += 1;
        }
        if depth == 0 {
            writer.write_event(event).map_err(malformed)?;
            continue;
        }
        paragraph.push(event);
        if closes {
            depth -= 1;
            if depth == 0 {
                write_paragraph(&mut writer, std::mem::take(&mut paragraph), data)?;
            }
        }
    }
    String::from_utf8(writer.into_inner()).map_err(malformed)
}

/// Returns a copy of `package` with every token in the body, headers, footers
/// and notes replaced by its value (or removed when absent).
pub fn fill_package(package: &[u8], data: &DataMapping) -> Result<Vec<u8>, RenderError> {
    let mut archive = open_archive(package)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(malformed)?;
        let name = file.name().to_string();
        if PART_RE.is_match(&name) {
            let mut xml = String::new();
            file.read_to_string(&mut xml).map_err(malformed)?;
            let filled = fill_part(&xml, data)?;
            writer.start_file(name, options).map_err(malformed)?;
            writer.write_all(filled.as_bytes())?;
        } else {
            writer.raw_copy_file(file).map_err(malformed)?;
        }
    }

    let cursor = writer.finish().map_err(malformed)?;
    Ok(cursor.into_inner())
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn toggles_on(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr_value(e, b"w:val").as_deref(),
        Some("0") | Some("false") | Some("none")
    )
}

/// Reads the main document part into blocks: one per paragraph, with bold and
/// italic runs, heading styles, list paragraphs and alignment.
pub fn package_blocks(package: &[u8]) -> Result<Vec<Block>, RenderError> {
    let mut archive = open_archive(package)?;
    let xml = read_part(&mut archive, MAIN_PART)?;
    part_blocks(&xml)
}

fn part_blocks(xml: &str) -> Result<Vec<Block>, RenderError> {
    let mut reader = Reader::from_str(xml);
    let mut blocks = Vec::new();
    let mut current: Option<Block> = None;
    let (mut bold, mut italic, mut in_text) = (false, false, false);

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Empty(e) if e.name().as_ref() == b"w:p" => {
                blocks.push(Block::paragraph(""));
            }
            Event::Empty(e) if is_text_tag(e.name()) => {}
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"w:p" => {
                    current = Some(Block {
                        kind: BlockKind::Paragraph,
                        align: Align::Left,
                        runs: Vec::new(),
                    });
                }
                b"w:pStyle" => {
                    let style = attr_value(&e, b"w:val").unwrap_or_default();
                    if let Some(block) = current.as_mut() {
                        let level = style
                            .strip_prefix("Heading")
                            .or_else(|| style.strip_prefix("Ttulo"))
                            .and_then(|n| n.parse::<u8>().ok());
                        if let Some(level) = level {
                            block.kind = BlockKind::Heading(level);
                        }
                    }
                }
                b"w:numPr" => {
                    if let Some(block) = current.as_mut() {
                        block.kind = BlockKind::ListItem(None);
                    }
                }
                b"w:jc" => {
                    if let Some(block) = current.as_mut() {
                        block.align = match attr_value(&e, b"w:val").as_deref() {
                            Some("center") => Align::Center,
                            Some("right") | Some("end") => Align::Right,
                            Some("both") => Align::Justify,
                            _ => Align::Left,
                        };
                    }
                }
                b"w:r" => {
                    bold = false;
                    italic = false;
                }
                b"w:b" => bold = toggles_on(&e),
                b"w:i" => italic = toggles_on(&e),
                b"w:t" => in_text = true,
                b"w:br" | b"w:cr" => push_run(&mut current, "\n", false, false),
                b"w:tab" => push_run(&mut current, "\t", bold, italic),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().map_err(malformed)?;
                push_run(&mut current, &text, bold, italic);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(blocks)
}

fn push_run(current: &mut Option<Block>, text: &str, bold: bool, italic: bool) {
    let Some(block) = current.as_mut() else {
        return;
    };
    if text.is_empty() {
        return;
    }
    match block.runs.last_mut() {
        Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(text),
        _ => block.runs.push(Run {
            text: text.to_string(),
            bold,
            italic,
        }),
    }
}

/// Paragraph text of every part [`fill_package`] substitutes in: the main
/// part first, then headers, footers and notes by part name. This is the
/// text placeholders are discovered from.
pub fn substitutable_text(package: &[u8]) -> Result<String, RenderError> {
    let mut archive = open_archive(package)?;
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| *name != MAIN_PART && PART_RE.is_match(name))
        .map(str::to_string)
        .collect();
    names.sort();
    names.insert(0, MAIN_PART.to_string());

    let mut lines = Vec::new();
    for name in names {
        let xml = read_part(&mut archive, &name)?;
        lines.extend(part_blocks(&xml)?.iter().map(Block::plain_text));
    }
    Ok(lines.join("\n"))
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn paragraph_xml(block: &Block) -> String {
    let mut xml = String::from("<w:p>");
    let jc = match block.align {
        Align::Left => None,
        Align::Center => Some("center"),
        Align::Right => Some("right"),
        Align::Justify => Some("both"),
    };
    if let Some(jc) = jc {
        xml.push_str(&format!(r#"<w:pPr><w:jc w:val="{}"/></w:pPr>"#, jc));
    }
    let heading_size = match block.kind {
        BlockKind::Heading(level) => Some(match level {
            1 => 36,
            2 => 30,
            _ => 26,
        }),
        _ => None,
    };
    let marker = block.marker().map(|m| Run {
        text: m,
        ..Run::default()
    });
    for run in marker.iter().chain(block.runs.iter()) {
        let bold = run.bold || heading_size.is_some();
        let mut props = String::new();
        if bold {
            props.push_str("<w:b/>");
        }
        if run.italic {
            props.push_str("<w:i/>");
        }
        if let Some(size) = heading_size {
            props.push_str(&format!(r#"<w:sz w:val="{}"/>"#, size));
        }
        xml.push_str("<w:r>");
        if !props.is_empty() {
            xml.push_str(&format!("<w:rPr>{}</w:rPr>", props));
        }
        xml.push_str(&format!(
            r#"<w:t xml:space="preserve">{}</w:t>"#,
            text_xml(&run.text)
        ));
        xml.push_str("</w:r>");
    }
    xml.push_str("</w:p>");
    xml
}

/// Writes a minimal Word package holding `blocks`.
pub fn build_package(blocks: &[Block]) -> Result<Vec<u8>, RenderError> {
    let mut body = String::new();
    for block in blocks {
        body.push_str(&paragraph_xml(block));
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1134" w:right="1134" w:bottom="1134" w:left="1134" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        (MAIN_PART, document.as_str()),
    ] {
        writer
            .start_file(name, options)
            .map_err(std::io::Error::from)?;
        writer.write_all(content.as_bytes())?;
    }
    let cursor = writer.finish().map_err(std::io::Error::from)?;
    Ok(cursor.into_inner())
}
