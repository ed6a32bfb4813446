//! A small block model shared by the PDF layout, the generated `.docx` and the
//! HTML preview of binary templates.
//!
//! HTML is parsed with html5ever, so entities and malformed editor markup are
//! handled the way a browser would. The walk understands the subset a
//! rich-text editor produces: paragraphs, headings, lists, line breaks,
//! bold/italic runs and the `ql-align-*` / `text-align` alignment markers.
//! Unknown elements are transparent.

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use std::sync::LazyLock;

static ALIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"ql-align-(center|right|justify)|text-align\s*:\s*(center|right|justify)")
        .expect("align pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    /// `None` for bullets, the 1-based position for ordered lists.
    ListItem(Option<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub align: Align,
    /// A `'\n'` inside a run is a hard line break.
    pub runs: Vec<Run>,
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block {
            kind: BlockKind::Paragraph,
            align: Align::Left,
            runs: vec![Run {
                text: text.into(),
                ..Run::default()
            }],
        }
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    /// Text prefix for list items (`"• "`, `"3. "`).
    pub fn marker(&self) -> Option<String> {
        match self.kind {
            BlockKind::ListItem(None) => Some("• ".to_string()),
            BlockKind::ListItem(Some(n)) => Some(format!("{}. ", n)),
            _ => None,
        }
    }
}

/// Escapes text for inclusion in HTML element content or attributes.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn parse_align(attrs: &str) -> Align {
    match ALIGN_RE.captures(attrs) {
        Some(caps) => match caps.get(1).or(caps.get(2)).map(|m| m.as_str()) {
            Some("center") => Align::Center,
            Some("right") => Align::Right,
            Some("justify") => Align::Justify,
            _ => Align::Left,
        },
        None => Align::Left,
    }
}

struct OpenBlock {
    block: Block,
    explicit: bool,
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    current: Option<OpenBlock>,
    bold: u32,
    italic: u32,
    /// Ordered flag and running counter per open list.
    lists: Vec<(bool, u32)>,
}

impl Builder {
    fn open(&mut self, kind: BlockKind, align: Align) {
        self.flush();
        self.current = Some(OpenBlock {
            block: Block {
                kind,
                align,
                runs: Vec::new(),
            },
            explicit: true,
        });
    }

    fn flush(&mut self) {
        let Some(OpenBlock { mut block, explicit }) = self.current.take() else {
            return;
        };
        if let Some(first) = block.runs.first_mut() {
            first.text = first.text.trim_start_matches(' ').to_string();
        }
        if let Some(last) = block.runs.last_mut() {
            last.text = last.text.trim_end_matches(' ').to_string();
        }
        block.runs.retain(|r| !r.text.is_empty());
        if explicit || !block.is_empty() {
            self.blocks.push(block);
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let current = self.current.get_or_insert_with(|| OpenBlock {
            block: Block {
                kind: BlockKind::Paragraph,
                align: Align::Left,
                runs: Vec::new(),
            },
            explicit: false,
        });
        let (bold, italic) = (self.bold > 0, self.italic > 0);
        let runs = &mut current.block.runs;
        let after_space = runs
            .last()
            .map(|r| r.text.is_empty() || r.text.ends_with(' ') || r.text.ends_with('\n'))
            .unwrap_or(true);
        let text = if after_space { text.trim_start_matches(' ') } else { text };
        if text.is_empty() {
            return;
        }
        match runs.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(text),
            _ => runs.push(Run {
                text: text.to_string(),
                bold,
                italic,
            }),
        }
    }

    fn line_break(&mut self) {
        // a break must survive whitespace trimming, so push it raw
        let current = self.current.get_or_insert_with(|| OpenBlock {
            block: Block {
                kind: BlockKind::Paragraph,
                align: Align::Left,
                runs: Vec::new(),
            },
            explicit: true,
        });
        let runs = &mut current.block.runs;
        if let Some(last) = runs.last_mut() {
            let trimmed = last.text.trim_end_matches(' ').len();
            last.text.truncate(trimmed);
        }
        if runs.iter().all(|r| r.text.is_empty()) {
            // `<p><br></p>` is an editor's blank line, not a break
            return;
        }
        runs.push(Run {
            text: "\n".to_string(),
            ..Run::default()
        });
    }

    fn tag(&mut self, closing: bool, name: &str, attrs: &str) {
        match (closing, name) {
            (false, "b" | "strong") => self.bold += 1,
            (true, "b" | "strong") => self.bold = self.bold.saturating_sub(1),
            (false, "i" | "em") => self.italic += 1,
            (true, "i" | "em") => self.italic = self.italic.saturating_sub(1),
            (false, "br") => self.line_break(),
            (false, "ul") => {
                self.flush();
                self.lists.push((false, 0));
            }
            (false, "ol") => {
                self.flush();
                self.lists.push((true, 0));
            }
            (true, "ul" | "ol") => {
                self.flush();
                self.lists.pop();
            }
            (false, "li") => {
                let number = match self.lists.last_mut() {
                    Some((true, counter)) => {
                        *counter += 1;
                        Some(*counter)
                    }
                    _ => None,
                };
                self.open(BlockKind::ListItem(number), parse_align(attrs));
            }
            (false, "h1" | "h2" | "h3" | "h4" | "h5" | "h6") => {
                let level = name[1..].parse::<u8>().unwrap_or(1);
                self.open(BlockKind::Heading(level), parse_align(attrs));
            }
            (false, "p" | "div" | "blockquote" | "pre" | "tr") => {
                self.open(BlockKind::Paragraph, parse_align(attrs));
            }
            (
                true,
                "p" | "div" | "blockquote" | "pre" | "tr" | "li" | "h1" | "h2" | "h3" | "h4"
                | "h5" | "h6",
            ) => self.flush(),
            (false, "td" | "th") => self.push_text(" "),
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn walk(builder: &mut Builder, handle: &Handle) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                walk(builder, child);
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            if matches!(tag, "head" | "style" | "script" | "template") {
                return;
            }
            // alignment may sit in `class` or `style`
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| &*attr.value)
                .collect::<Vec<_>>()
                .join(" ");
            builder.tag(false, tag, &attrs);
            for child in handle.children.borrow().iter() {
                walk(builder, child);
            }
            builder.tag(true, tag, "");
        }
        NodeData::Text { contents } => {
            builder.push_text(&collapse_whitespace(&contents.borrow()));
        }
        _ => {}
    }
}

/// Parses filled template HTML into blocks.
pub fn parse_html(html: &str) -> Vec<Block> {
    let dom = parse_document(RcDom::default(), Default::default()).one(html);
    let mut builder = Builder::default();
    walk(&mut builder, &dom.document);
    builder.flush();
    builder.blocks
}

/// Renders blocks back to simple HTML for in-browser preview.
pub fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut open_list: Option<bool> = None;
    for block in blocks {
        let list = match block.kind {
            BlockKind::ListItem(n) => Some(n.is_some()),
            _ => None,
        };
        if open_list != list {
            if let Some(ordered) = open_list {
                out.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            if let Some(ordered) = list {
                out.push_str(if ordered { "<ol>" } else { "<ul>" });
            }
            open_list = list;
        }
        let tag = match block.kind {
            BlockKind::Paragraph => "p".to_string(),
            BlockKind::Heading(level) => format!("h{}", level.clamp(1, 6)),
            BlockKind::ListItem(_) => "li".to_string(),
        };
        let class = match block.align {
            Align::Left => "",
            Align::Center => r#" class="ql-align-center""#,
            Align::Right => r#" class="ql-align-right""#,
            Align::Justify => r#" class="ql-align-justify""#,
        };
        out.push_str(&format!("<{}{}>", tag, class));
        for run in &block.runs {
            let mut text = escape_html(&run.text).replace('\n', "<br>");
            if run.italic {
                text = format!("<em>{}</em>", text);
            }
            if run.bold {
                text = format!("<strong>{}</strong>", text);
            }
            out.push_str(&text);
        }
        out.push_str(&format!("</{}>", tag));
    }
    if let Some(ordered) = open_list {
        out.push_str(if ordered { "</ol>" } else { "</ul>" });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(blocks: &[Block]) -> Vec<String> {
        blocks.iter().map(Block::plain_text).collect()
    }

    #[test]
    fn test_parse_paragraphs_and_styles() {
        let blocks = parse_html(
            "<p>Olá <strong>Ana</strong>,</p>\n<p class=\"ql-align-right\"><em>São Paulo</em></p>",
        );
        assert_eq!(texts(&blocks), vec!["Olá Ana,", "São Paulo"]);
        assert_eq!(
            blocks[0].runs,
            vec![
                Run { text: "Olá ".into(), bold: false, italic: false },
                Run { text: "Ana".into(), bold: true, italic: false },
                Run { text: ",".into(), bold: false, italic: false },
            ]
        );
        assert_eq!(blocks[1].align, Align::Right);
        assert!(blocks[1].runs[0].italic);
    }

    #[test]
    fn test_parse_headings_lists_and_breaks() {
        let html = "<h2 style=\"text-align: center\">Cláusula 1</h2>\
                    <ol><li>um</li><li>dois</li></ol><ul><li>item</li></ul>\
                    <p>linha 1<br>linha 2</p><p><br></p>";
        let blocks = parse_html(html);
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Heading(2),
                BlockKind::ListItem(Some(1)),
                BlockKind::ListItem(Some(2)),
                BlockKind::ListItem(None),
                BlockKind::Paragraph,
                BlockKind::Paragraph,
            ]
        );
        assert_eq!(blocks[0].align, Align::Center);
        assert_eq!(blocks[4].plain_text(), "linha 1\nlinha 2");
        assert!(blocks[5].is_empty());
        assert_eq!(blocks[2].marker().as_deref(), Some("2. "));
    }

    #[test]
    fn test_parse_decodes_entities_and_skips_styles() {
        let html = "<style>.x{color:red}</style>A &amp; B&nbsp;&#233;&#x41; &unknown;";
        let blocks = parse_html(html);
        assert_eq!(texts(&blocks), vec!["A & B\u{a0}éA &unknown;"]);
    }

    #[test]
    fn test_parse_decodes_named_entities() {
        let blocks = parse_html(
            "<p>Procura&ccedil;&atilde;o n&ordm; 1 &sect; 2 &ndash; Ana</p>",
        );
        assert_eq!(texts(&blocks), vec!["Procuração nº 1 § 2 – Ana"]);
    }

    #[test]
    fn test_parse_attribute_with_angle_bracket() {
        let blocks = parse_html(r#"<p title="a > b" class="ql-align-center">texto</p>"#);
        assert_eq!(texts(&blocks), vec!["texto"]);
        assert_eq!(blocks[0].align, Align::Center);
    }

    #[test]
    fn test_to_html_round_trip_shape() {
        let blocks = parse_html("<h1>T</h1><ul><li>a &lt; b</li></ul><p>x<br>y</p>");
        assert_eq!(
            to_html(&blocks),
            "<h1>T</h1><ul><li>a &lt; b</li></ul><p>x<br>y</p>"
        );
    }
}
