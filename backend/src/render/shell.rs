use crate::render::blocks::escape_html;

/// Filled content laid out on an A4 page, optionally under a watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageShell {
    pub title: String,
    pub content_html: String,
    pub watermark: Option<String>,
}

impl PageShell {
    pub fn new(title: impl Into<String>, content_html: impl Into<String>) -> Self {
        PageShell {
            title: title.into(),
            content_html: content_html.into(),
            watermark: None,
        }
    }

    pub fn with_watermark(mut self, text: impl Into<String>) -> Self {
        self.watermark = Some(text.into());
        self
    }

    /// The standalone HTML document handed to a browser-style renderer.
    ///
    /// The watermark layer is fixed to the page centre, rotated and drawn above
    /// the content (`z-index` 9999 over 1).
    pub fn to_html(&self) -> String {
        let watermark = match &self.watermark {
            Some(text) => format!(r#"<div class="watermark">{}</div>"#, escape_html(text)),
            None => String::new(),
        };
        format!(
            r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
      @page {{ size: A4; margin: 20mm; }}
      body {{
        font-family: Arial, Helvetica, sans-serif;
        margin: 0;
        padding: 0;
        position: relative;
      }}
      .watermark {{
        position: fixed;
        top: 50%;
        left: 50%;
        transform: translate(-50%, -50%) rotate(-45deg);
        font-size: 6rem;
        font-weight: bold;
        color: rgba(0, 0, 0, 0.08);
        white-space: nowrap;
        pointer-events: none;
        user-select: none;
        z-index: 9999;
      }}
      .content {{ position: relative; z-index: 1; }}
      .ql-align-center {{ text-align: center; }}
      .ql-align-right {{ text-align: right; }}
      .ql-align-justify {{ text-align: justify; }}
    </style>
  </head>
  <body>
    {watermark}
    <div class="content">
      {content}
    </div>
  </body>
</html>
"#,
            title = escape_html(&self.title),
            watermark = watermark,
            content = self.content_html,
        )
    }
}
