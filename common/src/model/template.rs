use crate::model::field::FieldDefinition;
use serde::{Deserialize, Serialize};

/// A catalog entry the user can buy a filled copy of.
///
/// A template carries either an HTML body with `{key}` tokens or a reference to
/// a binary `.docx` package stored elsewhere. When both are present the HTML
/// body is the canonical representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    /// Price in centavos.
    pub price_cents: i64,
    #[serde(default)]
    pub html_body: Option<String>,
    #[serde(default)]
    pub file_ref: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Which representation a template is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource<'a> {
    Html(&'a str),
    Binary(&'a str),
}

impl Template {
    /// Picks the render path from the populated fields. `None` means the
    /// template has neither a body nor a file yet.
    pub fn source(&self) -> Option<TemplateSource<'_>> {
        match (&self.html_body, &self.file_ref) {
            (Some(html), _) if !html.trim().is_empty() => Some(TemplateSource::Html(html)),
            (_, Some(file)) if !file.is_empty() => Some(TemplateSource::Binary(file)),
            _ => None,
        }
    }

    /// Price formatted as decimal reais, e.g. `49.90`, for payment providers.
    pub fn unit_price(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }

    /// Looks up the definition for a placeholder key.
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(html: Option<&str>, file: Option<&str>) -> Template {
        Template {
            id: "t1".to_string(),
            name: "Contrato".to_string(),
            description: None,
            category_id: None,
            subcategory_id: None,
            price_cents: 4990,
            html_body: html.map(str::to_string),
            file_ref: file.map(str::to_string),
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_source_prefers_html() {
        let t = template(Some("<p>{a}</p>"), Some("abc.docx"));
        assert_eq!(t.source(), Some(TemplateSource::Html("<p>{a}</p>")));
    }

    #[test]
    fn test_source_falls_back_to_binary() {
        let t = template(Some("   "), Some("abc.docx"));
        assert_eq!(t.source(), Some(TemplateSource::Binary("abc.docx")));
        assert_eq!(template(None, None).source(), None);
    }

    #[test]
    fn test_unit_price() {
        assert_eq!(template(None, None).unit_price(), 49.9);
    }
}
