use crate::engine::placeholder::PLACEHOLDER_RE;
use crate::model::document::DataMapping;
use regex::Captures;

/// Replaces every `{key}` token in `html` with its value from `data`.
///
/// Absent keys become the empty string. Values are inserted as-is, without HTML
/// escaping; they come from formatted form input and the template author's own
/// markup decides how they are presented. Everything that is not a token is
/// copied unchanged.
pub fn render(html: &str, data: &DataMapping) -> String {
    PLACEHOLDER_RE
        .replace_all(html, |caps: &Captures| {
            data.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}
