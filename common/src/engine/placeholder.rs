//! Placeholder discovery and field reconciliation.
//!
//! The token grammar is `{` + `[A-Za-z0-9_]+` + `}`. There is no nesting and no
//! escape; a brace that does not open a well-formed token is plain text.

use crate::model::field::FieldDefinition;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

pub const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z0-9_]+)\}";

pub(crate) static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("placeholder pattern is valid"));

/// Returns every distinct key in `html`, ordered by first occurrence.
pub fn extract(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    PLACEHOLDER_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|key| seen.insert(*key))
        .map(str::to_string)
        .collect()
}

/// A token occurrence: byte range in the scanned text and the key it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub start: usize,
    pub end: usize,
    pub key: &'a str,
}

/// Every token occurrence in `text`, in order, duplicates included.
pub fn tokens(text: &str) -> Vec<Token<'_>> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let key = caps.get(1)?;
            Some(Token {
                start: whole.start(),
                end: whole.end(),
                key: key.as_str(),
            })
        })
        .collect()
}

/// Appends a default definition for every extracted key the field list lacks.
///
/// Existing definitions are kept untouched and in place, including those whose
/// token no longer appears in the markup; removing them is an explicit author
/// action.
pub fn reconcile(existing: &[FieldDefinition], extracted: &[String]) -> Vec<FieldDefinition> {
    let mut fields = existing.to_vec();
    let mut known: HashSet<String> = existing.iter().map(|f| f.key.clone()).collect();
    for key in extracted {
        if known.insert(key.clone()) {
            fields.push(FieldDefinition::with_defaults(key.clone()));
        }
    }
    fields
}

/// Keys configured on the template that no longer appear in the markup.
pub fn orphaned<'a>(fields: &'a [FieldDefinition], extracted: &[String]) -> Vec<&'a str> {
    let present: HashSet<&str> = extracted.iter().map(String::as_str).collect();
    fields
        .iter()
        .map(|f| f.key.as_str())
        .filter(|k| !present.contains(k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::field::FieldType;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_dedups_in_first_occurrence_order() {
        let html = "<p>{b} and {a}</p><p>{b}{c_1}</p>";
        assert_eq!(extract(html), vec!["b", "a", "c_1"]);
    }

    #[test]
    fn test_extract_ignores_malformed_braces() {
        let html = "{ spaced } {} {a-b} {{x}} {ok} {unterminated";
        assert_eq!(extract(html), vec!["x", "ok"]);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let html = "<b>{nome}</b> {valor} {nome}";
        assert_eq!(extract(html), extract(html));
        assert!(extract("<p>sem chaves</p>").is_empty());
    }

    #[test]
    fn test_tokens_reports_byte_ranges() {
        let found = tokens("é {a} {a}");
        assert_eq!(
            found,
            vec![
                Token { start: 3, end: 6, key: "a" },
                Token { start: 7, end: 10, key: "a" },
            ]
        );
    }

    #[test]
    fn test_reconcile_adds_new_keys_with_defaults() {
        let existing = vec![FieldDefinition {
            key: "a".to_string(),
            label: "Campo A".to_string(),
            field_type: FieldType::Date,
            required: false,
        }];
        let fields = reconcile(&existing, &["a".to_string(), "b".to_string()]);
        assert_eq!(
            fields,
            vec![
                existing[0].clone(),
                FieldDefinition {
                    key: "b".to_string(),
                    label: "b".to_string(),
                    field_type: FieldType::Text,
                    required: true,
                },
            ]
        );
    }

    #[test]
    fn test_reconcile_never_drops_configured_fields() {
        let existing = vec![
            FieldDefinition::with_defaults("old"),
            FieldDefinition::with_defaults("kept"),
        ];
        let extracted = vec!["kept".to_string()];
        let fields = reconcile(&existing, &extracted);
        assert_eq!(fields, existing);
        assert_eq!(orphaned(&fields, &extracted), vec!["old"]);
    }
}
