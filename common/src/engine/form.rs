use crate::engine::format::{format_with, FormatPolicy};
use crate::model::document::DataMapping;
use crate::model::field::FieldDefinition;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}

/// Turns raw fill-in form input into the data mapping stored on a document.
///
/// Required fields are checked first and every missing key is reported at once.
/// Keys not declared in `fields` are ignored. Optional fields left blank are
/// omitted, so they render as empty strings.
pub fn fill_form(
    fields: &[FieldDefinition],
    raw: &HashMap<String, String>,
    policy: FormatPolicy,
) -> Result<DataMapping, FormError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required)
        .filter(|f| raw.get(&f.key).is_none_or(|v| v.trim().is_empty()))
        .map(|f| f.key.clone())
        .collect();
    if !missing.is_empty() {
        return Err(FormError::MissingRequired(missing));
    }

    let mut data = DataMapping::new();
    for field in fields {
        let Some(value) = raw.get(&field.key) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        data.insert(field.key.clone(), format_with(field.field_type, value, policy));
    }
    Ok(data)
}
