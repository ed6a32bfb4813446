use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while validating field configuration at template-save time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field type '{0}'")]
    UnknownType(String),

    #[error("invalid field key '{0}': only letters, digits and '_' are allowed")]
    InvalidKey(String),

    #[error("duplicate field key '{0}'")]
    DuplicateKey(String),
}

/// The closed set of input types a placeholder can declare.
///
/// Unknown tags are rejected when a template is saved, so render code never has
/// to deal with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Text,
    Date,
    Number,
    Monetary,
    Cpf,
    Cnpj,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Text,
        FieldType::Date,
        FieldType::Number,
        FieldType::Monetary,
        FieldType::Cpf,
        FieldType::Cnpj,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::Number => "number",
            FieldType::Monetary => "monetary",
            FieldType::Cpf => "cpf",
            FieldType::Cnpj => "cnpj",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| FieldError::UnknownType(s.to_string()))
    }
}

/// Metadata for one fillable `{key}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Matches the token name in the template body. Never changes once created.
    pub key: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl FieldDefinition {
    /// The definition created automatically for a key first seen in markup.
    pub fn with_defaults(key: impl Into<String>) -> Self {
        let key = key.into();
        FieldDefinition {
            label: key.clone(),
            key,
            field_type: FieldType::Text,
            required: true,
        }
    }
}

/// True when `key` follows the placeholder grammar `[A-Za-z0-9_]+`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Checks author-supplied definitions before they are persisted.
pub fn validate_fields(fields: &[FieldDefinition]) -> Result<(), FieldError> {
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        if !is_valid_key(&field.key) {
            return Err(FieldError::InvalidKey(field.key.clone()));
        }
        if !seen.insert(field.key.as_str()) {
            return Err(FieldError::DuplicateKey(field.key.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_round_trips_through_str() {
        for t in FieldType::ALL {
            assert_eq!(t.as_str().parse::<FieldType>(), Ok(t));
        }
    }

    #[test]
    fn test_unknown_field_type_is_rejected() {
        assert_eq!(
            "currency".parse::<FieldType>(),
            Err(FieldError::UnknownType("currency".to_string()))
        );
    }

    #[test]
    fn test_field_definition_json_uses_type_tag() {
        let field: FieldDefinition =
            serde_json::from_str(r#"{"key":"valor","label":"Valor","type":"monetary"}"#).unwrap();
        assert_eq!(field.field_type, FieldType::Monetary);
        assert!(field.required);

        let bad = serde_json::from_str::<FieldDefinition>(
            r#"{"key":"valor","label":"Valor","type":"money"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_fields() {
        let ok = vec![
            FieldDefinition::with_defaults("nome"),
            FieldDefinition::with_defaults("cpf_1"),
        ];
        assert_eq!(validate_fields(&ok), Ok(()));

        let dup = vec![
            FieldDefinition::with_defaults("nome"),
            FieldDefinition::with_defaults("nome"),
        ];
        assert_eq!(
            validate_fields(&dup),
            Err(FieldError::DuplicateKey("nome".to_string()))
        );

        let bad = vec![FieldDefinition::with_defaults("nome completo")];
        assert_eq!(
            validate_fields(&bad),
            Err(FieldError::InvalidKey("nome completo".to_string()))
        );
    }
}
