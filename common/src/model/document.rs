use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder key to display-formatted value. Values are inserted verbatim.
pub type DataMapping = BTreeMap<String, String>;

/// Payment state of a document. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Paid,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(DocumentStatus::Draft),
            "paid" => Ok(DocumentStatus::Paid),
            other => Err(format!("unknown document status '{}'", other)),
        }
    }
}

/// Outcome of applying a payment approval to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    /// `draft -> paid` happened now.
    Applied,
    /// The document was already paid; nothing changed.
    AlreadyPaid,
}

/// One user's filled instance of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub template_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub data: DataMapping,
    pub status: DocumentStatus,
    #[serde(default)]
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new_draft(
        id: String,
        template_id: String,
        user_id: Option<String>,
        data: DataMapping,
        created_at: DateTime<Utc>,
    ) -> Self {
        Document {
            id,
            template_id,
            user_id,
            data,
            status: DocumentStatus::Draft,
            payment_ref: None,
            created_at,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == DocumentStatus::Paid
    }

    /// Moves the document to `Paid`. Re-applying keeps the first payment reference.
    pub fn mark_paid(&mut self, payment_ref: &str) -> PaymentTransition {
        match self.status {
            DocumentStatus::Paid => PaymentTransition::AlreadyPaid,
            DocumentStatus::Draft => {
                self.status = DocumentStatus::Paid;
                self.payment_ref = Some(payment_ref.to_string());
                PaymentTransition::Applied
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn draft() -> Document {
        Document::new_draft(
            "d1".to_string(),
            "t1".to_string(),
            None,
            DataMapping::new(),
            DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        )
    }

    #[test]
    fn test_mark_paid_is_idempotent() {
        let mut doc = draft();
        assert_eq!(doc.mark_paid("pay-1"), PaymentTransition::Applied);
        let after_first = doc.clone();
        assert_eq!(doc.mark_paid("pay-1"), PaymentTransition::AlreadyPaid);
        assert_eq!(doc, after_first);
    }

    #[test]
    fn test_mark_paid_keeps_first_reference() {
        let mut doc = draft();
        doc.mark_paid("pay-1");
        doc.mark_paid("pay-2");
        assert_eq!(doc.payment_ref.as_deref(), Some("pay-1"));
        assert!(doc.is_paid());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("paid".parse::<DocumentStatus>(), Ok(DocumentStatus::Paid));
        assert!("refunded".parse::<DocumentStatus>().is_err());
    }
}
