//! Field type formatting.
//!
//! Converts the raw string a user typed (or a date picker produced) into the
//! display string stored in a document's data mapping. Every function here is
//! total: malformed input degrades to an empty string instead of an error,
//! because required-field checks happen before formatting.

use crate::model::field::FieldType;
use chrono::{DateTime, NaiveDate};
use num_format::{CustomFormat, Grouping, ToFormattedString};

/// Digits beyond this are ignored by the monetary masks, the same way a live
/// masked input stops accepting keystrokes.
pub const MAX_MONEY_DIGITS: usize = 15;

const CPF_PATTERN: &str = "###.###.###-##";
const CNPJ_PATTERN: &str = "##.###.###/####-##";

/// How monetary values are rendered into the stored mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonetaryStyle {
    /// `1234,56`, the live-typing mask of the fill-in form.
    #[default]
    Masked,
    /// `R$ 1.234,56`.
    Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatPolicy {
    pub monetary: MonetaryStyle,
}

/// Formats `raw` for `field_type` with the default policy.
pub fn format(field_type: FieldType, raw: &str) -> String {
    format_with(field_type, raw, FormatPolicy::default())
}

pub fn format_with(field_type: FieldType, raw: &str, policy: FormatPolicy) -> String {
    match field_type {
        FieldType::Text => raw.trim().to_string(),
        FieldType::Date => format_date(raw),
        FieldType::Number => format_number(raw),
        FieldType::Monetary => match policy.monetary {
            MonetaryStyle::Masked => mask_monetary(raw),
            MonetaryStyle::Currency => format_currency(raw),
        },
        FieldType::Cpf => format_cpf(raw),
        FieldType::Cnpj => format_cnpj(raw),
    }
}

/// Splits a digit stream into whole reais and centavos.
fn cents_parts(raw: &str) -> Option<(u64, u64)> {
    let digits: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(MAX_MONEY_DIGITS)
        .collect();
    if digits.is_empty() {
        return None;
    }
    let cents: u64 = digits.parse().ok()?;
    Some((cents / 100, cents % 100))
}

/// Live-typing mask: every digit shifts left, the last two are centavos.
///
/// `"150"` becomes `"1,50"`, `"5"` becomes `"0,05"`.
pub fn mask_monetary(raw: &str) -> String {
    match cents_parts(raw) {
        Some((reais, cents)) => format!("{},{:02}", reais, cents),
        None => String::new(),
    }
}

/// Brazilian currency display: `"123456"` becomes `"R$ 1.234,56"`.
pub fn format_currency(raw: &str) -> String {
    let Some((reais, cents)) = cents_parts(raw) else {
        return String::new();
    };
    let grouped = match CustomFormat::builder()
        .grouping(Grouping::Standard)
        .separator(".")
        .build()
    {
        Ok(fmt) => reais.to_formatted_string(&fmt),
        Err(_) => reais.to_string(),
    };
    format!("R$ {},{:02}", grouped, cents)
}

/// `DD/MM/YYYY` from a date-input value, an RFC 3339 timestamp, or an
/// already formatted date.
pub fn format_date(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok());
    match date {
        Some(d) => d.format("%d/%m/%Y").to_string(),
        None => String::new(),
    }
}

/// Plain numeric representation without grouping. Accepts `,` as decimal mark.
pub fn format_number(raw: &str) -> String {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return String::new();
    }
    if let Ok(n) = normalized.parse::<i64>() {
        return n.to_string();
    }
    match normalized.parse::<f64>() {
        Ok(n) if n.is_finite() => n.to_string(),
        _ => String::new(),
    }
}

pub fn format_cpf(raw: &str) -> String {
    apply_digit_pattern(raw, CPF_PATTERN)
}

pub fn format_cnpj(raw: &str) -> String {
    apply_digit_pattern(raw, CNPJ_PATTERN)
}

/// Fills `#` slots of `pattern` with the digits of `raw`, stopping when the
/// digits run out so partial input masks progressively.
fn apply_digit_pattern(raw: &str, pattern: &str) -> String {
    let mut digits = raw.chars().filter(char::is_ascii_digit).peekable();
    let mut out = String::with_capacity(pattern.len());
    for slot in pattern.chars() {
        if digits.peek().is_none() {
            break;
        }
        if slot == '#' {
            if let Some(d) = digits.next() {
                out.push(d);
            }
        } else {
            out.push(slot);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mask_monetary() {
        assert_eq!(mask_monetary("150"), "1,50");
        assert_eq!(mask_monetary("5"), "0,05");
        assert_eq!(mask_monetary(""), "");
        assert_eq!(mask_monetary("R$ 1.234,56"), "1234,56");
        assert_eq!(mask_monetary("0007"), "0,07");
        assert_eq!(mask_monetary("abc"), "");
    }

    #[test]
    fn test_mask_monetary_caps_digits() {
        let long = "9".repeat(MAX_MONEY_DIGITS + 5);
        assert_eq!(mask_monetary(&long), format!("{},99", "9".repeat(MAX_MONEY_DIGITS - 2)));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency("123456"), "R$ 1.234,56");
        assert_eq!(format_currency("5"), "R$ 0,05");
        assert_eq!(format_currency("100000000"), "R$ 1.000.000,00");
        assert_eq!(format_currency(""), "");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-03-15"), "15/03/2024");
        assert_eq!(format_date("2024-03-15T10:00:00Z"), "15/03/2024");
        assert_eq!(format_date("15/03/2024"), "15/03/2024");
        assert_eq!(format_date("2024-02-30"), "");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("42"), "42");
        assert_eq!(format_number(" 1,5 "), "1.5");
        assert_eq!(format_number("1000000"), "1000000");
        assert_eq!(format_number("dez"), "");
    }

    #[test]
    fn test_format_cpf_and_cnpj() {
        assert_eq!(format_cpf("12345678901"), "123.456.789-01");
        assert_eq!(format_cpf("123.456.789-01"), "123.456.789-01");
        assert_eq!(format_cpf("1234"), "123.4");
        assert_eq!(format_cpf("123456789012345"), "123.456.789-01");
        assert_eq!(format_cnpj("12345678000195"), "12.345.678/0001-95");
        assert_eq!(format_cnpj(""), "");
    }

    #[test]
    fn test_format_dispatch() {
        assert_eq!(format(FieldType::Text, "  Ana  "), "Ana");
        assert_eq!(format(FieldType::Monetary, "150"), "1,50");
        let policy = FormatPolicy {
            monetary: MonetaryStyle::Currency,
        };
        assert_eq!(format_with(FieldType::Monetary, "150", policy), "R$ 1,50");
        assert_eq!(format_with(FieldType::Text, "150", policy), "150");
    }
}
