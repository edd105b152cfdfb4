use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest description carried through the pipeline; anything beyond is cut.
pub const DESCRIPTION_MAX: usize = 200;

/// Substituted when a document yields no usable description text.
pub const DESCRIPTION_PLACEHOLDER: &str = "Imported transaction";

/// Direction of a movement from the account holder's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("Unknown transaction kind: '{other}'")),
        }
    }
}

/// One normalized movement extracted from an uploaded document.
///
/// `amount` is a magnitude; the sign of the source token is consumed exactly
/// once, by direction inference, and then discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ParsedTransaction {
    pub fn new(date: NaiveDate, amount: Decimal, description: String) -> Self {
        ParsedTransaction {
            date,
            amount: amount.abs(),
            description,
            kind: None,
            category: None,
        }
    }

    pub fn with_kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Collapse runs of whitespace and cut to [`DESCRIPTION_MAX`] characters.
/// Emptiness rules differ per extraction path, so the result may be empty.
pub fn compact_description(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len().min(DESCRIPTION_MAX));
    let mut chars = 0usize;
    for word in raw.split_whitespace() {
        if chars > 0 {
            out.push(' ');
            chars += 1;
        }
        for c in word.chars() {
            if chars >= DESCRIPTION_MAX {
                return out.trim_end().to_string();
            }
            out.push(c);
            chars += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── TransactionKind ───────────────────────────────────────────────────────

    #[test]
    fn kind_display_and_from_str_roundtrip() {
        assert_eq!(
            TransactionKind::from_str(&TransactionKind::Income.to_string()).unwrap(),
            TransactionKind::Income
        );
        assert_eq!(
            TransactionKind::from_str(&TransactionKind::Expense.to_string()).unwrap(),
            TransactionKind::Expense
        );
        assert!(TransactionKind::from_str("transfer").is_err());
    }

    // ── Serialization shape ───────────────────────────────────────────────────

    #[test]
    fn serializes_kind_under_type_key() {
        let tx = ParsedTransaction::new(
            date(2026, 3, 1),
            Decimal::from_str("45.30").unwrap(),
            "Mercadona".to_string(),
        )
        .with_kind(TransactionKind::Expense);
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["type"], "expense");
        assert_eq!(v["date"], "2026-03-01");
        assert!(v.get("kind").is_none());
        // Unset category is omitted, not null.
        assert!(v.get("category").is_none());
    }

    #[test]
    fn deserializes_type_key_back_into_kind() {
        let tx: ParsedTransaction = serde_json::from_str(
            r#"{"date":"2026-03-01","amount":"45.30","description":"Mercadona","type":"expense"}"#,
        )
        .unwrap();
        assert_eq!(tx.kind, Some(TransactionKind::Expense));
    }

    // ── Amount magnitude ──────────────────────────────────────────────────────

    #[test]
    fn new_stores_absolute_amount() {
        let tx = ParsedTransaction::new(
            date(2026, 3, 1),
            Decimal::from_str("-45.30").unwrap(),
            "x".to_string(),
        );
        assert_eq!(tx.amount, Decimal::from_str("45.30").unwrap());
    }

    // ── compact_description ──────────────────────────────────────────────────

    #[test]
    fn compact_collapses_whitespace() {
        assert_eq!(compact_description("  Pago   tarjeta \t visa "), "Pago tarjeta visa");
    }

    #[test]
    fn compact_cuts_at_two_hundred_chars() {
        let long = "palabra ".repeat(60);
        let out = compact_description(&long);
        assert!(out.chars().count() <= DESCRIPTION_MAX);
        assert!(!out.ends_with(' '));
    }

    #[test]
    fn compact_is_char_boundary_safe() {
        let long = "ñ".repeat(DESCRIPTION_MAX + 50);
        let out = compact_description(&long);
        assert_eq!(out.chars().count(), DESCRIPTION_MAX);
    }

    #[test]
    fn compact_of_blank_is_empty() {
        assert_eq!(compact_description("   \t "), "");
    }
}
