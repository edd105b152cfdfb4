use rust_decimal::Decimal;
use std::str::FromStr;

use crate::transaction::TransactionKind;

const CURRENCY_SYMBOLS: &[char] = &['€', '$', '£', '¥'];

/// Checked before the expense list; first list with a hit decides.
const INCOME_KEYWORDS: &[&str] = &[
    "ingreso",
    "salario",
    "deposito",
    "depósito",
    "abono",
    "nomina",
    "nómina",
    "transferencia recibida",
];

const EXPENSE_KEYWORDS: &[&str] = &[
    "pago",
    "compra",
    "cargo",
    "retiro",
    "transferencia enviada",
];

/// Parse a monetary token into a signed decimal.
///
/// Currency symbols and whitespace are stripped. When both `,` and `.`
/// appear, the rightmost one is the decimal separator; a lone `,` is a
/// decimal separator, repeated separators are thousands grouping.
/// Accounting parentheses mean negative. Unparseable input is `None`,
/// never zero.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    let (parenthesized, text) = if text.starts_with('(') && text.ends_with(')') && text.len() > 2 {
        (true, &text[1..text.len() - 1])
    } else {
        (false, text)
    };

    let mut cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if let Some(rest) = cleaned.strip_prefix('+') {
        cleaned = rest.to_string();
    }
    if cleaned.is_empty() {
        return None;
    }

    let normalized = normalize_separators(&cleaned);
    let mut value = Decimal::from_str(&normalized).ok()?;
    if parenthesized {
        value = -value;
    }
    Some(value)
}

/// Infer direction from contextual keywords, falling back to the numeric
/// sign of the source amount. This is the single place sign is consulted.
pub fn infer_kind(text: &str, amount: Decimal) -> TransactionKind {
    let haystack = text.to_lowercase();
    if INCOME_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return TransactionKind::Income;
    }
    if EXPENSE_KEYWORDS.iter().any(|k| haystack.contains(k)) {
        return TransactionKind::Expense;
    }
    if amount.is_sign_negative() {
        TransactionKind::Expense
    } else {
        TransactionKind::Income
    }
}

fn normalize_separators(s: &str) -> String {
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();
    match (commas, dots) {
        (c, d) if c >= 1 && d >= 1 => {
            let comma_pos = s.rfind(',');
            let dot_pos = s.rfind('.');
            if comma_pos > dot_pos {
                // European: dots group thousands, comma is the decimal mark.
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (1, 0) => s.replace(',', "."),
        (c, 0) if c > 1 => s.replace(',', ""),
        (0, d) if d > 1 => s.replace('.', ""),
        _ => s.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── separator disambiguation ──────────────────────────────────────────────

    #[test]
    fn european_thousands_and_decimal() {
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
    }

    #[test]
    fn us_thousands_and_decimal() {
        assert_eq!(parse_amount("1,234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn lone_comma_is_decimal() {
        assert_eq!(parse_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("45,30"), Some(dec("45.30")));
    }

    #[test]
    fn lone_dot_is_decimal() {
        assert_eq!(parse_amount("1234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn repeated_separators_are_grouping() {
        assert_eq!(parse_amount("1,234,567"), Some(dec("1234567")));
        assert_eq!(parse_amount("1.234.567"), Some(dec("1234567")));
        assert_eq!(parse_amount("1.234.567,89"), Some(dec("1234567.89")));
    }

    #[test]
    fn no_separator_parses_as_is() {
        assert_eq!(parse_amount("100"), Some(dec("100")));
        assert_eq!(parse_amount("0"), Some(dec("0")));
    }

    // ── symbols, signs, parens ────────────────────────────────────────────────

    #[test]
    fn currency_symbols_are_stripped() {
        assert_eq!(parse_amount("€1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("$100.00"), Some(dec("100.00")));
        assert_eq!(parse_amount("-45,30 €"), Some(dec("-45.30")));
        assert_eq!(parse_amount("£ 9.99"), Some(dec("9.99")));
    }

    #[test]
    fn explicit_plus_sign_is_dropped() {
        assert_eq!(parse_amount("+250,00"), Some(dec("250.00")));
    }

    #[test]
    fn accounting_parens_negate() {
        assert_eq!(parse_amount("(75.25)"), Some(dec("-75.25")));
        assert_eq!(parse_amount("($75.25)"), Some(dec("-75.25")));
    }

    #[test]
    fn unparseable_is_none_not_zero() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("€"), None);
        assert_eq!(parse_amount("()"), None);
        assert_eq!(parse_amount("12,34,56.78.90"), None);
    }

    // ── direction inference ───────────────────────────────────────────────────

    #[test]
    fn income_keywords_win() {
        assert_eq!(infer_kind("Nomina empresa", dec("1500")), TransactionKind::Income);
        assert_eq!(infer_kind("ABONO EN CUENTA", dec("-10")), TransactionKind::Income);
        assert_eq!(
            infer_kind("Transferencia recibida de Ana", dec("-10")),
            TransactionKind::Income
        );
    }

    #[test]
    fn expense_keywords_checked_second() {
        assert_eq!(infer_kind("Pago recibo luz", dec("20")), TransactionKind::Expense);
        assert_eq!(infer_kind("COMPRA TARJETA", dec("20")), TransactionKind::Expense);
    }

    #[test]
    fn income_list_beats_expense_list() {
        // Both lists match; the income pass runs first.
        assert_eq!(infer_kind("Pago nomina marzo", dec("-1500")), TransactionKind::Income);
    }

    #[test]
    fn sign_is_the_fallback() {
        assert_eq!(infer_kind("sin pistas", dec("-5")), TransactionKind::Expense);
        assert_eq!(infer_kind("sin pistas", dec("5")), TransactionKind::Income);
        assert_eq!(infer_kind("sin pistas", dec("0")), TransactionKind::Income);
    }
}
