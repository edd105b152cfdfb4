use std::ops::Range;
use std::sync::OnceLock;

use centimo_core::transaction::compact_description;
use centimo_core::{amount, date, ParsedTransaction, DESCRIPTION_PLACEHOLDER};
use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_dmy, r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})\b");
re!(re_date_ymd, r"\b(\d{4})[/-](\d{1,2})[/-](\d{1,2})\b");
re!(
    re_date_spanish,
    r"(?i)\b(\d{1,2})\s+(?:de\s+)?([a-záéíóú]+)\s+(?:de\s+)?(\d{4})\b"
);
re!(
    re_amount_symbol,
    r"[-+]?\s*[€$£¥]\s*\d+(?:[.,]\d{3})*(?:[.,]\d{1,2})?\b|[-+]?\d+(?:[.,]\d{3})*(?:[.,]\d{1,2})?\s*[€$£¥]"
);
re!(re_amount_plain, r"-?\d+(?:[.,]\d{3})*[.,]\d{1,2}\b");

re!(re_noise_transfer, r"(?i)^transferencia\s+(?:de|a)\s+");
re!(re_noise_prefix, r"(?i)^(?:compras?|pagos?|recibo)\b[\s:,-]*");
re!(re_noise_parens, r"\([^)]*\)");
re!(re_noise_card, r"(?i)[x*]{2,}\s*\d{2,4}");

/// Residual descriptions shorter than this get the placeholder label.
const MIN_DESCRIPTION_LEN: usize = 3;

type Span = Range<usize>;

type DateMatcher = fn(&str) -> Option<(Span, NaiveDate)>;
type AmountMatcher = fn(&str, &Span) -> Option<(Span, Decimal)>;

/// Tried strictly in order; the first matcher that produces a value ends
/// the chain.
const DATE_MATCHERS: &[DateMatcher] = &[
    match_day_first_date,
    match_year_first_date,
    match_spanish_date,
];

const AMOUNT_MATCHERS: &[AmountMatcher] = &[match_symbol_amount, match_plain_amount];

/// Scan a block of statement-like text line by line. A line contributes a
/// transaction only when both a date token and an amount token are found;
/// everything else is skipped without error.
pub fn extract_transactions(text: &str) -> Vec<ParsedTransaction> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ParsedTransaction> {
    let (date_span, date) = find_date(line)?;
    let (amount_span, signed) = find_amount(line, &date_span)?;

    // Keywords are read off the whole line, before any stripping.
    let kind = amount::infer_kind(line, signed);
    let residual = remove_spans(line, &[date_span, amount_span]);
    let description = clean_description(&residual);

    Some(ParsedTransaction::new(date, signed, description).with_kind(kind))
}

fn find_date(line: &str) -> Option<(Span, NaiveDate)> {
    DATE_MATCHERS.iter().find_map(|matcher| matcher(line))
}

fn find_amount(line: &str, date_span: &Span) -> Option<(Span, Decimal)> {
    AMOUNT_MATCHERS
        .iter()
        .find_map(|matcher| matcher(line, date_span))
}

// ── Date matchers ─────────────────────────────────────────────────────────────

fn match_day_first_date(line: &str) -> Option<(Span, NaiveDate)> {
    let m = re_date_dmy().find(line)?;
    let parsed = date::normalize_date(m.as_str())?;
    Some((m.range(), parsed))
}

fn match_year_first_date(line: &str) -> Option<(Span, NaiveDate)> {
    let m = re_date_ymd().find(line)?;
    let parsed = date::normalize_date(m.as_str())?;
    Some((m.range(), parsed))
}

fn match_spanish_date(line: &str) -> Option<(Span, NaiveDate)> {
    let c = re_date_spanish().captures(line)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month = date::spanish_month(c.get(2)?.as_str())?;
    let year: i32 = c.get(3)?.as_str().parse().ok()?;
    let parsed = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((c.get(0)?.range(), parsed))
}

// ── Amount matchers ───────────────────────────────────────────────────────────

fn match_symbol_amount(line: &str, date_span: &Span) -> Option<(Span, Decimal)> {
    first_parseable(re_amount_symbol(), line, date_span)
}

fn match_plain_amount(line: &str, date_span: &Span) -> Option<(Span, Decimal)> {
    first_parseable(re_amount_plain(), line, date_span)
}

fn first_parseable(re: &Regex, line: &str, date_span: &Span) -> Option<(Span, Decimal)> {
    re.find_iter(line)
        .filter(|m| !overlaps(&m.range(), date_span))
        .find_map(|m| amount::parse_amount(m.as_str()).map(|value| (m.range(), value)))
}

fn overlaps(a: &Span, b: &Span) -> bool {
    a.start < b.end && b.start < a.end
}

// ── Description ───────────────────────────────────────────────────────────────

/// Splice the matched token spans out of the line, leaving a single space
/// at each cut so surrounding words do not fuse.
fn remove_spans(line: &str, spans: &[Span]) -> String {
    let mut ordered: Vec<&Span> = spans.iter().collect();
    ordered.sort_by_key(|span| span.start);

    let mut out = String::with_capacity(line.len());
    let mut cursor = 0;
    for span in ordered {
        if span.start > cursor {
            out.push_str(&line[cursor..span.start]);
        }
        out.push(' ');
        cursor = cursor.max(span.end);
    }
    out.push_str(&line[cursor..]);
    out
}

fn clean_description(residual: &str) -> String {
    let mut text = residual.trim().to_string();
    text = re_noise_transfer().replace(&text, "").into_owned();
    text = re_noise_prefix().replace(&text, "").into_owned();
    text = re_noise_parens().replace_all(&text, " ").into_owned();
    text = re_noise_card().replace_all(&text, " ").into_owned();

    let compact = compact_description(&text);
    if compact.chars().count() < MIN_DESCRIPTION_LEN {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        compact
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
