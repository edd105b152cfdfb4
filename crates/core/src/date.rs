use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_day_first, r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})$");
re!(re_year_first, r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$");
re!(re_numeric, r"^\d+(?:\.\d+)?$");

/// Base of the Excel serial calendar. Serial 1 is 1899-12-31, with the
/// off-by-two base absorbing Excel's phantom 1900-02-29.
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serials outside this window are treated as plain numbers, not dates.
pub const SERIAL_SNIFF_MIN: f64 = 40_000.0;
pub const SERIAL_SNIFF_MAX: f64 = 50_000.0;

/// Normalize one heterogeneous date token to a calendar date.
///
/// Formats are tried in a fixed order; the first branch that yields a valid
/// calendar date wins, and a token no branch accepts is `None` so the caller
/// can drop the record.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Some(d) = try_day_first(text) {
        return Some(d);
    }
    if let Some(d) = try_year_first(text) {
        return Some(d);
    }
    if let Some(d) = try_serial(text) {
        return Some(d);
    }
    try_known_formats(text)
}

/// Map an Excel serial (days since the 1899-12-30 base) to a date.
/// Fractional day parts (time of day) are floored away.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial <= 0.0 {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    let base = NaiveDate::from_ymd_opt(y, m, d)?;
    base.checked_add_signed(Duration::days(serial.floor() as i64))
}

/// Spanish month name (full, lowercase or not) to month number.
pub fn spanish_month(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "enero" => Some(1),
        "febrero" => Some(2),
        "marzo" => Some(3),
        "abril" => Some(4),
        "mayo" => Some(5),
        "junio" => Some(6),
        "julio" => Some(7),
        "agosto" => Some(8),
        "septiembre" | "setiembre" => Some(9),
        "octubre" => Some(10),
        "noviembre" => Some(11),
        "diciembre" => Some(12),
        _ => None,
    }
}

// ── Chain branches ────────────────────────────────────────────────────────────

fn try_day_first(text: &str) -> Option<NaiveDate> {
    let c = re_day_first().captures(text)?;
    let day: u32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let year = expand_year(c.get(3)?.as_str().parse().ok()?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_year_first(text: &str) -> Option<NaiveDate> {
    let c = re_year_first().captures(text)?;
    let year: i32 = c.get(1)?.as_str().parse().ok()?;
    let month: u32 = c.get(2)?.as_str().parse().ok()?;
    let day: u32 = c.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn try_serial(text: &str) -> Option<NaiveDate> {
    if !re_numeric().is_match(text) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    // Small numbers show up as ids and quantities far more often than as
    // pre-1903 dates; only large serials are taken at face value.
    if value <= 1000.0 {
        return None;
    }
    from_excel_serial(value)
}

fn try_known_formats(text: &str) -> Option<NaiveDate> {
    for fmt in &["%d.%m.%Y", "%Y.%m.%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(text, fmt) {
            return Some(d);
        }
    }
    None
}

fn expand_year(y: i32) -> i32 {
    if y < 100 {
        2000 + y
    } else {
        y
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
