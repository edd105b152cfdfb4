use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use centimo_core::transaction::compact_description;
use centimo_core::{amount, date, ParsedTransaction, TransactionKind, DESCRIPTION_PLACEHOLDER};
use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;

use crate::error::ImportError;
use crate::report::{FileFormat, ImportReport, ParsingMethod};

/// Header synonyms, matched as lowercase substrings against row 0.
const DATE_HEADERS: &[&str] = &["fecha", "date", "dia", "día", "f. valor", "f.valor"];
const AMOUNT_HEADERS: &[&str] = &[
    "importe", "monto", "amount", "total", "cargo", "abono", "cantidad",
];
const DESCRIPTION_HEADERS: &[&str] = &[
    "descripcion",
    "descripción",
    "concepto",
    "detalle",
    "description",
];

/// Narrow cell union shared by the Excel and CSV paths.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    fn from_sheet(cell: &Data) -> Self {
        match cell {
            Data::String(s) => Self::from_text(s),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::from_text(s),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }

    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(trimmed.to_string())
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.parse().ok(),
            CellValue::Empty => None,
        }
    }

    /// Rendering used for the raw-grid diagnostics and description cells.
    /// Whole-valued floats print without a trailing `.0` the way sheet
    /// software shows them.
    fn render(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

/// Column roles for one grid. Row 0 is always the header row; data rows
/// start at row 1 whether the headers were recognized or sniffed around.
struct ColumnMap {
    date: usize,
    amount: usize,
    description: Vec<usize>,
    sniffed: bool,
}

enum CellClass {
    Date,
    Amount,
    Text,
}

/// Excel entry point: first worksheet of whatever workbook format the
/// bytes turn out to be.
pub fn parse_workbook(data: &[u8]) -> Result<ImportReport, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ImportError::Workbook("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::Workbook(e.to_string()))?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(CellValue::from_sheet).collect())
        .collect();

    build_report(grid, FileFormat::Excel)
}

/// CSV entry point. The field separator is guessed from the header line;
/// Spanish bank exports use `;` about as often as `,`.
pub fn parse_delimited(data: &[u8]) -> Result<ImportReport, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_delimiter(data))
        .from_reader(data);

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(CellValue::from_text).collect());
    }

    build_report(grid, FileFormat::Csv)
}

fn sniff_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|b| *b == b'\n').next().unwrap_or(data);
    let count = |delim: u8| header.iter().filter(|b| **b == delim).count();
    match [b';', b'\t', b'|'].into_iter().max_by_key(|d| count(*d)) {
        Some(d) if count(d) > count(b',') => d,
        _ => b',',
    }
}

fn build_report(grid: Vec<Vec<CellValue>>, format: FileFormat) -> Result<ImportReport, ImportError> {
    let columns = match grid.first().and_then(|row| detect_by_headers(row)) {
        Some(map) => map,
        None => sniff_columns(&grid).ok_or(ImportError::ColumnDetection)?,
    };

    let mut transactions = Vec::new();
    let mut skipped = 0usize;
    for row in grid.iter().skip(1) {
        if row.iter().all(CellValue::is_empty) {
            continue;
        }
        match read_row(row, &columns) {
            Some(tx) => transactions.push(tx),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(skipped, "dropped rows that failed date or amount normalization");
    }

    let raw = json!(grid
        .iter()
        .map(|row| row.iter().map(CellValue::render).collect::<Vec<_>>())
        .collect::<Vec<_>>());

    Ok(
        ImportReport::new(transactions, format, parsing_method(format, columns.sniffed))
            .with_raw_data(raw)
            .with_skipped_rows(skipped),
    )
}

fn parsing_method(format: FileFormat, sniffed: bool) -> ParsingMethod {
    match (format, sniffed) {
        (FileFormat::Excel, false) => ParsingMethod::XlsxHeaders,
        (FileFormat::Excel, true) => ParsingMethod::XlsxColumnSniffing,
        (_, false) => ParsingMethod::CsvHeaders,
        (_, true) => ParsingMethod::CsvColumnSniffing,
    }
}

// ── Column detection ─────────────────────────────────────────────────────────

/// Match row 0 against the synonym lists, scanning columns left to right.
/// Date and amount are mandatory; every description match is kept and
/// joined later.
fn detect_by_headers(header_row: &[CellValue]) -> Option<ColumnMap> {
    let names: Vec<Option<String>> = header_row
        .iter()
        .map(|cell| match cell {
            CellValue::Text(s) => Some(s.to_lowercase()),
            _ => None,
        })
        .collect();

    let find_role = |synonyms: &[&str], taken: &[usize]| -> Option<usize> {
        names.iter().enumerate().find_map(|(idx, name)| {
            let name = name.as_deref()?;
            if taken.contains(&idx) {
                return None;
            }
            synonyms.iter().any(|syn| name.contains(syn)).then_some(idx)
        })
    };

    let date = find_role(DATE_HEADERS, &[])?;
    let amount = find_role(AMOUNT_HEADERS, &[date])?;
    let description: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(idx, name)| {
            *idx != date
                && *idx != amount
                && name
                    .as_deref()
                    .is_some_and(|n| DESCRIPTION_HEADERS.iter().any(|syn| n.contains(syn)))
        })
        .map(|(idx, _)| idx)
        .collect();

    Some(ColumnMap {
        date,
        amount,
        description,
        sniffed: false,
    })
}

/// Classify the first non-empty data row cell by cell and take the first
/// date-shaped and first amount-shaped columns. Remaining text columns
/// become the description.
fn sniff_columns(grid: &[Vec<CellValue>]) -> Option<ColumnMap> {
    let sample = grid
        .iter()
        .skip(1)
        .find(|row| !row.iter().all(CellValue::is_empty))?;

    let mut date = None;
    let mut amount = None;
    let mut description = Vec::new();
    for (idx, cell) in sample.iter().enumerate() {
        match classify(cell) {
            CellClass::Date if date.is_none() => date = Some(idx),
            CellClass::Amount if amount.is_none() => amount = Some(idx),
            CellClass::Text => description.push(idx),
            _ => {}
        }
    }

    Some(ColumnMap {
        date: date?,
        amount: amount?,
        description,
        sniffed: true,
    })
}

fn classify(cell: &CellValue) -> CellClass {
    // Purely numeric cells are dates only inside the serial sniff window;
    // outside it they read as amounts.
    if let Some(n) = cell.as_number() {
        return if (date::SERIAL_SNIFF_MIN..=date::SERIAL_SNIFF_MAX).contains(&n) {
            CellClass::Date
        } else {
            CellClass::Amount
        };
    }
    match cell {
        CellValue::Text(s) if date::normalize_date(s).is_some() => CellClass::Date,
        CellValue::Text(s) if amount::parse_amount(s).is_some() => CellClass::Amount,
        _ => CellClass::Text,
    }
}

// ── Row reading ──────────────────────────────────────────────────────────────

fn read_row(row: &[CellValue], columns: &ColumnMap) -> Option<ParsedTransaction> {
    let date_cell = row.get(columns.date)?;
    let amount_cell = row.get(columns.amount)?;
    if date_cell.is_empty() || amount_cell.is_empty() {
        return None;
    }

    let date = cell_to_date(date_cell)?;
    let signed = cell_to_amount(amount_cell)?;
    let kind = if signed.is_sign_negative() {
        TransactionKind::Expense
    } else {
        TransactionKind::Income
    };

    let description = describe(row, &columns.description);
    Some(ParsedTransaction::new(date, signed, description).with_kind(kind))
}

fn cell_to_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Number(n) if *n > 1000.0 => date::from_excel_serial(*n),
        CellValue::Number(_) => None,
        CellValue::Text(s) => date::normalize_date(s),
        CellValue::Empty => None,
    }
}

fn cell_to_amount(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(n) => Decimal::from_f64(*n).map(|d| d.round_dp(2)),
        CellValue::Text(s) => amount::parse_amount(s),
        CellValue::Empty => None,
    }
}

fn describe(row: &[CellValue], columns: &[usize]) -> String {
    let joined = columns
        .iter()
        .filter_map(|idx| row.get(*idx))
        .map(CellValue::render)
        .collect::<Vec<_>>()
        .join(" ");
    let compact = compact_description(&joined);
    if compact.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        compact
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ── CellValue ─────────────────────────────────────────────────────────────

    #[test]
    fn render_drops_trailing_zero_fraction() {
        assert_eq!(CellValue::Number(45000.0).render(), "45000");
        assert_eq!(CellValue::Number(45.3).render(), "45.3");
        assert_eq!(CellValue::Text("Mercadona".into()).render(), "Mercadona");
        assert_eq!(CellValue::Empty.render(), "");
    }

    #[test]
    fn blank_text_is_an_empty_cell() {
        assert_eq!(CellValue::from_text("   "), CellValue::Empty);
        assert_eq!(CellValue::from_text(" x "), CellValue::Text("x".into()));
    }

    // ── classification ────────────────────────────────────────────────────────

    #[test]
    fn serial_window_numbers_classify_as_dates() {
        assert!(matches!(classify(&CellValue::Number(45000.0)), CellClass::Date));
        assert!(matches!(classify(&CellValue::Text("45000".into())), CellClass::Date));
    }

    #[test]
    fn numbers_outside_the_window_classify_as_amounts() {
        assert!(matches!(classify(&CellValue::Number(1500.0)), CellClass::Amount));
        assert!(matches!(classify(&CellValue::Text("1500.00".into())), CellClass::Amount));
        assert!(matches!(classify(&CellValue::Number(-45.3)), CellClass::Amount));
    }

    #[test]
    fn date_shaped_and_amount_shaped_text() {
        assert!(matches!(classify(&CellValue::Text("05/03/2024".into())), CellClass::Date));
        assert!(matches!(classify(&CellValue::Text("-45,30 €".into())), CellClass::Amount));
        assert!(matches!(classify(&CellValue::Text("Mercadona".into())), CellClass::Text));
    }

    // ── delimiter sniffing ────────────────────────────────────────────────────

    #[test]
    fn comma_is_the_default_delimiter() {
        assert_eq!(sniff_delimiter(b"Fecha,Concepto,Importe\n"), b',');
        assert_eq!(sniff_delimiter(b"singlecolumn\n"), b',');
    }

    #[test]
    fn semicolon_and_tab_headers_are_detected() {
        assert_eq!(sniff_delimiter(b"Fecha;Concepto;Importe\n"), b';');
        assert_eq!(sniff_delimiter(b"Fecha\tConcepto\tImporte\n"), b'\t');
    }

    // ── CSV end to end ────────────────────────────────────────────────────────

    #[test]
    fn headered_csv_uses_header_detection() {
        let data = b"Fecha Valor,Concepto,Importe\n01/03/2026,Mercadona compra,-45.30\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.metadata.parsing_method, ParsingMethod::CsvHeaders);
        assert_eq!(report.transactions.len(), 1);

        let tx = &report.transactions[0];
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(tx.amount, dec("45.30"));
        assert_eq!(tx.kind, Some(TransactionKind::Expense));
        assert_eq!(tx.description, "Mercadona compra");
    }

    #[test]
    fn unrecognized_headers_fall_back_to_sniffing() {
        let data = b"col1,col2,col3\n05/03/2024,Mercadona,-45.30\n06/03/2024,Lidl,-12.00\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.metadata.parsing_method, ParsingMethod::CsvColumnSniffing);
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.transactions[0].description, "Mercadona");
        assert_eq!(report.transactions[1].amount, dec("12.00"));
    }

    #[test]
    fn semicolon_csv_with_decimal_commas() {
        let data = b"Fecha;Concepto;Importe\n01/03/2026;Ikea;-120,50\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(report.transactions[0].amount, dec("120.50"));
        assert_eq!(report.transactions[0].kind, Some(TransactionKind::Expense));
    }

    #[test]
    fn serial_date_text_normalizes_in_date_column() {
        let data = b"Fecha,Importe\n45000,100.00\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(
            report.transactions[0].date,
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
        );
    }

    #[test]
    fn rows_missing_date_or_amount_are_skipped() {
        let data = b"Fecha,Concepto,Importe\n01/03/2026,Mercadona,-45.30\n,,\n02/03/2026,Sin importe,\n03/03/2026,Mal importe,abc\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.transactions.len(), 1);
        // Blank spacer rows are not counted; only candidate rows that failed.
        assert_eq!(report.metadata.skipped_rows, Some(2));
        assert_eq!(report.metadata.total_transactions, 1);
    }

    #[test]
    fn description_columns_are_joined() {
        let data = b"Fecha,Concepto,Detalle,Importe\n01/03/2026,Luz,Endesa,-60.00\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.transactions[0].description, "Luz Endesa");
    }

    #[test]
    fn missing_description_gets_placeholder() {
        let data = b"Fecha,Importe\n01/03/2026,-5.00\n";
        let report = parse_delimited(data).unwrap();
        assert_eq!(report.transactions[0].description, DESCRIPTION_PLACEHOLDER);
    }

    #[test]
    fn positive_amounts_are_income() {
        let data = b"Fecha,Concepto,Importe\n02/03/2026,Nomina empresa,1500.00\n";
        let report = parse_delimited(data).unwrap();
        let tx = &report.transactions[0];
        // Sheet direction comes from the sign alone.
        assert_eq!(tx.kind, Some(TransactionKind::Income));
        assert_eq!(tx.amount, dec("1500.00"));
    }

    #[test]
    fn no_detectable_columns_is_a_typed_failure() {
        let data = b"a,b\nfoo,bar\n";
        assert!(matches!(
            parse_delimited(data),
            Err(ImportError::ColumnDetection)
        ));
        assert!(matches!(
            parse_delimited(b""),
            Err(ImportError::ColumnDetection)
        ));
    }

    #[test]
    fn raw_grid_is_reported_for_diagnostics() {
        let data = b"Fecha,Importe\n01/03/2026,-5.00\n";
        let report = parse_delimited(data).unwrap();
        let raw = report.raw_data.unwrap();
        assert_eq!(raw[0][0], "Fecha");
        assert_eq!(raw[1][1], "-5.00");
    }

    // ── Excel error path ──────────────────────────────────────────────────────

    #[test]
    fn garbage_workbook_bytes_are_a_workbook_error() {
        assert!(matches!(
            parse_workbook(b"definitely not a workbook"),
            Err(ImportError::Workbook(_))
        ));
    }
}
