use centimo_core::ParsedTransaction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source document family, decided by file extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    #[serde(rename = "PDF")]
    Pdf,
    Excel,
    #[serde(rename = "CSV")]
    Csv,
    Image,
}

impl FileFormat {
    /// Route a filename to its parsing family, case-insensitive on the
    /// extension. Unknown extensions return `None` so the router can reject
    /// the upload before touching its bytes.
    pub fn from_filename(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileFormat::Pdf),
            "xlsx" | "xls" => Some(FileFormat::Excel),
            "csv" => Some(FileFormat::Csv),
            "jpg" | "jpeg" | "png" | "webp" | "gif" => Some(FileFormat::Image),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Pdf => write!(f, "PDF"),
            FileFormat::Excel => write!(f, "Excel"),
            FileFormat::Csv => write!(f, "CSV"),
            FileFormat::Image => write!(f, "Image"),
        }
    }
}

/// How the transactions were obtained, surfaced verbatim in the wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParsingMethod {
    TextExtraction,
    OcrTextExtraction,
    XlsxHeaders,
    XlsxColumnSniffing,
    CsvHeaders,
    CsvColumnSniffing,
}

impl fmt::Display for ParsingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParsingMethod::TextExtraction => "text-extraction",
            ParsingMethod::OcrTextExtraction => "ocr-text-extraction",
            ParsingMethod::XlsxHeaders => "xlsx-headers",
            ParsingMethod::XlsxColumnSniffing => "xlsx-column-sniffing",
            ParsingMethod::CsvHeaders => "csv-headers",
            ParsingMethod::CsvColumnSniffing => "csv-column-sniffing",
        };
        f.write_str(s)
    }
}

/// Everything one parsed document reports back.
///
/// An extraction that found zero transactions is still a success; failures
/// are the typed errors, not an empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub success: bool,
    pub transactions: Vec<ParsedTransaction>,
    #[serde(rename = "rawData", default, skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<serde_json::Value>,
    pub metadata: ImportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMetadata {
    pub total_transactions: usize,
    pub file_type: FileFormat,
    pub parsing_method: ParsingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_rows: Option<usize>,
}

impl ImportReport {
    pub fn new(
        transactions: Vec<ParsedTransaction>,
        file_type: FileFormat,
        parsing_method: ParsingMethod,
    ) -> Self {
        let metadata = ImportMetadata {
            total_transactions: transactions.len(),
            file_type,
            parsing_method,
            skipped_rows: None,
        };
        ImportReport {
            success: true,
            transactions,
            raw_data: None,
            metadata,
        }
    }

    pub fn with_raw_data(mut self, raw_data: serde_json::Value) -> Self {
        self.raw_data = Some(raw_data);
        self
    }

    pub fn with_skipped_rows(mut self, skipped: usize) -> Self {
        self.metadata.skipped_rows = Some(skipped);
        self
    }
}
