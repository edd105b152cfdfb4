use centimo_ocr::{OcrError, PreprocessError};
use thiserror::Error;

/// One variant per failure class the pipeline can report. Per-record
/// problems (a row with an unreadable date, a line with no amount) are
/// never errors; they are skipped and the batch still succeeds.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("Document has no extractable text layer")]
    NoTextLayer,
    #[error("Could not read PDF: {0}")]
    Pdf(String),
    #[error("Could not read workbook: {0}")]
    Workbook(String),
    #[error("Could not read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("No date and amount columns could be identified")]
    ColumnDetection,
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

impl ImportError {
    /// The `parsingMethod` string reported when this failure reaches the
    /// wire, so callers can tell "unreadable" apart from "parsed, found
    /// nothing".
    pub fn parsing_method(&self) -> &'static str {
        match self {
            ImportError::UnsupportedFormat(_) => "unsupported-format",
            ImportError::NoTextLayer => "text-extraction-failed",
            ImportError::ColumnDetection => "column-detection-failed",
            ImportError::Pdf(_)
            | ImportError::Workbook(_)
            | ImportError::Csv(_)
            | ImportError::Preprocess(_)
            | ImportError::Ocr(_) => "error",
        }
    }
}
