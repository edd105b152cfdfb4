use serde_json::json;

use crate::error::ImportError;
use crate::report::{FileFormat, ImportReport, ParsingMethod};
use crate::text;

/// Shortest extracted text still treated as a real text layer. Scanned
/// statements wrapped in a PDF container come back empty or with a few
/// stray glyphs, and the caller should ask for an image upload instead.
const MIN_TEXT_LEN: usize = 20;

pub fn parse(data: &[u8]) -> Result<ImportReport, ImportError> {
    if !data.starts_with(b"%PDF") {
        return Err(ImportError::Pdf("missing %PDF header".to_string()));
    }

    let extracted =
        pdf_extract::extract_text_from_mem(data).map_err(|e| ImportError::Pdf(e.to_string()))?;
    if extracted.trim().chars().count() < MIN_TEXT_LEN {
        return Err(ImportError::NoTextLayer);
    }

    let transactions = text::extract_transactions(&extracted);
    Ok(
        ImportReport::new(transactions, FileFormat::Pdf, ParsingMethod::TextExtraction)
            .with_raw_data(json!(extracted)),
    )
}
