use centimo_ocr::{prepare_image, OcrBackend};
use serde_json::json;

use crate::error::ImportError;
use crate::report::{FileFormat, ImportReport, ParsingMethod};
use crate::{pdf, sheet, text};

/// Entry point of the pipeline: one uploaded document in, one report out.
/// Dispatch is by extension alone; the OCR engine behind the image path is
/// whatever backend the parser was built with.
pub struct DocumentParser<B> {
    backend: B,
}

impl<B: OcrBackend> DocumentParser<B> {
    pub fn new(backend: B) -> Self {
        DocumentParser { backend }
    }

    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ImportReport, ImportError> {
        let format = FileFormat::from_filename(filename)
            .ok_or_else(|| ImportError::UnsupportedFormat(extension_of(filename)))?;
        match format {
            FileFormat::Pdf => pdf::parse(data),
            FileFormat::Excel => sheet::parse_workbook(data),
            FileFormat::Csv => sheet::parse_delimited(data),
            FileFormat::Image => self.parse_image(data),
        }
    }

    fn parse_image(&self, data: &[u8]) -> Result<ImportReport, ImportError> {
        let normalized = prepare_image(data)?;
        let recognized = self.backend.recognize(&normalized)?;
        let transactions = text::extract_transactions(&recognized);
        Ok(
            ImportReport::new(transactions, FileFormat::Image, ParsingMethod::OcrTextExtraction)
                .with_raw_data(json!(recognized)),
        )
    }
}

fn extension_of(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_else(|| filename.to_string())
}
