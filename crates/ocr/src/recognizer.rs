use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
}

/// Abstraction over a text recognition engine.
/// Implementations accept normalized PNG bytes and return the recognized text.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError>;

    /// Short backend label for logs and diagnostics.
    fn name(&self) -> &'static str;
}

impl<B: OcrBackend + ?Sized> OcrBackend for Box<B> {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image_bytes)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set string whatever the image — lets the line-extraction
/// pipeline be exercised without Tesseract installed.
pub struct MockRecognizer {
    pub text: String,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _image_bytes: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrBackend, OcrError};
    use leptess::LepTess;

    /// Recognizes statement photos with the system Tesseract install.
    /// `lang` takes Tesseract language specs, e.g. "spa+eng".
    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self {
                data_path,
                lang: lang.to_string(),
            }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, image_bytes: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image_bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }

        fn name(&self) -> &'static str {
            "tesseract"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_preset_text() {
        let r = MockRecognizer::new("01/03/2024 Compra -12,50 €");
        assert_eq!(r.recognize(b"fake image data").unwrap(), "01/03/2024 Compra -12,50 €");
    }

    #[test]
    fn mock_ignores_image_content() {
        let r = MockRecognizer::new("hola");
        assert_eq!(r.recognize(b"anything").unwrap(), "hola");
        assert_eq!(r.recognize(b"").unwrap(), "hola");
    }

    #[test]
    fn boxed_backend_delegates() {
        let boxed: Box<dyn OcrBackend> = Box::new(MockRecognizer::new("texto"));
        assert_eq!(boxed.recognize(b"x").unwrap(), "texto");
        assert_eq!(boxed.name(), "mock");
    }
}
