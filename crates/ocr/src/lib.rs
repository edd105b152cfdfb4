pub mod hash;
pub mod preprocess;
pub mod recognizer;

pub use hash::{sha256_bytes, sha256_hex, to_hex};
pub use preprocess::{prepare_image, PreprocessError};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError};
#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
