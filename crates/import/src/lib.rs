pub mod categorize;
pub mod error;
pub mod pdf;
pub mod report;
pub mod router;
pub mod sheet;
pub mod text;

pub use categorize::{CatalogError, KeywordCatalog, KeywordRule};
pub use error::ImportError;
pub use report::{FileFormat, ImportMetadata, ImportReport, ParsingMethod};
pub use router::DocumentParser;
pub use sheet::CellValue;
