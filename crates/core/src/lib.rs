pub mod amount;
pub mod date;
pub mod transaction;

pub use amount::{infer_kind, parse_amount};
pub use date::{from_excel_serial, normalize_date};
pub use transaction::{ParsedTransaction, TransactionKind, DESCRIPTION_MAX, DESCRIPTION_PLACEHOLDER};
