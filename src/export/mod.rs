//! Export adapters consuming a record stream.

mod csv;

pub use self::csv::{to_csv, CsvOptions, CsvSummary};
