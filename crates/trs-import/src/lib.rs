//! Bulk import of translation tables into a
//! [`TranslationStoreStack`](trs_stack::TranslationStoreStack).
//!
//! [`TranslationImporter`] detects the header row, maps columns to
//! languages, validates every row and merges the result in one change
//! batch. [`table`] reads and writes the CSV form of such tables.

pub mod config;
pub mod error;
pub mod importer;
pub mod table;

pub use config::ImportConfig;
pub use error::{ImportError, Result};
pub use importer::{ImportResult, TranslationImporter};
pub use table::{export_rows, read_csv, read_csv_file, write_csv};
