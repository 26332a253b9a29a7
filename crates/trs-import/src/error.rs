use trs_stack::StackError;
use trs_store::StoreError;

/// Errors from importing or exporting tables.
///
/// Problems with individual rows are not errors; they are recorded on the
/// importer and the row is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Merging into the stack failed.
    #[error(transparent)]
    Stack(#[from] StackError),

    /// Reading a store directly failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The table could not be read or written as CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
