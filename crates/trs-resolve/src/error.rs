use trs_stack::StackError;
use trs_store::StoreError;

/// Errors from store discovery and stack assembly.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A provider could not produce its stores.
    #[error("provider {provider} failed: {message}")]
    Provider { provider: String, message: String },

    /// A provider with this name is already registered.
    #[error("provider {0} is already registered")]
    DuplicateProvider(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stack(#[from] StackError),

    /// The registry lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
