use trs_types::{Language, TypeError};

/// Errors from translation store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A translation with this key already exists in the store.
    #[error("key {key:?} already exists in store {store}")]
    KeyExists { key: String, store: String },

    /// The store has no translation with this key.
    #[error("key {key:?} not found in store {store}")]
    KeyNotFound { key: String, store: String },

    /// The translation has no text for the default language.
    #[error("translation {key:?} has no default text")]
    MissingDefaultText { key: String },

    /// The language is already supported by the store.
    #[error("language {language} already exists in store {store}")]
    LanguageExists { language: Language, store: String },

    /// The translation uses a language the store does not support.
    #[error("language {language} is not supported by store {store}")]
    UnsupportedLanguage { language: Language, store: String },

    /// The store (or the store behind a filter) cannot be modified.
    #[error("store {store} is read-only")]
    ReadOnly { store: String },

    /// The progress monitor requested cancellation.
    #[error("operation cancelled")]
    Cancelled,

    /// Key or language rule violation.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error from the backing source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing source could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
