use trs_store::StoreError;
use trs_types::{Language, TypeError};

/// Errors from stack operations.
///
/// Every variant except [`StackError::Store`] and [`StackError::Poisoned`]
/// is a precondition violation detected before any store was touched.
#[derive(Debug, thiserror::Error)]
pub enum StackError {
    /// The key is empty or whitespace only.
    #[error("translation key must not be blank")]
    BlankKey,

    /// The key does not match the key pattern.
    #[error("invalid translation key: {key:?}")]
    InvalidKey { key: String },

    /// The translation has no non-blank default text.
    #[error("translation {key:?} has no default text")]
    MissingDefaultText { key: String },

    /// The target store already defines the key.
    #[error("key {key:?} already exists in store {store}")]
    KeyExistsInStore { key: String, store: String },

    /// The key already resolves somewhere in the stack.
    #[error("key {key:?} already exists in the stack")]
    KeyAlreadyResolves { key: String },

    /// No (editable) store in the stack defines the key.
    #[error("key {key:?} not found")]
    KeyNotFound { key: String },

    /// The store exists in the stack but cannot be modified.
    #[error("store {store} is not editable")]
    NotEditable { store: String },

    /// The store is not a member of this stack.
    #[error("store {store} is not part of this stack")]
    ForeignStore { store: String },

    /// The stack contains no editable store.
    #[error("the stack contains no editable store")]
    NoEditableStore,

    /// The target store already supports the language.
    #[error("language {language} already exists in store {store}")]
    LanguageExists { language: Language, store: String },

    /// The target store does not support a language used by the translation.
    #[error("language {language} is not supported by store {store}")]
    UnsupportedLanguage { language: Language, store: String },

    /// Failure inside an underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl From<TypeError> for StackError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::BlankKey => StackError::BlankKey,
            TypeError::InvalidKey(key) => StackError::InvalidKey { key },
            other => StackError::Store(StoreError::Type(other)),
        }
    }
}

/// Result alias for stack operations.
pub type StackResult<T> = Result<T, StackError>;
