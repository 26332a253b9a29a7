use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid language tag: {0:?}")]
    InvalidLanguage(String),

    #[error("invalid translation key: {0:?}")]
    InvalidKey(String),

    #[error("translation key must not be blank")]
    BlankKey,
}
