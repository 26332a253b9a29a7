//! Key and text validation with override-aware warnings.
//!
//! Results are [`Validation`] codes: `0` for OK, `100..=499` for warnings,
//! `40000` and up for errors. Functions work standalone on a
//! [`trs_stack::StackedTranslation`] or against a live stack through
//! [`TranslationValidator`].

pub mod code;
pub mod validator;

pub use code::{Severity, Validation};
pub use validator::{
    validate_key, validate_key_in_stack, validate_new_key, validate_text, validate_text_in_stack,
    validate_translation, TranslationReport, TranslationValidator,
};
