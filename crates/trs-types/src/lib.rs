//! Foundation types for the translation store stack.
//!
//! Every crate in the workspace builds on three primitives defined here:
//!
//! - [`Language`] -- an immutable locale-like identifier. The sentinel
//!   [`Language::DEFAULT`] always sorts first.
//! - [`Translation`] -- a key plus one text per [`Language`].
//! - the key rules in [`key`] -- the character set and length every
//!   translation key must satisfy.

pub mod error;
pub mod key;
pub mod language;
pub mod translation;

pub use error::TypeError;
pub use key::{check_key, is_blank, is_valid_key, KEY_MAX_LEN, KEY_PATTERN};
pub use language::Language;
pub use translation::Translation;
