//! The validation result taxonomy.
//!
//! Results carry stable integer codes: `0` is OK, `100..=499` are warnings
//! (the edit is allowed but has a side effect worth showing), and codes from
//! `40000` up are errors (the edit must be refused).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity class of a [`Validation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Ok,
    Warning,
    Error,
}

/// Outcome of validating a key or a text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Validation {
    Ok = 0,

    /// A lower precedence store defines the key; the new entry hides it.
    KeyOverridesOtherStoreWarning = 100,
    /// A higher precedence store defines the key; the new entry stays hidden.
    KeyIsOverriddenByOtherStoreWarning = 101,
    /// Both of the above.
    KeyOverridesAndIsOverriddenWarning = 102,
    /// A different store with the same order defines the key, so which one
    /// wins depends on tie-breaking only.
    KeyAmbiguousSameOrderWarning = 103,
    /// The text is empty but a lower precedence store provides one, which
    /// becomes visible instead.
    TextInheritedWarning = 200,

    /// No default text here and none to inherit.
    DefaultTranslationMissingError = 40000,
    KeyEmptyError = 40001,
    KeyInvalidError = 40002,
    KeyAlreadyExistsError = 40003,
}

const ALL: [Validation; 10] = [
    Validation::Ok,
    Validation::KeyOverridesOtherStoreWarning,
    Validation::KeyIsOverriddenByOtherStoreWarning,
    Validation::KeyOverridesAndIsOverriddenWarning,
    Validation::KeyAmbiguousSameOrderWarning,
    Validation::TextInheritedWarning,
    Validation::DefaultTranslationMissingError,
    Validation::KeyEmptyError,
    Validation::KeyInvalidError,
    Validation::KeyAlreadyExistsError,
];

impl Validation {
    /// The stable integer code.
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Validation> {
        ALL.into_iter().find(|v| v.code() == code)
    }

    pub fn severity(self) -> Severity {
        match self.code() {
            0 => Severity::Ok,
            100..=499 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_ok(self) -> bool {
        self.severity() == Severity::Ok
    }

    pub fn is_warning(self) -> bool {
        self.severity() == Severity::Warning
    }

    pub fn is_error(self) -> bool {
        self.severity() == Severity::Error
    }

    /// The more severe of two results; the first one on a tie.
    pub fn worst(self, other: Validation) -> Validation {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Human readable explanation.
    pub fn message(self) -> &'static str {
        match self {
            Validation::Ok => "ok",
            Validation::KeyOverridesOtherStoreWarning => {
                "the key also exists in a store with lower precedence and will override it"
            }
            Validation::KeyIsOverriddenByOtherStoreWarning => {
                "the key also exists in a store with higher precedence and will be overridden by it"
            }
            Validation::KeyOverridesAndIsOverriddenWarning => {
                "the key exists in stores with both lower and higher precedence"
            }
            Validation::KeyAmbiguousSameOrderWarning => {
                "the key exists in another store with the same order; the override is ambiguous"
            }
            Validation::TextInheritedWarning => {
                "the text is empty; the text of a store with lower precedence will be used"
            }
            Validation::DefaultTranslationMissingError => "a default text is required",
            Validation::KeyEmptyError => "the key must not be empty",
            Validation::KeyInvalidError => "the key contains invalid characters or is too long",
            Validation::KeyAlreadyExistsError => "the key already exists",
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.code())
    }
}
