//! Translation key rules.
//!
//! A key starts with an ASCII letter followed by up to 200 letters, digits,
//! `_`, `.` or `-`.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::TypeError;

/// The pattern every translation key must match.
pub const KEY_PATTERN: &str = r"^[A-Za-z][A-Za-z0-9_.\-]{0,200}$";

/// Maximum length of a translation key in characters.
pub const KEY_MAX_LEN: usize = 201;

static KEY_REGEX: OnceLock<Regex> = OnceLock::new();

fn key_regex() -> &'static Regex {
    KEY_REGEX.get_or_init(|| Regex::new(KEY_PATTERN).expect("key pattern is valid"))
}

/// Returns `true` if the text is empty or consists of whitespace only.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Returns `true` if `key` matches [`KEY_PATTERN`].
pub fn is_valid_key(key: &str) -> bool {
    key_regex().is_match(key)
}

/// Validate a key, distinguishing blank keys from malformed ones.
pub fn check_key(key: &str) -> Result<(), TypeError> {
    if is_blank(key) {
        return Err(TypeError::BlankKey);
    }
    if !is_valid_key(key) {
        return Err(TypeError::InvalidKey(key.to_string()));
    }
    Ok(())
}
