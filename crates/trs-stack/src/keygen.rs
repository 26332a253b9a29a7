//! Derivation of translation keys from free text.

/// Maximum length of a generated key before a uniqueness suffix is added.
pub const GENERATED_KEY_MAX_LEN: usize = 190;

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ' ')
}

fn capitalize(fragment: &str) -> String {
    let mut chars = fragment.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Turn free text into a key candidate, without the uniqueness suffix.
///
/// Characters outside `[A-Za-z0-9_.- ]` are dropped, the remaining words are
/// joined in camel case (only when there is more than one word), anything
/// before the first letter and trailing `.`, `-` are stripped, and the result
/// is cut to [`GENERATED_KEY_MAX_LEN`] characters. A non-empty result is
/// always a valid key.
pub fn key_base(text: &str) -> String {
    let cleaned: String = text.chars().filter(|c| is_key_char(*c)).collect();
    let words: Vec<&str> = cleaned.split(' ').filter(|w| !w.is_empty()).collect();

    let joined = if words.len() > 1 {
        words.iter().map(|w| capitalize(w)).collect::<String>()
    } else {
        words.concat()
    };

    let trimmed = joined
        .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
        .trim_end_matches(['.', '-']);
    // Only ASCII remains, so byte length equals character count.
    trimmed[..trimmed.len().min(GENERATED_KEY_MAX_LEN)].to_string()
}

/// Make `base` unique by appending the smallest non-negative integer suffix
/// for which `exists` returns `false`. `base` itself is returned if free.
pub fn unique_key<E, F>(base: &str, mut exists: F) -> Result<String, E>
where
    F: FnMut(&str) -> Result<bool, E>,
{
    if base.is_empty() || !exists(base)? {
        return Ok(base.to_string());
    }
    let mut suffix: u64 = 0;
    loop {
        let candidate = format!("{base}{suffix}");
        if !exists(&candidate)? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}
