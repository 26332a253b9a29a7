//! The [`Language`] identifier.
//!
//! A language wraps a locale-like tuple `(language, country, variant)` and a
//! cached display name of the form `lang`, `lang_COUNTRY` or
//! `lang_COUNTRY_variant`. The display name is the sole identity and
//! ordering key: two languages are equal iff their display names match.
//! [`Language::DEFAULT`] always sorts before every other language.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const LANGUAGE_PATTERN: &str =
    r"^([A-Za-z]{2,8})(?:_([A-Za-z0-9]{2,3})(?:_([A-Za-z0-9]{1,16}))?)?$";

const DEFAULT_NAME: &str = "default";

static LANGUAGE_REGEX: OnceLock<Regex> = OnceLock::new();

fn language_regex() -> &'static Regex {
    LANGUAGE_REGEX.get_or_init(|| Regex::new(LANGUAGE_PATTERN).expect("language pattern is valid"))
}

/// An immutable, locale-like language identifier.
#[derive(Clone)]
pub struct Language {
    language: Cow<'static, str>,
    country: Option<Cow<'static, str>>,
    variant: Option<Cow<'static, str>>,
    display: Cow<'static, str>,
}

impl Language {
    /// The sentinel language every store must support and every translation
    /// must define. Its textual form is `default`.
    pub const DEFAULT: Language = Language {
        language: Cow::Borrowed(DEFAULT_NAME),
        country: None,
        variant: None,
        display: Cow::Borrowed(DEFAULT_NAME),
    };

    /// Build a language from its locale parts.
    ///
    /// The language code is lower-cased and the country upper-cased; the
    /// variant is kept verbatim. A variant requires a country.
    pub fn from_parts(
        language: &str,
        country: Option<&str>,
        variant: Option<&str>,
    ) -> Result<Language, TypeError> {
        let mut tag = language.to_string();
        if let Some(country) = country {
            tag.push('_');
            tag.push_str(country);
        }
        if let Some(variant) = variant {
            if country.is_none() {
                return Err(TypeError::InvalidLanguage(format!("{language}__{variant}")));
            }
            tag.push('_');
            tag.push_str(variant);
        }
        Self::parse(&tag).ok_or(TypeError::InvalidLanguage(tag))
    }

    /// Parse a tag of the form `lang(_country(_variant)?)?`.
    ///
    /// Surrounding whitespace is ignored. Returns `None` if the text does not
    /// match the pattern. `default` (in any case) yields [`Language::DEFAULT`].
    pub fn parse(tag: &str) -> Option<Language> {
        let caps = language_regex().captures(tag.trim())?;
        let language = caps.get(1)?.as_str().to_ascii_lowercase();
        let country = caps.get(2).map(|m| m.as_str().to_ascii_uppercase());
        let variant = caps.get(3).map(|m| m.as_str().to_string());

        let mut display = language.clone();
        if let Some(ref c) = country {
            display.push('_');
            display.push_str(c);
        }
        if let Some(ref v) = variant {
            display.push('_');
            display.push_str(v);
        }
        if display == DEFAULT_NAME {
            return Some(Language::DEFAULT);
        }

        Some(Language {
            language: Cow::Owned(language),
            country: country.map(Cow::Owned),
            variant: variant.map(Cow::Owned),
            display: Cow::Owned(display),
        })
    }

    /// The lower-case language code.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The upper-case country code, if any.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// The variant, if any.
    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    /// The display name, also used as the identity of this language.
    pub fn display_name(&self) -> &str {
        &self.display
    }

    /// Returns `true` for [`Language::DEFAULT`].
    pub fn is_default(&self) -> bool {
        self.display == DEFAULT_NAME
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.display == other.display
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.display.hash(state);
    }
}

impl Ord for Language {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_default(), other.is_default()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.display.cmp(&other.display),
        }
    }
}

impl PartialOrd for Language {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Language({})", self.display)
    }
}

impl FromStr for Language {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::parse(s).ok_or_else(|| TypeError::InvalidLanguage(s.to_string()))
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display)
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}
