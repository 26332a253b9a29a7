//! The [`Translation`] record: a key and one text per language.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// A translation key together with its texts, sorted by [`Language`].
///
/// `Translation` is a plain mutable value. Stores hand out copies; changing
/// a copy has no effect until it is passed back to an editable store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    key: String,
    #[serde(default)]
    texts: BTreeMap<Language, String>,
}

impl Translation {
    /// Create a translation without any texts.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            texts: BTreeMap::new(),
        }
    }

    /// Builder-style variant of [`Translation::set_text`].
    pub fn with_text(mut self, language: Language, text: impl Into<String>) -> Self {
        self.set_text(language, text);
        self
    }

    /// The translation key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rename the translation.
    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    /// The text for `language`, if one is set.
    pub fn text(&self, language: &Language) -> Option<&str> {
        self.texts.get(language).map(String::as_str)
    }

    /// The text for [`Language::DEFAULT`], if one is set.
    pub fn default_text(&self) -> Option<&str> {
        self.text(&Language::DEFAULT)
    }

    /// Set the text for a language, replacing any previous value.
    ///
    /// Returns the previous text.
    pub fn set_text(&mut self, language: Language, text: impl Into<String>) -> Option<String> {
        self.texts.insert(language, text.into())
    }

    /// Remove the text for a language. Returns the removed text.
    pub fn remove_text(&mut self, language: &Language) -> Option<String> {
        self.texts.remove(language)
    }

    /// Remove every text.
    pub fn clear_texts(&mut self) {
        self.texts.clear();
    }

    /// All texts in language order.
    pub fn texts(&self) -> &BTreeMap<Language, String> {
        &self.texts
    }

    /// The languages this translation has a text for, in language order.
    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.texts.keys()
    }

    /// Returns `true` if a non-blank text exists for `language`.
    pub fn has_text(&self, language: &Language) -> bool {
        self.text(language).is_some_and(|t| !crate::key::is_blank(t))
    }

    /// A new translation holding the union of both text maps.
    ///
    /// Texts of `other` take precedence on conflicts. The key of `self` is
    /// kept and `self` is left untouched.
    pub fn merged(&self, other: &Translation) -> Translation {
        let mut texts = self.texts.clone();
        for (language, text) in &other.texts {
            texts.insert(language.clone(), text.clone());
        }
        Translation {
            key: self.key.clone(),
            texts,
        }
    }
}
