//! In-memory contents of a store and the rules every mutation obeys.

use std::collections::{BTreeMap, BTreeSet};

use trs_types::{check_key, Language, Translation};

use crate::error::{StoreError, StoreResult};

/// Languages and translations held by a store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreContent {
    pub languages: BTreeSet<Language>,
    pub translations: BTreeMap<String, Translation>,
}

impl StoreContent {
    /// Empty content supporting only [`Language::DEFAULT`].
    pub fn with_default_language() -> Self {
        let mut content = Self::default();
        content.languages.insert(Language::DEFAULT);
        content
    }

    pub(crate) fn add(&mut self, translation: &Translation, store: &str) -> StoreResult<()> {
        check_key(translation.key())?;
        if self.translations.contains_key(translation.key()) {
            return Err(StoreError::KeyExists {
                key: translation.key().to_string(),
                store: store.to_string(),
            });
        }
        self.check_texts(translation, store)?;
        self.translations
            .insert(translation.key().to_string(), translation.clone());
        Ok(())
    }

    pub(crate) fn update(&mut self, translation: &Translation, store: &str) -> StoreResult<()> {
        if !self.translations.contains_key(translation.key()) {
            return Err(not_found(translation.key(), store));
        }
        self.check_texts(translation, store)?;
        self.translations
            .insert(translation.key().to_string(), translation.clone());
        Ok(())
    }

    pub(crate) fn rename(&mut self, old_key: &str, new_key: &str, store: &str) -> StoreResult<&Translation> {
        check_key(new_key)?;
        if self.translations.contains_key(new_key) {
            return Err(StoreError::KeyExists {
                key: new_key.to_string(),
                store: store.to_string(),
            });
        }
        let mut translation = self
            .translations
            .remove(old_key)
            .ok_or_else(|| not_found(old_key, store))?;
        translation.set_key(new_key);
        Ok(self
            .translations
            .entry(new_key.to_string())
            .or_insert(translation))
    }

    pub(crate) fn remove(&mut self, key: &str, store: &str) -> StoreResult<Translation> {
        self.translations
            .remove(key)
            .ok_or_else(|| not_found(key, store))
    }

    pub(crate) fn add_language(&mut self, language: Language, store: &str) -> StoreResult<()> {
        if self.languages.contains(&language) {
            return Err(StoreError::LanguageExists {
                language,
                store: store.to_string(),
            });
        }
        self.languages.insert(language);
        Ok(())
    }

    fn check_texts(&self, translation: &Translation, store: &str) -> StoreResult<()> {
        if !translation.has_text(&Language::DEFAULT) {
            return Err(StoreError::MissingDefaultText {
                key: translation.key().to_string(),
            });
        }
        if let Some(language) = translation
            .languages()
            .find(|l| !self.languages.contains(*l))
        {
            return Err(StoreError::UnsupportedLanguage {
                language: language.clone(),
                store: store.to_string(),
            });
        }
        Ok(())
    }
}

fn not_found(key: &str, store: &str) -> StoreError {
    StoreError::KeyNotFound {
        key: key.to_string(),
        store: store.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn de() -> Language {
        Language::parse("de").unwrap()
    }

    fn hello() -> Translation {
        Translation::new("hello").with_text(Language::DEFAULT, "Hello")
    }

    #[test]
    fn add_rejects_duplicates_and_missing_default() {
        let mut c = StoreContent::with_default_language();
        c.add(&hello(), "s").unwrap();
        assert!(matches!(c.add(&hello(), "s"), Err(StoreError::KeyExists { .. })));
        let no_default = Translation::new("other");
        assert!(matches!(
            c.add(&no_default, "s"),
            Err(StoreError::MissingDefaultText { .. })
        ));
        let blank_default = Translation::new("other").with_text(Language::DEFAULT, " ");
        assert!(matches!(
            c.add(&blank_default, "s"),
            Err(StoreError::MissingDefaultText { .. })
        ));
    }

    #[test]
    fn add_rejects_unsupported_language_until_added() {
        let mut c = StoreContent::with_default_language();
        let t = hello().with_text(de(), "Hallo");
        assert!(matches!(
            c.add(&t, "s"),
            Err(StoreError::UnsupportedLanguage { .. })
        ));
        c.add_language(de(), "s").unwrap();
        c.add(&t, "s").unwrap();
        assert!(matches!(
            c.add_language(de(), "s"),
            Err(StoreError::LanguageExists { .. })
        ));
    }

    #[test]
    fn add_rejects_invalid_key() {
        let mut c = StoreContent::with_default_language();
        let t = Translation::new("1bad").with_text(Language::DEFAULT, "x");
        assert!(matches!(c.add(&t, "s"), Err(StoreError::Type(_))));
    }

    #[test]
    fn rename_moves_texts() {
        let mut c = StoreContent::with_default_language();
        c.add(&hello(), "s").unwrap();
        let renamed = c.rename("hello", "greeting", "s").unwrap().clone();
        assert_eq!(renamed.key(), "greeting");
        assert_eq!(renamed.default_text(), Some("Hello"));
        assert!(!c.translations.contains_key("hello"));
        assert!(matches!(
            c.rename("hello", "x", "s"),
            Err(StoreError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let mut c = StoreContent::with_default_language();
        c.add(&hello(), "s").unwrap();
        c.add(&Translation::new("bye").with_text(Language::DEFAULT, "Bye"), "s")
            .unwrap();
        assert!(matches!(
            c.rename("hello", "bye", "s"),
            Err(StoreError::KeyExists { .. })
        ));
        assert!(c.translations.contains_key("hello"));
    }

    #[test]
    fn update_and_remove_require_existing_key() {
        let mut c = StoreContent::with_default_language();
        assert!(matches!(c.update(&hello(), "s"), Err(StoreError::KeyNotFound { .. })));
        c.add(&hello(), "s").unwrap();
        let changed = Translation::new("hello").with_text(Language::DEFAULT, "Hi");
        c.update(&changed, "s").unwrap();
        assert_eq!(c.translations["hello"].default_text(), Some("Hi"));
        let removed = c.remove("hello", "s").unwrap();
        assert_eq!(removed.default_text(), Some("Hi"));
        assert!(matches!(c.remove("hello", "s"), Err(StoreError::KeyNotFound { .. })));
    }
}
