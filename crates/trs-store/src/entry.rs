//! [`TranslationEntry`]: a translation bound to the store that owns it.

use std::fmt;
use std::sync::{Arc, Weak};

use trs_types::{Language, Translation};

use crate::traits::TranslationStore;

/// A [`Translation`] together with a non-owning reference to its store.
///
/// Entries are snapshots. They are produced whenever a store materialises
/// its contents and become stale as soon as the store is mutated or
/// reloaded.
#[derive(Clone)]
pub struct TranslationEntry {
    translation: Translation,
    store: Weak<dyn TranslationStore>,
    store_identity: Arc<str>,
}

impl TranslationEntry {
    pub fn new(
        translation: Translation,
        store: Weak<dyn TranslationStore>,
        store_identity: Arc<str>,
    ) -> Self {
        Self {
            translation,
            store,
            store_identity,
        }
    }

    pub fn translation(&self) -> &Translation {
        &self.translation
    }

    pub fn into_translation(self) -> Translation {
        self.translation
    }

    pub fn key(&self) -> &str {
        self.translation.key()
    }

    pub fn text(&self, language: &Language) -> Option<&str> {
        self.translation.text(language)
    }

    /// The owning store, if it is still alive.
    pub fn store(&self) -> Option<Arc<dyn TranslationStore>> {
        self.store.upgrade()
    }

    /// Identity of the owning store. Stays available after the store is gone.
    pub fn store_identity(&self) -> &str {
        &self.store_identity
    }
}

impl PartialEq for TranslationEntry {
    fn eq(&self, other: &Self) -> bool {
        self.store_identity == other.store_identity && self.translation == other.translation
    }
}

impl Eq for TranslationEntry {}

impl fmt::Debug for TranslationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationEntry")
            .field("key", &self.translation.key())
            .field("store", &self.store_identity)
            .field("texts", self.translation.texts())
            .finish()
    }
}
