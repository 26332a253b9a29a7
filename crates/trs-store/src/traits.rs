//! The store contract.
//!
//! [`TranslationStore`] is the minimal read capability every provider must
//! implement. Stores that can be modified additionally implement
//! [`EditableTranslationStore`] and expose it through
//! [`TranslationStore::as_editable`], so callers branch on a typed capability
//! query instead of guessing the concrete type.

use std::collections::BTreeSet;
use std::fmt;

use trs_types::{Language, Translation};

use crate::entry::TranslationEntry;
use crate::error::StoreResult;
use crate::filtered::FilteredTranslationStore;
use crate::progress::ProgressMonitor;

/// A named, ordered provider of translation entries.
///
/// `order` defines precedence: the store with the numerically smallest order
/// wins when several stores define the same key. Every store must support
/// [`Language::DEFAULT`]; stacks reject stores that do not.
///
/// Implementations use interior mutability and must be `Send + Sync`, since
/// one store may be shared by several stacks.
pub trait TranslationStore: Send + Sync + fmt::Debug {
    /// Stable identity of the logical store (e.g. the provider's fully
    /// qualified resource name). Filtered views report the identity of the
    /// store they wrap.
    fn identity(&self) -> &str;

    /// Precedence of this store. Lower value = higher precedence.
    fn order(&self) -> f64;

    /// The languages this store supports.
    fn languages(&self) -> StoreResult<BTreeSet<Language>>;

    /// All entries, sorted by key.
    fn entries(&self) -> StoreResult<Vec<TranslationEntry>>;

    /// The entry for `key`, or `None` if the store does not define it.
    fn get(&self, key: &str) -> StoreResult<Option<TranslationEntry>>;

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    fn keys(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|e| e.key().to_string())
            .collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.entries()?.len())
    }

    fn contains_language(&self, language: &Language) -> StoreResult<bool> {
        Ok(self.languages()?.contains(language))
    }

    /// The editing capability of this store, if it has one.
    fn as_editable(&self) -> Option<&dyn EditableTranslationStore> {
        None
    }

    /// The filtered view this store is, if it is one.
    fn as_filtered(&self) -> Option<&FilteredTranslationStore> {
        None
    }

    fn is_editable(&self) -> bool {
        self.as_editable().is_some()
    }
}

/// A store whose contents can be modified and written back to its source.
///
/// Every mutation marks the store dirty until the next [`flush`] or
/// [`reload`].
///
/// [`flush`]: EditableTranslationStore::flush
/// [`reload`]: EditableTranslationStore::reload
pub trait EditableTranslationStore: TranslationStore {
    /// Add a translation whose key is not yet defined in this store.
    ///
    /// The key must be valid, the default text non-blank, and every language
    /// of the translation supported by the store.
    fn add_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry>;

    /// Replace the texts of an existing translation.
    fn update_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry>;

    /// Rename `old_key` to `new_key`, keeping its texts.
    fn change_key(&self, old_key: &str, new_key: &str) -> StoreResult<TranslationEntry>;

    /// Remove a translation, returning the removed entry.
    fn remove_translation(&self, key: &str) -> StoreResult<TranslationEntry>;

    /// Add support for a language not yet present.
    fn add_language(&self, language: Language) -> StoreResult<()>;

    /// Write the current state to the backing source.
    fn flush(&self, progress: &dyn ProgressMonitor) -> StoreResult<()>;

    /// Discard the current state and read the backing source again.
    fn reload(&self, progress: &dyn ProgressMonitor) -> StoreResult<()>;

    /// Returns `true` if the state differs from the last flush or reload.
    fn is_dirty(&self) -> bool;
}
