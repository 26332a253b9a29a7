//! [`FilteredTranslationStore`]: a key-restricted view of another store.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use trs_types::{Language, Translation};

use crate::entry::TranslationEntry;
use crate::error::{StoreError, StoreResult};
use crate::progress::ProgressMonitor;
use crate::traits::{EditableTranslationStore, TranslationStore};

/// A view of a store restricted to an explicit set of keys.
///
/// Reads are intersected with the allow-set. Writes are forwarded to the
/// wrapped store, which must be editable; keys created or renamed through
/// the view join the allow-set so they stay visible. Identity and order are
/// those of the wrapped store.
#[derive(Debug)]
pub struct FilteredTranslationStore {
    inner: Arc<dyn TranslationStore>,
    allowed: RwLock<BTreeSet<String>>,
}

impl FilteredTranslationStore {
    pub fn new<I, S>(inner: Arc<dyn TranslationStore>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            allowed: RwLock::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// The store behind this view.
    pub fn inner(&self) -> &Arc<dyn TranslationStore> {
        &self.inner
    }

    /// A copy of the allow-set.
    pub fn allowed_keys(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.allowed()?.clone())
    }

    /// A new view over the same store whose allow-set is the union of both.
    pub fn union(&self, other: &FilteredTranslationStore) -> StoreResult<FilteredTranslationStore> {
        let mut keys = self.allowed_keys()?;
        keys.extend(other.allowed_keys()?);
        Ok(FilteredTranslationStore::new(self.inner.clone(), keys))
    }

    fn allowed(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeSet<String>>> {
        self.allowed
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn allow(&self, key: &str) -> StoreResult<()> {
        self.allowed
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?
            .insert(key.to_string());
        Ok(())
    }

    fn editable_inner(&self) -> StoreResult<&dyn EditableTranslationStore> {
        self.inner.as_editable().ok_or_else(|| StoreError::ReadOnly {
            store: self.inner.identity().to_string(),
        })
    }
}

impl TranslationStore for FilteredTranslationStore {
    fn identity(&self) -> &str {
        self.inner.identity()
    }

    fn order(&self) -> f64 {
        self.inner.order()
    }

    fn languages(&self) -> StoreResult<BTreeSet<Language>> {
        self.inner.languages()
    }

    fn entries(&self) -> StoreResult<Vec<TranslationEntry>> {
        let allowed = self.allowed()?;
        Ok(self
            .inner
            .entries()?
            .into_iter()
            .filter(|e| allowed.contains(e.key()))
            .collect())
    }

    fn get(&self, key: &str) -> StoreResult<Option<TranslationEntry>> {
        if !self.allowed()?.contains(key) {
            return Ok(None);
        }
        self.inner.get(key)
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.allowed()?.contains(key) && self.inner.contains_key(key)?)
    }

    fn as_editable(&self) -> Option<&dyn EditableTranslationStore> {
        if self.inner.is_editable() {
            Some(self)
        } else {
            None
        }
    }

    fn as_filtered(&self) -> Option<&FilteredTranslationStore> {
        Some(self)
    }
}

impl EditableTranslationStore for FilteredTranslationStore {
    fn add_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry> {
        let entry = self.editable_inner()?.add_translation(translation)?;
        self.allow(translation.key())?;
        Ok(entry)
    }

    fn update_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry> {
        self.editable_inner()?.update_translation(translation)
    }

    fn change_key(&self, old_key: &str, new_key: &str) -> StoreResult<TranslationEntry> {
        let entry = self.editable_inner()?.change_key(old_key, new_key)?;
        self.allow(new_key)?;
        Ok(entry)
    }

    fn remove_translation(&self, key: &str) -> StoreResult<TranslationEntry> {
        self.editable_inner()?.remove_translation(key)
    }

    fn add_language(&self, language: Language) -> StoreResult<()> {
        self.editable_inner()?.add_language(language)
    }

    fn flush(&self, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        self.editable_inner()?.flush(progress)
    }

    fn reload(&self, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        self.editable_inner()?.reload(progress)
    }

    fn is_dirty(&self) -> bool {
        self.inner
            .as_editable()
            .is_some_and(|inner| inner.is_dirty())
    }
}
