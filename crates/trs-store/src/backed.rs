//! [`BackedTranslationStore`]: the stock store implementation.
//!
//! The store keeps its working contents in memory behind a `RwLock` and
//! remembers the contents of the last load or flush, which makes the dirty
//! flag exact: a store is dirty iff the two differ. Persistence is delegated
//! to a [`StoreSource`].

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, info};
use trs_types::{Language, Translation};

use crate::content::StoreContent;
use crate::entry::TranslationEntry;
use crate::error::{StoreError, StoreResult};
use crate::progress::ProgressMonitor;
use crate::source::{JsonFileSource, MemorySource, StoreSource};
use crate::traits::{EditableTranslationStore, TranslationStore};

#[derive(Debug)]
struct State {
    content: StoreContent,
    snapshot: StoreContent,
}

/// A translation store loaded from, and flushed to, a [`StoreSource`].
#[derive(Debug)]
pub struct BackedTranslationStore {
    identity: Arc<str>,
    order: f64,
    editable: bool,
    source: Box<dyn StoreSource>,
    state: RwLock<State>,
    me: Weak<dyn TranslationStore>,
}

impl BackedTranslationStore {
    /// Open a store by loading its source.
    pub fn open(
        identity: impl Into<String>,
        order: f64,
        editable: bool,
        source: Box<dyn StoreSource>,
        progress: &dyn ProgressMonitor,
    ) -> StoreResult<Arc<Self>> {
        let content = source.load(progress)?;
        Ok(Self::with_content(identity, order, editable, source, content))
    }

    fn with_content(
        identity: impl Into<String>,
        order: f64,
        editable: bool,
        source: Box<dyn StoreSource>,
        content: StoreContent,
    ) -> Arc<Self> {
        let identity: Arc<str> = Arc::from(identity.into());
        debug!(store = %identity, order, editable, translations = content.translations.len(), "store opened");
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me: Weak<dyn TranslationStore> = me.clone();
            Self {
                identity,
                order,
                editable,
                source,
                state: RwLock::new(State {
                    snapshot: content.clone(),
                    content,
                }),
                me,
            }
        })
    }

    /// Open a store persisted as a JSON document at `path`.
    pub fn open_json(
        identity: impl Into<String>,
        order: f64,
        editable: bool,
        path: impl Into<PathBuf>,
        progress: &dyn ProgressMonitor,
    ) -> StoreResult<Arc<Self>> {
        Self::open(
            identity,
            order,
            editable,
            Box::new(JsonFileSource::new(path)),
            progress,
        )
    }

    /// Start building an in-memory store.
    pub fn builder(identity: impl Into<String>, order: f64) -> StoreBuilder {
        StoreBuilder {
            identity: identity.into(),
            order,
            editable: true,
            content: StoreContent::default(),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        if !self.editable {
            return Err(StoreError::ReadOnly {
                store: self.identity.to_string(),
            });
        }
        self.state
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn entry(&self, translation: Translation) -> TranslationEntry {
        TranslationEntry::new(translation, self.me.clone(), self.identity.clone())
    }
}

impl TranslationStore for BackedTranslationStore {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn order(&self) -> f64 {
        self.order
    }

    fn languages(&self) -> StoreResult<BTreeSet<Language>> {
        Ok(self.read()?.content.languages.clone())
    }

    fn entries(&self) -> StoreResult<Vec<TranslationEntry>> {
        let state = self.read()?;
        Ok(state
            .content
            .translations
            .values()
            .map(|t| self.entry(t.clone()))
            .collect())
    }

    fn get(&self, key: &str) -> StoreResult<Option<TranslationEntry>> {
        let state = self.read()?;
        Ok(state
            .content
            .translations
            .get(key)
            .map(|t| self.entry(t.clone())))
    }

    fn contains_key(&self, key: &str) -> StoreResult<bool> {
        Ok(self.read()?.content.translations.contains_key(key))
    }

    fn keys(&self) -> StoreResult<BTreeSet<String>> {
        Ok(self.read()?.content.translations.keys().cloned().collect())
    }

    fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.content.translations.len())
    }

    fn as_editable(&self) -> Option<&dyn EditableTranslationStore> {
        if self.editable {
            Some(self)
        } else {
            None
        }
    }
}

impl EditableTranslationStore for BackedTranslationStore {
    fn add_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry> {
        let mut state = self.write()?;
        state.content.add(translation, &self.identity)?;
        debug!(store = %self.identity, key = translation.key(), "translation added");
        Ok(self.entry(translation.clone()))
    }

    fn update_translation(&self, translation: &Translation) -> StoreResult<TranslationEntry> {
        let mut state = self.write()?;
        state.content.update(translation, &self.identity)?;
        debug!(store = %self.identity, key = translation.key(), "translation updated");
        Ok(self.entry(translation.clone()))
    }

    fn change_key(&self, old_key: &str, new_key: &str) -> StoreResult<TranslationEntry> {
        let mut state = self.write()?;
        let renamed = state.content.rename(old_key, new_key, &self.identity)?.clone();
        debug!(store = %self.identity, old_key, new_key, "translation key changed");
        Ok(self.entry(renamed))
    }

    fn remove_translation(&self, key: &str) -> StoreResult<TranslationEntry> {
        let mut state = self.write()?;
        let removed = state.content.remove(key, &self.identity)?;
        debug!(store = %self.identity, key, "translation removed");
        Ok(self.entry(removed))
    }

    fn add_language(&self, language: Language) -> StoreResult<()> {
        let mut state = self.write()?;
        debug!(store = %self.identity, %language, "adding language");
        state.content.add_language(language, &self.identity)
    }

    fn flush(&self, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        let mut state = self.write()?;
        self.source.save(&state.content, progress)?;
        state.snapshot = state.content.clone();
        info!(store = %self.identity, "store flushed");
        Ok(())
    }

    fn reload(&self, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        let content = self.source.load(progress)?;
        let mut state = self.write()?;
        state.snapshot = content.clone();
        state.content = content;
        info!(store = %self.identity, "store reloaded");
        Ok(())
    }

    fn is_dirty(&self) -> bool {
        self.read()
            .map(|state| state.content != state.snapshot)
            .unwrap_or(false)
    }
}

/// Builder for in-memory [`BackedTranslationStore`]s.
///
/// Languages of added translations are registered automatically. The
/// default language is *not* added implicitly.
#[derive(Debug)]
pub struct StoreBuilder {
    identity: String,
    order: f64,
    editable: bool,
    content: StoreContent,
}

impl StoreBuilder {
    pub fn language(mut self, language: Language) -> Self {
        self.content.languages.insert(language);
        self
    }

    pub fn translation(mut self, translation: Translation) -> Self {
        self.content
            .languages
            .extend(translation.languages().cloned());
        self.content
            .translations
            .insert(translation.key().to_string(), translation);
        self
    }

    /// Convenience for a translation with only a default text.
    pub fn text(self, key: &str, default_text: &str) -> Self {
        self.translation(Translation::new(key).with_text(Language::DEFAULT, default_text))
    }

    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    pub fn build(self) -> Arc<BackedTranslationStore> {
        let source = MemorySource::new(self.content.clone());
        BackedTranslationStore::with_content(
            self.identity,
            self.order,
            self.editable,
            Box::new(source),
            self.content,
        )
    }
}
