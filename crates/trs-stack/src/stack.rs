//! The [`TranslationStoreStack`]: an ordered, override-resolving aggregate
//! of translation stores.
//!
//! Stores are sorted once at construction by ascending `order`; ties prefer
//! editable stores, then the identity name. A key is visible exactly once,
//! from the first store in that order that defines it.
//!
//! The stack is a monitor: every operation that reads the merged view or
//! mutates a store holds an internal lock for its duration. Listeners are
//! notified after the lock is released, on the calling thread, so they may
//! read the stack from inside the callback.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{debug, info, warn};
use trs_store::{EditableTranslationStore, ProgressMonitor, TranslationEntry, TranslationStore};
use trs_types::{check_key, Language, Translation};

use crate::batch::ChangeBatch;
use crate::error::{StackError, StackResult};
use crate::event::{StackEvent, StackListener};
use crate::keygen::{key_base, unique_key};
use crate::stacked::{StackedLayer, StackedTranslation};

fn stack_order(a: &Arc<dyn TranslationStore>, b: &Arc<dyn TranslationStore>) -> Ordering {
    a.order()
        .total_cmp(&b.order())
        .then_with(|| b.is_editable().cmp(&a.is_editable()))
        .then_with(|| a.identity().cmp(b.identity()))
}

/// Ordered aggregate of translation stores presenting one merged view.
pub struct TranslationStoreStack {
    stores: Vec<Arc<dyn TranslationStore>>,
    duplicates: Vec<(f64, String)>,
    listeners: RwLock<Vec<Arc<dyn StackListener>>>,
    batch: Mutex<ChangeBatch>,
    monitor: Mutex<()>,
}

impl fmt::Debug for TranslationStoreStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationStoreStack")
            .field(
                "stores",
                &self
                    .stores
                    .iter()
                    .map(|s| (s.identity(), s.order()))
                    .collect::<Vec<_>>(),
            )
            .field("duplicates", &self.duplicates)
            .finish()
    }
}

impl TranslationStoreStack {
    /// Build a stack from a set of stores.
    ///
    /// Stores that do not support [`Language::DEFAULT`], or whose languages
    /// cannot be read, are dropped with a warning. Duplicate
    /// `(order, identity)` pairs are kept and reported through
    /// [`duplicate_stores`](Self::duplicate_stores).
    pub fn new<I>(stores: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn TranslationStore>>,
    {
        let mut accepted: Vec<Arc<dyn TranslationStore>> = stores
            .into_iter()
            .filter(|store| match store.contains_language(&Language::DEFAULT) {
                Ok(true) => true,
                Ok(false) => {
                    warn!(store = store.identity(), "store does not support the default language, ignored");
                    false
                }
                Err(e) => {
                    warn!(store = store.identity(), error = %e, "store languages unreadable, ignored");
                    false
                }
            })
            .collect();
        accepted.sort_by(stack_order);

        let mut duplicates: Vec<(f64, String)> = Vec::new();
        {
            let mut seen: BTreeSet<(u64, &str)> = BTreeSet::new();
            for store in &accepted {
                if !seen.insert((store.order().to_bits(), store.identity())) {
                    duplicates.push((store.order(), store.identity().to_string()));
                }
            }
        }
        for (order, identity) in &duplicates {
            warn!(order, store = %identity, "duplicate store in stack");
        }

        debug!(stores = accepted.len(), "translation store stack created");
        Self {
            stores: accepted,
            duplicates,
            listeners: RwLock::new(Vec::new()),
            batch: Mutex::new(ChangeBatch::new()),
            monitor: Mutex::new(()),
        }
    }

    // ---------------------------------------------------------------
    // Stores
    // ---------------------------------------------------------------

    /// All member stores in stack order (highest precedence first).
    pub fn stores(&self) -> &[Arc<dyn TranslationStore>] {
        &self.stores
    }

    /// Editable member stores in stack order.
    pub fn editable_stores(&self) -> impl Iterator<Item = &Arc<dyn TranslationStore>> {
        self.stores.iter().filter(|s| s.is_editable())
    }

    /// The first editable store in stack order; default target of edits.
    pub fn primary_editable_store(&self) -> Option<&Arc<dyn TranslationStore>> {
        self.editable_stores().next()
    }

    /// The first member with the given identity.
    pub fn member(&self, identity: &str) -> Option<&Arc<dyn TranslationStore>> {
        self.stores.iter().find(|s| s.identity() == identity)
    }

    /// `(order, identity)` pairs that occur more than once.
    pub fn duplicate_stores(&self) -> &[(f64, String)] {
        &self.duplicates
    }

    pub fn is_editable(&self) -> bool {
        self.primary_editable_store().is_some()
    }

    /// Returns `true` if any editable store has unflushed changes.
    pub fn is_dirty(&self) -> bool {
        self.editable_stores()
            .filter_map(|s| s.as_editable())
            .any(|e| e.is_dirty())
    }

    /// Union of the languages of all stores.
    pub fn languages(&self) -> StackResult<BTreeSet<Language>> {
        self.union_languages(self.stores.iter())
    }

    /// Union of the languages of all editable stores.
    pub fn editable_languages(&self) -> StackResult<BTreeSet<Language>> {
        self.union_languages(self.editable_stores())
    }

    fn union_languages<'a>(
        &self,
        stores: impl Iterator<Item = &'a Arc<dyn TranslationStore>>,
    ) -> StackResult<BTreeSet<Language>> {
        let mut languages = BTreeSet::new();
        for store in stores {
            languages.extend(store.languages()?);
        }
        Ok(languages)
    }

    // ---------------------------------------------------------------
    // Merged view
    // ---------------------------------------------------------------

    /// Every visible entry, one per key, sorted by key.
    pub fn all_entries(&self) -> StackResult<Vec<TranslationEntry>> {
        let _monitor = self.lock_monitor()?;
        Ok(self.merged(self.stores.iter())?.into_values().collect())
    }

    /// Visible entries owned by editable stores.
    pub fn all_editable_entries(&self) -> StackResult<Vec<TranslationEntry>> {
        let _monitor = self.lock_monitor()?;
        let editable: BTreeSet<&str> = self.editable_stores().map(|s| s.identity()).collect();
        Ok(self
            .merged(self.stores.iter())?
            .into_values()
            .filter(|e| editable.contains(e.store_identity()))
            .collect())
    }

    /// Override resolution. Stores are visited from the highest order value
    /// down to the lowest, overwriting earlier entries, so the store with the
    /// smallest order wins.
    fn merged<'a>(
        &self,
        stores: impl DoubleEndedIterator<Item = &'a Arc<dyn TranslationStore>>,
    ) -> StackResult<BTreeMap<String, TranslationEntry>> {
        let mut entries = BTreeMap::new();
        for store in stores.rev() {
            for entry in store.entries()? {
                entries.insert(entry.key().to_string(), entry);
            }
        }
        Ok(entries)
    }

    /// All visible keys, sorted.
    pub fn keys(&self) -> StackResult<BTreeSet<String>> {
        let _monitor = self.lock_monitor()?;
        let mut keys = BTreeSet::new();
        for store in &self.stores {
            keys.extend(store.keys()?);
        }
        Ok(keys)
    }

    /// Number of visible keys.
    pub fn size(&self) -> StackResult<usize> {
        Ok(self.keys()?.len())
    }

    pub fn contains_key(&self, key: &str) -> StackResult<bool> {
        let _monitor = self.lock_monitor()?;
        self.contains_key_unlocked(key)
    }

    /// The visible entry for `key`.
    pub fn translation(&self, key: &str) -> StackResult<Option<TranslationEntry>> {
        let _monitor = self.lock_monitor()?;
        self.translation_unlocked(key)
    }

    /// Every definition of `key`, highest precedence first.
    pub fn stacked(&self, key: &str) -> StackResult<Option<StackedTranslation>> {
        let _monitor = self.lock_monitor()?;
        let mut layers = Vec::new();
        for store in &self.stores {
            if let Some(entry) = store.get(key)? {
                layers.push(StackedLayer {
                    store_identity: store.identity().to_string(),
                    order: store.order(),
                    editable: store.is_editable(),
                    entry,
                });
            }
        }
        if layers.is_empty() {
            return Ok(None);
        }
        Ok(Some(StackedTranslation::new(key, layers)))
    }

    fn contains_key_unlocked(&self, key: &str) -> StackResult<bool> {
        for store in &self.stores {
            if store.contains_key(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn translation_unlocked(&self, key: &str) -> StackResult<Option<TranslationEntry>> {
        for store in &self.stores {
            if let Some(entry) = store.get(key)? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// The highest precedence store defining `key`.
    fn governing_store(&self, key: &str) -> StackResult<Option<&Arc<dyn TranslationStore>>> {
        for store in &self.stores {
            if store.contains_key(key)? {
                return Ok(Some(store));
            }
        }
        Ok(None)
    }

    /// The first editable store defining `key`.
    fn editable_store_containing(&self, key: &str) -> StackResult<Option<&Arc<dyn TranslationStore>>> {
        for store in self.editable_stores() {
            if store.contains_key(key)? {
                return Ok(Some(store));
            }
        }
        Ok(None)
    }

    // ---------------------------------------------------------------
    // Editing
    // ---------------------------------------------------------------

    /// Resolve an explicit target (by identity) or the primary editable store.
    fn target_store(&self, target: Option<&str>) -> StackResult<&Arc<dyn TranslationStore>> {
        match target {
            Some(identity) => {
                let store = self.member(identity).ok_or_else(|| StackError::ForeignStore {
                    store: identity.to_string(),
                })?;
                if !store.is_editable() {
                    return Err(StackError::NotEditable {
                        store: identity.to_string(),
                    });
                }
                Ok(store)
            }
            None => self.primary_editable_store().ok_or(StackError::NoEditableStore),
        }
    }

    fn check_translation(translation: &Translation) -> StackResult<()> {
        check_key(translation.key())?;
        if !translation.has_text(&Language::DEFAULT) {
            return Err(StackError::MissingDefaultText {
                key: translation.key().to_string(),
            });
        }
        Ok(())
    }

    fn check_languages(store: &dyn TranslationStore, translation: &Translation) -> StackResult<()> {
        let supported = store.languages()?;
        if let Some(language) = translation.languages().find(|l| !supported.contains(*l)) {
            return Err(StackError::UnsupportedLanguage {
                language: language.clone(),
                store: store.identity().to_string(),
            });
        }
        Ok(())
    }

    /// Add a new translation to `target` (an identity) or the primary
    /// editable store.
    pub fn add_new_translation(
        &self,
        translation: &Translation,
        target: Option<&str>,
    ) -> StackResult<TranslationEntry> {
        self.apply(|events| {
            Self::check_translation(translation)?;
            let store = self.target_store(target)?;
            if store.contains_key(translation.key())? {
                return Err(StackError::KeyExistsInStore {
                    key: translation.key().to_string(),
                    store: store.identity().to_string(),
                });
            }
            Self::check_languages(store.as_ref(), translation)?;

            let entry = editable(store)?.add_translation(translation)?;
            events.push(StackEvent::NewTranslation {
                entry: entry.clone(),
            });
            Ok(entry)
        })
    }

    /// Replace the texts of an existing translation.
    ///
    /// Without an explicit target the first editable store defining the key
    /// receives the update.
    pub fn update_translation(
        &self,
        translation: &Translation,
        target: Option<&str>,
    ) -> StackResult<TranslationEntry> {
        self.apply(|events| {
            Self::check_translation(translation)?;
            let key = translation.key();
            let store = match target {
                Some(_) => self.target_store(target)?,
                None => self
                    .editable_store_containing(key)?
                    .ok_or_else(|| StackError::KeyNotFound { key: key.to_string() })?,
            };
            if !store.contains_key(key)? {
                return Err(StackError::KeyNotFound { key: key.to_string() });
            }
            Self::check_languages(store.as_ref(), translation)?;

            let entry = editable(store)?.update_translation(translation)?;
            events.push(StackEvent::UpdateTranslation {
                entry: entry.clone(),
            });
            Ok(entry)
        })
    }

    /// Rename a key in the store that currently governs it.
    ///
    /// If a lower precedence store also defines `old_key`, that definition
    /// becomes visible and is announced as a new translation.
    pub fn change_key(&self, old_key: &str, new_key: &str) -> StackResult<TranslationEntry> {
        self.apply(|events| {
            check_key(old_key).map_err(|_| blank_or_invalid(old_key))?;
            check_key(new_key)?;
            if self.contains_key_unlocked(new_key)? {
                return Err(StackError::KeyAlreadyResolves {
                    key: new_key.to_string(),
                });
            }
            let owner = self
                .governing_store(old_key)?
                .ok_or_else(|| StackError::KeyNotFound {
                    key: old_key.to_string(),
                })?;

            let entry = editable(owner)?.change_key(old_key, new_key)?;
            events.push(StackEvent::KeyChanged {
                old_key: old_key.to_string(),
                entry: entry.clone(),
            });
            self.push_unmasked(old_key, owner, events)?;
            Ok(entry)
        })
    }

    /// Remove keys, each from the first editable store defining it.
    ///
    /// All keys are resolved before anything is removed; an unresolvable key
    /// aborts the whole call. Lower precedence definitions that become
    /// visible are announced as new translations.
    pub fn remove_translations<I, S>(&self, keys: I) -> StackResult<Vec<TranslationEntry>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = {
            let mut seen = BTreeSet::new();
            keys.into_iter()
                .map(|k| k.as_ref().to_string())
                .filter(|k| seen.insert(k.clone()))
                .collect()
        };
        self.apply(|events| {
            let mut plan = Vec::with_capacity(keys.len());
            for key in &keys {
                if key.trim().is_empty() {
                    return Err(StackError::BlankKey);
                }
                let store = self
                    .editable_store_containing(key)?
                    .ok_or_else(|| StackError::KeyNotFound { key: key.clone() })?;
                let governed = self
                    .governing_store(key)?
                    .is_some_and(|governing| std::ptr::eq(governing, store));
                plan.push((key, store, governed));
            }

            let mut removed = Vec::with_capacity(plan.len());
            for (key, store, governed) in plan {
                let entry = editable(store)?.remove_translation(key)?;
                events.push(StackEvent::RemoveTranslation {
                    entry: entry.clone(),
                });
                removed.push(entry);
                if governed {
                    self.push_unmasked(key, store, events)?;
                }
            }
            Ok(removed)
        })
    }

    /// Announce the definition of `key` that became visible after `previous`,
    /// the store that governed it, gave it up.
    fn push_unmasked(
        &self,
        key: &str,
        previous: &Arc<dyn TranslationStore>,
        events: &mut Vec<StackEvent>,
    ) -> StackResult<()> {
        if let Some(store) = self.governing_store(key)? {
            if !std::ptr::eq(store, previous) {
                if let Some(unmasked) = store.get(key)? {
                    debug!(key, store = unmasked.store_identity(), "translation unmasked");
                    events.push(StackEvent::NewTranslation { entry: unmasked });
                }
            }
        }
        Ok(())
    }

    /// Add a language to `target` (an identity) or the primary editable store.
    pub fn add_new_language(&self, language: Language, target: Option<&str>) -> StackResult<()> {
        self.apply(|events| {
            let store = self.target_store(target)?;
            if store.contains_language(&language)? {
                return Err(StackError::LanguageExists {
                    language,
                    store: store.identity().to_string(),
                });
            }
            editable(store)?.add_language(language.clone())?;
            events.push(StackEvent::NewLanguage { language });
            Ok(())
        })
    }

    /// Flush every dirty editable store.
    pub fn flush_all(&self, progress: &dyn ProgressMonitor) -> StackResult<()> {
        self.apply(|events| {
            let dirty: Vec<&dyn EditableTranslationStore> = self
                .editable_stores()
                .filter_map(|s| s.as_editable())
                .filter(|e| e.is_dirty())
                .collect();
            progress.begin("flush translation stores", dirty.len());
            for store in dirty {
                store.flush(progress)?;
                progress.worked(1);
            }
            info!("translation stores flushed");
            events.push(StackEvent::Flush);
            Ok(())
        })
    }

    /// Reload every editable store from its source.
    pub fn reload_all(&self, progress: &dyn ProgressMonitor) -> StackResult<()> {
        self.apply(|events| {
            let stores: Vec<&dyn EditableTranslationStore> = self
                .editable_stores()
                .filter_map(|s| s.as_editable())
                .collect();
            progress.begin("reload translation stores", stores.len());
            for store in stores {
                store.reload(progress)?;
                progress.worked(1);
            }
            info!("translation stores reloaded");
            events.push(StackEvent::Reload);
            Ok(())
        })
    }

    /// Derive an unused key from free text. Empty input yields `""`.
    pub fn generate_new_key(&self, base_text: &str) -> StackResult<String> {
        let _monitor = self.lock_monitor()?;
        let base = key_base(base_text);
        unique_key(&base, |candidate| self.contains_key_unlocked(candidate))
    }

    // ---------------------------------------------------------------
    // Change notification
    // ---------------------------------------------------------------

    pub fn add_listener(&self, listener: Arc<dyn StackListener>) -> StackResult<()> {
        self.listeners
            .write()
            .map_err(|e| StackError::Poisoned(e.to_string()))?
            .push(listener);
        Ok(())
    }

    /// Remove a listener previously added. Returns `false` if it was unknown.
    pub fn remove_listener(&self, listener: &Arc<dyn StackListener>) -> StackResult<bool> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| StackError::Poisoned(e.to_string()))?;
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        Ok(listeners.len() != before)
    }

    /// Enter (`true`) or leave (`false`) changing mode.
    ///
    /// Calls nest. While in changing mode events are buffered; leaving the
    /// outermost level delivers them to every listener as one batch.
    pub fn set_changing(&self, changing: bool) -> StackResult<()> {
        let released = {
            let mut batch = self.lock_batch()?;
            if changing {
                batch.begin();
                None
            } else {
                batch.end()
            }
        };
        if let Some(events) = released {
            self.dispatch(&events);
        }
        Ok(())
    }

    pub fn is_changing(&self) -> bool {
        self.batch.lock().map(|b| b.is_batching()).unwrap_or(false)
    }

    /// Run one operation under the monitor and hand its events to the batch
    /// before the monitor is released.
    /// Events of a failed operation that already touched a store are still
    /// delivered.
    fn apply<T, F>(&self, op: F) -> StackResult<T>
    where
        F: FnOnce(&mut Vec<StackEvent>) -> StackResult<T>,
    {
        let mut events = Vec::new();
        let (result, released) = {
            let _monitor = self.lock_monitor()?;
            let result = op(&mut events);
            let released = self.lock_batch()?.record(events);
            (result, released)
        };
        if let Some(events) = released {
            self.dispatch(&events);
        }
        result
    }

    fn dispatch(&self, events: &[StackEvent]) {
        let listeners = match self.listeners.read() {
            Ok(listeners) => listeners.clone(),
            Err(e) => {
                warn!(error = %e, "listener list poisoned, events dropped");
                return;
            }
        };
        for listener in listeners {
            listener.stack_changed(events);
        }
    }

    fn lock_monitor(&self) -> StackResult<MutexGuard<'_, ()>> {
        self.monitor
            .lock()
            .map_err(|e| StackError::Poisoned(e.to_string()))
    }

    fn lock_batch(&self) -> StackResult<MutexGuard<'_, ChangeBatch>> {
        self.batch
            .lock()
            .map_err(|e| StackError::Poisoned(e.to_string()))
    }
}

fn editable(store: &Arc<dyn TranslationStore>) -> StackResult<&dyn EditableTranslationStore> {
    store.as_editable().ok_or_else(|| StackError::NotEditable {
        store: store.identity().to_string(),
    })
}

fn blank_or_invalid(key: &str) -> StackError {
    if key.trim().is_empty() {
        StackError::BlankKey
    } else {
        StackError::KeyNotFound {
            key: key.to_string(),
        }
    }
}

fn same_listener(a: &Arc<dyn StackListener>, b: &Arc<dyn StackListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::StackEventKind;
    use proptest::prelude::*;
    use trs_store::{BackedTranslationStore, NullProgress};

    fn de() -> Language {
        Language::parse("de").unwrap()
    }

    fn store(identity: &str, order: f64, texts: &[(&str, &str)]) -> Arc<dyn TranslationStore> {
        let mut builder = BackedTranslationStore::builder(identity, order).language(Language::DEFAULT);
        for (key, text) in texts {
            builder = builder.text(key, text);
        }
        builder.build()
    }

    fn read_only(identity: &str, order: f64, texts: &[(&str, &str)]) -> Arc<dyn TranslationStore> {
        let mut builder = BackedTranslationStore::builder(identity, order)
            .language(Language::DEFAULT)
            .read_only();
        for (key, text) in texts {
            builder = builder.text(key, text);
        }
        builder.build()
    }

    fn text(key: &str, default_text: &str) -> Translation {
        Translation::new(key).with_text(Language::DEFAULT, default_text)
    }

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<StackEvent>>>,
    }

    impl Recorder {
        fn kinds(&self) -> Vec<Vec<StackEventKind>> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .map(|b| b.iter().map(StackEvent::kind).collect())
                .collect()
        }
    }

    impl StackListener for Recorder {
        fn stack_changed(&self, events: &[StackEvent]) {
            self.batches.lock().unwrap().push(events.to_vec());
        }
    }

    fn recorded(stack: &TranslationStoreStack) -> Arc<Recorder> {
        let recorder = Arc::new(Recorder::default());
        stack.add_listener(recorder.clone()).unwrap();
        recorder
    }

    fn identities(stack: &TranslationStoreStack) -> Vec<&str> {
        stack.stores().iter().map(|s| s.identity()).collect()
    }

    // ---- ordering ----

    #[test]
    fn sorts_by_order_then_editable_then_identity() {
        let stack = TranslationStoreStack::new([
            store("z", 20.0, &[]),
            read_only("a-ro", 10.0, &[]),
            store("b", 10.0, &[]),
            store("a", 10.0, &[]),
            store("first", -1.0, &[]),
        ]);
        assert_eq!(identities(&stack), vec!["first", "a", "b", "a-ro", "z"]);
        assert_eq!(stack.primary_editable_store().unwrap().identity(), "first");
    }

    #[test]
    fn drops_store_without_default_language() {
        let german_only = BackedTranslationStore::builder("german", 1.0)
            .language(de())
            .build();
        let stack = TranslationStoreStack::new([german_only as Arc<dyn TranslationStore>, store("ok", 2.0, &[])]);
        assert_eq!(identities(&stack), vec!["ok"]);
    }

    #[test]
    fn duplicate_order_and_identity_is_reported_not_rejected() {
        let stack = TranslationStoreStack::new([store("same", 5.0, &[]), store("same", 5.0, &[])]);
        assert_eq!(stack.stores().len(), 2);
        assert_eq!(stack.duplicate_stores(), &[(5.0, "same".to_string())]);
    }

    #[test]
    fn duplicates_are_found_when_not_adjacent() {
        let stack = TranslationStoreStack::new([
            store("x", 5.0, &[]),
            store("y", 5.0, &[]),
            read_only("x", 5.0, &[]),
        ]);
        assert_eq!(identities(&stack), vec!["x", "y", "x"]);
        assert_eq!(stack.duplicate_stores(), &[(5.0, "x".to_string())]);
    }

    // ---- merged view ----

    #[test]
    fn lowest_order_wins_on_collision() {
        let stack = TranslationStoreStack::new([
            store("low", 30.0, &[("shared", "low"), ("only-low", "x")]),
            store("high", 10.0, &[("shared", "high")]),
            store("mid", 20.0, &[("shared", "mid"), ("only-mid", "y")]),
        ]);
        let entries = stack.all_entries().unwrap();
        let by_key: BTreeMap<_, _> = entries
            .iter()
            .map(|e| (e.key(), e.store_identity()))
            .collect();
        assert_eq!(by_key.len(), 3);
        assert_eq!(by_key["shared"], "high");
        assert_eq!(by_key["only-low"], "low");
        assert_eq!(by_key["only-mid"], "mid");

        let visible = stack.translation("shared").unwrap().unwrap();
        assert_eq!(visible.text(&Language::DEFAULT), Some("high"));
        assert_eq!(stack.size().unwrap(), 3);
    }

    #[test]
    fn stacked_lists_every_definition() {
        let stack = TranslationStoreStack::new([
            store("low", 30.0, &[("k", "low")]),
            read_only("high", 10.0, &[("k", "high")]),
        ]);
        let stacked = stack.stacked("k").unwrap().unwrap();
        assert!(stacked.is_overridden());
        assert_eq!(stacked.governing().unwrap().store_identity, "high");
        assert!(!stacked.governing().unwrap().editable);
        assert_eq!(stacked.layers()[1].order, 30.0);
        assert!(stack.stacked("missing").unwrap().is_none());
    }

    #[test]
    fn editable_entries_exclude_read_only_winners() {
        let stack = TranslationStoreStack::new([
            read_only("ro", 1.0, &[("a", "A")]),
            store("rw", 2.0, &[("a", "a"), ("b", "B")]),
        ]);
        let keys: Vec<_> = stack
            .all_editable_entries()
            .unwrap()
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn languages_are_unioned() {
        let german = BackedTranslationStore::builder("german", 1.0)
            .language(Language::DEFAULT)
            .language(de())
            .read_only()
            .build();
        let stack = TranslationStoreStack::new([german as Arc<dyn TranslationStore>, store("rw", 2.0, &[])]);
        assert_eq!(stack.languages().unwrap(), BTreeSet::from([Language::DEFAULT, de()]));
        assert_eq!(stack.editable_languages().unwrap(), BTreeSet::from([Language::DEFAULT]));
    }

    // ---- editing ----

    #[test]
    fn add_targets_primary_editable_store() {
        let stack = TranslationStoreStack::new([read_only("ro", 1.0, &[]), store("rw", 2.0, &[])]);
        let events = recorded(&stack);
        let entry = stack.add_new_translation(&text("k", "v"), None).unwrap();
        assert_eq!(entry.store_identity(), "rw");
        assert!(stack.contains_key("k").unwrap());
        assert_eq!(events.kinds(), vec![vec![StackEventKind::NewTranslation]]);
        assert!(stack.is_dirty());
    }

    #[test]
    fn add_checks_preconditions_without_side_effects() {
        let stack = TranslationStoreStack::new([
            read_only("ro", 1.0, &[]),
            store("rw", 2.0, &[("taken", "t")]),
        ]);
        let events = recorded(&stack);

        assert!(matches!(stack.add_new_translation(&text(" ", "v"), None), Err(StackError::BlankKey)));
        assert!(matches!(
            stack.add_new_translation(&text("9lives", "v"), None),
            Err(StackError::InvalidKey { .. })
        ));
        assert!(matches!(
            stack.add_new_translation(&text("k", "  "), None),
            Err(StackError::MissingDefaultText { .. })
        ));
        assert!(matches!(
            stack.add_new_translation(&text("taken", "v"), None),
            Err(StackError::KeyExistsInStore { .. })
        ));
        assert!(matches!(
            stack.add_new_translation(&text("k", "v"), Some("ro")),
            Err(StackError::NotEditable { .. })
        ));
        assert!(matches!(
            stack.add_new_translation(&text("k", "v"), Some("elsewhere")),
            Err(StackError::ForeignStore { .. })
        ));
        assert!(matches!(
            stack.add_new_translation(&text("k", "v").with_text(de(), "w"), None),
            Err(StackError::UnsupportedLanguage { .. })
        ));

        assert!(!stack.contains_key("k").unwrap());
        assert!(events.kinds().is_empty());
        assert!(!stack.is_dirty());
    }

    #[test]
    fn add_without_editable_store_fails() {
        let stack = TranslationStoreStack::new([read_only("ro", 1.0, &[])]);
        assert!(!stack.is_editable());
        assert!(matches!(
            stack.add_new_translation(&text("k", "v"), None),
            Err(StackError::NoEditableStore)
        ));
    }

    #[test]
    fn add_to_explicit_lower_store() {
        let stack = TranslationStoreStack::new([store("top", 1.0, &[("k", "top")]), store("bottom", 2.0, &[])]);
        let entry = stack.add_new_translation(&text("k", "bottom"), Some("bottom")).unwrap();
        assert_eq!(entry.store_identity(), "bottom");
        assert_eq!(stack.translation("k").unwrap().unwrap().store_identity(), "top");
    }

    #[test]
    fn update_goes_to_first_editable_store_with_key() {
        let stack = TranslationStoreStack::new([
            read_only("ro", 1.0, &[("k", "ro")]),
            store("a", 2.0, &[]),
            store("b", 3.0, &[("k", "b")]),
        ]);
        let events = recorded(&stack);
        let entry = stack.update_translation(&text("k", "changed"), None).unwrap();
        assert_eq!(entry.store_identity(), "b");
        assert_eq!(
            stack.member("b").unwrap().get("k").unwrap().unwrap().text(&Language::DEFAULT),
            Some("changed")
        );
        assert_eq!(events.kinds(), vec![vec![StackEventKind::UpdateTranslation]]);

        assert!(matches!(
            stack.update_translation(&text("k", "x"), Some("a")),
            Err(StackError::KeyNotFound { .. })
        ));
        assert!(matches!(
            stack.update_translation(&text("nope", "x"), None),
            Err(StackError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn change_key_unmasks_lower_definition() {
        let stack = TranslationStoreStack::new([
            store("top", 1.0, &[("old", "top")]),
            store("bottom", 2.0, &[("old", "bottom")]),
        ]);
        let events = recorded(&stack);
        let entry = stack.change_key("old", "new").unwrap();
        assert_eq!(entry.key(), "new");
        assert_eq!(entry.store_identity(), "top");

        let visible_old = stack.translation("old").unwrap().unwrap();
        assert_eq!(visible_old.store_identity(), "bottom");

        let batches = events.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        match &batches[0][..] {
            [StackEvent::KeyChanged { old_key, entry }, StackEvent::NewTranslation { entry: unmasked }] => {
                assert_eq!(old_key, "old");
                assert_eq!(entry.key(), "new");
                assert_eq!(unmasked.store_identity(), "bottom");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn change_key_rejects_existing_target_anywhere() {
        let stack = TranslationStoreStack::new([
            store("top", 1.0, &[("a", "A")]),
            read_only("lib", 2.0, &[("b", "B")]),
        ]);
        assert!(matches!(
            stack.change_key("a", "b"),
            Err(StackError::KeyAlreadyResolves { .. })
        ));
        assert!(matches!(stack.change_key("", "c"), Err(StackError::BlankKey)));
        assert!(matches!(stack.change_key("a", " "), Err(StackError::BlankKey)));
        assert!(matches!(stack.change_key("a", "-c"), Err(StackError::InvalidKey { .. })));
        assert!(matches!(stack.change_key("zz", "c"), Err(StackError::KeyNotFound { .. })));
        assert!(matches!(stack.change_key("b", "c"), Err(StackError::NotEditable { .. })));
        assert!(stack.contains_key("a").unwrap());
    }

    #[test]
    fn remove_is_all_or_nothing() {
        let stack = TranslationStoreStack::new([
            store("rw", 1.0, &[("a", "A")]),
            read_only("ro", 2.0, &[("b", "B")]),
        ]);
        let events = recorded(&stack);
        assert!(matches!(
            stack.remove_translations(["a", "b"]),
            Err(StackError::KeyNotFound { .. })
        ));
        assert!(stack.contains_key("a").unwrap());
        assert!(events.kinds().is_empty());
    }

    #[test]
    fn remove_uses_first_editable_store_and_unmasks() {
        let stack = TranslationStoreStack::new([
            store("top", 1.0, &[("k", "top"), ("solo", "s")]),
            store("bottom", 2.0, &[("k", "bottom")]),
        ]);
        let events = recorded(&stack);
        let removed = stack.remove_translations(["k", "solo", "k"]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].store_identity(), "top");
        assert_eq!(stack.translation("k").unwrap().unwrap().store_identity(), "bottom");
        assert!(!stack.contains_key("solo").unwrap());
        assert_eq!(
            events.kinds(),
            vec![vec![
                StackEventKind::RemoveTranslation,
                StackEventKind::NewTranslation,
                StackEventKind::RemoveTranslation,
            ]]
        );
    }

    #[test]
    fn remove_below_a_read_only_winner_unmasks_nothing() {
        let stack = TranslationStoreStack::new([
            read_only("ro", 1.0, &[("k", "fixed")]),
            store("rw", 2.0, &[("k", "mine")]),
        ]);
        let events = recorded(&stack);
        let removed = stack.remove_translations(["k"]).unwrap();
        assert_eq!(removed[0].store_identity(), "rw");
        assert_eq!(stack.translation("k").unwrap().unwrap().store_identity(), "ro");
        assert_eq!(events.kinds(), vec![vec![StackEventKind::RemoveTranslation]]);
    }

    #[test]
    fn add_new_language_once() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[])]);
        let events = recorded(&stack);
        stack.add_new_language(de(), None).unwrap();
        assert!(stack.languages().unwrap().contains(&de()));
        assert!(matches!(
            stack.add_new_language(de(), None),
            Err(StackError::LanguageExists { .. })
        ));
        let batches = events.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].language(), Some(&de()));
    }

    #[test]
    fn flush_and_reload_emit_events() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[("a", "A")])]);
        let events = recorded(&stack);

        stack.add_new_translation(&text("b", "B"), None).unwrap();
        stack.flush_all(&NullProgress).unwrap();
        assert!(!stack.is_dirty());

        stack.remove_translations(["a"]).unwrap();
        stack.reload_all(&NullProgress).unwrap();
        assert!(stack.contains_key("a").unwrap());
        assert!(stack.contains_key("b").unwrap());

        assert_eq!(
            events.kinds(),
            vec![
                vec![StackEventKind::NewTranslation],
                vec![StackEventKind::Flush],
                vec![StackEventKind::RemoveTranslation],
                vec![StackEventKind::Reload],
            ]
        );
    }

    // ---- batching ----

    #[test]
    fn changing_mode_delivers_one_batch_in_call_order() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[("old", "O")])]);
        let events = recorded(&stack);

        stack.set_changing(true).unwrap();
        stack.add_new_translation(&text("k", "v"), None).unwrap();
        stack.remove_translations(["old"]).unwrap();
        assert!(events.kinds().is_empty());
        stack.set_changing(false).unwrap();

        assert_eq!(
            events.kinds(),
            vec![vec![StackEventKind::NewTranslation, StackEventKind::RemoveTranslation]]
        );
    }

    #[test]
    fn without_changing_mode_each_operation_is_delivered() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[("old", "O")])]);
        let events = recorded(&stack);
        stack.add_new_translation(&text("k", "v"), None).unwrap();
        stack.remove_translations(["old"]).unwrap();
        assert_eq!(
            events.kinds(),
            vec![vec![StackEventKind::NewTranslation], vec![StackEventKind::RemoveTranslation]]
        );
    }

    #[test]
    fn concurrent_edits_are_recorded_in_mutation_order() {
        let stack = Arc::new(TranslationStoreStack::new([store("rw", 1.0, &[])]));
        let events = recorded(&stack);
        stack.set_changing(true).unwrap();
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let stack = Arc::clone(&stack);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let _ = stack.add_new_translation(&text("k", "v"), None);
                        let _ = stack.remove_translations(["k"]);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        stack.set_changing(false).unwrap();

        let kinds = events.kinds();
        assert_eq!(kinds.len(), 1);
        assert!(!kinds[0].is_empty());
        for (i, kind) in kinds[0].iter().enumerate() {
            let expected = if i % 2 == 0 {
                StackEventKind::NewTranslation
            } else {
                StackEventKind::RemoveTranslation
            };
            assert_eq!(*kind, expected, "event {i}");
        }
    }

    #[test]
    fn changing_mode_nests() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[])]);
        let events = recorded(&stack);
        stack.set_changing(true).unwrap();
        stack.set_changing(true).unwrap();
        stack.add_new_translation(&text("a", "A"), None).unwrap();
        stack.set_changing(false).unwrap();
        assert!(stack.is_changing());
        assert!(events.kinds().is_empty());
        stack.add_new_translation(&text("b", "B"), None).unwrap();
        stack.set_changing(false).unwrap();
        assert!(!stack.is_changing());
        assert_eq!(events.kinds().len(), 1);
        assert_eq!(events.kinds()[0].len(), 2);
    }

    #[test]
    fn listeners_may_read_the_stack() {
        let stack = Arc::new(TranslationStoreStack::new([store("rw", 1.0, &[])]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (inner, sink) = (Arc::downgrade(&stack), seen.clone());
        stack
            .add_listener(Arc::new(move |events: &[StackEvent]| {
                let stack = inner.upgrade().unwrap();
                for event in events {
                    let key = event.key().unwrap();
                    let visible = stack.contains_key(key).unwrap();
                    sink.lock().unwrap().push((key.to_string(), visible));
                }
            }))
            .unwrap();
        stack.add_new_translation(&text("k", "v"), None).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![("k".to_string(), true)]);
    }

    #[test]
    fn removed_listener_is_not_called() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[])]);
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn StackListener> = recorder.clone();
        stack.add_listener(listener.clone()).unwrap();
        assert!(stack.remove_listener(&listener).unwrap());
        assert!(!stack.remove_listener(&listener).unwrap());
        stack.add_new_translation(&text("k", "v"), None).unwrap();
        assert!(recorder.kinds().is_empty());
    }

    // ---- key generation ----

    #[test]
    fn generate_new_key_examples() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[])]);
        assert_eq!(stack.generate_new_key("Hello World").unwrap(), "HelloWorld");
        assert_eq!(stack.generate_new_key("").unwrap(), "");
    }

    #[test]
    fn generate_new_key_avoids_existing_keys() {
        let stack = TranslationStoreStack::new([store("rw", 1.0, &[]), read_only("lib", 2.0, &[("Foo", "x")])]);
        for expected in ["Foo0", "Foo1", "Foo2"] {
            let key = stack.generate_new_key("Foo").unwrap();
            assert_eq!(key, expected);
            stack.add_new_translation(&text(&key, "x"), None).unwrap();
        }
    }

    // ---- properties ----

    proptest! {
        #[test]
        fn every_key_is_attributed_to_smallest_order(
            layout in proptest::collection::vec(
                (0u8..6, proptest::collection::btree_set("[a-e]", 0..5)),
                1..6,
            )
        ) {
            let stores: Vec<Arc<dyn TranslationStore>> = layout
                .iter()
                .enumerate()
                .map(|(i, (order, keys))| {
                    let texts: Vec<(&str, &str)> = keys.iter().map(|k| (k.as_str(), "t")).collect();
                    store(&format!("s{i}"), f64::from(*order), &texts)
                })
                .collect();
            let stack = TranslationStoreStack::new(stores.clone());
            let entries = stack.all_entries().unwrap();

            let all_keys: BTreeSet<&String> = layout.iter().flat_map(|(_, keys)| keys).collect();
            prop_assert_eq!(entries.len(), all_keys.len());

            for entry in entries {
                let expected = stores
                    .iter()
                    .filter(|s| s.contains_key(entry.key()).unwrap())
                    .min_by(|a, b| stack_order(a, b))
                    .unwrap();
                prop_assert_eq!(entry.store_identity(), expected.identity());
            }
        }
    }
}
