//! Change events delivered to stack listeners.

use std::fmt;

use trs_store::TranslationEntry;
use trs_types::Language;

/// Discriminant of a [`StackEvent`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StackEventKind {
    NewTranslation,
    RemoveTranslation,
    UpdateTranslation,
    KeyChanged,
    NewLanguage,
    Flush,
    Reload,
}

impl fmt::Display for StackEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StackEventKind::NewTranslation => "new-translation",
            StackEventKind::RemoveTranslation => "remove-translation",
            StackEventKind::UpdateTranslation => "update-translation",
            StackEventKind::KeyChanged => "key-changed",
            StackEventKind::NewLanguage => "new-language",
            StackEventKind::Flush => "flush",
            StackEventKind::Reload => "reload",
        };
        f.write_str(name)
    }
}

/// A single change of a stack's contents.
///
/// Each variant carries only what is relevant to its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StackEvent {
    /// A translation became visible (added, or unmasked by a rename/removal).
    NewTranslation { entry: TranslationEntry },
    /// A translation was removed from its store.
    RemoveTranslation { entry: TranslationEntry },
    /// The texts of a translation changed.
    UpdateTranslation { entry: TranslationEntry },
    /// A translation was renamed; `entry` carries the new key.
    KeyChanged {
        old_key: String,
        entry: TranslationEntry,
    },
    /// A store gained a language.
    NewLanguage { language: Language },
    /// Editable stores were written to their sources.
    Flush,
    /// Editable stores were re-read from their sources.
    Reload,
}

impl StackEvent {
    pub fn kind(&self) -> StackEventKind {
        match self {
            StackEvent::NewTranslation { .. } => StackEventKind::NewTranslation,
            StackEvent::RemoveTranslation { .. } => StackEventKind::RemoveTranslation,
            StackEvent::UpdateTranslation { .. } => StackEventKind::UpdateTranslation,
            StackEvent::KeyChanged { .. } => StackEventKind::KeyChanged,
            StackEvent::NewLanguage { .. } => StackEventKind::NewLanguage,
            StackEvent::Flush => StackEventKind::Flush,
            StackEvent::Reload => StackEventKind::Reload,
        }
    }

    /// The entry the event refers to, if any.
    pub fn entry(&self) -> Option<&TranslationEntry> {
        match self {
            StackEvent::NewTranslation { entry }
            | StackEvent::RemoveTranslation { entry }
            | StackEvent::UpdateTranslation { entry }
            | StackEvent::KeyChanged { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// The key the event refers to. For [`StackEvent::KeyChanged`] this is
    /// the new key.
    pub fn key(&self) -> Option<&str> {
        self.entry().map(|e| e.key())
    }

    pub fn language(&self) -> Option<&Language> {
        match self {
            StackEvent::NewLanguage { language } => Some(language),
            _ => None,
        }
    }
}

/// Observer of stack changes.
///
/// Listeners are called synchronously on the thread that performed the
/// change, after the change is complete. Each call carries one batch: a
/// single operation, or everything recorded while the stack was in changing
/// mode, in the order it happened.
pub trait StackListener: Send + Sync {
    fn stack_changed(&self, events: &[StackEvent]);
}

impl<F> StackListener for F
where
    F: Fn(&[StackEvent]) + Send + Sync,
{
    fn stack_changed(&self, events: &[StackEvent]) {
        self(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trs_store::{BackedTranslationStore, TranslationStore};

    #[test]
    fn accessors_follow_kind() {
        let store = BackedTranslationStore::builder("s", 0.0).text("k", "v").build();
        let entry = store.get("k").unwrap().unwrap();

        let changed = StackEvent::KeyChanged {
            old_key: "old".into(),
            entry: entry.clone(),
        };
        assert_eq!(changed.kind(), StackEventKind::KeyChanged);
        assert_eq!(changed.key(), Some("k"));
        assert!(changed.language().is_none());

        let lang = StackEvent::NewLanguage {
            language: Language::DEFAULT,
        };
        assert_eq!(lang.kind(), StackEventKind::NewLanguage);
        assert!(lang.entry().is_none());
        assert_eq!(lang.language(), Some(&Language::DEFAULT));

        assert!(StackEvent::Flush.entry().is_none());
        assert_eq!(StackEvent::Reload.kind().to_string(), "reload");
    }
}
