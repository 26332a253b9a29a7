//! Translation store contract and stock implementations.
//!
//! A store is a named, ordered provider of translation entries. Stores are
//! shared as `Arc<dyn TranslationStore>` and use interior mutability, so the
//! same store can sit in several stacks at once.
//!
//! # Capabilities
//!
//! - [`TranslationStore`] -- read access, required of every provider
//! - [`EditableTranslationStore`] -- mutation, flush and reload, reached
//!   through [`TranslationStore::as_editable`]
//!
//! # Implementations
//!
//! - [`BackedTranslationStore`] -- working copy in memory, persisted through
//!   a [`StoreSource`] ([`MemorySource`] or [`JsonFileSource`])
//! - [`FilteredTranslationStore`] -- restricts another store to a key set
//!
//! # Rules
//!
//! 1. Every store supports [`trs_types::Language::DEFAULT`].
//! 2. Every translation has a non-blank default text.
//! 3. A store holds at most one translation per key.

pub mod backed;
pub mod content;
pub mod entry;
pub mod error;
pub mod filtered;
pub mod progress;
pub mod source;
pub mod traits;

pub use backed::{BackedTranslationStore, StoreBuilder};
pub use content::StoreContent;
pub use entry::TranslationEntry;
pub use error::{StoreError, StoreResult};
pub use filtered::FilteredTranslationStore;
pub use progress::{check_cancelled, CancellableProgress, NullProgress, ProgressMonitor};
pub use source::{JsonFileSource, MemorySource, StoreSource};
pub use traits::{EditableTranslationStore, TranslationStore};
