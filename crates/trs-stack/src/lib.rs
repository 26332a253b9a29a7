//! The translation store stack.
//!
//! A [`TranslationStoreStack`] aggregates stores into one deterministic view:
//! for every key, the store with the numerically smallest `order` wins, and
//! lower precedence stores still contribute the keys nobody overrides.
//! Edits go through the stack, which picks the right underlying editable
//! store and notifies [`StackListener`]s with typed [`StackEvent`]s.
//!
//! # Modules
//!
//! - [`stack`] -- ordering, override resolution, editing API
//! - [`stacked`] -- [`StackedTranslation`], every definition of one key
//! - [`event`] -- events and the listener trait
//! - [`batch`] -- the re-entrant change batch behind `set_changing`
//! - [`keygen`] -- key derivation from free text
//! - [`error`] -- [`StackError`]

pub mod batch;
pub mod error;
pub mod event;
pub mod keygen;
pub mod stack;
pub mod stacked;

pub use batch::ChangeBatch;
pub use error::{StackError, StackResult};
pub use event::{StackEvent, StackEventKind, StackListener};
pub use keygen::{key_base, unique_key, GENERATED_KEY_MAX_LEN};
pub use stack::TranslationStoreStack;
pub use stacked::{StackedLayer, StackedTranslation};
