//! [`StackedTranslation`]: every definition of one key across a stack.

use trs_store::TranslationEntry;
use trs_types::{is_blank, Language};

/// One store's definition of a key.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedLayer {
    pub store_identity: String,
    pub order: f64,
    pub editable: bool,
    pub entry: TranslationEntry,
}

/// All definitions of a key, highest precedence first.
///
/// The first layer is the one visible in the stack's merged view; the
/// others are overridden by it.
#[derive(Clone, Debug, PartialEq)]
pub struct StackedTranslation {
    key: String,
    layers: Vec<StackedLayer>,
}

impl StackedTranslation {
    pub fn new(key: impl Into<String>, layers: Vec<StackedLayer>) -> Self {
        Self {
            key: key.into(),
            layers,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn layers(&self) -> &[StackedLayer] {
        &self.layers
    }

    /// The visible definition.
    pub fn governing(&self) -> Option<&StackedLayer> {
        self.layers.first()
    }

    /// Returns `true` if more than one store defines the key.
    pub fn is_overridden(&self) -> bool {
        self.layers.len() > 1
    }

    pub fn defined_in(&self, store_identity: &str) -> bool {
        self.layers.iter().any(|l| l.store_identity == store_identity)
    }

    /// Layers of stores other than `store_identity` with a strictly larger
    /// order, i.e. those a definition at `order` would override.
    pub fn below<'a>(
        &'a self,
        store_identity: &'a str,
        order: f64,
    ) -> impl Iterator<Item = &'a StackedLayer> + 'a {
        self.layers
            .iter()
            .filter(move |l| l.store_identity != store_identity && l.order > order)
    }

    /// Layers of stores other than `store_identity` with a strictly smaller
    /// order, i.e. those that would override a definition at `order`.
    pub fn above<'a>(
        &'a self,
        store_identity: &'a str,
        order: f64,
    ) -> impl Iterator<Item = &'a StackedLayer> + 'a {
        self.layers
            .iter()
            .filter(move |l| l.store_identity != store_identity && l.order < order)
    }

    /// Layers of other stores sharing exactly `order`.
    pub fn beside<'a>(
        &'a self,
        store_identity: &'a str,
        order: f64,
    ) -> impl Iterator<Item = &'a StackedLayer> + 'a {
        self.layers
            .iter()
            .filter(move |l| l.store_identity != store_identity && l.order == order)
    }

    /// The text that shows through for `language` if the definition of
    /// `store_identity` at `order` had none: the first non-blank text of a
    /// lower precedence store.
    pub fn inherited_text<'a>(
        &'a self,
        language: &Language,
        store_identity: &'a str,
        order: f64,
    ) -> Option<&'a str> {
        self.below(store_identity, order)
            .filter_map(|l| l.entry.text(language))
            .find(|t| !is_blank(t))
    }
}
