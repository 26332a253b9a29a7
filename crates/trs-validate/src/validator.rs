//! Key and text validation.
//!
//! The free functions are pure: they look only at their arguments and at an
//! optional [`StackedTranslation`] describing every existing definition of
//! the key. [`TranslationValidator`] binds them to a live stack.

use std::collections::BTreeMap;

use tracing::debug;
use trs_stack::{StackError, StackResult, StackedTranslation, TranslationStoreStack};
use trs_store::TranslationStore;
use trs_types::{check_key, is_blank, Language, Translation, TypeError};

use crate::code::Validation;

/// Syntax check only: blank or pattern mismatch.
pub fn validate_key(key: &str) -> Validation {
    match check_key(key) {
        Ok(()) => Validation::Ok,
        Err(TypeError::BlankKey) => Validation::KeyEmptyError,
        Err(_) => Validation::KeyInvalidError,
    }
}

/// Validate `key` as a key about to be defined in `target`.
///
/// `stacked` holds the existing definitions of the key, if any. A definition
/// in `target` itself is an error unless `accept_existing` is set (the key is
/// the one being edited). Definitions in other stores produce override
/// warnings.
pub fn validate_new_key(
    key: &str,
    target: &dyn TranslationStore,
    stacked: Option<&StackedTranslation>,
    accept_existing: bool,
) -> Validation {
    let syntax = validate_key(key);
    if !syntax.is_ok() {
        return syntax;
    }
    let Some(stacked) = stacked else {
        return Validation::Ok;
    };

    let identity = target.identity();
    let order = target.order();
    if !accept_existing && stacked.defined_in(identity) {
        return Validation::KeyAlreadyExistsError;
    }
    if stacked.beside(identity, order).next().is_some() {
        return Validation::KeyAmbiguousSameOrderWarning;
    }

    let overrides = stacked.below(identity, order).next().is_some();
    let overridden = stacked.above(identity, order).next().is_some();
    match (overrides, overridden) {
        (true, true) => Validation::KeyOverridesAndIsOverriddenWarning,
        (true, false) => Validation::KeyOverridesOtherStoreWarning,
        (false, true) => Validation::KeyIsOverriddenByOtherStoreWarning,
        (false, false) => Validation::Ok,
    }
}

/// Validate the text `target` would hold for `language`.
///
/// An empty text is acceptable when a lower precedence store still provides
/// one for the same key (a warning, since that text becomes visible). An
/// empty default text with nothing to inherit is an error.
pub fn validate_text(
    text: &str,
    language: &Language,
    target: &dyn TranslationStore,
    stacked: Option<&StackedTranslation>,
) -> Validation {
    if !is_blank(text) {
        return Validation::Ok;
    }
    let inherited = stacked
        .and_then(|s| s.inherited_text(language, target.identity(), target.order()))
        .is_some();
    if inherited {
        Validation::TextInheritedWarning
    } else if language.is_default() {
        Validation::DefaultTranslationMissingError
    } else {
        Validation::Ok
    }
}

/// Per-field results for a whole translation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationReport {
    pub key: Validation,
    pub texts: BTreeMap<Language, Validation>,
}

impl TranslationReport {
    /// The most severe result over the key and every text.
    pub fn worst(&self) -> Validation {
        self.texts.values().fold(self.key, |acc, v| acc.worst(*v))
    }
}

/// Validate the key and every text of `translation`. The default language
/// is always checked, even when the translation has no entry for it.
pub fn validate_translation(
    translation: &Translation,
    target: &dyn TranslationStore,
    stacked: Option<&StackedTranslation>,
    accept_existing: bool,
) -> TranslationReport {
    let key = validate_new_key(translation.key(), target, stacked, accept_existing);
    let mut texts = BTreeMap::new();
    texts.insert(
        Language::DEFAULT,
        validate_text(
            translation.default_text().unwrap_or_default(),
            &Language::DEFAULT,
            target,
            stacked,
        ),
    );
    for (language, text) in translation.texts() {
        texts.insert(language.clone(), validate_text(text, language, target, stacked));
    }
    TranslationReport { key, texts }
}

/// Validation against a live stack.
///
/// The target store is addressed by identity; `None` means the stack's
/// primary editable store.
#[derive(Clone, Copy, Debug)]
pub struct TranslationValidator<'a> {
    stack: &'a TranslationStoreStack,
}

impl<'a> TranslationValidator<'a> {
    pub fn new(stack: &'a TranslationStoreStack) -> Self {
        Self { stack }
    }

    fn target(&self, target: Option<&str>) -> StackResult<&'a dyn TranslationStore> {
        let store = match target {
            Some(identity) => self.stack.member(identity).ok_or_else(|| StackError::ForeignStore {
                store: identity.to_string(),
            })?,
            None => self
                .stack
                .primary_editable_store()
                .ok_or(StackError::NoEditableStore)?,
        };
        Ok(store.as_ref())
    }

    pub fn validate_key(
        &self,
        key: &str,
        target: Option<&str>,
        accept_existing: bool,
    ) -> StackResult<Validation> {
        let store = self.target(target)?;
        let syntax = validate_key(key);
        if !syntax.is_ok() {
            return Ok(syntax);
        }
        let stacked = self.stack.stacked(key)?;
        let result = validate_new_key(key, store, stacked.as_ref(), accept_existing);
        debug!(key, store = store.identity(), code = result.code(), "validated key");
        Ok(result)
    }

    pub fn validate_text(
        &self,
        key: &str,
        language: &Language,
        text: &str,
        target: Option<&str>,
    ) -> StackResult<Validation> {
        let store = self.target(target)?;
        let stacked = if validate_key(key).is_ok() {
            self.stack.stacked(key)?
        } else {
            None
        };
        Ok(validate_text(text, language, store, stacked.as_ref()))
    }

    pub fn validate_translation(
        &self,
        translation: &Translation,
        target: Option<&str>,
        accept_existing: bool,
    ) -> StackResult<TranslationReport> {
        let store = self.target(target)?;
        let stacked = if validate_key(translation.key()).is_ok() {
            self.stack.stacked(translation.key())?
        } else {
            None
        };
        Ok(validate_translation(
            translation,
            store,
            stacked.as_ref(),
            accept_existing,
        ))
    }
}

/// Shorthand for [`TranslationValidator::validate_key`].
pub fn validate_key_in_stack(
    stack: &TranslationStoreStack,
    key: &str,
    target: Option<&str>,
    accept_existing: bool,
) -> StackResult<Validation> {
    TranslationValidator::new(stack).validate_key(key, target, accept_existing)
}

/// Shorthand for [`TranslationValidator::validate_text`].
pub fn validate_text_in_stack(
    stack: &TranslationStoreStack,
    key: &str,
    language: &Language,
    text: &str,
    target: Option<&str>,
) -> StackResult<Validation> {
    TranslationValidator::new(stack).validate_text(key, language, text, target)
}
