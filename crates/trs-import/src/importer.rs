//! [`TranslationImporter`]: bulk import of a table of cells into a stack.
//!
//! The first row that names both the key column and the default language
//! column is the header. Every other header cell that parses as a language
//! becomes a language column; the rest are ignored. Data rows after the
//! header become translations when they carry a valid key and a default
//! text. Everything is merged into the stack inside one change batch.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};
use trs_stack::{StackError, TranslationStoreStack};
use trs_store::TranslationStore;
use trs_types::{is_blank, Language, Translation};
use trs_validate::validate_key;

use crate::config::ImportConfig;
use crate::error::Result;

/// Outcome of [`TranslationImporter::import`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportResult {
    /// Fewer than two rows, or no valid data row.
    NoData,
    /// No row names both the key column and the default language column.
    NoKeyOrDefaultLangColumn,
    /// This many translations were merged into the stack.
    Imported(usize),
}

/// Imports tables into a [`TranslationStoreStack`].
///
/// Diagnostics of the last import stay available through the accessors
/// until the next call to [`import`](Self::import).
#[derive(Debug)]
pub struct TranslationImporter<'a> {
    stack: &'a TranslationStoreStack,
    config: ImportConfig,
    header_row_index: Option<usize>,
    key_column_index: Option<usize>,
    default_language_column_index: Option<usize>,
    language_columns: BTreeMap<usize, Language>,
    ignored_columns: BTreeMap<usize, String>,
    duplicate_keys: BTreeSet<String>,
    invalid_row_indices: BTreeSet<usize>,
    imported_keys: Vec<String>,
}

impl<'a> TranslationImporter<'a> {
    pub fn new(stack: &'a TranslationStoreStack, config: ImportConfig) -> Self {
        Self {
            stack,
            config,
            header_row_index: None,
            key_column_index: None,
            default_language_column_index: None,
            language_columns: BTreeMap::new(),
            ignored_columns: BTreeMap::new(),
            duplicate_keys: BTreeSet::new(),
            invalid_row_indices: BTreeSet::new(),
            imported_keys: Vec::new(),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Index of the detected header row.
    pub fn header_row_index(&self) -> Option<usize> {
        self.header_row_index
    }

    pub fn key_column_index(&self) -> Option<usize> {
        self.key_column_index
    }

    pub fn default_language_column_index(&self) -> Option<usize> {
        self.default_language_column_index
    }

    /// Columns mapped to a language other than the default one.
    pub fn language_columns(&self) -> &BTreeMap<usize, Language> {
        &self.language_columns
    }

    /// Non-blank header cells that name no usable language, by column.
    pub fn ignored_columns(&self) -> &BTreeMap<usize, String> {
        &self.ignored_columns
    }

    /// Keys that occurred in more than one row. The last row won.
    pub fn duplicate_keys(&self) -> &BTreeSet<String> {
        &self.duplicate_keys
    }

    /// Data rows skipped for a missing or invalid key or a blank default text.
    pub fn invalid_row_indices(&self) -> &BTreeSet<usize> {
        &self.invalid_row_indices
    }

    /// Keys merged into the stack, in table order.
    pub fn imported_keys(&self) -> &[String] {
        &self.imported_keys
    }

    fn reset(&mut self) {
        self.header_row_index = None;
        self.key_column_index = None;
        self.default_language_column_index = None;
        self.language_columns.clear();
        self.ignored_columns.clear();
        self.duplicate_keys.clear();
        self.invalid_row_indices.clear();
        self.imported_keys.clear();
    }

    /// Parse `rows` and merge the valid ones into the stack.
    ///
    /// Row problems are recorded, not raised. An error means merging into
    /// the stack failed; translations merged before the failure stay.
    pub fn import<R, C>(&mut self, rows: &[R]) -> Result<ImportResult>
    where
        R: AsRef<[C]>,
        C: AsRef<str>,
    {
        self.reset();
        if rows.len() < 2 {
            info!(rows = rows.len(), "nothing to import");
            return Ok(ImportResult::NoData);
        }

        let mut parsed: Vec<Translation> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if self.header_row_index.is_none() {
                self.detect_header(index, row);
                continue;
            }
            let Some(translation) = self.parse_row(row) else {
                debug!(row = index, "skipping invalid row");
                self.invalid_row_indices.insert(index);
                continue;
            };
            match positions.get(translation.key()) {
                Some(&position) => {
                    debug!(row = index, key = translation.key(), "duplicate key replaces earlier row");
                    self.duplicate_keys.insert(translation.key().to_string());
                    parsed[position] = translation;
                }
                None => {
                    positions.insert(translation.key().to_string(), parsed.len());
                    parsed.push(translation);
                }
            }
        }

        if self.header_row_index.is_none() {
            warn!(
                key_column = %self.config.key_column_name,
                "no row names both the key and the default language column"
            );
            return Ok(ImportResult::NoKeyOrDefaultLangColumn);
        }
        if parsed.is_empty() {
            info!(invalid = self.invalid_row_indices.len(), "no valid rows to import");
            return Ok(ImportResult::NoData);
        }

        self.stack.set_changing(true)?;
        let merged = self.merge_all(&parsed);
        self.stack.set_changing(false)?;
        merged?;

        info!(
            imported = parsed.len(),
            duplicates = self.duplicate_keys.len(),
            invalid = self.invalid_row_indices.len(),
            "import finished"
        );
        Ok(ImportResult::Imported(parsed.len()))
    }

    fn cell<'r, C: AsRef<str>>(&self, row: &'r [C], column: usize) -> Option<&'r str> {
        let cell = row.get(column)?.as_ref();
        let cell = if self.config.trim_cells { cell.trim() } else { cell };
        (!is_blank(cell)).then_some(cell)
    }

    fn detect_header<C: AsRef<str>>(&mut self, index: usize, row: &[C]) {
        let default_language = Language::DEFAULT;
        let key_name = self.config.key_column_name.trim();
        let default_name = default_language.display_name();
        let find = |name: &str| row.iter().position(|c| c.as_ref().trim().eq_ignore_ascii_case(name));

        let (Some(key_column), Some(default_column)) = (find(key_name), find(default_name)) else {
            return;
        };
        self.header_row_index = Some(index);
        self.key_column_index = Some(key_column);
        self.default_language_column_index = Some(default_column);

        for (column, cell) in row.iter().enumerate() {
            if column == key_column || column == default_column {
                continue;
            }
            let name = cell.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match Language::parse(name) {
                Some(language)
                    if !language.is_default()
                        && !self.language_columns.values().any(|l| *l == language) =>
                {
                    self.language_columns.insert(column, language);
                }
                _ => {
                    debug!(column, name, "ignoring column");
                    self.ignored_columns.insert(column, name.to_string());
                }
            }
        }
        debug!(
            row = index,
            key_column,
            default_column,
            languages = self.language_columns.len(),
            "detected header"
        );
    }

    fn parse_row<C: AsRef<str>>(&self, row: &[C]) -> Option<Translation> {
        let key = self.cell(row, self.key_column_index?)?;
        if !validate_key(key).is_ok() {
            return None;
        }
        let default_text = self.cell(row, self.default_language_column_index?)?;

        let mut translation = Translation::new(key).with_text(Language::DEFAULT, default_text);
        for (column, language) in &self.language_columns {
            if let Some(text) = self.cell(row, *column) {
                translation.set_text(language.clone(), text);
            }
        }
        Some(translation)
    }

    fn merge_all(&mut self, translations: &[Translation]) -> Result<()> {
        for translation in translations {
            self.merge(translation)?;
            self.imported_keys.push(translation.key().to_string());
        }
        Ok(())
    }

    /// Merge one translation. A key governed by an editable store is updated
    /// there; any other key goes to the configured target store. Imported
    /// texts win over existing ones.
    fn merge(&self, imported: &Translation) -> Result<()> {
        let key = imported.key();
        let visible = self.stack.translation(key)?;
        let receiver = match &visible {
            Some(entry) => match self.stack.member(entry.store_identity()) {
                Some(store) if store.is_editable() => store.clone(),
                _ => self.target()?,
            },
            None => self.target()?,
        };

        match receiver.get(key)? {
            Some(own) => {
                let merged = own.translation().merged(imported);
                self.ensure_languages(receiver.as_ref(), &merged)?;
                self.stack.update_translation(&merged, Some(receiver.identity()))?;
            }
            None => {
                let merged = match &visible {
                    Some(entry) => entry.translation().merged(imported),
                    None => imported.clone(),
                };
                self.ensure_languages(receiver.as_ref(), &merged)?;
                self.stack.add_new_translation(&merged, Some(receiver.identity()))?;
            }
        }
        Ok(())
    }

    fn ensure_languages(&self, store: &dyn TranslationStore, translation: &Translation) -> Result<()> {
        for language in translation.languages() {
            if !store.contains_language(language)? {
                self.stack
                    .add_new_language(language.clone(), Some(store.identity()))?;
            }
        }
        Ok(())
    }

    fn target(&self) -> Result<Arc<dyn TranslationStore>> {
        let store = match self.config.target_store.as_deref() {
            Some(identity) => self
                .stack
                .member(identity)
                .ok_or_else(|| StackError::ForeignStore {
                    store: identity.to_string(),
                })?,
            None => self
                .stack
                .primary_editable_store()
                .ok_or(StackError::NoEditableStore)?,
        };
        if !store.is_editable() {
            return Err(StackError::NotEditable {
                store: store.identity().to_string(),
            }
            .into());
        }
        Ok(store.clone())
    }
}
