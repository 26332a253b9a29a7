//! Backing sources a [`BackedTranslationStore`](crate::BackedTranslationStore)
//! loads from and flushes to.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trs_types::{Language, Translation};

use crate::content::StoreContent;
use crate::error::{StoreError, StoreResult};
use crate::progress::{check_cancelled, ProgressMonitor};

/// Persistent location of a store's contents.
pub trait StoreSource: Send + Sync + fmt::Debug {
    /// Read the full contents.
    fn load(&self, progress: &dyn ProgressMonitor) -> StoreResult<StoreContent>;

    /// Replace the persisted contents.
    fn save(&self, content: &StoreContent, progress: &dyn ProgressMonitor) -> StoreResult<()>;
}

/// A source that keeps the "persisted" state in memory.
///
/// Flushing copies the working state here; reloading copies it back. Data is
/// lost when the source is dropped.
#[derive(Debug, Default)]
pub struct MemorySource {
    saved: RwLock<StoreContent>,
}

impl MemorySource {
    pub fn new(content: StoreContent) -> Self {
        Self {
            saved: RwLock::new(content),
        }
    }
}

impl StoreSource for MemorySource {
    fn load(&self, progress: &dyn ProgressMonitor) -> StoreResult<StoreContent> {
        check_cancelled(progress)?;
        let saved = self
            .saved
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(saved.clone())
    }

    fn save(&self, content: &StoreContent, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        check_cancelled(progress)?;
        let mut saved = self
            .saved
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *saved = content.clone();
        Ok(())
    }
}

/// On-disk layout of a JSON store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    languages: Vec<Language>,
    #[serde(default)]
    translations: Vec<Translation>,
}

/// A source backed by one JSON document on disk.
///
/// A missing file reads as an empty store supporting only the default
/// language; the file is created on the first flush. Writes go through a
/// temporary file in the same directory and are renamed into place.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StoreSource for JsonFileSource {
    fn load(&self, progress: &dyn ProgressMonitor) -> StoreResult<StoreContent> {
        check_cancelled(progress)?;
        if !self.path.exists() {
            debug!(path = %self.path.display(), "store file missing, starting empty");
            return Ok(StoreContent::with_default_language());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let document: JsonDocument =
            serde_json::from_str(&raw).map_err(|e| StoreError::Serialization(e.to_string()))?;
        progress.begin("load translations", document.translations.len());

        let mut content = StoreContent {
            languages: document.languages.into_iter().collect(),
            ..Default::default()
        };
        for translation in document.translations {
            // Texts imply their languages even if the header list omits them.
            content
                .languages
                .extend(translation.languages().cloned());
            if let Some(previous) = content
                .translations
                .insert(translation.key().to_string(), translation)
            {
                warn!(path = %self.path.display(), key = previous.key(), "duplicate key in store file, last one wins");
            }
            progress.worked(1);
        }
        Ok(content)
    }

    fn save(&self, content: &StoreContent, progress: &dyn ProgressMonitor) -> StoreResult<()> {
        check_cancelled(progress)?;
        let document = JsonDocument {
            languages: content.languages.iter().cloned().collect(),
            translations: content.translations.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %self.path.display(), translations = content.translations.len(), "store file written");
        Ok(())
    }
}
