use serde::{Deserialize, Serialize};

/// Configuration for [`TranslationImporter`](crate::TranslationImporter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Header of the key column, matched case-insensitively.
    pub key_column_name: String,
    /// Whether surrounding whitespace is stripped from every cell.
    pub trim_cells: bool,
    /// Identity of the store receiving keys that no editable store governs.
    /// `None` means the stack's primary editable store.
    pub target_store: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            key_column_name: "Key".to_string(),
            trim_cells: true,
            target_store: None,
        }
    }
}

impl ImportConfig {
    /// Default configuration importing into `store`.
    pub fn into_store(store: impl Into<String>) -> Self {
        Self {
            target_store: Some(store.into()),
            ..Default::default()
        }
    }
}
