use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use trs_import::ImportConfig;
use trs_resolve::{Environment, Scope};

/// Contents of `trs.toml`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrsConfig {
    pub import: ImportConfig,
    pub environment: Environment,
    pub stores: Vec<StoreConfig>,
}

/// One JSON file store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    pub identity: String,
    /// Relative paths are resolved against the configuration file.
    pub path: PathBuf,
    pub order: f64,
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default = "default_scope")]
    pub scope: Scope,
    /// Module root the store is visible to; every module when unset.
    #[serde(default)]
    pub module: Option<PathBuf>,
    /// Restrict the store to these keys.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
}

fn default_editable() -> bool {
    true
}

fn default_scope() -> Scope {
    Scope::Compile
}

impl TrsConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read configuration {}", path.display()))?;
        let mut config: TrsConfig = toml::from_str(&text)
            .with_context(|| format!("invalid configuration {}", path.display()))?;
        let base = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let base = std::path::absolute(base)
            .with_context(|| format!("cannot resolve {}", base.display()))?;
        for store in &mut config.stores {
            if store.path.is_relative() {
                store.path = base.join(&store.path);
            }
            if let Some(module) = store.module.as_mut() {
                if module.is_relative() {
                    *module = base.join(&*module);
                }
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stores_with_defaults() {
        let config: TrsConfig = toml::from_str(
            r#"
            [import]
            key_column_name = "Id"

            [[stores]]
            identity = "app"
            path = "app.json"
            order = 1.0

            [[stores]]
            identity = "vendor"
            path = "/opt/vendor.json"
            order = 10.0
            editable = false
            scope = "runtime"
            keys = ["ok", "cancel"]
            "#,
        )
        .unwrap();

        assert_eq!(config.import.key_column_name, "Id");
        assert!(config.import.trim_cells);
        assert_eq!(config.environment, Environment::default());
        assert_eq!(config.stores.len(), 2);
        assert!(config.stores[0].editable);
        assert_eq!(config.stores[0].scope, Scope::Compile);
        assert_eq!(config.stores[1].scope, Scope::Runtime);
        assert_eq!(config.stores[1].keys.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trs.toml");
        std::fs::write(
            &path,
            "[[stores]]\nidentity = \"app\"\npath = \"i18n/app.json\"\norder = 1.0\nmodule = \"app\"\n",
        )
        .unwrap();

        let config = TrsConfig::load(&path).unwrap();
        assert_eq!(config.stores[0].path, dir.path().join("i18n/app.json"));
        assert_eq!(config.stores[0].module.as_deref(), Some(dir.path().join("app").as_path()));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = TrsConfig::load(Path::new("/nonexistent/trs.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/trs.toml"));
    }
}
