//! The store provider interface and a provider serving fixed stores.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use trs_store::{ProgressMonitor, TranslationStore};

use crate::error::ResolveResult;

/// A dependency scope through which a module sees stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Runtime,
    Test,
    Provided,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Test => "test",
            Scope::Provided => "provided",
        };
        f.write_str(name)
    }
}

/// The scopes a resolution looks through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub scopes: Vec<Scope>,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::Compile, Scope::Runtime],
        }
    }
}

impl Environment {
    pub fn new(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            scopes: scopes.into_iter().collect(),
        }
    }

    /// Every scope, tests included.
    pub fn all() -> Self {
        Self::new([Scope::Compile, Scope::Runtime, Scope::Test, Scope::Provided])
    }

    pub fn includes(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// A reference to a store published as a service, addressed by the
/// identity of the store it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceRef {
    pub identity: String,
    pub properties: BTreeMap<String, String>,
}

impl ServiceRef {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }
}

/// Supplies the stores visible from a module.
///
/// A provider may return the same logical store more than once, for
/// example once per scope it is reachable through; the registry merges
/// such duplicates.
pub trait StoreProvider: Send + Sync + fmt::Debug {
    /// Unique name used to register and unregister the provider.
    fn name(&self) -> &str;

    fn visible_stores(
        &self,
        module: &Path,
        env: &Environment,
        progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Vec<Arc<dyn TranslationStore>>>;

    /// The store behind a service reference, if this provider knows it.
    fn create_store_for_service(
        &self,
        _service: &ServiceRef,
        _progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Option<Arc<dyn TranslationStore>>> {
        Ok(None)
    }
}

#[derive(Debug)]
struct Binding {
    module: Option<PathBuf>,
    scope: Scope,
    store: Arc<dyn TranslationStore>,
}

/// A provider over stores opened up front.
///
/// Each store is bound to a scope and optionally to a module root; it is
/// visible to modules inside that root (or to every module when unbound)
/// whenever the environment includes the scope.
#[derive(Debug)]
pub struct StaticStoreProvider {
    name: String,
    bindings: Vec<Binding>,
}

impl StaticStoreProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: Vec::new(),
        }
    }

    /// Make `store` visible to every module through `scope`.
    pub fn with_store(mut self, scope: Scope, store: Arc<dyn TranslationStore>) -> Self {
        self.bindings.push(Binding {
            module: None,
            scope,
            store,
        });
        self
    }

    /// Make `store` visible through `scope` to modules under `module`.
    pub fn with_module_store(
        mut self,
        module: impl Into<PathBuf>,
        scope: Scope,
        store: Arc<dyn TranslationStore>,
    ) -> Self {
        self.bindings.push(Binding {
            module: Some(module.into()),
            scope,
            store,
        });
        self
    }
}

impl StoreProvider for StaticStoreProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn visible_stores(
        &self,
        module: &Path,
        env: &Environment,
        progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Vec<Arc<dyn TranslationStore>>> {
        progress.begin("collect translation stores", self.bindings.len());
        let stores = self
            .bindings
            .iter()
            .filter(|b| env.includes(b.scope))
            .filter(|b| b.module.as_deref().map_or(true, |root| module.starts_with(root)))
            .map(|b| b.store.clone())
            .collect();
        progress.worked(self.bindings.len());
        Ok(stores)
    }

    fn create_store_for_service(
        &self,
        service: &ServiceRef,
        _progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Option<Arc<dyn TranslationStore>>> {
        Ok(self
            .bindings
            .iter()
            .find(|b| b.store.identity() == service.identity)
            .map(|b| b.store.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trs_store::{BackedTranslationStore, NullProgress};
    use trs_types::Language;

    fn store(identity: &str) -> Arc<dyn TranslationStore> {
        BackedTranslationStore::builder(identity, 1.0)
            .language(Language::DEFAULT)
            .build()
    }

    fn identities(stores: &[Arc<dyn TranslationStore>]) -> Vec<&str> {
        stores.iter().map(|s| s.identity()).collect()
    }

    #[test]
    fn scopes_deserialize_lowercase() {
        let env: Environment = toml::from_str("scopes = [\"compile\", \"test\"]").unwrap();
        assert_eq!(env, Environment::new([Scope::Compile, Scope::Test]));
        assert_eq!(Scope::Provided.to_string(), "provided");
    }

    #[test]
    fn filters_by_scope_and_module() {
        let provider = StaticStoreProvider::new("static")
            .with_store(Scope::Compile, store("core"))
            .with_store(Scope::Test, store("fixtures"))
            .with_module_store("/ws/app", Scope::Runtime, store("app"));

        let visible = provider
            .visible_stores(Path::new("/ws/app/ui"), &Environment::default(), &NullProgress)
            .unwrap();
        assert_eq!(identities(&visible), vec!["core", "app"]);

        let visible = provider
            .visible_stores(Path::new("/ws/lib"), &Environment::all(), &NullProgress)
            .unwrap();
        assert_eq!(identities(&visible), vec!["core", "fixtures"]);
    }

    #[test]
    fn resolves_services_by_identity() {
        let provider = StaticStoreProvider::new("static").with_store(Scope::Compile, store("core"));
        let found = provider
            .create_store_for_service(&ServiceRef::new("core").with_property("kind", "json"), &NullProgress)
            .unwrap();
        assert_eq!(found.map(|s| s.identity().to_string()).as_deref(), Some("core"));
        let missing = provider
            .create_store_for_service(&ServiceRef::new("other"), &NullProgress)
            .unwrap();
        assert!(missing.is_none());
    }
}
