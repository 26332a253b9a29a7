//! [`StoreRegistry`]: the explicit registry of providers and stack listeners.

use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use trs_stack::{StackListener, TranslationStoreStack};
use trs_store::{check_cancelled, ProgressMonitor, TranslationStore};

use crate::error::{ResolveError, ResolveResult};
use crate::merge::{combine_same_stores, having_implicit_overrides};
use crate::provider::{Environment, ServiceRef, StoreProvider};

/// Providers and listeners used to assemble stacks.
///
/// Stacks built by [`create_stack`](Self::create_stack) get every listener
/// registered at that time. Registering later does not affect existing
/// stacks.
#[derive(Default)]
pub struct StoreRegistry {
    providers: RwLock<Vec<Arc<dyn StoreProvider>>>,
    listeners: RwLock<Vec<Arc<dyn StackListener>>>,
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("providers", &self.provider_names())
            .field("listeners", &self.listeners.read().map(|l| l.len()).unwrap_or(0))
            .finish()
    }
}

impl StoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider. Names must be unique.
    pub fn register_provider(&self, provider: Arc<dyn StoreProvider>) -> ResolveResult<()> {
        let mut providers = self.providers_mut()?;
        if providers.iter().any(|p| p.name() == provider.name()) {
            return Err(ResolveError::DuplicateProvider(provider.name().to_string()));
        }
        debug!(provider = provider.name(), "registered store provider");
        providers.push(provider);
        Ok(())
    }

    /// Remove the provider called `name`. Returns `false` if there was none.
    pub fn unregister_provider(&self, name: &str) -> ResolveResult<bool> {
        let mut providers = self.providers_mut()?;
        let before = providers.len();
        providers.retain(|p| p.name() != name);
        Ok(providers.len() != before)
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .read()
            .map(|p| p.iter().map(|p| p.name().to_string()).collect())
            .unwrap_or_default()
    }

    pub fn register_listener(&self, listener: Arc<dyn StackListener>) -> ResolveResult<()> {
        self.listeners
            .write()
            .map_err(|e| ResolveError::Poisoned(e.to_string()))?
            .push(listener);
        Ok(())
    }

    /// Remove a listener by identity. Returns `false` if it was not registered.
    pub fn unregister_listener(&self, listener: &Arc<dyn StackListener>) -> ResolveResult<bool> {
        let mut listeners = self
            .listeners
            .write()
            .map_err(|e| ResolveError::Poisoned(e.to_string()))?;
        let before = listeners.len();
        listeners.retain(|l| !std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)));
        Ok(listeners.len() != before)
    }

    /// Every store visible from `module`, with stores found more than once
    /// combined. A failing provider is logged and skipped.
    pub fn visible_stores(
        &self,
        module: &Path,
        env: &Environment,
        progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Vec<Arc<dyn TranslationStore>>> {
        let providers = self.providers()?.clone();
        let mut stores = Vec::new();
        for provider in &providers {
            check_cancelled(progress)?;
            match provider.visible_stores(module, env, progress) {
                Ok(found) => {
                    debug!(provider = provider.name(), stores = found.len(), "provider resolved");
                    stores.extend(found);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "skipping failing store provider");
                }
            }
        }
        Ok(combine_same_stores(stores)?)
    }

    /// Resolve, combine and stack the stores visible from `module`, and
    /// attach every registered listener.
    pub fn create_stack(
        &self,
        module: &Path,
        env: &Environment,
        progress: &dyn ProgressMonitor,
    ) -> ResolveResult<TranslationStoreStack> {
        let stores = self.visible_stores(module, env, progress)?;
        for found in having_implicit_overrides(&stores)? {
            warn!(
                order = found.order,
                stores = ?found.stores,
                keys = found.keys.len(),
                "stores with equal order override each other implicitly"
            );
        }

        let stack = TranslationStoreStack::new(stores);
        let listeners = self
            .listeners
            .read()
            .map_err(|e| ResolveError::Poisoned(e.to_string()))?
            .clone();
        for listener in listeners {
            stack.add_listener(listener)?;
        }
        info!(
            module = %module.display(),
            stores = stack.stores().len(),
            editable = stack.is_editable(),
            "created translation store stack"
        );
        Ok(stack)
    }

    /// Ask every provider in registration order for the store behind
    /// `service`; the first answer wins.
    pub fn create_store_for_service(
        &self,
        service: &ServiceRef,
        progress: &dyn ProgressMonitor,
    ) -> ResolveResult<Option<Arc<dyn TranslationStore>>> {
        let providers = self.providers()?.clone();
        for provider in &providers {
            match provider.create_store_for_service(service, progress) {
                Ok(Some(store)) => return Ok(Some(store)),
                Ok(None) => {}
                Err(e) => {
                    warn!(provider = provider.name(), service = %service.identity, error = %e, "provider failed to create store");
                }
            }
        }
        Ok(None)
    }

    fn providers(&self) -> ResolveResult<RwLockReadGuard<'_, Vec<Arc<dyn StoreProvider>>>> {
        self.providers
            .read()
            .map_err(|e| ResolveError::Poisoned(e.to_string()))
    }

    fn providers_mut(&self) -> ResolveResult<RwLockWriteGuard<'_, Vec<Arc<dyn StoreProvider>>>> {
        self.providers
            .write()
            .map_err(|e| ResolveError::Poisoned(e.to_string()))
    }
}
