//! Reconciling stores found through several resolution paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;
use trs_store::{StoreResult, TranslationStore};

/// Merge all stores sharing an identity into one, keeping the position of
/// the first occurrence.
///
/// An unfiltered store wins over a filtered view, since it is a superset.
/// Two filtered views merge into one view over the union of their keys.
pub fn combine_same_stores(
    stores: Vec<Arc<dyn TranslationStore>>,
) -> StoreResult<Vec<Arc<dyn TranslationStore>>> {
    let mut combined: Vec<Arc<dyn TranslationStore>> = Vec::with_capacity(stores.len());
    let mut positions: BTreeMap<String, usize> = BTreeMap::new();
    for store in stores {
        match positions.get(store.identity()) {
            Some(&position) => {
                debug!(store = store.identity(), "combining store found more than once");
                let merged = combine(&combined[position], store)?;
                combined[position] = merged;
            }
            None => {
                positions.insert(store.identity().to_string(), combined.len());
                combined.push(store);
            }
        }
    }
    Ok(combined)
}

fn combine(
    kept: &Arc<dyn TranslationStore>,
    other: Arc<dyn TranslationStore>,
) -> StoreResult<Arc<dyn TranslationStore>> {
    match (kept.as_filtered(), other.as_filtered()) {
        (None, _) => Ok(kept.clone()),
        (Some(_), None) => Ok(other),
        (Some(a), Some(b)) => Ok(Arc::new(a.union(b)?)),
    }
}

/// Distinct stores with the same order that define some of the same keys.
///
/// Which of them wins for those keys depends on tie-breaking only, so a
/// reordering of equal values silently changes the result.
#[derive(Clone, Debug, PartialEq)]
pub struct ImplicitOverride {
    pub order: f64,
    pub stores: Vec<String>,
    pub keys: BTreeSet<String>,
}

/// Find every group of distinct stores sharing an order value that also
/// share at least one key. Groups come out in ascending order.
pub fn having_implicit_overrides(
    stores: &[Arc<dyn TranslationStore>],
) -> StoreResult<Vec<ImplicitOverride>> {
    let mut sorted: Vec<&Arc<dyn TranslationStore>> = stores.iter().collect();
    sorted.sort_by(|a, b| a.order().total_cmp(&b.order()));

    let mut found = Vec::new();
    for group in sorted.chunk_by(|a, b| a.order() == b.order()) {
        let mut seen_identities = BTreeSet::new();
        let members: Vec<&Arc<dyn TranslationStore>> = group
            .iter()
            .copied()
            .filter(|s| seen_identities.insert(s.identity().to_string()))
            .collect();
        if members.len() < 2 {
            continue;
        }

        let mut owners: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for store in &members {
            for key in store.keys()? {
                owners
                    .entry(key)
                    .or_default()
                    .insert(store.identity().to_string());
            }
        }
        let keys: BTreeSet<String> = owners
            .into_iter()
            .filter(|(_, o)| o.len() > 1)
            .map(|(k, _)| k)
            .collect();
        if keys.is_empty() {
            continue;
        }
        found.push(ImplicitOverride {
            order: members[0].order(),
            stores: members.iter().map(|s| s.identity().to_string()).collect(),
            keys,
        });
    }
    Ok(found)
}
