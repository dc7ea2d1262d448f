use crate::client::PortalApi;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Identifier of a backend-hosted option list.
pub type LookupId = i64;

/// A single entry of a lookup table, as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOption {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Process-wide cache of lookup option lists, keyed by lookup id.
///
/// The cache is dependency-injected into the session so tests can seed it
/// with fakes. Entries are populated once and never invalidated for the
/// lifetime of the process; fields referencing the same lookup id share one
/// entry. Fetch failures are *not* cached, so a field that is hidden and
/// later re-shown gets another chance to resolve its options.
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: RwLock<AHashMap<LookupId, Arc<Vec<LookupOption>>>>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached options for `id`, if already resolved.
    pub fn get(&self, id: LookupId) -> Option<Arc<Vec<LookupOption>>> {
        self.entries.read().expect("lookup cache poisoned").get(&id).cloned()
    }

    /// Inserts an option list unless one is already present; the first
    /// write wins and the resident entry is returned either way.
    pub fn insert_once(
        &self,
        id: LookupId,
        options: Vec<LookupOption>,
    ) -> Arc<Vec<LookupOption>> {
        let mut entries = self.entries.write().expect("lookup cache poisoned");
        entries
            .entry(id)
            .or_insert_with(|| Arc::new(options))
            .clone()
    }

    /// Resolves `id` through the cache, fetching from the backend on a
    /// miss. An unresolvable lookup degrades to "no options available"
    /// rather than blocking the step that references it.
    pub async fn get_or_fetch(
        &self,
        id: LookupId,
        api: &dyn PortalApi,
    ) -> Arc<Vec<LookupOption>> {
        if let Some(options) = self.get(id) {
            return options;
        }
        match api.fetch_lookup_options(id).await {
            Ok(options) => self.insert_once(id, options),
            Err(err) => {
                warn!(lookup = id, error = %err, "lookup options unavailable");
                Arc::new(Vec::new())
            }
        }
    }
}
