use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::model::{ComponentLookup, Id, SectionType, TenantSite};
use crate::store::traits::TenantSiteStore;

type SiteCell = Arc<OnceCell<Option<Arc<TenantSite>>>>;

/// Tenants kept before the oldest entry is evicted
pub const DEFAULT_MAX_TENANTS: usize = 1024;

#[derive(Debug)]
struct CacheEntry {
    cell: SiteCell,
    /// Insertion order, oldest lowest
    inserted: u64,
}

/// Result of forcing a fresh fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshOutcome {
    pub revision: Option<String>,
    pub changed: bool,
}

/// Session cache of tenant sites.
///
/// A site is fetched once per tenant and shared afterwards. Callers that ask
/// for the same tenant while a fetch is in flight wait for that fetch instead
/// of issuing their own. Failed fetches and unknown tenants are not cached,
/// and at most `max_tenants` sites are kept.
#[derive(Debug)]
pub struct TenantDataStore<S> {
    source: Arc<S>,
    entries: RwLock<HashMap<Id, CacheEntry>>,
    max_tenants: usize,
    next_seq: AtomicU64,
}

impl<S: TenantSiteStore> TenantDataStore<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_max_tenants(source, DEFAULT_MAX_TENANTS)
    }

    pub fn with_max_tenants(source: Arc<S>, max_tenants: usize) -> Self {
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            max_tenants: max_tenants.max(1),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    fn cell_for(&self, tenant_id: &Id) -> SiteCell {
        if let Some(entry) = self.entries.read().get(tenant_id) {
            return entry.cell.clone();
        }
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(tenant_id) {
            return entry.cell.clone();
        }
        let cell = Arc::new(OnceCell::new());
        self.insert_entry(&mut entries, tenant_id, cell.clone());
        cell
    }

    fn insert_entry(&self, entries: &mut HashMap<Id, CacheEntry>, tenant_id: &Id, cell: SiteCell) {
        if !entries.contains_key(tenant_id) && entries.len() >= self.max_tenants {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                log::debug!("evicting tenant '{}' from the site cache", oldest);
                entries.remove(&oldest);
            }
        }
        entries.insert(
            tenant_id.clone(),
            CacheEntry {
                cell,
                inserted: self.next_seq.fetch_add(1, Ordering::Relaxed),
            },
        );
    }

    /// Drop the tenant's entry if it is still `cell` and holds no site
    fn forget_if_empty(&self, tenant_id: &Id, cell: &SiteCell) {
        let mut entries = self.entries.write();
        let stale = entries.get(tenant_id).is_some_and(|entry| {
            Arc::ptr_eq(&entry.cell, cell) && cell.get().map_or(true, Option::is_none)
        });
        if stale {
            entries.remove(tenant_id);
        }
    }

    /// Fetch a tenant's site, from cache when it has already been loaded
    pub async fn fetch_tenant_data(&self, tenant_id: &Id) -> Result<Option<Arc<TenantSite>>> {
        let cell = self.cell_for(tenant_id);
        if let Some(site) = cell.get() {
            log::debug!("tenant '{}' served from cache", tenant_id);
            return Ok(site.clone());
        }

        let fetched = cell
            .get_or_try_init(|| async {
                log::debug!("fetching site for tenant '{}'", tenant_id);
                match self.source.fetch_tenant_site(tenant_id).await {
                    Ok(site) => Ok(site.map(Arc::new)),
                    Err(e) => {
                        log::warn!("site fetch for tenant '{}' failed: {:#}", tenant_id, e);
                        Err(e)
                    }
                }
            })
            .await
            .map(Clone::clone);

        if !matches!(fetched, Ok(Some(_))) {
            self.forget_if_empty(tenant_id, &cell);
        }
        fetched
    }

    /// Number of tenants with a cache entry
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Currently cached site, without fetching
    pub fn cached(&self, tenant_id: &Id) -> Option<Arc<TenantSite>> {
        self.entries
            .read()
            .get(tenant_id)
            .and_then(|entry| entry.cell.get().cloned())
            .flatten()
    }

    /// Fetch again regardless of the cache and replace the cached entry
    pub async fn refresh(&self, tenant_id: &Id) -> Result<RefreshOutcome> {
        let previous = self.cached(tenant_id).map(|site| site.revision());
        let fresh = self.source.fetch_tenant_site(tenant_id).await?.map(Arc::new);
        let revision = fresh.as_ref().map(|site| site.revision());

        {
            let mut entries = self.entries.write();
            match fresh {
                Some(site) => {
                    let cell = Arc::new(OnceCell::new_with(Some(Some(site))));
                    entries.remove(tenant_id);
                    self.insert_entry(&mut entries, tenant_id, cell);
                }
                None => {
                    entries.remove(tenant_id);
                }
            }
        }

        let changed = previous != revision;
        if changed {
            log::info!("tenant '{}' site changed on refresh", tenant_id);
        }
        Ok(RefreshOutcome { revision, changed })
    }

    pub fn invalidate(&self, tenant_id: &Id) -> bool {
        self.entries.write().remove(tenant_id).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Saved data of one instance; `None` when the tenant or instance is unknown.
    /// Lookups are tried in order.
    pub async fn find_component_data(
        &self,
        tenant_id: &Id,
        section_type: SectionType,
        lookups: &[ComponentLookup],
        page: Option<&str>,
    ) -> Result<Option<Value>> {
        let Some(site) = self.fetch_tenant_data(tenant_id).await? else {
            return Ok(None);
        };
        Ok(lookups
            .iter()
            .find_map(|lookup| site.find_component(section_type, lookup, page))
            .map(|instance| match &instance.data {
                Value::Null => json!({}),
                data => data.clone(),
            }))
    }

    /// Saved data of one instance, or `{}` when there is none
    pub async fn component_data(
        &self,
        tenant_id: &Id,
        section_type: SectionType,
        lookup: &ComponentLookup,
        page: Option<&str>,
    ) -> Result<Value> {
        Ok(self
            .find_component_data(tenant_id, section_type, std::slice::from_ref(lookup), page)
            .await?
            .unwrap_or_else(|| json!({})))
    }
}
