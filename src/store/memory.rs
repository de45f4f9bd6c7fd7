use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::model::{BlogPost, Id, TenantSite};
use crate::store::traits::{PostStore, TenantSiteStore};

/// Backend kept entirely in memory, used for seed data and tests
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sites: RwLock<HashMap<Id, TenantSite>>,
    posts: RwLock<HashMap<Id, Vec<BlogPost>>>,
    fail_posts: AtomicBool,
    fail_sites: AtomicBool,
    site_fetches: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_site(&self, site: TenantSite) {
        self.sites.write().insert(site.tenant_id.clone(), site);
    }

    pub fn remove_site(&self, tenant_id: &Id) -> bool {
        self.sites.write().remove(tenant_id).is_some()
    }

    pub fn set_posts(&self, tenant_id: &Id, posts: Vec<BlogPost>) {
        self.posts.write().insert(tenant_id.clone(), posts);
    }

    /// Make every `list_posts` call fail until switched back
    pub fn set_posts_failing(&self, failing: bool) {
        self.fail_posts.store(failing, Ordering::SeqCst);
    }

    /// Make every `fetch_tenant_site` call fail until switched back
    pub fn set_sites_failing(&self, failing: bool) {
        self.fail_sites.store(failing, Ordering::SeqCst);
    }

    /// Number of site fetches served so far
    pub fn site_fetches(&self) -> usize {
        self.site_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TenantSiteStore for MemoryBackend {
    async fn fetch_tenant_site(&self, tenant_id: &Id) -> Result<Option<TenantSite>> {
        self.site_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_sites.load(Ordering::SeqCst) {
            return Err(anyhow!("site backend unavailable"));
        }
        Ok(self.sites.read().get(tenant_id).cloned())
    }
}

#[async_trait::async_trait]
impl PostStore for MemoryBackend {
    async fn list_posts(&self, tenant_id: &Id, limit: usize) -> Result<Vec<BlogPost>> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(anyhow!("posts backend unavailable"));
        }
        Ok(self
            .posts
            .read()
            .get(tenant_id)
            .map(|posts| posts.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str) -> BlogPost {
        BlogPost {
            id: id.to_string(),
            title: format!("Post {id}"),
            excerpt: None,
            image_url: None,
            slug: None,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn serves_sites_and_counts_fetches() {
        let backend = MemoryBackend::new();
        backend.upsert_site(TenantSite::new("t1"));

        assert!(backend.fetch_tenant_site(&"t1".to_string()).await.unwrap().is_some());
        assert!(backend.fetch_tenant_site(&"t2".to_string()).await.unwrap().is_none());
        assert_eq!(backend.site_fetches(), 2);
    }

    #[tokio::test]
    async fn posts_respect_limit_and_failure_switch() {
        let backend = MemoryBackend::new();
        let tenant = "t1".to_string();
        backend.set_posts(&tenant, vec![post("1"), post("2"), post("3")]);

        assert_eq!(backend.list_posts(&tenant, 2).await.unwrap().len(), 2);
        backend.set_posts_failing(true);
        assert!(backend.list_posts(&tenant, 2).await.is_err());
    }
}
