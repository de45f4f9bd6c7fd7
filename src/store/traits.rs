use crate::model::{BlogPost, Id, TenantSite};
use anyhow::Result;

/// Source of tenants' saved site configuration
#[async_trait::async_trait]
pub trait TenantSiteStore: Send + Sync {
    /// Fetch the full site of a tenant; `None` when the tenant has no site
    async fn fetch_tenant_site(&self, tenant_id: &Id) -> Result<Option<TenantSite>>;
}

/// Source of blog posts shown by the blogs section
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn list_posts(&self, tenant_id: &Id, limit: usize) -> Result<Vec<BlogPost>>;
}

pub trait Backend: TenantSiteStore + PostStore + Send + Sync {}
impl<T: TenantSiteStore + PostStore + Send + Sync> Backend for T {}
