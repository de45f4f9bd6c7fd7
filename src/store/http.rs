use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::model::{BlogPost, Id, TenantSite};
use crate::store::traits::{PostStore, TenantSiteStore};

/// Backend reached over the tenant REST API
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct BackendError {
    message: Option<String>,
}

/// `/api/posts` has been seen both bare and wrapped in `{ "posts": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PostsPayload {
    Bare(Vec<BlogPost>),
    Wrapped { posts: Vec<BlogPost> },
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build backend HTTP client")?;

        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid backend URL '{}'", base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("Backend URL '{}' cannot carry a path", base_url));
        }

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Base URL with `segments` appended. Each segment is percent-encoded, so
    /// a `/`, `?` or `#` inside a tenant id stays part of that segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Backend URL '{}' cannot carry a path", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-success response into an error carrying the backend's message
    async fn error_for(response: Response, what: &str) -> anyhow::Error {
        let status = response.status();
        let message = response
            .json::<BackendError>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        anyhow!("{} failed with {}: {}", what, status.as_u16(), message)
    }
}

#[async_trait::async_trait]
impl TenantSiteStore for HttpBackend {
    async fn fetch_tenant_site(&self, tenant_id: &Id) -> Result<Option<TenantSite>> {
        if tenant_id.is_empty() || tenant_id == "." || tenant_id == ".." {
            return Err(anyhow!("Invalid tenant id '{}'", tenant_id));
        }
        let url = self.endpoint(&["v1", "tenants", tenant_id.as_str(), "website"])?;
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to reach backend for tenant '{}'", tenant_id))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response, "Tenant site fetch").await);
        }

        let mut site: TenantSite = response
            .json()
            .await
            .with_context(|| format!("Invalid site payload for tenant '{}'", tenant_id))?;
        if site.tenant_id.is_empty() {
            site.tenant_id = tenant_id.clone();
        }
        Ok(Some(site))
    }
}

#[async_trait::async_trait]
impl PostStore for HttpBackend {
    async fn list_posts(&self, tenant_id: &Id, limit: usize) -> Result<Vec<BlogPost>> {
        let url = self.endpoint(&["api", "posts"])?;
        let limit_param = limit.to_string();

        let response = self
            .client
            .get(url)
            .query(&[("tenantId", tenant_id.as_str()), ("limit", limit_param.as_str())])
            .send()
            .await
            .context("Failed to reach posts endpoint")?;

        if !response.status().is_success() {
            return Err(Self::error_for(response, "Posts fetch").await);
        }

        let payload: PostsPayload = response.json().await.context("Invalid posts payload")?;
        let mut posts = match payload {
            PostsPayload::Bare(posts) | PostsPayload::Wrapped { posts } => posts,
        };
        posts.truncate(limit);
        Ok(posts)
    }
}
