pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

pub use api::handlers;
pub use api::routes;

pub use logic::{
    deep_merge, default_data, merge_layers, ColorResolver, ComponentResolver, Layer, MergeError,
    RenderContext, Resolution, ResolveError, ResolveRequest, SectionRenderer,
};

pub use model::*;

pub use store::{
    Backend, EditorError, EditorLiveStore, EditorSessions, EnsureOutcome, HttpBackend,
    MemoryBackend, PostStore, TenantDataStore, TenantSiteStore,
};

use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::{AppContext, AppState};
use crate::config::AppConfig;

/// How often idle editor sessions are swept
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the application router for a backend
pub fn build_app<B: Backend + 'static>(state: AppState<B>, config: &AppConfig) -> axum::Router {
    let router = crate::api::routes::create_router::<B>();
    let router = match &config.assets.dir {
        Some(dir) => router.nest_service("/assets", tower_http::services::ServeDir::new(dir)),
        None => router,
    };
    router.with_state(state)
}

/// Serve the API for one backend until the listener fails
pub async fn serve_backend<B: Backend + 'static>(backend: Arc<B>, config: &AppConfig) -> anyhow::Result<()> {
    let state: AppState<B> = Arc::new(AppContext::with_tenant_store(
        TenantDataStore::with_max_tenants(backend, config.backend.max_cached_tenants),
        Duration::from_secs(config.editor.session_ttl_secs),
    ));

    let sweeper_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper_state.sessions.clear_expired();
            if removed > 0 {
                log::info!("dropped {} idle editor sessions", removed);
            }
        }
    });

    let app = build_app(state, config);
    let bind_address = config.server_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    log::info!("site composer listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Pick the backend named by the configuration and serve
pub async fn run_with_config(config: &AppConfig) -> anyhow::Result<()> {
    match config.backend_url() {
        Some(url) => {
            log::info!("using tenant backend at {}", url);
            let backend = HttpBackend::new(&url, Duration::from_secs(config.backend.timeout_secs))?;
            serve_backend(Arc::new(backend), config).await
        }
        None => {
            log::info!("no backend URL configured, serving seed data from memory");
            let backend = MemoryBackend::new();
            seed::load_seed_data(&backend);
            serve_backend(Arc::new(backend), config).await
        }
    }
}
