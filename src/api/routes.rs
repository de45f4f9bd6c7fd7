use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::handlers::{self, AppState};
use crate::store::traits::Backend;

pub fn create_router<B: Backend + 'static>() -> Router<AppState<B>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Section catalogue
        .route("/sections", get(handlers::list_sections))
        .route(
            "/sections/:section_type/defaults",
            get(handlers::get_section_defaults),
        )
        // Tenant site data
        .route("/tenants/:tenant_id/site", get(handlers::get_tenant_site::<B>))
        .route(
            "/tenants/:tenant_id/site/refresh",
            post(handlers::refresh_tenant_site::<B>),
        )
        // Resolution and rendering
        .route(
            "/tenants/:tenant_id/resolve",
            post(handlers::resolve_component::<B>),
        )
        .route(
            "/tenants/:tenant_id/render",
            post(handlers::render_component::<B>).get(handlers::render_component_query::<B>),
        )
        // Live-editor sessions
        .route("/editor/sessions", post(handlers::create_session::<B>))
        .route(
            "/editor/sessions/:session_id",
            delete(handlers::delete_session::<B>),
        )
        .route(
            "/editor/sessions/:session_id/dirty",
            get(handlers::list_dirty_components::<B>),
        )
        .route(
            "/editor/sessions/:session_id/components/:section_type/:instance_id",
            get(handlers::get_component::<B>)
                .put(handlers::ensure_component::<B>)
                .patch(handlers::update_component_field::<B>)
                .delete(handlers::remove_component::<B>),
        )
}
