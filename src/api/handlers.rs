use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::session_extractor::EditorSession;
use crate::logic::defaults::{color_fields, default_data};
use crate::logic::merge::{merge_layers, Layer};
use crate::logic::render::{RenderContext, SectionRenderer};
use crate::logic::resolve::{ComponentResolver, ResolveError, ResolveRequest};
use crate::model::{
    ColorCategory, ComponentLookup, Id, LayerKind, MergedRenderData, PostsOutcome, SectionType,
};
use crate::store::editor::{EditorError, EditorSessions, EnsureOutcome, SliceSnapshot};
use crate::store::tenant_cache::{RefreshOutcome, TenantDataStore};
use crate::store::traits::Backend;

/// Shared state of the server: the tenant cache and the live-editor sessions
pub struct AppContext<B> {
    pub tenants: TenantDataStore<B>,
    pub sessions: EditorSessions,
}

impl<B: Backend> AppContext<B> {
    pub fn new(backend: Arc<B>, session_ttl: Duration) -> Self {
        Self::with_tenant_store(TenantDataStore::new(backend), session_ttl)
    }

    pub fn with_tenant_store(tenants: TenantDataStore<B>, session_ttl: Duration) -> Self {
        Self {
            tenants,
            sessions: EditorSessions::new(session_ttl),
        }
    }

    pub fn resolver(&self) -> ComponentResolver<'_, B> {
        ComponentResolver::new(&self.tenants, &self.sessions)
    }
}

pub type AppState<B> = Arc<AppContext<B>>;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
        }
    }
}

fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

fn editor_error(e: EditorError) -> ApiError {
    let status = match e {
        EditorError::SessionNotFound(_) | EditorError::ComponentNotSeeded { .. } => StatusCode::NOT_FOUND,
        EditorError::Path(_) => StatusCode::BAD_REQUEST,
    };
    api_error(status, &e.to_string())
}

fn resolve_error(e: ResolveError) -> ApiError {
    match e {
        ResolveError::Editor(e) => editor_error(e),
        other => api_error(StatusCode::BAD_REQUEST, &other.to_string()),
    }
}

/// The session id from the body or query wins over the header
fn with_session(mut request: ResolveRequest, session: EditorSession) -> ResolveRequest {
    if request.session_id.is_none() {
        request.session_id = session.0;
    }
    request
}

fn parse_section_type(raw: &str) -> Result<SectionType, ApiError> {
    raw.parse::<SectionType>()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, &e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct ColorFieldInfo {
    pub path: &'static str,
    pub category: ColorCategory,
}

#[derive(Debug, Serialize)]
pub struct SectionInfo {
    pub section_type: SectionType,
    pub variants: Vec<String>,
    pub color_fields: Vec<ColorFieldInfo>,
}

/// GET /sections
pub async fn list_sections() -> Json<ListResponse<SectionInfo>> {
    let sections: Vec<SectionInfo> = SectionType::ALL
        .into_iter()
        .map(|section_type| SectionInfo {
            section_type,
            variants: section_type
                .variants()
                .iter()
                .map(|v| section_type.variant_name(*v))
                .collect(),
            color_fields: color_fields(section_type)
                .iter()
                .map(|field| ColorFieldInfo {
                    path: field.path,
                    category: field.category,
                })
                .collect(),
        })
        .collect();
    Json(sections.into())
}

/// GET /sections/{section_type}/defaults
pub async fn get_section_defaults(Path(section_type): Path<String>) -> Result<Json<Value>, ApiError> {
    let section_type = parse_section_type(&section_type)?;
    Ok(Json(default_data(section_type)))
}

/// GET /tenants/{tenant_id}/site
pub async fn get_tenant_site<B: Backend>(
    Path(tenant_id): Path<Id>,
    State(state): State<AppState<B>>,
) -> Result<impl IntoResponse, ApiError> {
    match state.tenants.fetch_tenant_data(&tenant_id).await {
        Ok(Some(site)) => {
            let etag = format!("\"{}\"", site.revision());
            Ok(([(header::ETAG, etag)], Json(site.as_ref().clone())))
        }
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Tenant site not found")),
        Err(e) => Err(api_error(StatusCode::BAD_GATEWAY, &format!("{:#}", e))),
    }
}

/// POST /tenants/{tenant_id}/site/refresh
pub async fn refresh_tenant_site<B: Backend>(
    Path(tenant_id): Path<Id>,
    State(state): State<AppState<B>>,
) -> Result<Json<RefreshOutcome>, ApiError> {
    state
        .tenants
        .refresh(&tenant_id)
        .await
        .map(Json)
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, &format!("{:#}", e)))
}

/// POST /tenants/{tenant_id}/resolve
pub async fn resolve_component<B: Backend>(
    Path(tenant_id): Path<Id>,
    State(state): State<AppState<B>>,
    session: EditorSession,
    RequestJson(request): RequestJson<ResolveRequest>,
) -> Result<Json<MergedRenderData>, ApiError> {
    let request = with_session(request, session);
    let resolution = state
        .resolver()
        .resolve(Some(&tenant_id), &request)
        .await
        .map_err(resolve_error)?;
    Ok(Json(resolution.merged))
}

/// Query form of a render request, used by the blogs retry button.
/// `props` travels as a JSON string.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderQuery {
    pub section_type: Option<SectionType>,
    pub component_name: Option<String>,
    pub instance_id: Option<Id>,
    pub page: Option<String>,
    pub session_id: Option<Id>,
    pub use_store: Option<bool>,
    pub props: Option<String>,
}

impl RenderQuery {
    fn into_request(self) -> Result<ResolveRequest, ApiError> {
        let props = match self.props.as_deref() {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, &format!("Invalid props: {}", e)))?,
            None => Value::Null,
        };
        let defaults = ResolveRequest::default();
        Ok(ResolveRequest {
            section_type: self.section_type,
            component_name: self.component_name,
            instance_id: self.instance_id,
            page: self.page,
            session_id: self.session_id,
            use_store: self.use_store.unwrap_or(defaults.use_store),
            props,
        })
    }

    fn from_request(request: &ResolveRequest) -> Self {
        Self {
            section_type: request.section_type,
            component_name: request.component_name.clone(),
            instance_id: request.instance_id.clone(),
            page: request.page.clone(),
            session_id: request.session_id.clone(),
            use_store: Some(request.use_store),
            props: match &request.props {
                Value::Null => None,
                props => Some(props.to_string()),
            },
        }
    }
}

/// GET URL that renders the same request again
fn retry_url(tenant_id: &str, request: &ResolveRequest) -> String {
    let mut url = match reqwest::Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return String::new(),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(["tenants", tenant_id, "render"]);
    }

    let query = RenderQuery::from_request(request);
    {
        let mut pairs = url.query_pairs_mut();
        let mut push = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                pairs.append_pair(key, value);
            }
        };
        push("sectionType", query.section_type.map(|t| t.as_str()));
        push("componentName", query.component_name.as_deref());
        push("instanceId", query.instance_id.as_deref());
        push("page", query.page.as_deref());
        push("sessionId", query.session_id.as_deref());
        push("useStore", query.use_store.map(|b| if b { "true" } else { "false" }));
        push("props", query.props.as_deref());
    }

    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}

/// POST /tenants/{tenant_id}/render
///
/// The blogs section fetches its posts here, independently of the merge;
/// a failed fetch renders the retry block instead of failing the request.
pub async fn render_component<B: Backend>(
    Path(tenant_id): Path<Id>,
    State(state): State<AppState<B>>,
    session: EditorSession,
    RequestJson(request): RequestJson<ResolveRequest>,
) -> Result<Html<String>, ApiError> {
    render_request(&state, &tenant_id, with_session(request, session)).await
}

/// GET /tenants/{tenant_id}/render
pub async fn render_component_query<B: Backend>(
    Path(tenant_id): Path<Id>,
    State(state): State<AppState<B>>,
    session: EditorSession,
    Query(query): Query<RenderQuery>,
) -> Result<Html<String>, ApiError> {
    let request = query.into_request()?;
    render_request(&state, &tenant_id, with_session(request, session)).await
}

async fn render_request<B: Backend>(
    state: &AppState<B>,
    tenant_id: &Id,
    request: ResolveRequest,
) -> Result<Html<String>, ApiError> {
    let resolution = state
        .resolver()
        .resolve(Some(tenant_id), &request)
        .await
        .map_err(resolve_error)?;

    let merged = &resolution.merged;
    let posts = if merged.visible && merged.section_type == SectionType::Blogs {
        let limit = SectionRenderer::post_limit(&merged.data);
        Some(match state.tenants.source().list_posts(tenant_id, limit).await {
            Ok(posts) => PostsOutcome::Loaded(posts),
            Err(e) => {
                log::warn!("posts for tenant '{}' unavailable: {:#}", tenant_id, e);
                PostsOutcome::Failed(e.to_string())
            }
        })
    } else {
        None
    };

    let retry_url = retry_url(tenant_id, &request);
    let ctx = RenderContext {
        posts: posts.as_ref(),
        retry_url: Some(&retry_url),
    };
    SectionRenderer::render(&resolution, &ctx)
        .map(Html)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Id,
}

/// POST /editor/sessions
pub async fn create_session<B: Backend>(
    State(state): State<AppState<B>>,
) -> (StatusCode, Json<SessionResponse>) {
    let (session_id, _) = state.sessions.create();
    (StatusCode::CREATED, Json(SessionResponse { session_id }))
}

/// DELETE /editor/sessions/{session_id}
pub async fn delete_session<B: Backend>(
    Path(session_id): Path<Id>,
    State(state): State<AppState<B>>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.teardown(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(editor_error(EditorError::SessionNotFound(session_id)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureComponentRequest {
    /// Data to seed the slice with. When omitted the slice is seeded with the
    /// section defaults, plus the tenant's saved data if a tenant is named.
    pub initial_data: Option<Value>,
    pub tenant_id: Option<Id>,
    pub page: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnsureComponentResponse {
    pub outcome: EnsureOutcome,
    pub component: SliceSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct FieldUpdate {
    pub path: String,
    pub value: Value,
}

/// Defaults with the tenant's saved data for the instance on top
async fn seed_data<B: Backend>(
    state: &AppState<B>,
    section_type: SectionType,
    instance_id: &Id,
    request: &EnsureComponentRequest,
) -> Value {
    let defaults = Layer::new(LayerKind::Defaults, default_data(section_type));
    let Some(tenant_id) = &request.tenant_id else {
        return defaults.data;
    };

    let lookup = [ComponentLookup::ById(instance_id.clone())];
    let saved = match state
        .tenants
        .find_component_data(tenant_id, section_type, &lookup, request.page.as_deref())
        .await
    {
        Ok(saved) => saved.unwrap_or(Value::Null),
        Err(e) => {
            log::warn!("seeding '{}' from defaults, tenant '{}' unavailable: {:#}", instance_id, tenant_id, e);
            Value::Null
        }
    };
    merge_layers(&[defaults, Layer::new(LayerKind::Tenant, saved)]).0
}

/// PUT /editor/sessions/{session_id}/components/{section_type}/{instance_id}
pub async fn ensure_component<B: Backend>(
    Path((session_id, section_type, instance_id)): Path<(Id, String, Id)>,
    State(state): State<AppState<B>>,
    body: Option<RequestJson<EnsureComponentRequest>>,
) -> Result<Json<EnsureComponentResponse>, ApiError> {
    let section_type = parse_section_type(&section_type)?;
    let store = state.sessions.require(&session_id).map_err(editor_error)?;

    let mut request = body.map(|RequestJson(req)| req).unwrap_or_default();
    let initial = match request.initial_data.take() {
        Some(data) => data,
        None => seed_data(&state, section_type, &instance_id, &request).await,
    };
    let outcome = store.ensure_component_variant(section_type, &instance_id, initial);
    let component = store.snapshot(section_type, &instance_id).ok_or_else(|| {
        editor_error(EditorError::ComponentNotSeeded {
            section_type,
            instance_id: instance_id.clone(),
        })
    })?;

    Ok(Json(EnsureComponentResponse { outcome, component }))
}

/// GET /editor/sessions/{session_id}/components/{section_type}/{instance_id}
pub async fn get_component<B: Backend>(
    Path((session_id, section_type, instance_id)): Path<(Id, String, Id)>,
    State(state): State<AppState<B>>,
) -> Result<Json<SliceSnapshot>, ApiError> {
    let section_type = parse_section_type(&section_type)?;
    let store = state.sessions.require(&session_id).map_err(editor_error)?;
    store
        .snapshot(section_type, &instance_id)
        .map(Json)
        .ok_or_else(|| editor_error(EditorError::ComponentNotSeeded { section_type, instance_id }))
}

/// PATCH /editor/sessions/{session_id}/components/{section_type}/{instance_id}
pub async fn update_component_field<B: Backend>(
    Path((session_id, section_type, instance_id)): Path<(Id, String, Id)>,
    State(state): State<AppState<B>>,
    RequestJson(update): RequestJson<FieldUpdate>,
) -> Result<Json<SliceSnapshot>, ApiError> {
    let section_type = parse_section_type(&section_type)?;
    let store = state.sessions.require(&session_id).map_err(editor_error)?;
    store
        .update_field(section_type, &instance_id, &update.path, update.value)
        .map_err(editor_error)?;
    store
        .snapshot(section_type, &instance_id)
        .map(Json)
        .ok_or_else(|| editor_error(EditorError::ComponentNotSeeded { section_type, instance_id }))
}

/// DELETE /editor/sessions/{session_id}/components/{section_type}/{instance_id}
pub async fn remove_component<B: Backend>(
    Path((session_id, section_type, instance_id)): Path<(Id, String, Id)>,
    State(state): State<AppState<B>>,
) -> Result<StatusCode, ApiError> {
    let section_type = parse_section_type(&section_type)?;
    let store = state.sessions.require(&session_id).map_err(editor_error)?;
    if store.remove_component(section_type, &instance_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(editor_error(EditorError::ComponentNotSeeded { section_type, instance_id }))
    }
}

/// GET /editor/sessions/{session_id}/dirty
pub async fn list_dirty_components<B: Backend>(
    Path(session_id): Path<Id>,
    State(state): State<AppState<B>>,
) -> Result<Json<ListResponse<SliceSnapshot>>, ApiError> {
    let store = state.sessions.require(&session_id).map_err(editor_error)?;
    Ok(Json(store.dirty_components().into()))
}
