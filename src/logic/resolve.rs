use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::logic::defaults::default_data;
use crate::logic::merge::{merge_layers, Layer};
use crate::model::{
    Branding, ComponentLookup, Id, LayerKind, MergedRenderData, SectionType, TenantDataStatus,
};
use crate::store::editor::{EditorError, EditorSessions};
use crate::store::tenant_cache::TenantDataStore;
use crate::store::traits::TenantSiteStore;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("either sectionType or componentName is required")]
    MissingSectionType,
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("component '{component_name}' is not a {section_type} variant")]
    MismatchedComponent {
        section_type: SectionType,
        component_name: String,
    },
    #[error(transparent)]
    Editor(#[from] EditorError),
}

/// Which instance to resolve and which layers to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub section_type: Option<SectionType>,
    /// Variant name such as `testimonials1`
    #[serde(default)]
    pub component_name: Option<String>,
    #[serde(default)]
    pub instance_id: Option<Id>,
    #[serde(default)]
    pub page: Option<String>,
    /// Live-editor session whose unsaved edits apply
    #[serde(default)]
    pub session_id: Option<Id>,
    #[serde(default = "default_use_store")]
    pub use_store: bool,
    #[serde(default)]
    pub props: Value,
}

fn default_use_store() -> bool {
    true
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            section_type: None,
            component_name: None,
            instance_id: None,
            page: None,
            session_id: None,
            use_store: default_use_store(),
            props: Value::Null,
        }
    }
}

impl ResolveRequest {
    pub fn for_section(section_type: SectionType) -> Self {
        Self {
            section_type: Some(section_type),
            ..Default::default()
        }
    }

    /// Section type and variant named by the request
    pub fn target(&self) -> Result<(SectionType, u32), ResolveError> {
        match (&self.component_name, self.section_type) {
            (Some(name), section_type) => {
                let (parsed, variant) = SectionType::parse_variant(name)
                    .ok_or_else(|| ResolveError::UnknownComponent(name.clone()))?;
                match section_type {
                    Some(expected) if expected != parsed => Err(ResolveError::MismatchedComponent {
                        section_type: expected,
                        component_name: name.clone(),
                    }),
                    _ => Ok((parsed, variant)),
                }
            }
            (None, Some(section_type)) => Ok((section_type, 1)),
            (None, None) => Err(ResolveError::MissingSectionType),
        }
    }
}

/// Merged data plus the branding it should be painted with
#[derive(Debug, Clone)]
pub struct Resolution {
    pub merged: MergedRenderData,
    pub branding: Branding,
}

/// Builds render-ready data from defaults, saved tenant data, live edits and props
pub struct ComponentResolver<'a, S> {
    tenants: &'a TenantDataStore<S>,
    sessions: &'a EditorSessions,
}

impl<'a, S: TenantSiteStore> ComponentResolver<'a, S> {
    pub fn new(tenants: &'a TenantDataStore<S>, sessions: &'a EditorSessions) -> Self {
        Self { tenants, sessions }
    }

    pub async fn resolve(
        &self,
        tenant_id: Option<&Id>,
        request: &ResolveRequest,
    ) -> Result<Resolution, ResolveError> {
        let (section_type, variant) = request.target()?;
        let component_name = section_type.variant_name(variant);
        let defaults = default_data(section_type);

        let (tenant_data, tenant_status, branding) = match tenant_id {
            Some(tenant_id) => self.tenant_layer(tenant_id, section_type, request, &component_name).await,
            None => (json!({}), TenantDataStatus::Skipped, Branding::default()),
        };

        let editor_data = match (&request.session_id, request.use_store) {
            (Some(session_id), true) => {
                let store = self.sessions.require(session_id)?;
                let key = request.instance_id.clone().unwrap_or_else(|| component_name.clone());

                let (seed, _) = merge_layers(&[
                    Layer::new(LayerKind::Defaults, defaults.clone()),
                    Layer::new(LayerKind::Tenant, tenant_data.clone()),
                ]);
                store.ensure_component_variant(section_type, &key, seed);

                // Only the fields the user wrote sit above the tenant layer
                let edits = store.edited_fields(section_type, &key);
                if edits.is_none() {
                    log::debug!("{} '{}': live slice is untouched, using tenant data", section_type, key);
                }
                edits
            }
            _ => None,
        };

        let mut layers = vec![
            Layer::new(LayerKind::Defaults, defaults),
            Layer::new(LayerKind::Tenant, tenant_data),
            Layer::new(LayerKind::Props, request.props.clone()),
        ];
        if let Some(editor_data) = editor_data {
            layers.push(Layer::new(LayerKind::Editor, editor_data));
        }
        let (data, contributed) = merge_layers(&layers);
        let visible = data.get("visible").and_then(Value::as_bool).unwrap_or(true);

        log::debug!(
            "resolved {} ({:?}) from layers {:?}",
            component_name,
            request.instance_id,
            contributed
        );

        Ok(Resolution {
            merged: MergedRenderData {
                section_type,
                variant,
                instance_id: request.instance_id.clone(),
                data,
                layers: contributed,
                tenant_status,
                visible,
            },
            branding,
        })
    }

    /// Saved data for the instance. A failed fetch falls back to an empty
    /// layer and is reported in the status rather than failing the render.
    async fn tenant_layer(
        &self,
        tenant_id: &Id,
        section_type: SectionType,
        request: &ResolveRequest,
        component_name: &str,
    ) -> (Value, TenantDataStatus, Branding) {
        // An explicit instance id is authoritative; name lookup is only used without one
        let lookup = match &request.instance_id {
            Some(id) => ComponentLookup::ById(id.clone()),
            None => ComponentLookup::ByName(component_name.to_string()),
        };

        let found = self
            .tenants
            .find_component_data(tenant_id, section_type, std::slice::from_ref(&lookup), request.page.as_deref())
            .await;
        let branding = self
            .tenants
            .cached(tenant_id)
            .map(|site| site.branding().clone())
            .unwrap_or_default();

        match found {
            Ok(Some(data)) => (data, TenantDataStatus::Loaded, branding),
            Ok(None) => (json!({}), TenantDataStatus::Missing, branding),
            Err(e) => {
                log::warn!(
                    "using defaults for {} of tenant '{}': {:#}",
                    component_name,
                    tenant_id,
                    e
                );
                (
                    json!({}),
                    TenantDataStatus::Failed {
                        message: e.to_string(),
                    },
                    branding,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComponentInstance, PageComponents, TenantSite};
    use crate::store::memory::MemoryBackend;
    use std::sync::Arc;
    use std::time::Duration;

    const TENANT: &str = "acme-homes";

    fn backend() -> Arc<MemoryBackend> {
        let mut site = TenantSite::new(TENANT);
        site.website_layout.branding.primary = Some("#0f766e".to_string());
        site.component_settings.insert(
            "homepage".to_string(),
            PageComponents::List(vec![
                ComponentInstance {
                    id: "tm-1".to_string(),
                    component_type: "testimonials".to_string(),
                    component_name: Some("testimonials1".to_string()),
                    data: json!({"content": {"title": "Stories from Riverside residents"}}),
                },
                ComponentInstance {
                    id: "why-1".to_string(),
                    component_type: "whyChooseUs".to_string(),
                    component_name: Some("whyChooseUs1".to_string()),
                    data: json!({"colors": {"title": {"value": "#111111", "useDefaultColor": false}}, "visible": false}),
                },
            ]),
        );
        let backend = Arc::new(MemoryBackend::new());
        backend.upsert_site(site);
        backend
    }

    fn request(section_type: SectionType, instance_id: &str) -> ResolveRequest {
        ResolveRequest {
            instance_id: Some(instance_id.to_string()),
            ..ResolveRequest::for_section(section_type)
        }
    }

    #[tokio::test]
    async fn defaults_only_without_tenant() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let resolver = ComponentResolver::new(&tenants, &sessions);

        for section_type in SectionType::ALL {
            let resolution = resolver
                .resolve(None, &ResolveRequest::for_section(section_type))
                .await
                .unwrap();
            assert_eq!(resolution.merged.data, default_data(section_type));
            assert_eq!(resolution.merged.layers, vec![LayerKind::Defaults]);
            assert_eq!(resolution.merged.tenant_status, TenantDataStatus::Skipped);
        }
    }

    #[tokio::test]
    async fn pristine_store_slice_does_not_mask_tenant_title() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let (session_id, store) = sessions.create();
        // The editor seeded the slice with defaults before tenant data arrived
        store.ensure_component_variant(
            SectionType::Testimonials,
            "tm-1",
            default_data(SectionType::Testimonials),
        );

        let resolver = ComponentResolver::new(&tenants, &sessions);
        let resolution = resolver
            .resolve(
                Some(&TENANT.to_string()),
                &ResolveRequest {
                    session_id: Some(session_id),
                    ..request(SectionType::Testimonials, "tm-1")
                },
            )
            .await
            .unwrap();

        assert_eq!(
            resolution.merged.data["content"]["title"],
            json!("Stories from Riverside residents")
        );
        assert_ne!(
            default_data(SectionType::Testimonials)["content"]["title"],
            json!("Stories from Riverside residents")
        );
        assert_eq!(resolution.merged.tenant_status, TenantDataStatus::Loaded);
        assert_eq!(resolution.branding.primary.as_deref(), Some("#0f766e"));
    }

    #[tokio::test]
    async fn edits_beat_tenant_and_props_beat_edits() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let (session_id, store) = sessions.create();
        let resolver = ComponentResolver::new(&tenants, &sessions);
        let tenant = TENANT.to_string();

        let base = ResolveRequest {
            session_id: Some(session_id.clone()),
            ..request(SectionType::Testimonials, "tm-1")
        };
        resolver.resolve(Some(&tenant), &base).await.unwrap();
        store
            .update_field(SectionType::Testimonials, "tm-1", "content.subtitle", json!("Edited subtitle"))
            .unwrap();

        let resolution = resolver.resolve(Some(&tenant), &base).await.unwrap();
        assert_eq!(resolution.merged.data["content"]["subtitle"], json!("Edited subtitle"));
        assert_eq!(
            resolution.merged.data["content"]["title"],
            json!("Stories from Riverside residents")
        );

        let with_props = ResolveRequest {
            props: json!({"content": {"subtitle": "Forced preview"}}),
            ..base.clone()
        };
        let resolution = resolver.resolve(Some(&tenant), &with_props).await.unwrap();
        assert_eq!(resolution.merged.data["content"]["subtitle"], json!("Forced preview"));
        assert_eq!(
            resolution.merged.layers,
            vec![LayerKind::Defaults, LayerKind::Tenant, LayerKind::Editor, LayerKind::Props]
        );
    }

    #[tokio::test]
    async fn unedited_tenant_fields_survive_an_edit() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let (session_id, store) = sessions.create();
        // Seeded with defaults only, then edited before tenant data was merged in
        store.ensure_component_variant(
            SectionType::Testimonials,
            "tm-1",
            default_data(SectionType::Testimonials),
        );
        store
            .update_field(SectionType::Testimonials, "tm-1", "content.subtitle", json!("Open house"))
            .unwrap();

        let resolver = ComponentResolver::new(&tenants, &sessions);
        let resolution = resolver
            .resolve(
                Some(&TENANT.to_string()),
                &ResolveRequest {
                    session_id: Some(session_id),
                    ..request(SectionType::Testimonials, "tm-1")
                },
            )
            .await
            .unwrap();

        assert_eq!(resolution.merged.data["content"]["subtitle"], json!("Open house"));
        assert_eq!(
            resolution.merged.data["content"]["title"],
            json!("Stories from Riverside residents")
        );
        let live = store.snapshot(SectionType::Testimonials, "tm-1").unwrap();
        assert_eq!(live.data["content"]["title"], json!("Stories from Riverside residents"));
    }

    #[test]
    fn default_request_matches_empty_json() {
        let decoded: ResolveRequest = serde_json::from_value(json!({})).unwrap();
        let built = ResolveRequest::default();
        assert!(built.use_store);
        assert_eq!(decoded.use_store, built.use_store);
        assert_eq!(decoded.props, built.props);
    }

    #[tokio::test]
    async fn store_is_ignored_when_disabled() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let (session_id, store) = sessions.create();
        store.replace_component_data(SectionType::Testimonials, "tm-1", json!({"visible": false}));

        let resolver = ComponentResolver::new(&tenants, &sessions);
        let resolution = resolver
            .resolve(
                Some(&TENANT.to_string()),
                &ResolveRequest {
                    session_id: Some(session_id),
                    use_store: false,
                    ..request(SectionType::Testimonials, "tm-1")
                },
            )
            .await
            .unwrap();
        assert!(resolution.merged.visible);
    }

    #[tokio::test]
    async fn visibility_and_missing_instances() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let resolver = ComponentResolver::new(&tenants, &sessions);
        let tenant = TENANT.to_string();

        let hidden = resolver
            .resolve(Some(&tenant), &request(SectionType::WhyChooseUs, "why-1"))
            .await
            .unwrap();
        assert!(!hidden.merged.visible);
        // Partial colors from the tenant keep the default siblings
        assert_eq!(hidden.merged.data["colors"]["title"]["value"], json!("#111111"));
        assert!(hidden.merged.data["colors"]["icon"].is_object());

        let missing = resolver
            .resolve(Some(&tenant), &request(SectionType::Hero, "hero-404"))
            .await
            .unwrap();
        assert_eq!(missing.merged.tenant_status, TenantDataStatus::Missing);
        assert_eq!(missing.merged.data, default_data(SectionType::Hero));
    }

    #[tokio::test]
    async fn lookup_by_component_name_without_id() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let resolver = ComponentResolver::new(&tenants, &sessions);

        let resolution = resolver
            .resolve(
                Some(&TENANT.to_string()),
                &ResolveRequest {
                    component_name: Some("testimonials1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resolution.merged.section_type, SectionType::Testimonials);
        assert_eq!(resolution.merged.tenant_status, TenantDataStatus::Loaded);
    }

    #[test]
    fn target_validation() {
        assert!(matches!(
            ResolveRequest::default().target(),
            Err(ResolveError::MissingSectionType)
        ));
        let mismatched = ResolveRequest {
            component_name: Some("hero1".to_string()),
            ..ResolveRequest::for_section(SectionType::Blogs)
        };
        assert!(matches!(mismatched.target(), Err(ResolveError::MismatchedComponent { .. })));
        let unknown = ResolveRequest {
            component_name: Some("pricing1".to_string()),
            ..Default::default()
        };
        assert!(matches!(unknown.target(), Err(ResolveError::UnknownComponent(_))));
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let tenants = TenantDataStore::new(backend());
        let sessions = EditorSessions::new(Duration::from_secs(60));
        let resolver = ComponentResolver::new(&tenants, &sessions);
        let result = resolver
            .resolve(
                None,
                &ResolveRequest {
                    session_id: Some("gone".to_string()),
                    ..ResolveRequest::for_section(SectionType::Hero)
                },
            )
            .await;
        assert!(matches!(result, Err(ResolveError::Editor(EditorError::SessionNotFound(_)))));
    }
}
