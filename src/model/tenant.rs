use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::model::{Branding, Id, SectionType};

/// One placed, configured section on a tenant page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInstance {
    #[serde(default)]
    pub id: Id,
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub component_name: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl ComponentInstance {
    pub fn section_type(&self) -> Option<SectionType> {
        self.component_type.parse().ok()
    }

    fn is_type(&self, section_type: SectionType) -> bool {
        self.section_type() == Some(section_type)
    }
}

/// Components on one page. The backend has served both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageComponents {
    List(Vec<ComponentInstance>),
    Keyed(BTreeMap<String, ComponentInstance>),
}

impl PageComponents {
    /// Decode one page, keeping the entries that parse
    fn lenient(page: &str, value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(PageComponents::List(
                items
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, item)| decode_instance(&format!("{}[{}]", page, i), item))
                    .collect(),
            )),
            Value::Object(items) => Some(PageComponents::Keyed(
                items
                    .into_iter()
                    .filter_map(|(key, item)| {
                        decode_instance(&format!("{}.{}", page, key), item).map(|instance| (key, instance))
                    })
                    .collect(),
            )),
            Value::Null => None,
            other => {
                log::warn!("skipping page '{}': expected a list or map, got {}", page, other);
                None
            }
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &ComponentInstance> + '_> {
        match self {
            PageComponents::List(items) => Box::new(items.iter()),
            PageComponents::Keyed(items) => Box::new(items.values()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebsiteLayout {
    #[serde(default)]
    pub branding: Branding,
}

/// A tenant's published site configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantSite {
    #[serde(default)]
    pub tenant_id: Id,
    #[serde(default, deserialize_with = "lenient_pages")]
    pub component_settings: BTreeMap<String, PageComponents>,
    /// Flat component list used by newer payloads
    #[serde(default, deserialize_with = "lenient_components", skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<ComponentInstance>,
    #[serde(rename = "WebsiteLayout", default)]
    pub website_layout: WebsiteLayout,
}

fn decode_instance(location: &str, value: Value) -> Option<ComponentInstance> {
    match serde_json::from_value(value) {
        Ok(instance) => Some(instance),
        Err(e) => {
            log::warn!("skipping component at '{}': {}", location, e);
            None
        }
    }
}

/// One malformed entry must not cost the whole site, so pages are decoded
/// entry by entry. `null` reads as no pages.
fn lenient_pages<'de, D>(deserializer: D) -> Result<BTreeMap<String, PageComponents>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(pages) => pages
            .into_iter()
            .filter_map(|(page, value)| PageComponents::lenient(&page, value).map(|c| (page, c)))
            .collect(),
        Value::Null => BTreeMap::new(),
        other => {
            log::warn!("ignoring componentSettings: expected a map, got {}", other);
            BTreeMap::new()
        }
    })
}

fn lenient_components<'de, D>(deserializer: D) -> Result<Vec<ComponentInstance>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| decode_instance(&format!("components[{}]", i), item))
            .collect(),
        Value::Null => Vec::new(),
        other => {
            log::warn!("ignoring components: expected a list, got {}", other);
            Vec::new()
        }
    })
}

/// How a consumer identifies the instance it renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentLookup {
    ById(Id),
    ByName(String),
}

/// Canonical, shape-independent view of one component on the site
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedComponent<'a> {
    /// `None` for entries from the flat `components` list
    pub page: Option<&'a str>,
    pub instance: &'a ComponentInstance,
}

impl TenantSite {
    pub fn new(tenant_id: impl Into<Id>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            ..Default::default()
        }
    }

    pub fn branding(&self) -> &Branding {
        &self.website_layout.branding
    }

    /// Every component in page order followed by the flat list
    pub fn placed_components(&self) -> Vec<PlacedComponent<'_>> {
        let paged = self.component_settings.iter().flat_map(|(page, components)| {
            components.iter().map(move |instance| PlacedComponent {
                page: Some(page.as_str()),
                instance,
            })
        });
        let flat = self
            .components
            .iter()
            .map(|instance| PlacedComponent { page: None, instance });
        paged.chain(flat).collect()
    }

    /// Find an instance of `section_type`. A page restricts the paged
    /// settings to that page; the flat list is always searched last.
    pub fn find_component(
        &self,
        section_type: SectionType,
        lookup: &ComponentLookup,
        page: Option<&str>,
    ) -> Option<&ComponentInstance> {
        self.placed_components()
            .into_iter()
            .filter(|placed| match (page, placed.page) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .map(|placed| placed.instance)
            .find(|instance| {
                instance.is_type(section_type)
                    && match lookup {
                        ComponentLookup::ById(id) => &instance.id == id,
                        ComponentLookup::ByName(name) => {
                            instance.component_name.as_deref() == Some(name.as_str())
                        }
                    }
            })
    }

    /// Stable fingerprint of the site configuration
    pub fn revision(&self) -> String {
        // serde_json maps are ordered, so the encoding is deterministic
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&encoded))
    }
}
