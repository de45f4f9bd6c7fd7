use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Id, SectionType};

/// Precedence layers, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Defaults,
    Tenant,
    Editor,
    Props,
}

/// Outcome of looking up the tenant's saved data for one render
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TenantDataStatus {
    /// Saved data for the instance was found
    Loaded,
    /// The site (or the instance on it) has no saved data
    Missing,
    /// The fetch failed and defaults were used instead
    Failed { message: String },
    /// No tenant was involved in the render
    Skipped,
}

/// Render-ready configuration for one section instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRenderData {
    pub section_type: SectionType,
    pub variant: u32,
    pub instance_id: Option<Id>,
    pub data: Value,
    /// Layers that contributed, in merge order
    pub layers: Vec<LayerKind>,
    pub tenant_status: TenantDataStatus,
    pub visible: bool,
}

impl MergedRenderData {
    pub fn component_name(&self) -> String {
        self.section_type.variant_name(self.variant)
    }
}
