use serde_json::Value;
use std::collections::BTreeMap;

use crate::logic::defaults::color_fields;
use crate::logic::merge::get_path;
use crate::model::{is_hex_color, Branding, ColorCategory, ColorValue, SectionType};

/// Resolves color fields of one section against the tenant's branding
#[derive(Debug, Clone)]
pub struct ColorResolver<'a> {
    section_type: SectionType,
    branding: &'a Branding,
}

impl<'a> ColorResolver<'a> {
    pub fn new(section_type: SectionType, branding: &'a Branding) -> Self {
        Self {
            section_type,
            branding,
        }
    }

    /// Category declared for a path by the section's default schema
    pub fn declared_category(&self, path: &str) -> Option<ColorCategory> {
        color_fields(self.section_type)
            .iter()
            .find(|field| field.path == path)
            .map(|field| field.category)
    }

    /// Always returns a valid hex color, whatever is (or is not) stored at `path`
    pub fn resolve(&self, data: &Value, path: &str) -> String {
        let stored = get_path(data, path)
            .cloned()
            .and_then(|raw| serde_json::from_value::<ColorValue>(raw).ok());

        if let Some(color) = &stored {
            if !color.uses_default_color() {
                if let Some(literal) = color.literal().filter(|c| is_hex_color(c)) {
                    return literal.to_string();
                }
            }
        }

        let category = stored
            .as_ref()
            .and_then(ColorValue::declared_category)
            .or_else(|| self.declared_category(path))
            .unwrap_or(ColorCategory::Primary);
        self.branding.color(category).to_string()
    }

    /// Every declared color field of the section, resolved
    pub fn resolve_all(&self, data: &Value) -> BTreeMap<&'static str, String> {
        color_fields(self.section_type)
            .iter()
            .map(|field| (field.path, self.resolve(data, field.path)))
            .collect()
    }
}
