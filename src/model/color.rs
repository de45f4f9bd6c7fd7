use serde::{Deserialize, Serialize};

pub const FALLBACK_PRIMARY: &str = "#1e3a8a";
pub const FALLBACK_SECONDARY: &str = "#64748b";
pub const FALLBACK_ACCENT: &str = "#f59e0b";

/// Which of the tenant's branding colors a field follows by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCategory {
    Primary,
    Secondary,
    Accent,
}

impl ColorCategory {
    pub fn fallback(&self) -> &'static str {
        match self {
            ColorCategory::Primary => FALLBACK_PRIMARY,
            ColorCategory::Secondary => FALLBACK_SECONDARY,
            ColorCategory::Accent => FALLBACK_ACCENT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "primary" => Some(ColorCategory::Primary),
            "secondary" => Some(ColorCategory::Secondary),
            "accent" => Some(ColorCategory::Accent),
            _ => None,
        }
    }
}

/// Tenant-wide color triple from `WebsiteLayout.branding`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

impl Branding {
    /// Branding color for a category, or the hardcoded fallback when the
    /// tenant has none or stored something that is not a hex color
    pub fn color(&self, category: ColorCategory) -> &str {
        let configured = match category {
            ColorCategory::Primary => self.primary.as_deref(),
            ColorCategory::Secondary => self.secondary.as_deref(),
            ColorCategory::Accent => self.accent.as_deref(),
        };
        configured
            .filter(|c| is_hex_color(c))
            .unwrap_or_else(|| category.fallback())
    }
}

/// A stored color field. Older sections store a bare hex string, newer ones
/// an object that records whether the branding color should be used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColorValue {
    Literal(String),
    #[serde(rename_all = "camelCase")]
    Field {
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        use_default_color: Option<bool>,
        #[serde(default)]
        global_color_type: Option<String>,
    },
}

impl ColorValue {
    pub fn uses_default_color(&self) -> bool {
        match self {
            ColorValue::Literal(_) => false,
            ColorValue::Field {
                use_default_color, ..
            } => use_default_color.unwrap_or(true),
        }
    }

    pub fn literal(&self) -> Option<&str> {
        match self {
            ColorValue::Literal(value) => Some(value.as_str()),
            ColorValue::Field { value, .. } => value.as_deref(),
        }
    }

    pub fn declared_category(&self) -> Option<ColorCategory> {
        match self {
            ColorValue::Literal(_) => None,
            ColorValue::Field {
                global_color_type, ..
            } => global_color_type.as_deref().and_then(ColorCategory::from_name),
        }
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`
pub fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    matches!(digits.len(), 3 | 6 | 8) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
