use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Section component types a tenant can place on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionType {
    Hero,
    Testimonials,
    LogosTicker,
    WhyChooseUs,
    Blogs,
}

impl SectionType {
    pub const ALL: [SectionType; 5] = [
        SectionType::Hero,
        SectionType::Testimonials,
        SectionType::LogosTicker,
        SectionType::WhyChooseUs,
        SectionType::Blogs,
    ];

    /// Name used on the wire and as the variant prefix (`testimonials1`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "hero",
            SectionType::Testimonials => "testimonials",
            SectionType::LogosTicker => "logosTicker",
            SectionType::WhyChooseUs => "whyChooseUs",
            SectionType::Blogs => "blogs",
        }
    }

    /// Variant numbers that have a renderer
    pub fn variants(&self) -> &'static [u32] {
        &[1]
    }

    pub fn variant_name(&self, variant: u32) -> String {
        format!("{}{}", self.as_str(), variant)
    }

    /// Split a component name such as `whyChooseUs1` into its type and variant
    pub fn parse_variant(component_name: &str) -> Option<(SectionType, u32)> {
        let digits_at = component_name
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(component_name.len());
        let (prefix, number) = component_name.split_at(digits_at);
        let section_type = prefix.parse::<SectionType>().ok()?;
        let variant = if number.is_empty() {
            1
        } else {
            number.parse::<u32>().ok()?
        };
        section_type
            .variants()
            .contains(&variant)
            .then_some((section_type, variant))
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section type '{0}'")]
pub struct UnknownSectionType(pub String);

impl FromStr for SectionType {
    type Err = UnknownSectionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSectionType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("logosTicker".parse::<SectionType>().unwrap(), SectionType::LogosTicker);
        assert_eq!("whychooseus".parse::<SectionType>().unwrap(), SectionType::WhyChooseUs);
        assert!("carousel".parse::<SectionType>().is_err());
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!(
            SectionType::parse_variant("testimonials1"),
            Some((SectionType::Testimonials, 1))
        );
        assert_eq!(SectionType::parse_variant("hero"), Some((SectionType::Hero, 1)));
        assert_eq!(SectionType::parse_variant("hero7"), None);
        assert_eq!(SectionType::parse_variant("gallery1"), None);
        assert_eq!(SectionType::Blogs.variant_name(1), "blogs1");
    }

    #[test]
    fn serializes_as_camel_case() {
        let json = serde_json::to_string(&SectionType::WhyChooseUs).unwrap();
        assert_eq!(json, "\"whyChooseUs\"");
    }
}
