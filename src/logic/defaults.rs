//! Default data for every section type.
//!
//! Each provider returns a complete configuration: every field a renderer
//! reads has a value here, so tenant, editor and prop layers only ever need
//! to carry the fields they change.

use serde_json::{json, Value};

use crate::model::{ColorCategory, SectionType};

/// A color field and the branding color it follows by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorField {
    pub path: &'static str,
    pub category: ColorCategory,
}

const fn field(path: &'static str, category: ColorCategory) -> ColorField {
    ColorField { path, category }
}

use ColorCategory::{Accent, Primary, Secondary};

const HERO_COLORS: &[ColorField] = &[
    field("colors.title", Primary),
    field("colors.subtitle", Secondary),
    field("colors.button", Primary),
    field("colors.buttonText", Secondary),
    field("colors.overlay", Primary),
];

const TESTIMONIALS_COLORS: &[ColorField] = &[
    field("colors.background", Secondary),
    field("colors.title", Primary),
    field("colors.subtitle", Secondary),
    field("colors.cardBackground", Secondary),
    field("colors.quote", Secondary),
    field("colors.rating", Accent),
];

const LOGOS_TICKER_COLORS: &[ColorField] = &[
    field("colors.background", Secondary),
    field("colors.title", Primary),
    field("colors.subtitle", Secondary),
];

const WHY_CHOOSE_US_COLORS: &[ColorField] = &[
    field("colors.background", Secondary),
    field("colors.title", Primary),
    field("colors.subtitle", Secondary),
    field("colors.icon", Accent),
    field("colors.featureTitle", Primary),
    field("colors.featureDescription", Secondary),
];

const BLOGS_COLORS: &[ColorField] = &[
    field("colors.background", Secondary),
    field("colors.title", Primary),
    field("colors.subtitle", Secondary),
    field("colors.cardTitle", Primary),
    field("colors.link", Accent),
];

/// Declared color fields of a section type
pub fn color_fields(section_type: SectionType) -> &'static [ColorField] {
    match section_type {
        SectionType::Hero => HERO_COLORS,
        SectionType::Testimonials => TESTIMONIALS_COLORS,
        SectionType::LogosTicker => LOGOS_TICKER_COLORS,
        SectionType::WhyChooseUs => WHY_CHOOSE_US_COLORS,
        SectionType::Blogs => BLOGS_COLORS,
    }
}

pub fn default_data(section_type: SectionType) -> Value {
    match section_type {
        SectionType::Hero => hero_defaults(),
        SectionType::Testimonials => testimonials_defaults(),
        SectionType::LogosTicker => logos_ticker_defaults(),
        SectionType::WhyChooseUs => why_choose_us_defaults(),
        SectionType::Blogs => blogs_defaults(),
    }
}

fn branded(category: ColorCategory, value: &str) -> Value {
    json!({ "value": value, "useDefaultColor": true, "globalColorType": category })
}

fn fixed(category: ColorCategory, value: &str) -> Value {
    json!({ "value": value, "useDefaultColor": false, "globalColorType": category })
}

fn animation(kind: &str, duration: u32) -> Value {
    json!({ "enabled": true, "type": kind, "duration": duration, "delay": 0 })
}

pub fn hero_defaults() -> Value {
    json!({
        "visible": true,
        "layout": {
            "maxWidth": "1280px",
            "minHeight": "520px",
            "alignment": "center",
            "overlayOpacity": 0.45
        },
        "content": {
            "title": "Find the home that fits your life",
            "subtitle": "Browse verified listings for sale and for rent, curated by our agents.",
            "backgroundImage": "/images/hero-default.jpg",
            "primaryButton": { "text": "Browse properties", "url": "/properties" }
        },
        "colors": {
            "title": fixed(Primary, "#ffffff"),
            "subtitle": fixed(Secondary, "#e5e7eb"),
            "button": branded(Primary, "#1e3a8a"),
            "buttonText": fixed(Secondary, "#ffffff"),
            "overlay": fixed(Primary, "#000000")
        },
        "animation": animation("fade-up", 600)
    })
}

pub fn testimonials_defaults() -> Value {
    json!({
        "visible": true,
        "layout": { "maxWidth": "1200px", "columns": 3, "gap": "24px" },
        "content": {
            "title": "What our clients say",
            "subtitle": "Families and investors who found their place with us."
        },
        "testimonials": [
            {
                "name": "Sara Al-Harbi",
                "role": "Home buyer",
                "quote": "They found us a villa within our budget in two weeks.",
                "rating": 5,
                "avatar": "/images/avatars/1.png"
            },
            {
                "name": "Omar Khalid",
                "role": "Landlord",
                "quote": "Rent collection and maintenance requests are finally in one place.",
                "rating": 5,
                "avatar": "/images/avatars/2.png"
            },
            {
                "name": "Lina Haddad",
                "role": "Tenant",
                "quote": "Clear contracts and quick answers every time.",
                "rating": 4,
                "avatar": "/images/avatars/3.png"
            }
        ],
        "colors": {
            "background": fixed(Secondary, "#f9fafb"),
            "title": branded(Primary, "#1e3a8a"),
            "subtitle": branded(Secondary, "#64748b"),
            "cardBackground": fixed(Secondary, "#ffffff"),
            "quote": fixed(Secondary, "#374151"),
            "rating": branded(Accent, "#f59e0b")
        },
        "animation": animation("fade-in", 500)
    })
}

pub fn logos_ticker_defaults() -> Value {
    json!({
        "visible": true,
        "content": {
            "title": "Trusted by leading developers",
            "subtitle": "We market projects for the region's best builders."
        },
        "logos": [
            { "name": "Partner 1", "image": "/images/logos/1.svg", "url": "" },
            { "name": "Partner 2", "image": "/images/logos/2.svg", "url": "" },
            { "name": "Partner 3", "image": "/images/logos/3.svg", "url": "" },
            { "name": "Partner 4", "image": "/images/logos/4.svg", "url": "" }
        ],
        "ticker": { "speed": 40, "direction": "left", "pauseOnHover": true },
        "colors": {
            "background": fixed(Secondary, "#ffffff"),
            "title": branded(Primary, "#1e3a8a"),
            "subtitle": branded(Secondary, "#64748b")
        },
        "animation": animation("slide", 400)
    })
}

pub fn why_choose_us_defaults() -> Value {
    json!({
        "visible": true,
        "layout": { "maxWidth": "1200px", "columns": 3 },
        "header": {
            "title": "Why choose us",
            "subtitle": "A full-service team from the first viewing to the final signature."
        },
        "features": {
            "items": [
                {
                    "icon": "shield",
                    "title": "Verified listings",
                    "description": "Every property is inspected and documented before it is published."
                },
                {
                    "icon": "key",
                    "title": "Managed rentals",
                    "description": "Contracts, payments and maintenance handled for you."
                },
                {
                    "icon": "chart",
                    "title": "Market insight",
                    "description": "Pricing advice grounded in recent neighbourhood sales."
                }
            ]
        },
        "colors": {
            "background": fixed(Secondary, "#ffffff"),
            "title": branded(Primary, "#1e3a8a"),
            "subtitle": branded(Secondary, "#64748b"),
            "icon": branded(Accent, "#f59e0b"),
            "featureTitle": branded(Primary, "#1e3a8a"),
            "featureDescription": fixed(Secondary, "#4b5563")
        },
        "animation": animation("fade-up", 600)
    })
}

pub fn blogs_defaults() -> Value {
    json!({
        "visible": true,
        "layout": { "maxWidth": "1200px", "columns": 3 },
        "content": {
            "title": "Latest from our blog",
            "subtitle": "Market updates and guides for buyers, sellers and renters.",
            "readMoreText": "Read more",
            "emptyText": "No posts yet.",
            "errorText": "We could not load the latest posts.",
            "retryText": "Try again"
        },
        "posts": { "limit": 3 },
        "colors": {
            "background": fixed(Secondary, "#f9fafb"),
            "title": branded(Primary, "#1e3a8a"),
            "subtitle": branded(Secondary, "#64748b"),
            "cardTitle": branded(Primary, "#1e3a8a"),
            "link": branded(Accent, "#f59e0b")
        },
        "animation": animation("fade-in", 500)
    })
}
