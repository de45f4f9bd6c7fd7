use chrono::{TimeZone, Utc};
use serde_json::json;
use std::collections::BTreeMap;

use crate::model::{BlogPost, Branding, ComponentInstance, PageComponents, TenantSite, WebsiteLayout};
use crate::store::memory::MemoryBackend;

pub const DEMO_TENANT: &str = "demo-realty";

fn component(id: &str, component_type: &str, component_name: &str, data: serde_json::Value) -> ComponentInstance {
    ComponentInstance {
        id: id.to_string(),
        component_type: component_type.to_string(),
        component_name: Some(component_name.to_string()),
        data,
    }
}

/// Demo tenant site. The homepage uses the keyed storage shape, the about
/// page the list shape, and the logos ticker lives in the flat list.
pub fn demo_site() -> TenantSite {
    let homepage = BTreeMap::from([
        (
            "hero".to_string(),
            component(
                "hero-main",
                "hero",
                "hero1",
                json!({
                    "content": {
                        "title": "Homes across Riverside and the Old Port",
                        "primaryButton": { "text": "See listings", "url": "/listings" }
                    }
                }),
            ),
        ),
        (
            "why".to_string(),
            component(
                "why-main",
                "whyChooseUs",
                "whyChooseUs1",
                json!({
                    "header": { "title": "Why Demo Realty" },
                    "colors": { "icon": { "value": "#e11d48", "useDefaultColor": false } }
                }),
            ),
        ),
        (
            "testimonials".to_string(),
            component(
                "testimonials-main",
                "testimonials",
                "testimonials1",
                json!({ "content": { "title": "Stories from our residents" } }),
            ),
        ),
        (
            "blogs".to_string(),
            component("blogs-main", "blogs", "blogs1", json!({ "posts": { "limit": 2 } })),
        ),
    ]);

    let about = vec![component(
        "testimonials-about",
        "testimonials",
        "testimonials1",
        json!({ "visible": false }),
    )];

    TenantSite {
        tenant_id: DEMO_TENANT.to_string(),
        component_settings: BTreeMap::from([
            ("homepage".to_string(), PageComponents::Keyed(homepage)),
            ("about".to_string(), PageComponents::List(about)),
        ]),
        components: vec![component(
            "logos-main",
            "logosTicker",
            "logosTicker1",
            json!({ "ticker": { "speed": 25 } }),
        )],
        website_layout: WebsiteLayout {
            branding: Branding {
                primary: Some("#0f766e".to_string()),
                secondary: Some("#334155".to_string()),
                accent: Some("#eab308".to_string()),
            },
        },
    }
}

pub fn demo_posts() -> Vec<BlogPost> {
    let post = |id: &str, title: &str, excerpt: &str, day: u32| BlogPost {
        id: id.to_string(),
        title: title.to_string(),
        excerpt: Some(excerpt.to_string()),
        image_url: None,
        slug: Some(id.to_string()),
        published_at: Utc.with_ymd_and_hms(2026, 9, day, 9, 0, 0).single(),
    };
    vec![
        post("rent-vs-buy", "Renting or buying in 2026", "A quick comparison for first-time movers.", 2),
        post("inspection-checklist", "Viewing checklist", "Ten things to check before you sign.", 14),
        post("service-charges", "Understanding service charges", "What building fees actually cover.", 28),
    ]
}

/// Load the demo tenant into an in-memory backend
pub fn load_seed_data(backend: &MemoryBackend) {
    backend.upsert_site(demo_site());
    backend.set_posts(&DEMO_TENANT.to_string(), demo_posts());
    log::info!("seed data loaded for tenant '{}'", DEMO_TENANT);
}
