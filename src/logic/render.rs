//! Section render components.
//!
//! Every section reads its merged data into a small view struct and paints it
//! through an askama template. Hidden sections produce no markup at all.

use askama::Template;
use serde_json::Value;

use crate::logic::color::ColorResolver;
use crate::logic::merge::get_path;
use crate::logic::resolve::Resolution;
use crate::model::{BlogPost, PostsOutcome, SectionType};

/// Inputs a renderer needs besides the merged data
#[derive(Debug, Clone, Default)]
pub struct RenderContext<'a> {
    /// Posts fetched for the blogs section
    pub posts: Option<&'a PostsOutcome>,
    /// Endpoint the blogs retry button re-issues
    pub retry_url: Option<&'a str>,
}

fn text(data: &Value, path: &str) -> String {
    match get_path(data, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn number(data: &Value, path: &str, fallback: u64) -> u64 {
    get_path(data, path).and_then(Value::as_u64).unwrap_or(fallback)
}

fn flag(data: &Value, path: &str, fallback: bool) -> bool {
    get_path(data, path).and_then(Value::as_bool).unwrap_or(fallback)
}

fn items<'v>(data: &'v Value, path: &str) -> &'v [Value] {
    get_path(data, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

const CSS_UNITS: &[&str] = &["px", "rem", "em", "%", "vh", "vw", "ch"];
const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// A CSS length such as `1200px` or `80vh`; anything else renders as empty
fn css_length(data: &Value, path: &str) -> String {
    let raw = text(data, path);
    let value = raw.trim();
    if value == "0" {
        return value.to_string();
    }
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    if !number.is_empty() && number.parse::<f64>().is_ok() && CSS_UNITS.contains(&unit) {
        value.to_string()
    } else {
        String::new()
    }
}

/// One of `allowed`, the first when the data holds anything else
fn css_keyword(data: &Value, path: &str, allowed: &[&str]) -> String {
    let value = text(data, path);
    if allowed.contains(&value.as_str()) {
        value
    } else {
        allowed.first().copied().unwrap_or_default().to_string()
    }
}

fn opacity(data: &Value, path: &str, fallback: f64) -> String {
    let value = match get_path(data, path) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    value
        .filter(|v: &f64| v.is_finite())
        .unwrap_or(fallback)
        .clamp(0.0, 1.0)
        .to_string()
}

/// Relative links and http(s), mailto and tel URLs; anything else is dropped
fn safe_url(raw: &str) -> String {
    let url = raw.trim();
    if url.chars().any(char::is_control) {
        return String::new();
    }
    match url.find(|c| matches!(c, ':' | '/' | '?' | '#')) {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            if URL_SCHEMES.contains(&scheme.as_str()) {
                url.to_string()
            } else {
                String::new()
            }
        }
        _ => url.to_string(),
    }
}

/// A URL that can sit inside `url('...')` in a style attribute
fn css_url(raw: &str) -> String {
    let url = safe_url(raw);
    if url
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '(' | ')' | '\\' | ';'))
    {
        String::new()
    } else {
        url
    }
}

/// `fade-up 600ms` style data attribute, empty when animation is off
fn animation(data: &Value) -> String {
    if !flag(data, "animation.enabled", false) {
        return String::new();
    }
    format!(
        "{} {}ms {}ms",
        text(data, "animation.type"),
        number(data, "animation.duration", 0),
        number(data, "animation.delay", 0)
    )
}

#[derive(Template)]
#[template(path = "hero.html")]
struct HeroTemplate {
    instance_id: String,
    animation: String,
    max_width: String,
    min_height: String,
    alignment: String,
    overlay_opacity: String,
    background_image: String,
    title: String,
    subtitle: String,
    button_text: String,
    button_url: String,
    title_color: String,
    subtitle_color: String,
    button_color: String,
    button_text_color: String,
    overlay_color: String,
}

struct Testimonial {
    name: String,
    role: String,
    quote: String,
    stars: String,
    avatar: String,
}

#[derive(Template)]
#[template(path = "testimonials.html")]
struct TestimonialsTemplate {
    instance_id: String,
    animation: String,
    max_width: String,
    columns: u64,
    gap: String,
    title: String,
    subtitle: String,
    testimonials: Vec<Testimonial>,
    background_color: String,
    title_color: String,
    subtitle_color: String,
    card_color: String,
    quote_color: String,
    rating_color: String,
}

struct Logo {
    name: String,
    image: String,
    url: String,
}

#[derive(Template)]
#[template(path = "logos_ticker.html")]
struct LogosTickerTemplate {
    instance_id: String,
    animation: String,
    title: String,
    subtitle: String,
    logos: Vec<Logo>,
    speed: u64,
    direction: String,
    pause_on_hover: bool,
    background_color: String,
    title_color: String,
    subtitle_color: String,
}

struct Feature {
    icon: String,
    title: String,
    description: String,
}

#[derive(Template)]
#[template(path = "why_choose_us.html")]
struct WhyChooseUsTemplate {
    instance_id: String,
    animation: String,
    max_width: String,
    columns: u64,
    title: String,
    subtitle: String,
    features: Vec<Feature>,
    background_color: String,
    title_color: String,
    subtitle_color: String,
    icon_color: String,
    feature_title_color: String,
    feature_description_color: String,
}

struct PostCard {
    title: String,
    excerpt: String,
    image_url: String,
    url: String,
}

impl From<&BlogPost> for PostCard {
    fn from(post: &BlogPost) -> Self {
        Self {
            title: post.title.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            image_url: safe_url(post.image_url.as_deref().unwrap_or_default()),
            url: safe_url(&format!("/blog/{}", post.slug.as_deref().unwrap_or(&post.id))),
        }
    }
}

#[derive(Template)]
#[template(path = "blogs.html")]
struct BlogsTemplate {
    instance_id: String,
    animation: String,
    max_width: String,
    columns: u64,
    title: String,
    subtitle: String,
    read_more_text: String,
    empty_text: String,
    error_text: String,
    retry_text: String,
    retry_url: String,
    posts: Vec<PostCard>,
    failed: bool,
    background_color: String,
    title_color: String,
    subtitle_color: String,
    card_title_color: String,
    link_color: String,
}

pub struct SectionRenderer;

impl SectionRenderer {
    /// Paint one resolved section. Hidden sections render to an empty string.
    pub fn render(resolution: &Resolution, ctx: &RenderContext<'_>) -> askama::Result<String> {
        let merged = &resolution.merged;
        if !merged.visible {
            return Ok(String::new());
        }

        let data = &merged.data;
        let colors = ColorResolver::new(merged.section_type, &resolution.branding);
        let color = |path: &str| colors.resolve(data, path);
        let instance_id = merged
            .instance_id
            .clone()
            .unwrap_or_else(|| merged.component_name());

        match merged.section_type {
            SectionType::Hero => HeroTemplate {
                instance_id,
                animation: animation(data),
                max_width: css_length(data, "layout.maxWidth"),
                min_height: css_length(data, "layout.minHeight"),
                alignment: css_keyword(data, "layout.alignment", &["center", "left", "right"]),
                overlay_opacity: opacity(data, "layout.overlayOpacity", 0.45),
                background_image: css_url(&text(data, "content.backgroundImage")),
                title: text(data, "content.title"),
                subtitle: text(data, "content.subtitle"),
                button_text: text(data, "content.primaryButton.text"),
                button_url: safe_url(&text(data, "content.primaryButton.url")),
                title_color: color("colors.title"),
                subtitle_color: color("colors.subtitle"),
                button_color: color("colors.button"),
                button_text_color: color("colors.buttonText"),
                overlay_color: color("colors.overlay"),
            }
            .render(),
            SectionType::Testimonials => TestimonialsTemplate {
                instance_id,
                animation: animation(data),
                max_width: css_length(data, "layout.maxWidth"),
                columns: number(data, "layout.columns", 3),
                gap: css_length(data, "layout.gap"),
                title: text(data, "content.title"),
                subtitle: text(data, "content.subtitle"),
                testimonials: items(data, "testimonials")
                    .iter()
                    .map(|item| Testimonial {
                        name: text(item, "name"),
                        role: text(item, "role"),
                        quote: text(item, "quote"),
                        stars: "★".repeat(number(item, "rating", 0).min(5) as usize),
                        avatar: safe_url(&text(item, "avatar")),
                    })
                    .collect(),
                background_color: color("colors.background"),
                title_color: color("colors.title"),
                subtitle_color: color("colors.subtitle"),
                card_color: color("colors.cardBackground"),
                quote_color: color("colors.quote"),
                rating_color: color("colors.rating"),
            }
            .render(),
            SectionType::LogosTicker => LogosTickerTemplate {
                instance_id,
                animation: animation(data),
                title: text(data, "content.title"),
                subtitle: text(data, "content.subtitle"),
                logos: items(data, "logos")
                    .iter()
                    .map(|logo| Logo {
                        name: text(logo, "name"),
                        image: safe_url(&text(logo, "image")),
                        url: safe_url(&text(logo, "url")),
                    })
                    .collect(),
                speed: number(data, "ticker.speed", 40),
                direction: css_keyword(data, "ticker.direction", &["left", "right"]),
                pause_on_hover: flag(data, "ticker.pauseOnHover", true),
                background_color: color("colors.background"),
                title_color: color("colors.title"),
                subtitle_color: color("colors.subtitle"),
            }
            .render(),
            SectionType::WhyChooseUs => WhyChooseUsTemplate {
                instance_id,
                animation: animation(data),
                max_width: css_length(data, "layout.maxWidth"),
                columns: number(data, "layout.columns", 3),
                title: text(data, "header.title"),
                subtitle: text(data, "header.subtitle"),
                features: items(data, "features.items")
                    .iter()
                    .map(|feature| Feature {
                        icon: text(feature, "icon"),
                        title: text(feature, "title"),
                        description: text(feature, "description"),
                    })
                    .collect(),
                background_color: color("colors.background"),
                title_color: color("colors.title"),
                subtitle_color: color("colors.subtitle"),
                icon_color: color("colors.icon"),
                feature_title_color: color("colors.featureTitle"),
                feature_description_color: color("colors.featureDescription"),
            }
            .render(),
            SectionType::Blogs => {
                let (posts, failed): (Vec<PostCard>, bool) = match ctx.posts {
                    Some(PostsOutcome::Loaded(posts)) => (posts.iter().map(PostCard::from).collect(), false),
                    Some(PostsOutcome::Failed(_)) => (Vec::new(), true),
                    None => (Vec::new(), false),
                };
                BlogsTemplate {
                    instance_id,
                    animation: animation(data),
                    max_width: css_length(data, "layout.maxWidth"),
                    columns: number(data, "layout.columns", 3),
                    title: text(data, "content.title"),
                    subtitle: text(data, "content.subtitle"),
                    read_more_text: text(data, "content.readMoreText"),
                    empty_text: text(data, "content.emptyText"),
                    error_text: text(data, "content.errorText"),
                    retry_text: text(data, "content.retryText"),
                    retry_url: ctx.retry_url.unwrap_or_default().to_string(),
                    posts,
                    failed,
                    background_color: color("colors.background"),
                    title_color: color("colors.title"),
                    subtitle_color: color("colors.subtitle"),
                    card_title_color: color("colors.cardTitle"),
                    link_color: color("colors.link"),
                }
                .render()
            }
        }
    }

    /// How many posts the blogs section asks for
    pub fn post_limit(data: &Value) -> usize {
        number(data, "posts.limit", 3).clamp(1, 24) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::defaults::default_data;
    use crate::model::{Branding, LayerKind, MergedRenderData, TenantDataStatus};
    use serde_json::json;

    fn resolution(section_type: SectionType, data: Value) -> Resolution {
        let visible = data.get("visible").and_then(Value::as_bool).unwrap_or(true);
        Resolution {
            merged: MergedRenderData {
                section_type,
                variant: 1,
                instance_id: Some("inst-1".to_string()),
                data,
                layers: vec![LayerKind::Defaults],
                tenant_status: TenantDataStatus::Skipped,
                visible,
            },
            branding: Branding {
                primary: Some("#0f766e".to_string()),
                secondary: None,
                accent: None,
            },
        }
    }

    #[test]
    fn hidden_sections_render_nothing() {
        for section_type in SectionType::ALL {
            let mut data = default_data(section_type);
            data["visible"] = json!(false);
            let html = SectionRenderer::render(&resolution(section_type, data), &RenderContext::default()).unwrap();
            assert!(html.is_empty(), "{section_type} rendered while hidden");
        }
    }

    #[test]
    fn every_default_section_renders() {
        for section_type in SectionType::ALL {
            let html = SectionRenderer::render(
                &resolution(section_type, default_data(section_type)),
                &RenderContext::default(),
            )
            .unwrap();
            assert!(html.contains("data-instance-id=\"inst-1\""), "{section_type}");
            assert!(html.contains(&format!("data-section=\"{}\"", section_type.as_str())));
        }
    }

    #[test]
    fn testimonials_use_branding_and_escape_text() {
        let mut data = default_data(SectionType::Testimonials);
        data["content"]["title"] = json!("Happy <clients> & friends");
        let html = SectionRenderer::render(
            &resolution(SectionType::Testimonials, data),
            &RenderContext::default(),
        )
        .unwrap();
        assert!(html.contains("Happy &lt;clients&gt; &amp; friends"));
        assert!(html.contains("color: #0f766e"));
        assert!(html.contains("Sara Al-Harbi"));
    }

    #[test]
    fn blogs_show_posts_or_retry() {
        let data = default_data(SectionType::Blogs);
        let posts = PostsOutcome::Loaded(vec![BlogPost {
            id: "p1".to_string(),
            title: "Buying off-plan in 2026".to_string(),
            excerpt: Some("What to check first".to_string()),
            image_url: None,
            slug: Some("buying-off-plan".to_string()),
            published_at: None,
        }]);
        let html = SectionRenderer::render(
            &resolution(SectionType::Blogs, data.clone()),
            &RenderContext { posts: Some(&posts), retry_url: None },
        )
        .unwrap();
        assert!(html.contains("Buying off-plan in 2026"));
        assert!(!html.contains("blogs-retry"));

        let failed = PostsOutcome::Failed("timeout".to_string());
        let html = SectionRenderer::render(
            &resolution(SectionType::Blogs, data),
            &RenderContext {
                posts: Some(&failed),
                retry_url: Some("/tenants/t1/render"),
            },
        )
        .unwrap();
        assert!(html.contains("blogs-retry"));
        assert!(html.contains("Try again"));
        assert!(html.contains("We could not load the latest posts."));
    }

    #[test]
    fn style_and_link_values_are_checked() {
        let mut data = default_data(SectionType::Hero);
        data["layout"]["maxWidth"] = json!("100px; background: url(//evil.example)");
        data["layout"]["alignment"] = json!("center; position: fixed");
        data["layout"]["overlayOpacity"] = json!("7");
        data["content"]["primaryButton"]["url"] = json!("javascript:alert(1)");
        data["content"]["backgroundImage"] = json!("/img.jpg'); background: red; --x: ('");
        let html = SectionRenderer::render(&resolution(SectionType::Hero, data), &RenderContext::default()).unwrap();
        assert!(!html.contains("evil.example"));
        assert!(!html.contains("position: fixed"));
        assert!(!html.contains("javascript:"));
        assert!(!html.contains("background: red"));
        assert!(html.contains("text-align: center\""));
        assert!(html.contains("opacity: 1\""));

        let html = SectionRenderer::render(
            &resolution(SectionType::Hero, default_data(SectionType::Hero)),
            &RenderContext::default(),
        )
        .unwrap();
        assert!(html.contains("max-width: 1280px"));
        assert!(html.contains("properties\" style"));
    }

    #[test]
    fn url_and_length_rules() {
        assert_eq!(safe_url("/listings?page=2"), "/listings?page=2");
        assert_eq!(safe_url("https://example.com/a"), "https://example.com/a");
        assert_eq!(safe_url("listings/villa-3"), "listings/villa-3");
        assert_eq!(safe_url("JavaScript:alert(1)"), "");
        assert_eq!(safe_url("data:text/html,hi"), "");
        assert_eq!(safe_url("java\tscript:alert(1)"), "");

        assert_eq!(css_length(&json!({"w": "24px"}), "w"), "24px");
        assert_eq!(css_length(&json!({"w": "1.5rem"}), "w"), "1.5rem");
        assert_eq!(css_length(&json!({"w": "0"}), "w"), "0");
        assert_eq!(css_length(&json!({"w": "calc(100% - 1px)"}), "w"), "");
        assert_eq!(css_length(&json!({"w": "px"}), "w"), "");
    }

    #[test]
    fn post_limit_is_clamped() {
        assert_eq!(SectionRenderer::post_limit(&json!({})), 3);
        assert_eq!(SectionRenderer::post_limit(&json!({"posts": {"limit": 0}})), 1);
        assert_eq!(SectionRenderer::post_limit(&json!({"posts": {"limit": 100}})), 24);
    }
}
