use serde::{Deserialize, Serialize};

/// Post returned by the backend's `/api/posts` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// What the blogs section got back from its independent fetch
#[derive(Debug, Clone, PartialEq)]
pub enum PostsOutcome {
    Loaded(Vec<BlogPost>),
    Failed(String),
}
