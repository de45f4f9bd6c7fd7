use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;

use crate::model::Id;

pub const EDITOR_SESSION_HEADER: &str = "x-editor-session";

/// Live-editor session named by the `X-Editor-Session` header, if any.
///
/// The preview frame sends this header on every request so that resolve and
/// render calls pick up unsaved edits without repeating the id in each body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession(pub Option<Id>);

#[async_trait]
impl<S> FromRequestParts<S> for EditorSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(EditorSession(extract_header_value(
            &parts.headers,
            EDITOR_SESSION_HEADER,
        )))
    }
}

/// Extract a non-empty header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
