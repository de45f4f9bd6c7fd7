use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use site_composer::{
    ComponentResolver, EditorSessions, HttpBackend, PostStore, ResolveRequest, SectionType,
    TenantDataStatus, TenantDataStore, TenantSiteStore,
};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
}

fn site_payload() -> serde_json::Value {
    json!({
        "componentSettings": {
            "homepage": {
                "hero": {
                    "id": "hero-main",
                    "type": "hero",
                    "componentName": "hero1",
                    "data": {"content": {"title": "Waterfront homes"}}
                }
            }
        },
        "components": [],
        "WebsiteLayout": {"branding": {"primary": "#0f766e"}}
    })
}

#[tokio::test]
async fn test_fetches_tenant_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/acme/website"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    assert_eq!(backend.base_url(), server.uri());

    let site = backend.fetch_tenant_site(&"acme".to_string()).await.unwrap().unwrap();
    assert_eq!(site.tenant_id, "acme");
    assert_eq!(site.branding().primary.as_deref(), Some("#0f766e"));
    assert_eq!(site.placed_components().len(), 1);
}

#[tokio::test]
async fn test_missing_tenant_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/ghost/website"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let site = backend_for(&server).fetch_tenant_site(&"ghost".to_string()).await.unwrap();
    assert!(site.is_none());
}

#[tokio::test]
async fn test_backend_error_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/acme/website"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance window"})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .fetch_tenant_site(&"acme".to_string())
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("503"));
    assert!(message.contains("maintenance window"));
}

#[tokio::test]
async fn test_tenant_id_stays_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let site = backend.fetch_tenant_site(&"../../user?".to_string()).await.unwrap();
    assert!(site.is_none());

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/v1/tenants/..%2F..%2Fuser%3F/website");

    assert!(backend.fetch_tenant_site(&"..".to_string()).await.is_err());
    assert!(backend.fetch_tenant_site(&String::new()).await.is_err());
}

#[tokio::test]
async fn test_base_url_path_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backend/v1/tenants/acme/website"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&format!("{}/backend/", server.uri()), Duration::from_secs(5)).unwrap();
    assert!(backend.fetch_tenant_site(&"acme".to_string()).await.unwrap().is_some());
}

#[tokio::test]
async fn test_lists_posts_in_both_shapes() {
    let server = MockServer::start().await;
    let posts = json!([
        {"id": "p1", "title": "First"},
        {"id": "p2", "title": "Second"},
        {"id": "p3", "title": "Third"}
    ]);
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("tenantId", "bare"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("tenantId", "wrapped"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": posts})))
        .mount(&server)
        .await;

    let backend = backend_for(&server);

    // The limit is enforced even when the backend ignores it
    let bare = backend.list_posts(&"bare".to_string(), 2).await.unwrap();
    assert_eq!(bare.len(), 2);
    assert_eq!(bare[0].title, "First");

    let wrapped = backend.list_posts(&"wrapped".to_string(), 3).await.unwrap();
    assert_eq!(wrapped.len(), 3);
    assert_eq!(wrapped[2].id, "p3");
}

#[tokio::test]
async fn test_posts_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(backend_for(&server).list_posts(&"acme".to_string(), 3).await.is_err());
}

#[tokio::test]
async fn test_concurrent_fetches_hit_backend_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/acme/website"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(site_payload())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(TenantDataStore::new(Arc::new(backend_for(&server))));
    let calls: Vec<_> = (0..6)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.fetch_tenant_data(&"acme".to_string()).await })
        })
        .collect();

    for call in calls {
        let site = call.await.unwrap().unwrap().unwrap();
        assert_eq!(site.tenant_id, "acme");
    }
    // The mock verifies `expect(1)` when the server is dropped
}

#[tokio::test]
async fn test_failed_fetch_is_retried_and_falls_back_to_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/acme/website"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tenants/acme/website"))
        .respond_with(ResponseTemplate::new(200).set_body_json(site_payload()))
        .mount(&server)
        .await;

    let tenants = TenantDataStore::new(Arc::new(backend_for(&server)));
    let sessions = EditorSessions::new(Duration::from_secs(60));
    let resolver = ComponentResolver::new(&tenants, &sessions);
    let tenant = "acme".to_string();
    let request = ResolveRequest {
        instance_id: Some("hero-main".to_string()),
        ..ResolveRequest::for_section(SectionType::Hero)
    };

    let first = resolver.resolve(Some(&tenant), &request).await.unwrap();
    match &first.merged.tenant_status {
        TenantDataStatus::Failed { message } => assert!(message.contains("boom")),
        other => panic!("expected failed status, got {:?}", other),
    }
    assert_ne!(first.merged.data["content"]["title"], json!("Waterfront homes"));

    // Failures are not cached, so the next resolve fetches again
    let second = resolver.resolve(Some(&tenant), &request).await.unwrap();
    assert_eq!(second.merged.tenant_status, TenantDataStatus::Loaded);
    assert_eq!(second.merged.data["content"]["title"], json!("Waterfront homes"));
    assert_eq!(second.branding.primary.as_deref(), Some("#0f766e"));
}
