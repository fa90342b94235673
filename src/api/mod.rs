//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints:
//! - Blog endpoints under `/api/v1` (posts, authors, tags, locales)
//! - Admin blog endpoints under `/api/v1/admin`, guarded by a bearer token
//! - Tool endpoints under `/api/v1/tools`
//! - Network measurement endpoints under `/api`
//! - `/health`

pub mod authors;
pub mod common;
pub mod health;
pub mod middleware;
pub mod net;
pub mod posts;
pub mod responses;
pub mod tags;
pub mod tools;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need the admin token)
    let admin_routes = Router::new()
        .nest("/admin/posts", posts::admin_router())
        .nest("/admin/authors", authors::admin_router())
        .nest("/admin/tags", tags::admin_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    // Public routes
    Router::new()
        .nest("/posts", posts::router())
        .nest("/authors", authors::router())
        .nest("/tags", tags::router())
        .route("/locales", get(posts::list_locales))
        .nest("/tools", tools::router())
        .merge(admin_routes)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT_LANGUAGE]);

    if origin.trim() == "*" {
        return cors.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => cors.allow_origin(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
            cors
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    // Random download payloads don't compress; only the JSON API is gzipped
    let api = build_api_router(state.clone()).layer(CompressionLayer::new());

    Router::new()
        .nest("/api/v1", api)
        .merge(net::router())
        .route("/health", get(health::health))
        .layer(cors_layer(&server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::{BlogConfig, CacheConfig, ToolsConfig};
    use crate::db::{create_test_pool, migrations};
    use crate::services::blog::{BlogRepositories, BlogService};
    use crate::services::content::ContentStore;
    use crate::services::markdown::MarkdownRenderer;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    const TOKEN: &str = "test-admin-token";

    fn state(blog: BlogService, pool: Option<crate::db::DynDatabasePool>, admin_token: Option<&str>) -> AppState {
        AppState {
            pool,
            blog: Arc::new(blog),
            renderer: Arc::new(MarkdownRenderer::new()),
            tools: Arc::new(ToolsConfig {
                max_download_bytes: 256 * 1024,
                max_upload_bytes: 1024,
            }),
            admin_token: admin_token.map(Arc::from),
        }
    }

    fn server(state: AppState) -> TestServer {
        TestServer::new(build_router(state, &ServerConfig::default())).unwrap()
    }

    async fn db_server(admin_token: Option<&str>) -> TestServer {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let blog = BlogService::new(
            Some(BlogRepositories::from_pool(pool.clone())),
            ContentStore::new("/nonexistent/folio-content"),
            create_cache(&CacheConfig::default()),
            &BlogConfig::default(),
        );
        server(state(blog, Some(pool), admin_token))
    }

    fn file_server(root: &Path) -> TestServer {
        let blog = BlogService::new(
            None,
            ContentStore::new(root),
            create_cache(&CacheConfig::default()),
            &BlogConfig::default(),
        );
        server(state(blog, None, None))
    }

    fn write_post(root: &Path, locale: &str, slug: &str, body: &str) {
        let dir = root.join(locale);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.md", slug)), body).unwrap();
    }

    #[tokio::test]
    async fn test_file_fallback_posts_by_locale() {
        let dir = TempDir::new().unwrap();
        write_post(dir.path(), "en", "hello", "---\ntitle: Hello\ndate: 2024-05-01\n---\n# Hi\n\nEnglish body.\n");
        write_post(dir.path(), "ru", "privet", "---\ntitle: Привет\ndate: 2024-05-02\n---\nРусский текст.\n");
        let server = file_server(dir.path());

        let en: Value = server.get("/api/v1/posts").await.json();
        assert_eq!(en["source"], "files");
        assert_eq!(en["locale"], "en");
        assert_eq!(en["posts"][0]["slug"], "hello");

        let ru: Value = server
            .get("/api/v1/posts")
            .add_header(header::ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,en;q=0.5"))
            .await
            .json();
        assert_eq!(ru["locale"], "ru");
        assert_eq!(ru["posts"][0]["title"], "Привет");

        let post = server.get("/api/v1/posts/hello?locale=en").await;
        post.assert_status_ok();
        let post: Value = post.json();
        assert_eq!(post["id"], 0);
        assert!(post["content_html"].as_str().unwrap().contains("<h1"));
        assert_eq!(post["toc"][0]["text"], "Hi");

        let missing = server.get("/api/v1/posts/nope").await;
        missing.assert_status(StatusCode::NOT_FOUND);
        let body: Value = missing.json();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_reads_without_any_source_are_empty() {
        let server = file_server(Path::new("/nonexistent/folio-content"));
        let body: Value = server.get("/api/v1/posts").await.json();
        assert_eq!(body["source"], "empty");
        assert_eq!(body["total"], 0);

        let authors: Value = server.get("/api/v1/authors").await.json();
        assert_eq!(authors["authors"], json!([]));

        let health = server.get("/health").await;
        health.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        let health: Value = health.json();
        assert_eq!(health["database"], "disabled");
    }

    #[tokio::test]
    async fn test_admin_routes_closed_without_token() {
        let server = db_server(None).await;
        let response = server
            .post("/api/v1/admin/posts")
            .authorization_bearer("anything")
            .json(&json!({"title": "T", "content": "C"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_routes_require_matching_token() {
        let server = db_server(Some(TOKEN)).await;

        server
            .get("/api/v1/admin/posts")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/admin/posts")
            .authorization_bearer("wrong")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/api/v1/admin/posts")
            .authorization_bearer(TOKEN)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_post_lifecycle_over_http() {
        let server = db_server(Some(TOKEN)).await;

        let author: Value = server
            .post("/api/v1/admin/authors")
            .authorization_bearer(TOKEN)
            .json(&json!({"name": "Ada"}))
            .await
            .json();
        let author_id = author["id"].as_i64().unwrap();

        let created = server
            .post("/api/v1/admin/posts")
            .authorization_bearer(TOKEN)
            .json(&json!({
                "title": "First Post",
                "content": "Hello **world**",
                "locale": "en",
                "author_ids": [author_id],
                "tags": ["Rust"]
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["slug"], "first-post");
        assert_eq!(created["published_at"], Value::Null);

        // Drafts are invisible to the public
        server
            .get("/api/v1/posts/first-post")
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let published: Value = server
            .post(&format!("/api/v1/admin/posts/{}/publish", id))
            .authorization_bearer(TOKEN)
            .await
            .json();
        assert!(published["published_at"].is_string());

        let list: Value = server.get("/api/v1/posts?locale=en").await.json();
        assert_eq!(list["source"], "database");
        assert_eq!(list["posts"][0]["authors"][0]["name"], "Ada");
        assert_eq!(list["posts"][0]["tags"][0]["slug"], "rust");

        let duplicate = server
            .post("/api/v1/admin/posts")
            .authorization_bearer(TOKEN)
            .json(&json!({"title": "First Post", "content": "again"}))
            .await;
        duplicate.assert_status(StatusCode::CONFLICT);

        let updated: Value = server
            .put(&format!("/api/v1/admin/posts/{}", id))
            .authorization_bearer(TOKEN)
            .json(&json!({"title": "Renamed"}))
            .await
            .json();
        assert_eq!(updated["title"], "Renamed");

        let unpublished: Value = server
            .post(&format!("/api/v1/admin/posts/{}/unpublish", id))
            .authorization_bearer(TOKEN)
            .await
            .json();
        assert_eq!(unpublished["published_at"], Value::Null);

        server
            .delete(&format!("/api/v1/admin/posts/{}", id))
            .authorization_bearer(TOKEN)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .delete(&format!("/api/v1/admin/posts/{}", id))
            .authorization_bearer(TOKEN)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_post_validation_error() {
        let server = db_server(Some(TOKEN)).await;
        let response = server
            .post("/api/v1/admin/posts")
            .authorization_bearer(TOKEN)
            .json(&json!({"title": "  ", "content": "body"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_health_with_database() {
        let server = db_server(None).await;
        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "up");
    }

    #[tokio::test]
    async fn test_locales_endpoint() {
        let server = file_server(Path::new("/nonexistent"));
        let body: Value = server.get("/api/v1/locales").await.json();
        assert_eq!(body["default"], "en");
        assert_eq!(body["locales"], json!(["en", "ru"]));
    }

    #[tokio::test]
    async fn test_tool_endpoints() {
        let server = file_server(Path::new("/nonexistent"));

        let encoded: Value = server
            .post("/api/v1/tools/base64/encode")
            .json(&json!({"text": "hello"}))
            .await
            .json();
        assert_eq!(encoded["result"], "aGVsbG8=");

        let temp: Value = server
            .post("/api/v1/tools/units/temperature")
            .json(&json!({"value": 100.0, "from": "c", "to": "f"}))
            .await
            .json();
        assert_eq!(temp["result"], 212.0);

        let hash: Value = server
            .post("/api/v1/tools/hash")
            .json(&json!({"algorithm": "md5", "text": ""}))
            .await
            .json();
        assert_eq!(hash["digest"], "d41d8cd98f00b204e9800998ecf8427e");

        let uuids: Value = server
            .post("/api/v1/tools/uuid")
            .json(&json!({"count": 3}))
            .await
            .json();
        assert_eq!(uuids["uuids"].as_array().unwrap().len(), 3);

        let regex: Value = server
            .post("/api/v1/tools/regex/test")
            .json(&json!({"pattern": "\\d+", "flags": "g", "text": "a1 b22"}))
            .await
            .json();
        assert_eq!(regex["matches"].as_array().unwrap().len(), 2);

        server.get("/api/v1/tools/timestamp/now").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_tool_errors_use_envelope() {
        let server = file_server(Path::new("/nonexistent"));

        let response = server
            .post("/api/v1/tools/json/format")
            .json(&json!({"text": "{\"a\": }"}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["details"]["kind"], "invalid_json");
        assert_eq!(body["error"]["details"]["line"], 1);

        let response = server
            .post("/api/v1/tools/percentage")
            .json(&json!({"operation": "what_percent", "x": 1.0, "y": 0.0}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["details"]["kind"], "division_by_zero");
    }

    #[tokio::test]
    async fn test_net_endpoints() {
        let server = file_server(Path::new("/nonexistent"));

        let ip: Value = server
            .get("/api/ip")
            .add_header(
                header::HeaderName::from_static("x-forwarded-for"),
                HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
            )
            .await
            .json();
        assert_eq!(ip["ip"], "203.0.113.9");

        let ping: Value = server.get("/api/ping").await.json();
        assert_eq!(ping["pong"], true);

        let download = server.get("/api/download?bytes=100000").await;
        download.assert_status_ok();
        assert_eq!(download.as_bytes().len(), 100_000);

        // Capped at max_download_bytes
        let capped = server.get("/api/download?bytes=999999999").await;
        assert_eq!(capped.as_bytes().len(), 256 * 1024);

        let upload: Value = server
            .post("/api/upload")
            .bytes(vec![7u8; 512].into())
            .await
            .json();
        assert_eq!(upload["bytes"], 512);

        server
            .post("/api/upload")
            .bytes(vec![7u8; 4096].into())
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }
}
