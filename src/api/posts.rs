//! Post API endpoints
//!
//! Public:
//! - GET /api/v1/posts - Published posts of the request locale
//! - GET /api/v1/posts/{slug} - One published post
//! - GET /api/v1/locales - Supported locales
//!
//! Admin:
//! - GET /api/v1/admin/posts - All posts including drafts
//! - POST /api/v1/admin/posts - Create a post
//! - GET|PUT|DELETE /api/v1/admin/posts/{id}
//! - POST /api/v1/admin/posts/{id}/publish
//! - POST /api/v1/admin/posts/{id}/unpublish

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{parse_id, request_locale, LocaleQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{PostListResponse, PostResponse};
use crate::models::{CreatePostInput, ListParams, PostSource, UpdatePostInput};

/// Query parameters for post lists
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Response for the supported locale list
#[derive(Debug, Serialize)]
pub struct LocalesResponse {
    pub default: String,
    pub locales: Vec<String>,
}

/// Public post routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{slug}", get(get_post))
}

/// Admin post routes
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_posts).post(create_post))
        .route(
            "/{id}",
            get(get_post_by_id).put(update_post).delete(delete_post),
        )
        .route("/{id}/publish", post(publish_post))
        .route("/{id}/unpublish", post(unpublish_post))
}

/// GET /api/v1/posts
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
    headers: HeaderMap,
) -> Json<PostListResponse> {
    let locale = request_locale(
        &state,
        &LocaleQuery {
            locale: query.locale.clone(),
        },
        &headers,
    );
    let list = state.blog.list_published(locale.as_str()).await;
    tracing::debug!(
        "Listed {} posts for {} from {:?}",
        list.posts.len(),
        locale,
        list.source
    );
    let params = ListParams::new(query.page, query.per_page);
    Json(PostListResponse::new(list, Some(locale.to_string()), &params))
}

/// GET /api/v1/posts/{slug}
async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<LocaleQuery>,
    headers: HeaderMap,
) -> Result<Json<PostResponse>, ApiError> {
    let locale = request_locale(&state, &query, &headers);
    let (post, source) = state
        .blog
        .get_post(&slug, locale.as_str())
        .await
        .ok_or_else(|| ApiError::not_found(format!("Post not found: {}", slug)))?;

    Ok(Json(PostResponse::render(post, source, &state.renderer)))
}

/// GET /api/v1/locales
pub async fn list_locales(State(state): State<AppState>) -> Json<LocalesResponse> {
    let resolver = state.blog.locales();
    Json(LocalesResponse {
        default: resolver.default_locale().to_string(),
        locales: resolver.supported().iter().map(|l| l.to_string()).collect(),
    })
}

/// GET /api/v1/admin/posts
async fn list_all_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Json<PostListResponse> {
    let list = state.blog.list_all(query.locale.as_deref()).await;
    let params = ListParams::new(query.page, query.per_page);
    Json(PostListResponse::new(list, query.locale, &params))
}

/// GET /api/v1/admin/posts/{id}
async fn get_post_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.blog.get_post_by_id(parse_id(id)?).await?;
    Ok(Json(PostResponse::render(post, PostSource::Database, &state.renderer)))
}

/// POST /api/v1/admin/posts
async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let post = state.blog.create_post(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(PostResponse::render(post, PostSource::Database, &state.renderer)),
    ))
}

/// PUT /api/v1/admin/posts/{id}
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdatePostInput>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.blog.update_post(parse_id(id)?, input).await?;
    Ok(Json(PostResponse::render(post, PostSource::Database, &state.renderer)))
}

/// DELETE /api/v1/admin/posts/{id}
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete_post(parse_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/posts/{id}/publish
async fn publish_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.blog.publish_post(parse_id(id)?).await?;
    Ok(Json(PostResponse::render(post, PostSource::Database, &state.renderer)))
}

/// POST /api/v1/admin/posts/{id}/unpublish
async fn unpublish_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state.blog.unpublish_post(parse_id(id)?).await?;
    Ok(Json(PostResponse::render(post, PostSource::Database, &state.renderer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let query: ListPostsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.locale, None);
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);

        let query: ListPostsQuery =
            serde_json::from_str(r#"{"locale": "ru", "page": 3, "per_page": 5}"#).unwrap();
        assert_eq!(query.locale.as_deref(), Some("ru"));
        assert_eq!((query.page, query.per_page), (3, 5));
    }
}
