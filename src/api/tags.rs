//! Tag API endpoints
//!
//! Handles HTTP requests for tags:
//! - GET /api/v1/tags - Tag list
//! - POST /api/v1/admin/tags - Create a tag

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Tag;

/// Response for tag list
#[derive(Debug, Serialize)]
pub struct TagListResponse {
    pub tags: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_tags))
}

pub fn admin_router() -> Router<AppState> {
    Router::new().route("/", post(create_tag))
}

/// GET /api/v1/tags
async fn list_tags(State(state): State<AppState>) -> Json<TagListResponse> {
    Json(TagListResponse {
        tags: state.blog.list_tags().await,
    })
}

/// POST /api/v1/admin/tags
async fn create_tag(
    State(state): State<AppState>,
    Json(request): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.blog.create_tag(&request.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}
