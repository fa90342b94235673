//! Author API endpoints
//!
//! - GET /api/v1/authors - Author list
//! - POST /api/v1/admin/authors - Create an author
//! - PUT|DELETE /api/v1/admin/authors/{id}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::common::parse_id;
use crate::api::middleware::{ApiError, AppState};
use crate::models::{Author, CreateAuthorInput, UpdateAuthorInput};

#[derive(Debug, Serialize)]
pub struct AuthorListResponse {
    pub authors: Vec<Author>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_authors))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_author))
        .route("/{id}", put(update_author).delete(delete_author))
}

/// GET /api/v1/authors
async fn list_authors(State(state): State<AppState>) -> Json<AuthorListResponse> {
    Json(AuthorListResponse {
        authors: state.blog.list_authors().await,
    })
}

/// POST /api/v1/admin/authors
async fn create_author(
    State(state): State<AppState>,
    Json(input): Json<CreateAuthorInput>,
) -> Result<(StatusCode, Json<Author>), ApiError> {
    let author = state.blog.create_author(input).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// PUT /api/v1/admin/authors/{id}
async fn update_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateAuthorInput>,
) -> Result<Json<Author>, ApiError> {
    let author = state.blog.update_author(parse_id(id)?, input).await?;
    Ok(Json(author))
}

/// DELETE /api/v1/admin/authors/{id}
async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.blog.delete_author(parse_id(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
