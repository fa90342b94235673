//! Health check endpoint
//!
//! GET /health reports database reachability and whether the Markdown
//! content directory exists. The process is healthy as long as one of the
//! two can serve posts.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::AppState;
use crate::services::blog::with_timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Up,
    Down,
    /// No database configured
    Disabled,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "ok" or "degraded"
    pub status: String,
    pub database: DatabaseStatus,
    pub content_dir: bool,
    pub version: String,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = match &state.pool {
        None => DatabaseStatus::Disabled,
        Some(pool) => match with_timeout(state.blog.query_timeout(), pool.ping()).await {
            Ok(()) => DatabaseStatus::Up,
            Err(e) => {
                tracing::warn!("Health check: database unreachable: {}", e);
                DatabaseStatus::Down
            }
        },
    };
    let content_dir = state.blog.content().is_present();

    let healthy = database == DatabaseStatus::Up || content_dir;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(HealthResponse {
            status: if database == DatabaseStatus::Down || !healthy { "degraded" } else { "ok" }.to_string(),
            database,
            content_dir,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
