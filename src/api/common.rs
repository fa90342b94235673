//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use axum::http::{header, HeaderMap};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState};
use crate::services::locale::Locale;

/// `?locale=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct LocaleQuery {
    #[serde(default)]
    pub locale: Option<String>,
}

/// Locale for a request: the query value, then `Accept-Language`, then the default
pub fn request_locale(state: &AppState, query: &LocaleQuery, headers: &HeaderMap) -> Locale {
    let accept_language = headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    state
        .blog
        .locales()
        .resolve(query.locale.as_deref(), accept_language)
}

/// Path ids must be positive
pub fn parse_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation_error(format!("Invalid id: {}", id)));
    }
    Ok(id)
}
