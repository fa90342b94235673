//! Network measurement endpoints
//!
//! Used by the speed test and "what is my IP" widgets:
//! - GET /api/ip - Client address
//! - POST /api/upload - Drain the body and report its size and timing
//! - GET /api/download?bytes=N - Random payload of N bytes
//! - GET /api/ping - Minimal response for latency probes

use axum::{
    body::{Body, Bytes},
    extract::{ConnectInfo, DefaultBodyLimit, Query, Request, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Instant;

use crate::api::middleware::{ApiError, AppState};

/// Size of each generated download chunk
const DOWNLOAD_CHUNK: usize = 64 * 1024;

/// Payload size when `bytes` is not given (1 MiB)
const DEFAULT_DOWNLOAD_BYTES: u64 = 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ip", get(client_ip))
        .route("/api/upload", post(upload).layer(DefaultBodyLimit::disable()))
        .route("/api/download", get(download))
        .route("/api/ping", get(ping))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IpResponse {
    pub ip: String,
    /// Which header or socket the address came from
    pub source: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub bytes: u64,
    pub elapsed_ms: f64,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub bytes: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub pong: bool,
    pub server_time: String,
}

fn no_store() -> [(header::HeaderName, HeaderValue); 1] {
    [(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))]
}

/// First usable address from the proxy headers
pub fn forwarded_ip(headers: &HeaderMap) -> Option<(String, &'static str)> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').map(str::trim).find(|ip| !ip.is_empty()));
    if let Some(ip) = forwarded {
        return Some((ip.to_string(), "x-forwarded-for"));
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(|ip| (ip.to_string(), "x-real-ip"))
}

/// GET /api/ip
async fn client_ip(request: Request) -> impl IntoResponse {
    let (ip, source) = forwarded_ip(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| (addr.ip().to_string(), "socket"))
        })
        .unwrap_or_else(|| ("unknown".to_string(), "none"));

    (
        no_store(),
        Json(IpResponse {
            ip,
            source: source.to_string(),
        }),
    )
}

/// POST /api/upload
///
/// Reads the body as a stream so oversized uploads are cut off once they
/// pass `max_upload_bytes`.
async fn upload(State(state): State<AppState>, body: Body) -> Result<impl IntoResponse, ApiError> {
    let limit = state.tools.max_upload_bytes;
    let started = Instant::now();
    let mut received: u64 = 0;

    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ApiError::validation_error(format!("Upload failed: {}", e)))?;
        received += chunk.len() as u64;
        if received > limit {
            return Err(ApiError::payload_too_large(format!(
                "Upload exceeds {} bytes",
                limit
            )));
        }
    }

    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::debug!("Upload probe: {} bytes in {:.1} ms", received, elapsed_ms);

    Ok((
        no_store(),
        Json(UploadResponse {
            bytes: received,
            elapsed_ms,
        }),
    ))
}

/// GET /api/download
async fn download(State(state): State<AppState>, Query(query): Query<DownloadQuery>) -> Response {
    let size = query
        .bytes
        .unwrap_or(DEFAULT_DOWNLOAD_BYTES)
        .min(state.tools.max_download_bytes);

    let chunk = DOWNLOAD_CHUNK as u64;
    let chunks = (0..size.div_ceil(chunk)).map(move |i| {
        let len = chunk.min(size - i * chunk) as usize;
        let mut buf = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut buf);
        Ok::<_, std::convert::Infallible>(Bytes::from(buf))
    });

    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
            (header::CONTENT_LENGTH, HeaderValue::from(size)),
        ],
        Body::from_stream(futures::stream::iter(chunks)),
    )
        .into_response()
}

/// GET /api/ping
async fn ping() -> impl IntoResponse {
    (
        no_store(),
        Json(PingResponse {
            pong: true,
            server_time: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_ip_prefers_first_forwarded_entry() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            forwarded_ip(&headers),
            Some(("203.0.113.7".to_string(), "x-forwarded-for"))
        );
    }

    #[test]
    fn test_forwarded_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , "));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(
            forwarded_ip(&headers),
            Some(("198.51.100.2".to_string(), "x-real-ip"))
        );
        assert!(forwarded_ip(&HeaderMap::new()).is_none());
    }
}
