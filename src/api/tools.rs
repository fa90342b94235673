//! Tool API endpoints
//!
//! Thin JSON wrappers over the pure functions in `crate::tools`. Every
//! endpoint is stateless; invalid input answers 400 with the tool error kind
//! in `details.kind`.

use axum::{routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::tools::{
    base64, color, hashing, json, number_base, password, percentage, regex_tester, text,
    timestamp, units, url_codec, uuid_gen,
};

/// Build the tools router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/base64/encode", post(base64_encode))
        .route("/base64/decode", post(base64_decode))
        .route("/json/format", post(json_format))
        .route("/json/minify", post(json_minify))
        .route("/json/validate", post(json_validate))
        .route("/json/to-yaml", post(json_to_yaml))
        .route("/json/from-yaml", post(json_from_yaml))
        .route("/regex/test", post(regex_test))
        .route("/regex/replace", post(regex_replace))
        .route("/password", post(password_generate))
        .route("/password/strength", post(password_strength))
        .route("/uuid", post(uuid_generate))
        .route("/uuid/inspect", post(uuid_inspect))
        .route("/units/temperature", post(units_temperature))
        .route("/units/convert", post(units_convert))
        .route("/percentage", post(percentage_calc))
        .route("/hash", post(hash_digest))
        .route("/url/encode", post(url_encode))
        .route("/url/decode", post(url_decode))
        .route("/url/parse", post(url_parse))
        .route("/timestamp/from-unix", post(timestamp_from_unix))
        .route("/timestamp/to-unix", post(timestamp_to_unix))
        .route("/timestamp/now", get(timestamp_now))
        .route("/number-base", post(number_base_convert))
        .route("/text/slugify", post(text_slugify))
        .route("/text/case", post(text_case))
        .route("/text/stats", post(text_stats))
        .route("/color", post(color_parse))
}

// ============================================================================
// Request / response types
// ============================================================================

/// Single string result
#[derive(Debug, Serialize, Deserialize)]
pub struct TextResult {
    pub result: String,
}

impl From<String> for TextResult {
    fn from(result: String) -> Self {
        Self { result }
    }
}

/// Single number result
#[derive(Debug, Serialize, Deserialize)]
pub struct NumberResult {
    pub result: f64,
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct Base64Request {
    pub text: String,
    #[serde(default)]
    pub url_safe: bool,
}

#[derive(Debug, Deserialize)]
pub struct JsonFormatRequest {
    pub text: String,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_indent() -> usize {
    2
}

#[derive(Debug, Deserialize)]
pub struct RegexRequest {
    pub pattern: String,
    #[serde(default)]
    pub flags: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct RegexReplaceRequest {
    pub pattern: String,
    #[serde(default)]
    pub flags: String,
    pub text: String,
    #[serde(default)]
    pub replacement: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordResponse {
    pub password: String,
    pub strength: password::Strength,
}

#[derive(Debug, Deserialize)]
pub struct PasswordStrengthRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UuidResponse {
    pub uuids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UuidInspectRequest {
    pub uuid: String,
}

#[derive(Debug, Deserialize)]
pub struct TemperatureRequest {
    pub value: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct UnitConvertRequest {
    pub category: units::Category,
    pub value: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentOperation {
    /// x percent of y
    Of,
    /// x as a percentage of y
    WhatPercent,
    /// Change from x to y in percent
    Change,
}

#[derive(Debug, Deserialize)]
pub struct PercentageRequest {
    pub operation: PercentOperation,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct HashRequest {
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    pub text: String,
}

fn default_algorithm() -> String {
    "sha256".to_string()
}

#[derive(Debug, Serialize)]
pub struct HashResponse {
    pub algorithm: hashing::HashAlgorithm,
    pub digest: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlParseRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UnixRequest {
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub struct NumberBaseRequest {
    pub value: String,
    #[serde(default = "default_radix")]
    pub from: u32,
    #[serde(default = "default_radix")]
    pub to: u32,
}

fn default_radix() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct CaseRequest {
    pub text: String,
    pub case: text::Case,
}

// ============================================================================
// Handlers
// ============================================================================

async fn base64_encode(Json(req): Json<Base64Request>) -> Json<TextResult> {
    Json(base64::encode(&req.text, req.url_safe).into())
}

async fn base64_decode(Json(req): Json<Base64Request>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(base64::decode(&req.text, req.url_safe)?.into()))
}

async fn json_format(Json(req): Json<JsonFormatRequest>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(json::format(&req.text, req.indent)?.into()))
}

async fn json_minify(Json(req): Json<TextRequest>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(json::minify(&req.text)?.into()))
}

async fn json_validate(Json(req): Json<TextRequest>) -> Result<Json<json::JsonSummary>, ApiError> {
    Ok(Json(json::validate(&req.text)?))
}

async fn json_to_yaml(Json(req): Json<TextRequest>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(json::to_yaml(&req.text)?.into()))
}

async fn json_from_yaml(Json(req): Json<TextRequest>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(json::from_yaml(&req.text)?.into()))
}

async fn regex_test(Json(req): Json<RegexRequest>) -> Result<Json<regex_tester::RegexReport>, ApiError> {
    Ok(Json(regex_tester::test(&req.pattern, &req.flags, &req.text)?))
}

async fn regex_replace(Json(req): Json<RegexReplaceRequest>) -> Result<Json<TextResult>, ApiError> {
    let result = regex_tester::replace(&req.pattern, &req.flags, &req.text, &req.replacement)?;
    Ok(Json(result.into()))
}

async fn password_generate(Json(options): Json<password::PasswordOptions>) -> Result<Json<PasswordResponse>, ApiError> {
    let generated = password::generate(&options)?;
    let strength = password::strength(&generated);
    Ok(Json(PasswordResponse {
        password: generated,
        strength,
    }))
}

async fn password_strength(Json(req): Json<PasswordStrengthRequest>) -> Json<password::Strength> {
    Json(password::strength(&req.password))
}

async fn uuid_generate(Json(options): Json<uuid_gen::UuidOptions>) -> Result<Json<UuidResponse>, ApiError> {
    Ok(Json(UuidResponse {
        uuids: uuid_gen::generate_v4(&options)?,
    }))
}

async fn uuid_inspect(Json(req): Json<UuidInspectRequest>) -> Result<Json<uuid_gen::UuidInfo>, ApiError> {
    Ok(Json(uuid_gen::inspect(&req.uuid)?))
}

async fn units_temperature(Json(req): Json<TemperatureRequest>) -> Result<Json<NumberResult>, ApiError> {
    let from: units::Temperature = req.from.parse()?;
    let to: units::Temperature = req.to.parse()?;
    Ok(Json(NumberResult {
        result: units::convert_temperature(req.value, from, to)?,
    }))
}

async fn units_convert(Json(req): Json<UnitConvertRequest>) -> Result<Json<NumberResult>, ApiError> {
    Ok(Json(NumberResult {
        result: units::convert(req.category, req.value, &req.from, &req.to)?,
    }))
}

async fn percentage_calc(Json(req): Json<PercentageRequest>) -> Result<Json<NumberResult>, ApiError> {
    let result = match req.operation {
        PercentOperation::Of => percentage::percent_of(req.x, req.y),
        PercentOperation::WhatPercent => percentage::what_percent(req.x, req.y),
        PercentOperation::Change => percentage::percent_change(req.x, req.y),
    }?;
    Ok(Json(NumberResult { result }))
}

async fn hash_digest(Json(req): Json<HashRequest>) -> Result<Json<HashResponse>, ApiError> {
    let algorithm: hashing::HashAlgorithm = req.algorithm.parse()?;
    Ok(Json(HashResponse {
        algorithm,
        digest: hashing::digest(algorithm, &req.text),
    }))
}

async fn url_encode(Json(req): Json<TextRequest>) -> Json<TextResult> {
    Json(url_codec::encode(&req.text).into())
}

async fn url_decode(Json(req): Json<TextRequest>) -> Result<Json<TextResult>, ApiError> {
    Ok(Json(url_codec::decode(&req.text)?.into()))
}

async fn url_parse(Json(req): Json<UrlParseRequest>) -> Result<Json<url_codec::UrlParts>, ApiError> {
    Ok(Json(url_codec::parse(&req.url)?))
}

async fn timestamp_from_unix(Json(req): Json<UnixRequest>) -> Result<Json<timestamp::TimestampInfo>, ApiError> {
    Ok(Json(timestamp::from_unix(req.value)?))
}

async fn timestamp_to_unix(Json(req): Json<TextRequest>) -> Result<Json<timestamp::TimestampInfo>, ApiError> {
    Ok(Json(timestamp::to_unix(&req.text)?))
}

async fn timestamp_now() -> Json<timestamp::TimestampInfo> {
    Json(timestamp::now())
}

async fn number_base_convert(Json(req): Json<NumberBaseRequest>) -> Result<Json<number_base::Conversion>, ApiError> {
    Ok(Json(number_base::convert(&req.value, req.from, req.to)?))
}

async fn text_slugify(Json(req): Json<TextRequest>) -> Json<TextResult> {
    Json(text::slugify(&req.text).into())
}

async fn text_case(Json(req): Json<CaseRequest>) -> Json<TextResult> {
    Json(text::convert_case(&req.text, req.case).into())
}

async fn text_stats(Json(req): Json<TextRequest>) -> Json<text::TextStats> {
    Json(text::stats(&req.text))
}

async fn color_parse(Json(req): Json<TextRequest>) -> Result<Json<color::ColorInfo>, ApiError> {
    Ok(Json(color::parse(&req.text)?))
}
