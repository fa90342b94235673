//! Folio - Portfolio and blog backend
//!
//! This library provides the blog data layer (Postgres or SQLite with a
//! Markdown file fallback), the stateless utility tools, and the HTTP API
//! exposing both.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tools;
