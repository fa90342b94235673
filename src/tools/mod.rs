//! Stateless utility tools
//!
//! Each submodule is one self-contained tool: pure functions from input to
//! output, returning [`ToolError`] for bad input. The HTTP layer in
//! `api::tools` is a thin JSON wrapper around these functions.

pub mod base64;
pub mod color;
pub mod error;
pub mod hashing;
pub mod json;
pub mod number_base;
pub mod password;
pub mod percentage;
pub mod regex_tester;
pub mod text;
pub mod timestamp;
pub mod units;
pub mod url_codec;
pub mod uuid_gen;

pub use error::{ToolError, ToolResult};
