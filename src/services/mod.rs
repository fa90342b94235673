//! Services layer - Business logic
//!
//! This module contains the blog services:
//! - `BlogService`: database reads with timeout and file fallback, writes with validation
//! - `ContentStore`: Markdown posts with YAML front matter
//! - `MarkdownRenderer`: HTML rendering with syntax highlighting
//! - `LocaleResolver`: picking the locale a request is served in

pub mod blog;
pub mod content;
pub mod locale;
pub mod markdown;

pub use blog::{with_timeout, BlogRepositories, BlogService, BlogServiceError, QueryFailure};
pub use content::{ContentError, ContentStore};
pub use locale::{Locale, LocaleResolver};
pub use markdown::{MarkdownRenderer, RenderedDocument, TocEntry};
