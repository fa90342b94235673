//! Tag model

use serde::{Deserialize, Serialize};

/// Tag attached to blog posts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier (0 for tags read from Markdown front matter)
    pub id: i64,
    pub name: String,
    /// URL-friendly slug, unique across tags
    pub slug: String,
}

impl Tag {
    /// Build a tag from its display name, deriving the slug
    pub fn from_name(name: &str) -> Self {
        Self {
            id: 0,
            name: name.trim().to_string(),
            slug: crate::tools::text::slugify(name),
        }
    }
}
