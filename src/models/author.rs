//! Author model

use serde::{Deserialize, Serialize};

/// Author of one or more blog posts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Unique identifier (0 for authors read from Markdown front matter)
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Author {
    /// Create an author that only carries a display name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            email: None,
            picture: None,
            bio: None,
        }
    }
}

/// Input for creating a new author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAuthorInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// Input for updating an existing author.
///
/// For the optional profile fields, `Some("")` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAuthorInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
    pub bio: Option<String>,
}

impl UpdateAuthorInput {
    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.picture.is_some() || self.bio.is_some()
    }
}
