//! Blog post model
//!
//! This module provides:
//! - `BlogPost` entity and the input types for creating and updating posts
//! - `PostSource` / `PostList` describing where a read was served from
//! - Pagination types for list endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Tag};

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    /// Unique identifier (0 for posts read from Markdown files)
    pub id: i64,
    /// URL-friendly slug, unique per locale
    pub slug: String,
    pub title: String,
    /// Short summary shown in listings
    pub excerpt: Option<String>,
    /// Markdown body
    pub content: String,
    pub cover_image: Option<String>,
    pub published: bool,
    /// Language tag, e.g. "en"
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the post becomes published, cleared when it is unpublished
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl BlogPost {
    /// Whether the post may be shown to anonymous readers
    pub fn is_visible(&self) -> bool {
        self.published && self.published_at.is_some()
    }
}

/// Input for creating a new post
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostInput {
    /// Generated from the title when empty
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Falls back to the default locale when empty
    #[serde(default)]
    pub locale: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub author_ids: Vec<i64>,
    /// Tag names; missing tags are created
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreatePostInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            locale: locale.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    pub fn with_authors(mut self, author_ids: Vec<i64>) -> Self {
        self.author_ids = author_ids;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Input for updating an existing post.
///
/// `None` leaves a field untouched. For `excerpt` and `cover_image`,
/// `Some("")` clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub locale: Option<String>,
    pub published: Option<bool>,
    pub author_ids: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    /// Check if any column of the post row changes
    pub fn has_row_changes(&self) -> bool {
        self.slug.is_some()
            || self.title.is_some()
            || self.excerpt.is_some()
            || self.content.is_some()
            || self.cover_image.is_some()
            || self.locale.is_some()
            || self.published.is_some()
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.has_row_changes() || self.author_ids.is_some() || self.tags.is_some()
    }
}

/// Where a list or lookup was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSource {
    Database,
    /// Markdown files in the content directory
    Files,
    /// Every source failed; the result is the empty default
    Empty,
}

/// Posts together with the source that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostList {
    pub posts: Vec<BlogPost>,
    pub source: PostSource,
}

impl PostList {
    pub fn new(posts: Vec<BlogPost>, source: PostSource) -> Self {
        Self { posts, source }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), PostSource::Empty)
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl ListParams {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.per_page as usize
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Cut one page out of a fully loaded list
    pub fn from_vec(all: Vec<T>, params: &ListParams) -> Self {
        let total = all.len();
        let items = all
            .into_iter()
            .skip(params.offset())
            .take(params.per_page as usize)
            .collect();
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 0;
        }
        self.total.div_ceil(self.per_page as usize) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_clamps() {
        let params = ListParams::new(0, 500);
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 100);
        assert_eq!(params.offset(), 0);

        let params = ListParams::new(3, 10);
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn test_paged_result_from_vec() {
        let items: Vec<u32> = (1..=25).collect();
        let page = PagedResult::from_vec(items, &ListParams::new(3, 10));

        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert!(!page.has_next());
    }

    #[test]
    fn test_paged_result_past_the_end() {
        let page = PagedResult::from_vec(vec![1, 2, 3], &ListParams::new(5, 10));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn test_update_input_change_tracking() {
        assert!(!UpdatePostInput::new().has_changes());
        assert!(UpdatePostInput::new().with_published(true).has_row_changes());

        let tags_only = UpdatePostInput {
            tags: Some(vec!["rust".to_string()]),
            ..UpdatePostInput::default()
        };
        assert!(tags_only.has_changes());
        assert!(!tags_only.has_row_changes());
    }
}
