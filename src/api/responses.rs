//! Shared API response types
//!
//! Response structures used by the post endpoints, kept here so the public
//! and admin handlers render posts the same way.

use serde::{Deserialize, Serialize};

use crate::models::{Author, BlogPost, ListParams, PagedResult, PostList, PostSource, Tag};
use crate::services::markdown::{MarkdownRenderer, TocEntry};

// ============================================================================
// Post Response Types
// ============================================================================

/// Full post response with rendered content
#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    pub content: String,
    pub content_html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub published: bool,
    pub locale: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
    pub toc: Vec<TocEntry>,
    pub reading_time_minutes: usize,
    pub source: PostSource,
}

impl PostResponse {
    pub fn render(post: BlogPost, source: PostSource, renderer: &MarkdownRenderer) -> Self {
        let document = renderer.render_document(&post.content);
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            content: post.content,
            content_html: document.html,
            cover_image: post.cover_image,
            published: post.published,
            locale: post.locale,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            authors: post.authors,
            tags: post.tags,
            toc: document.toc,
            reading_time_minutes: document.reading_time_minutes,
            source,
        }
    }
}

/// Post without its body, for list views
#[derive(Debug, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    pub published: bool,
    pub locale: String,
    pub published_at: Option<String>,
    pub updated_at: String,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
    pub reading_time_minutes: usize,
}

impl From<BlogPost> for PostSummary {
    fn from(post: BlogPost) -> Self {
        let reading_time_minutes = crate::services::markdown::reading_time_minutes(&post.content);
        Self {
            id: post.id,
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published: post.published,
            locale: post.locale,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            updated_at: post.updated_at.to_rfc3339(),
            authors: post.authors,
            tags: post.tags,
            reading_time_minutes,
        }
    }
}

/// Post list response, one page of the full list
#[derive(Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostSummary>,
    /// Number of posts across all pages
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    /// Locale filter the list was built for, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub source: PostSource,
}

impl PostListResponse {
    pub fn new(list: PostList, locale: Option<String>, params: &ListParams) -> Self {
        let source = list.source;
        let paged = PagedResult::from_vec(list.posts, params);
        let total_pages = paged.total_pages();
        Self {
            posts: paged.items.into_iter().map(PostSummary::from).collect(),
            total: paged.total,
            page: paged.page,
            per_page: paged.per_page,
            total_pages,
            locale,
            source,
        }
    }
}
