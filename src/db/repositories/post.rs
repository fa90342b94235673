//! Blog post repository
//!
//! Database operations for blog posts and their author associations.
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for Postgres and SQLite
//!
//! Returned posts carry empty `authors`/`tags`; the blog service hydrates them.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Author, BlogPost, CreatePostInput, UpdatePostInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, content, cover_image, published, locale, created_at, updated_at, published_at";

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post; `published_at` is stamped when created published
    async fn create(&self, input: &CreatePostInput) -> Result<BlogPost>;

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>>;

    async fn get_by_slug(&self, slug: &str, locale: &str) -> Result<Option<BlogPost>>;

    /// Published posts of one locale, newest first
    async fn list_published(&self, locale: &str) -> Result<Vec<BlogPost>>;

    /// All posts regardless of state, optionally restricted to one locale
    async fn list(&self, locale: Option<&str>) -> Result<Vec<BlogPost>>;

    /// Apply the changed fields. Returns `None` if the post doesn't exist.
    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<BlogPost>>;

    /// Delete a post. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Check whether `(slug, locale)` is taken by a post other than `exclude_id`
    async fn exists_by_slug(&self, slug: &str, locale: &str, exclude_id: Option<i64>) -> Result<bool>;

    /// Replace the ordered author list of a post
    async fn set_authors(&self, post_id: i64, author_ids: &[i64]) -> Result<()>;

    /// Authors of a post in their stored order
    async fn authors_for(&self, post_id: i64) -> Result<Vec<Author>>;

    /// Publish or unpublish a post
    async fn set_published(&self, id: i64, published: bool) -> Result<Option<BlogPost>> {
        self.update(id, &UpdatePostInput::new().with_published(published))
            .await
    }
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, input: &CreatePostInput) -> Result<BlogPost> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_post_sqlite(pool, input).await,
            Backend::Postgres(pool) => create_post_postgres(pool, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_post_by_id_sqlite(pool, id).await,
            Backend::Postgres(pool) => get_post_by_id_postgres(pool, id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str, locale: &str) -> Result<Option<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_post_by_slug_sqlite(pool, slug, locale).await,
            Backend::Postgres(pool) => get_post_by_slug_postgres(pool, slug, locale).await,
        }
    }

    async fn list_published(&self, locale: &str) -> Result<Vec<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_published_sqlite(pool, locale).await,
            Backend::Postgres(pool) => list_published_postgres(pool, locale).await,
        }
    }

    async fn list(&self, locale: Option<&str>) -> Result<Vec<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_posts_sqlite(pool, locale).await,
            Backend::Postgres(pool) => list_posts_postgres(pool, locale).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Option<BlogPost>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_post_sqlite(pool, id, input).await,
            Backend::Postgres(pool) => update_post_postgres(pool, id, input).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM blog_posts WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Postgres(pool) => sqlx::query("DELETE FROM blog_posts WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete post")?;
        Ok(affected > 0)
    }

    async fn exists_by_slug(&self, slug: &str, locale: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exclude_id = exclude_id.unwrap_or(0);
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(
                "SELECT COUNT(*) AS count FROM blog_posts WHERE slug = ? AND locale = ? AND id <> ?",
            )
            .bind(slug)
            .bind(locale)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check slug")?
            .try_get("count")?,
            Backend::Postgres(pool) => sqlx::query(
                "SELECT COUNT(*) AS count FROM blog_posts WHERE slug = $1 AND locale = $2 AND id <> $3",
            )
            .bind(slug)
            .bind(locale)
            .bind(exclude_id)
            .fetch_one(pool)
            .await
            .context("Failed to check slug")?
            .try_get("count")?,
        };
        Ok(count > 0)
    }

    async fn set_authors(&self, post_id: i64, author_ids: &[i64]) -> Result<()> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => set_authors_sqlite(pool, post_id, author_ids).await,
            Backend::Postgres(pool) => set_authors_postgres(pool, post_id, author_ids).await,
        }
    }

    async fn authors_for(&self, post_id: i64) -> Result<Vec<Author>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT a.id, a.name, a.email, a.picture, a.bio
                    FROM authors a
                    INNER JOIN blog_post_authors pa ON pa.author_id = a.id
                    WHERE pa.post_id = ?
                    ORDER BY pa.position, a.id
                    "#,
                )
                .bind(post_id)
                .fetch_all(pool)
                .await
                .context("Failed to load post authors")?;
                rows.iter().map(super::author::row_to_author_sqlite).collect()
            }
            Backend::Postgres(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT a.id, a.name, a.email, a.picture, a.bio
                    FROM authors a
                    INNER JOIN blog_post_authors pa ON pa.author_id = a.id
                    WHERE pa.post_id = $1
                    ORDER BY pa.position, a.id
                    "#,
                )
                .bind(post_id)
                .fetch_all(pool)
                .await
                .context("Failed to load post authors")?;
                rows.iter().map(super::author::row_to_author_postgres).collect()
            }
        }
    }
}

/// Treat empty optional text as absent
pub(crate) fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Resolve the row values an update produces from the stored post
struct MergedPost {
    slug: String,
    title: String,
    excerpt: Option<String>,
    content: String,
    cover_image: Option<String>,
    locale: String,
    published: bool,
    published_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl MergedPost {
    fn new(existing: &BlogPost, input: &UpdatePostInput) -> Self {
        let now = Utc::now();
        let published = input.published.unwrap_or(existing.published);
        let published_at = match (existing.published, published) {
            (false, true) => Some(now),
            (_, false) => None,
            (true, true) => existing.published_at.or(Some(now)),
        };

        Self {
            slug: input.slug.clone().unwrap_or_else(|| existing.slug.clone()),
            title: input.title.clone().unwrap_or_else(|| existing.title.clone()),
            excerpt: match &input.excerpt {
                Some(excerpt) => blank_to_none(Some(excerpt)),
                None => existing.excerpt.clone(),
            },
            content: input.content.clone().unwrap_or_else(|| existing.content.clone()),
            cover_image: match &input.cover_image {
                Some(cover) => blank_to_none(Some(cover)),
                None => existing.cover_image.clone(),
            },
            locale: input.locale.clone().unwrap_or_else(|| existing.locale.clone()),
            published,
            published_at,
            updated_at: now,
        }
    }

    fn into_post(self, existing: BlogPost) -> BlogPost {
        BlogPost {
            slug: self.slug,
            title: self.title,
            excerpt: self.excerpt,
            content: self.content,
            cover_image: self.cover_image,
            locale: self.locale,
            published: self.published,
            published_at: self.published_at,
            updated_at: self.updated_at,
            ..existing
        }
    }
}

fn new_post(id: i64, input: &CreatePostInput, now: DateTime<Utc>) -> BlogPost {
    BlogPost {
        id,
        slug: input.slug.clone(),
        title: input.title.clone(),
        excerpt: blank_to_none(input.excerpt.as_deref()),
        content: input.content.clone(),
        cover_image: blank_to_none(input.cover_image.as_deref()),
        published: input.published,
        locale: input.locale.clone(),
        created_at: now,
        updated_at: now,
        published_at: input.published.then_some(now),
        authors: Vec::new(),
        tags: Vec::new(),
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, input: &CreatePostInput) -> Result<BlogPost> {
    let now = Utc::now();
    let post = new_post(0, input, now);

    let result = sqlx::query(
        r#"
        INSERT INTO blog_posts (slug, title, excerpt, content, cover_image, published, locale, created_at, updated_at, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.cover_image)
    .bind(post.published)
    .bind(&post.locale)
    .bind(post.created_at)
    .bind(post.updated_at)
    .bind(post.published_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(BlogPost {
        id: result.last_insert_rowid(),
        ..post
    })
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<BlogPost>> {
    let sql = format!("SELECT {} FROM blog_posts WHERE id = ?", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_sqlite).transpose()
}

async fn get_post_by_slug_sqlite(pool: &SqlitePool, slug: &str, locale: &str) -> Result<Option<BlogPost>> {
    let sql = format!(
        "SELECT {} FROM blog_posts WHERE slug = ? AND locale = ?",
        POST_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(slug)
        .bind(locale)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;

    row.as_ref().map(row_to_post_sqlite).transpose()
}

async fn list_published_sqlite(pool: &SqlitePool, locale: &str) -> Result<Vec<BlogPost>> {
    let sql = format!(
        r#"
        SELECT {} FROM blog_posts
        WHERE locale = ? AND published = 1 AND published_at IS NOT NULL
        ORDER BY published_at DESC, id DESC
        "#,
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(locale)
        .fetch_all(pool)
        .await
        .context("Failed to list published posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn list_posts_sqlite(pool: &SqlitePool, locale: Option<&str>) -> Result<Vec<BlogPost>> {
    let sql = format!(
        r#"
        SELECT {} FROM blog_posts
        WHERE (? IS NULL OR locale = ?)
        ORDER BY created_at DESC, id DESC
        "#,
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(locale)
        .bind(locale)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn update_post_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePostInput) -> Result<Option<BlogPost>> {
    let Some(existing) = get_post_by_id_sqlite(pool, id).await? else {
        return Ok(None);
    };
    if !input.has_row_changes() {
        return Ok(Some(existing));
    }

    let merged = MergedPost::new(&existing, input);
    sqlx::query(
        r#"
        UPDATE blog_posts
        SET slug = ?, title = ?, excerpt = ?, content = ?, cover_image = ?, locale = ?,
            published = ?, published_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.slug)
    .bind(&merged.title)
    .bind(&merged.excerpt)
    .bind(&merged.content)
    .bind(&merged.cover_image)
    .bind(&merged.locale)
    .bind(merged.published)
    .bind(merged.published_at)
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    Ok(Some(merged.into_post(existing)))
}

async fn set_authors_sqlite(pool: &SqlitePool, post_id: i64, author_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM blog_post_authors WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post authors")?;

    for (position, author_id) in author_ids.iter().enumerate() {
        sqlx::query(
            "INSERT OR IGNORE INTO blog_post_authors (post_id, author_id, position) VALUES (?, ?, ?)",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await
        .context("Failed to add post author")?;
    }

    tx.commit().await?;
    Ok(())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<BlogPost> {
    Ok(BlogPost {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        cover_image: row.try_get("cover_image")?,
        published: row.try_get("published")?,
        locale: row.try_get("locale")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        published_at: row.try_get("published_at")?,
        authors: Vec::new(),
        tags: Vec::new(),
    })
}

// ============================================================================
// Postgres implementations
// ============================================================================

async fn create_post_postgres(pool: &PgPool, input: &CreatePostInput) -> Result<BlogPost> {
    let now = Utc::now();
    let post = new_post(0, input, now);

    let id: i64 = sqlx::query(
        r#"
        INSERT INTO blog_posts (slug, title, excerpt, content, cover_image, published, locale, created_at, updated_at, published_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(&post.slug)
    .bind(&post.title)
    .bind(&post.excerpt)
    .bind(&post.content)
    .bind(&post.cover_image)
    .bind(post.published)
    .bind(&post.locale)
    .bind(post.created_at)
    .bind(post.updated_at)
    .bind(post.published_at)
    .fetch_one(pool)
    .await
    .context("Failed to create post")?
    .try_get("id")?;

    Ok(BlogPost { id, ..post })
}

async fn get_post_by_id_postgres(pool: &PgPool, id: i64) -> Result<Option<BlogPost>> {
    let sql = format!("SELECT {} FROM blog_posts WHERE id = $1", POST_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    row.as_ref().map(row_to_post_postgres).transpose()
}

async fn get_post_by_slug_postgres(pool: &PgPool, slug: &str, locale: &str) -> Result<Option<BlogPost>> {
    let sql = format!(
        "SELECT {} FROM blog_posts WHERE slug = $1 AND locale = $2",
        POST_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(slug)
        .bind(locale)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by slug")?;

    row.as_ref().map(row_to_post_postgres).transpose()
}

async fn list_published_postgres(pool: &PgPool, locale: &str) -> Result<Vec<BlogPost>> {
    let sql = format!(
        r#"
        SELECT {} FROM blog_posts
        WHERE locale = $1 AND published = TRUE AND published_at IS NOT NULL
        ORDER BY published_at DESC, id DESC
        "#,
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(locale)
        .fetch_all(pool)
        .await
        .context("Failed to list published posts")?;

    rows.iter().map(row_to_post_postgres).collect()
}

async fn list_posts_postgres(pool: &PgPool, locale: Option<&str>) -> Result<Vec<BlogPost>> {
    let sql = format!(
        r#"
        SELECT {} FROM blog_posts
        WHERE ($1::TEXT IS NULL OR locale = $1)
        ORDER BY created_at DESC, id DESC
        "#,
        POST_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(locale)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_postgres).collect()
}

async fn update_post_postgres(pool: &PgPool, id: i64, input: &UpdatePostInput) -> Result<Option<BlogPost>> {
    let Some(existing) = get_post_by_id_postgres(pool, id).await? else {
        return Ok(None);
    };
    if !input.has_row_changes() {
        return Ok(Some(existing));
    }

    let merged = MergedPost::new(&existing, input);
    sqlx::query(
        r#"
        UPDATE blog_posts
        SET slug = $1, title = $2, excerpt = $3, content = $4, cover_image = $5, locale = $6,
            published = $7, published_at = $8, updated_at = $9
        WHERE id = $10
        "#,
    )
    .bind(&merged.slug)
    .bind(&merged.title)
    .bind(&merged.excerpt)
    .bind(&merged.content)
    .bind(&merged.cover_image)
    .bind(&merged.locale)
    .bind(merged.published)
    .bind(merged.published_at)
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    Ok(Some(merged.into_post(existing)))
}

async fn set_authors_postgres(pool: &PgPool, post_id: i64, author_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM blog_post_authors WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post authors")?;

    for (position, author_id) in author_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO blog_post_authors (post_id, author_id, position) VALUES ($1, $2, $3)
            ON CONFLICT (post_id, author_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .bind(position as i32)
        .execute(&mut *tx)
        .await
        .context("Failed to add post author")?;
    }

    tx.commit().await?;
    Ok(())
}

fn row_to_post_postgres(row: &sqlx::postgres::PgRow) -> Result<BlogPost> {
    Ok(BlogPost {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        cover_image: row.try_get("cover_image")?,
        published: row.try_get("published")?,
        locale: row.try_get("locale")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        published_at: row.try_get("published_at")?,
        authors: Vec::new(),
        tags: Vec::new(),
    })
}
