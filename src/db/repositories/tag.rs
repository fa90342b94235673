//! Tag repository
//!
//! Database operations for tags.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for Postgres and SQLite
//!
//! Tags are unique by slug. Attaching a name that slugifies to an existing
//! tag reuses that tag.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Tag;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag; fails if the slug is taken
    async fn create(&self, name: &str) -> Result<Tag>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// Return the tag for `name`, creating it when missing
    async fn get_or_create(&self, name: &str) -> Result<Tag>;

    /// All tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Replace the tags of a post with `names`, creating missing tags
    async fn set_for_post(&self, post_id: i64, names: &[String]) -> Result<Vec<Tag>>;

    /// Tags attached to a post
    async fn tags_for(&self, post_id: i64) -> Result<Vec<Tag>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, name: &str) -> Result<Tag> {
        let tag = Tag::from_name(name);
        if tag.slug.is_empty() {
            bail!("Tag name '{}' has no usable characters", name);
        }
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_tag_sqlite(pool, &tag).await?,
            Backend::Postgres(pool) => create_tag_postgres(pool, &tag).await?,
        };
        Ok(Tag { id, ..tag })
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = ?")
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get tag by slug")?;
                row.as_ref().map(row_to_tag_sqlite).transpose()
            }
            Backend::Postgres(pool) => {
                let row = sqlx::query("SELECT id, name, slug FROM tags WHERE slug = $1")
                    .bind(slug)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get tag by slug")?;
                row.as_ref().map(row_to_tag_postgres).transpose()
            }
        }
    }

    async fn get_or_create(&self, name: &str) -> Result<Tag> {
        let tag = Tag::from_name(name);
        if tag.slug.is_empty() {
            bail!("Tag name '{}' has no usable characters", name);
        }

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?) ON CONFLICT (slug) DO NOTHING")
                    .bind(&tag.name)
                    .bind(&tag.slug)
                    .execute(pool)
                    .await
                    .context("Failed to upsert tag")?;
            }
            Backend::Postgres(pool) => {
                sqlx::query(
                    "INSERT INTO tags (name, slug) VALUES ($1, $2) ON CONFLICT (slug) DO NOTHING",
                )
                .bind(&tag.name)
                .bind(&tag.slug)
                .execute(pool)
                .await
                .context("Failed to upsert tag")?;
            }
        }

        self.get_by_slug(&tag.slug)
            .await?
            .with_context(|| format!("Tag '{}' vanished after upsert", tag.slug))
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        const SQL: &str = "SELECT id, name, slug FROM tags ORDER BY name, id";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SQL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            Backend::Postgres(pool) => {
                let rows = sqlx::query(SQL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list tags")?;
                rows.iter().map(row_to_tag_postgres).collect()
            }
        }
    }

    async fn set_for_post(&self, post_id: i64, names: &[String]) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());
        for name in names {
            if Tag::from_name(name).slug.is_empty() {
                continue;
            }
            let tag = self.get_or_create(name).await?;
            if !tags.iter().any(|t| t.id == tag.id) {
                tags.push(tag);
            }
        }

        let ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        match self.pool.backend() {
            Backend::Sqlite(pool) => link_tags_sqlite(pool, post_id, &ids).await?,
            Backend::Postgres(pool) => link_tags_postgres(pool, post_id, &ids).await?,
        }
        Ok(tags)
    }

    async fn tags_for(&self, post_id: i64) -> Result<Vec<Tag>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT t.id, t.name, t.slug
                    FROM tags t
                    INNER JOIN blog_post_tags pt ON pt.tag_id = t.id
                    WHERE pt.post_id = ?
                    ORDER BY t.name
                    "#,
                )
                .bind(post_id)
                .fetch_all(pool)
                .await
                .context("Failed to load post tags")?;
                rows.iter().map(row_to_tag_sqlite).collect()
            }
            Backend::Postgres(pool) => {
                let rows = sqlx::query(
                    r#"
                    SELECT t.id, t.name, t.slug
                    FROM tags t
                    INNER JOIN blog_post_tags pt ON pt.tag_id = t.id
                    WHERE pt.post_id = $1
                    ORDER BY t.name
                    "#,
                )
                .bind(post_id)
                .fetch_all(pool)
                .await
                .context("Failed to load post tags")?;
                rows.iter().map(row_to_tag_postgres).collect()
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, tag: &Tag) -> Result<i64> {
    let result = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(&tag.name)
        .bind(&tag.slug)
        .execute(pool)
        .await
        .context("Failed to create tag")?;
    Ok(result.last_insert_rowid())
}

async fn link_tags_sqlite(pool: &SqlitePool, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM blog_post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;
    for tag_id in tag_ids {
        sqlx::query("INSERT OR IGNORE INTO blog_post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .context("Failed to add tag to post")?;
    }
    tx.commit().await?;
    Ok(())
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}

// ============================================================================
// Postgres implementations
// ============================================================================

async fn create_tag_postgres(pool: &PgPool, tag: &Tag) -> Result<i64> {
    let row = sqlx::query("INSERT INTO tags (name, slug) VALUES ($1, $2) RETURNING id")
        .bind(&tag.name)
        .bind(&tag.slug)
        .fetch_one(pool)
        .await
        .context("Failed to create tag")?;
    Ok(row.try_get("id")?)
}

async fn link_tags_postgres(pool: &PgPool, post_id: i64, tag_ids: &[i64]) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM blog_post_tags WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *tx)
        .await
        .context("Failed to clear post tags")?;
    for tag_id in tag_ids {
        sqlx::query(
            "INSERT INTO blog_post_tags (post_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await
        .context("Failed to add tag to post")?;
    }
    tx.commit().await?;
    Ok(())
}

fn row_to_tag_postgres(row: &sqlx::postgres::PgRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
    })
}
