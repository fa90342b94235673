//! Author repository
//!
//! Database operations for post authors.

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Author, CreateAuthorInput, UpdateAuthorInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, SqlitePool};
use std::sync::Arc;

use super::post::blank_to_none;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create(&self, input: &CreateAuthorInput) -> Result<Author>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    /// All authors ordered by name
    async fn list(&self) -> Result<Vec<Author>>;

    /// Apply the changed fields. Returns `None` if the author doesn't exist.
    async fn update(&self, id: i64, input: &UpdateAuthorInput) -> Result<Option<Author>>;

    /// Delete an author; post links are removed by cascade
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, input: &CreateAuthorInput) -> Result<Author> {
        let author = Author {
            id: 0,
            name: input.name.trim().to_string(),
            email: blank_to_none(input.email.as_deref()),
            picture: blank_to_none(input.picture.as_deref()),
            bio: blank_to_none(input.bio.as_deref()),
        };

        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => insert_author_sqlite(pool, &author).await?,
            Backend::Postgres(pool) => insert_author_postgres(pool, &author).await?,
        };
        Ok(Author { id, ..author })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query("SELECT id, name, email, picture, bio FROM authors WHERE id = ?")
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get author by ID")?;
                row.as_ref().map(row_to_author_sqlite).transpose()
            }
            Backend::Postgres(pool) => {
                let row = sqlx::query("SELECT id, name, email, picture, bio FROM authors WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get author by ID")?;
                row.as_ref().map(row_to_author_postgres).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Author>> {
        const SQL: &str = "SELECT id, name, email, picture, bio FROM authors ORDER BY name, id";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(SQL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list authors")?;
                rows.iter().map(row_to_author_sqlite).collect()
            }
            Backend::Postgres(pool) => {
                let rows = sqlx::query(SQL)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list authors")?;
                rows.iter().map(row_to_author_postgres).collect()
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateAuthorInput) -> Result<Option<Author>> {
        let Some(existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        if !input.has_changes() {
            return Ok(Some(existing));
        }

        let merge = |new: &Option<String>, old: Option<String>| match new {
            Some(value) => blank_to_none(Some(value)),
            None => old,
        };
        let author = Author {
            id,
            name: input
                .name
                .as_deref()
                .map(str::trim)
                .map(str::to_string)
                .unwrap_or(existing.name),
            email: merge(&input.email, existing.email),
            picture: merge(&input.picture, existing.picture),
            bio: merge(&input.bio, existing.bio),
        };

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query("UPDATE authors SET name = ?, email = ?, picture = ?, bio = ? WHERE id = ?")
                    .bind(&author.name)
                    .bind(&author.email)
                    .bind(&author.picture)
                    .bind(&author.bio)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update author")?;
            }
            Backend::Postgres(pool) => {
                sqlx::query(
                    "UPDATE authors SET name = $1, email = $2, picture = $3, bio = $4 WHERE id = $5",
                )
                .bind(&author.name)
                .bind(&author.email)
                .bind(&author.picture)
                .bind(&author.bio)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to update author")?;
            }
        }

        Ok(Some(author))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query("DELETE FROM authors WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Postgres(pool) => sqlx::query("DELETE FROM authors WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete author")?;
        Ok(affected > 0)
    }
}

async fn insert_author_sqlite(pool: &SqlitePool, author: &Author) -> Result<i64> {
    let result = sqlx::query("INSERT INTO authors (name, email, picture, bio) VALUES (?, ?, ?, ?)")
        .bind(&author.name)
        .bind(&author.email)
        .bind(&author.picture)
        .bind(&author.bio)
        .execute(pool)
        .await
        .context("Failed to create author")?;
    Ok(result.last_insert_rowid())
}

async fn insert_author_postgres(pool: &PgPool, author: &Author) -> Result<i64> {
    let row = sqlx::query(
        "INSERT INTO authors (name, email, picture, bio) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&author.name)
    .bind(&author.email)
    .bind(&author.picture)
    .bind(&author.bio)
    .fetch_one(pool)
    .await
    .context("Failed to create author")?;
    Ok(row.try_get("id")?)
}

pub(crate) fn row_to_author_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Author> {
    Ok(Author {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        picture: row.try_get("picture")?,
        bio: row.try_get("bio")?,
    })
}

pub(crate) fn row_to_author_postgres(row: &sqlx::postgres::PgRow) -> Result<Author> {
    Ok(Author {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        picture: row.try_get("picture")?,
        bio: row.try_get("bio")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxAuthorRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxAuthorRepository::new(pool)
    }

    fn input(name: &str) -> CreateAuthorInput {
        CreateAuthorInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_author() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&CreateAuthorInput {
                name: " Grace Hopper ".to_string(),
                email: Some("grace@example.com".to_string()),
                picture: Some(String::new()),
                bio: None,
            })
            .await
            .unwrap();

        assert!(created.id > 0);
        assert_eq!(created.name, "Grace Hopper");
        assert!(created.picture.is_none());

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_list_authors_sorted_by_name() {
        let repo = setup_test_repo().await;
        repo.create(&input("Zed")).await.unwrap();
        repo.create(&input("Alice")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Alice", "Zed"]);
    }

    #[tokio::test]
    async fn test_update_author_partial() {
        let repo = setup_test_repo().await;
        let created = repo
            .create(&CreateAuthorInput {
                name: "Alan".to_string(),
                bio: Some("Mathematician".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = repo
            .update(
                created.id,
                &UpdateAuthorInput {
                    email: Some("alan@example.com".to_string()),
                    bio: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Alan");
        assert_eq!(updated.email.as_deref(), Some("alan@example.com"));
        assert!(updated.bio.is_none());
        assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let repo = setup_test_repo().await;
        let result = repo
            .update(42, &UpdateAuthorInput { name: Some("x".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete_author() {
        let repo = setup_test_repo().await;
        let created = repo.create(&input("Temp")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
