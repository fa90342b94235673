//! Blog service
//!
//! Implements the blog data layer on top of the repositories:
//! - Every repository call races a fixed query timeout
//! - Reads degrade to the Markdown content store, then to empty results
//! - Writes never degrade; they report why they could not complete
//! - Published post lists are cached per locale and invalidated on writes

use crate::cache::{CacheLayer, MemoryCache};
use crate::config::BlogConfig;
use crate::db::repositories::{
    AuthorRepository, PostRepository, SqlxAuthorRepository, SqlxPostRepository,
    SqlxTagRepository, TagRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{
    Author, BlogPost, CreateAuthorInput, CreatePostInput, PostList, PostSource, Tag,
    UpdateAuthorInput, UpdatePostInput,
};
use crate::services::content::ContentStore;
use crate::services::locale::LocaleResolver;
use crate::tools::text::{is_valid_slug, slugify};
use futures::future::try_join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Cache key prefix for published lists, followed by the locale
const CACHE_KEY_POSTS: &str = "posts:";

/// Cache key prefix for single published posts (`post:<locale>:<slug>`)
const CACHE_KEY_POST: &str = "post:";

/// Why a raced repository call produced no value
#[derive(Debug, thiserror::Error)]
pub enum QueryFailure {
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

/// Race `future` against a timer of `duration`.
///
/// When the timer wins the query future is dropped, which cancels the
/// in-flight query.
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, QueryFailure>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(QueryFailure::Database(e)),
        Err(_) => Err(QueryFailure::Timeout(duration)),
    }
}

/// Error types for blog write operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    /// No database is configured
    #[error("Blog database is not configured")]
    Unavailable,

    #[error("Database query timed out")]
    Timeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Post slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<QueryFailure> for BlogServiceError {
    fn from(failure: QueryFailure) -> Self {
        match failure {
            QueryFailure::Timeout(_) => Self::Timeout,
            QueryFailure::Database(e) => Self::Internal(e),
        }
    }
}

/// Whether an error chain contains a unique-constraint violation
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

/// Repositories backing the blog
#[derive(Clone)]
pub struct BlogRepositories {
    pub posts: Arc<dyn PostRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub tags: Arc<dyn TagRepository>,
}

impl BlogRepositories {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        authors: Arc<dyn AuthorRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        Self {
            posts,
            authors,
            tags,
        }
    }

    /// SQLx repositories sharing one pool
    pub fn from_pool(pool: DynDatabasePool) -> Self {
        Self::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool),
        )
    }

    /// Fill in authors and tags of a post
    async fn hydrate(&self, mut post: BlogPost) -> anyhow::Result<BlogPost> {
        post.authors = self.posts.authors_for(post.id).await?;
        post.tags = self.tags.tags_for(post.id).await?;
        Ok(post)
    }

    async fn hydrate_all(&self, posts: Vec<BlogPost>) -> anyhow::Result<Vec<BlogPost>> {
        try_join_all(posts.into_iter().map(|post| self.hydrate(post))).await
    }
}

/// Blog service
///
/// Serves posts from the database when one is configured and healthy, and
/// from the content directory otherwise.
pub struct BlogService {
    repos: Option<BlogRepositories>,
    content: ContentStore,
    cache: Arc<MemoryCache>,
    cache_ttl: Duration,
    query_timeout: Duration,
    locales: LocaleResolver,
}

impl BlogService {
    /// Create a blog service. `repos` is `None` when no database is configured.
    pub fn new(
        repos: Option<BlogRepositories>,
        content: ContentStore,
        cache: Arc<MemoryCache>,
        config: &BlogConfig,
    ) -> Self {
        let cache_ttl = cache.default_ttl();
        Self {
            repos,
            content,
            cache,
            cache_ttl,
            query_timeout: config.query_timeout(),
            locales: LocaleResolver::new(&config.locales, &config.default_locale),
        }
    }

    pub fn locales(&self) -> &LocaleResolver {
        &self.locales
    }

    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    pub fn has_database(&self) -> bool {
        self.repos.is_some()
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    /// Run a repository future under the query timeout, logging failures
    async fn timed<T, F>(&self, op: &str, future: F) -> Result<T, QueryFailure>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        let result = with_timeout(self.query_timeout, future).await;
        if let Err(ref failure) = result {
            tracing::warn!(op, "Blog query failed: {}", failure);
        }
        result
    }

    fn require_repos(&self) -> Result<&BlogRepositories, BlogServiceError> {
        self.repos.as_ref().ok_or(BlogServiceError::Unavailable)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Published posts of a locale, newest first.
    ///
    /// Database, then content files, then an empty list.
    pub async fn list_published(&self, locale: &str) -> PostList {
        let cache_key = format!("{}{}", CACHE_KEY_POSTS, locale);
        if let Ok(Some(list)) = self.cache.get::<PostList>(&cache_key).await {
            return list;
        }

        if let Some(repos) = &self.repos {
            let fetched = self
                .timed("list_published", async {
                    let posts = repos.posts.list_published(locale).await?;
                    repos.hydrate_all(posts).await
                })
                .await;
            if let Ok(posts) = fetched {
                let list = PostList::new(posts, PostSource::Database);
                if let Err(e) = self.cache.set(&cache_key, &list, self.cache_ttl).await {
                    tracing::debug!("Failed to cache post list: {}", e);
                }
                return list;
            }
        }

        self.list_from_files(locale).await
    }

    async fn list_from_files(&self, locale: &str) -> PostList {
        if !self.content.is_present() {
            return PostList::empty();
        }
        match self.content.list_published(locale).await {
            Ok(posts) => PostList::new(posts, PostSource::Files),
            Err(e) => {
                tracing::warn!("Content fallback failed for locale {}: {}", locale, e);
                PostList::empty()
            }
        }
    }

    /// A published post by slug.
    ///
    /// Content files are consulted only when the database is absent or
    /// fails; a database miss is final.
    pub async fn get_post(&self, slug: &str, locale: &str) -> Option<(BlogPost, PostSource)> {
        let cache_key = format!("{}{}:{}", CACHE_KEY_POST, locale, slug);
        if let Ok(Some(post)) = self.cache.get::<BlogPost>(&cache_key).await {
            return Some((post, PostSource::Database));
        }

        if let Some(repos) = &self.repos {
            let fetched = self
                .timed("get_post", async {
                    match repos.posts.get_by_slug(slug, locale).await? {
                        Some(post) if post.is_visible() => Ok(Some(repos.hydrate(post).await?)),
                        _ => Ok(None),
                    }
                })
                .await;
            if let Ok(found) = fetched {
                let post = found?;
                if let Err(e) = self.cache.set(&cache_key, &post, self.cache_ttl).await {
                    tracing::debug!("Failed to cache post: {}", e);
                }
                return Some((post, PostSource::Database));
            }
        }

        match self.content.get_post(slug, locale).await {
            Ok(post) => post.map(|p| (p, PostSource::Files)),
            Err(e) => {
                tracing::warn!("Content fallback failed for {}/{}: {}", locale, slug, e);
                None
            }
        }
    }

    /// Every post including drafts, for the admin listing
    pub async fn list_all(&self, locale: Option<&str>) -> PostList {
        let Some(repos) = &self.repos else {
            return PostList::empty();
        };
        self.timed("list_all", async {
            let posts = repos.posts.list(locale).await?;
            repos.hydrate_all(posts).await
        })
        .await
        .map(|posts| PostList::new(posts, PostSource::Database))
        .unwrap_or_else(|_| PostList::empty())
    }

    pub async fn list_authors(&self) -> Vec<Author> {
        let Some(repos) = &self.repos else {
            return Vec::new();
        };
        self.timed("list_authors", repos.authors.list())
            .await
            .unwrap_or_default()
    }

    pub async fn list_tags(&self) -> Vec<Tag> {
        let Some(repos) = &self.repos else {
            return Vec::new();
        };
        self.timed("list_tags", repos.tags.list())
            .await
            .unwrap_or_default()
    }

    /// A post by id regardless of state
    pub async fn get_post_by_id(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        let repos = self.require_repos()?;
        self.timed("get_post_by_id", async {
            match repos.posts.get_by_id(id).await? {
                Some(post) => Ok(Some(repos.hydrate(post).await?)),
                None => Ok(None),
            }
        })
        .await?
        .ok_or_else(|| BlogServiceError::NotFound(format!("post {}", id)))
    }

    // ------------------------------------------------------------------
    // Post writes
    // ------------------------------------------------------------------

    /// Create a post.
    ///
    /// # Errors
    /// - `Validation` for an empty title or content, a bad slug, an
    ///   unsupported locale, or unknown authors
    /// - `DuplicateSlug` if `(slug, locale)` is taken
    pub async fn create_post(&self, mut input: CreatePostInput) -> Result<BlogPost, BlogServiceError> {
        let repos = self.require_repos()?;

        validate_title(&input.title)?;
        validate_content(&input.content)?;
        input.title = input.title.trim().to_string();
        input.locale = self.resolve_locale(&input.locale)?;
        input.slug = resolve_slug(&input.slug, &input.title)?;
        self.ensure_authors_exist(repos, &input.author_ids).await?;

        if self
            .timed("exists_by_slug", repos.posts.exists_by_slug(&input.slug, &input.locale, None))
            .await?
        {
            return Err(BlogServiceError::DuplicateSlug(input.slug));
        }

        let post = match self.timed("create_post", repos.posts.create(&input)).await {
            Ok(post) => post,
            Err(QueryFailure::Database(e)) if is_unique_violation(&e) => {
                return Err(BlogServiceError::DuplicateSlug(input.slug));
            }
            Err(e) => return Err(e.into()),
        };

        let authors = Some(input.author_ids.as_slice()).filter(|ids| !ids.is_empty());
        let tags = Some(input.tags.as_slice()).filter(|tags| !tags.is_empty());
        if let Err(e) = self.link_relations(repos, post.id, authors, tags).await {
            // Roll back the half-linked row
            if let Err(rollback) = self.timed("delete_post", repos.posts.delete(post.id)).await {
                tracing::error!("Failed to roll back post {}: {}", post.id, rollback);
            }
            self.invalidate_posts().await;
            return Err(e.into());
        }

        self.invalidate_posts().await;
        tracing::info!("Created post {} ({}/{})", post.id, post.locale, post.slug);

        Ok(self.timed("hydrate_post", repos.hydrate(post)).await?)
    }

    /// Update a post. Fields left as `None` are untouched.
    pub async fn update_post(&self, id: i64, mut input: UpdatePostInput) -> Result<BlogPost, BlogServiceError> {
        let repos = self.require_repos()?;

        let existing = self
            .timed("get_post_by_id", repos.posts.get_by_id(id))
            .await?
            .ok_or_else(|| BlogServiceError::NotFound(format!("post {}", id)))?;

        if let Some(title) = &input.title {
            validate_title(title)?;
            input.title = Some(title.trim().to_string());
        }
        if let Some(content) = &input.content {
            validate_content(content)?;
        }
        if let Some(locale) = &input.locale {
            input.locale = Some(self.resolve_locale(locale)?);
        }
        if let Some(slug) = &input.slug {
            let title = input.title.as_deref().unwrap_or(&existing.title);
            input.slug = Some(resolve_slug(slug, title)?);
        }
        if let Some(author_ids) = &input.author_ids {
            self.ensure_authors_exist(repos, author_ids).await?;
        }

        let slug = input.slug.clone().unwrap_or_else(|| existing.slug.clone());
        let locale = input.locale.clone().unwrap_or_else(|| existing.locale.clone());
        if (slug != existing.slug || locale != existing.locale)
            && self
                .timed("exists_by_slug", repos.posts.exists_by_slug(&slug, &locale, Some(id)))
                .await?
        {
            return Err(BlogServiceError::DuplicateSlug(slug));
        }

        let mut post = existing;
        if input.has_row_changes() {
            post = match self.timed("update_post", repos.posts.update(id, &input)).await {
                Ok(Some(post)) => post,
                Ok(None) => return Err(BlogServiceError::NotFound(format!("post {}", id))),
                Err(QueryFailure::Database(e)) if is_unique_violation(&e) => {
                    return Err(BlogServiceError::DuplicateSlug(slug));
                }
                Err(e) => return Err(e.into()),
            };
        }

        let linked = self
            .link_relations(repos, id, input.author_ids.as_deref(), input.tags.as_deref())
            .await;
        // The row may have changed even when linking failed
        if input.has_changes() {
            self.invalidate_posts().await;
        }
        linked?;
        if input.has_changes() {
            tracing::info!("Updated post {}", id);
        }

        Ok(self.timed("hydrate_post", repos.hydrate(post)).await?)
    }

    /// Delete a post together with its author and tag links
    pub async fn delete_post(&self, id: i64) -> Result<(), BlogServiceError> {
        let repos = self.require_repos()?;
        if !self.timed("delete_post", repos.posts.delete(id)).await? {
            return Err(BlogServiceError::NotFound(format!("post {}", id)));
        }
        self.invalidate_posts().await;
        tracing::info!("Deleted post {}", id);
        Ok(())
    }

    /// Publish a post, stamping `published_at` if it was a draft
    pub async fn publish_post(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        self.set_published(id, true).await
    }

    /// Return a post to draft, clearing `published_at`
    pub async fn unpublish_post(&self, id: i64) -> Result<BlogPost, BlogServiceError> {
        self.set_published(id, false).await
    }

    async fn set_published(&self, id: i64, published: bool) -> Result<BlogPost, BlogServiceError> {
        let repos = self.require_repos()?;
        let post = self
            .timed("set_published", repos.posts.set_published(id, published))
            .await?
            .ok_or_else(|| BlogServiceError::NotFound(format!("post {}", id)))?;
        self.invalidate_posts().await;
        tracing::info!("Post {} published={}", id, published);
        Ok(self.timed("hydrate_post", repos.hydrate(post)).await?)
    }

    // ------------------------------------------------------------------
    // Authors and tags
    // ------------------------------------------------------------------

    pub async fn create_author(&self, mut input: CreateAuthorInput) -> Result<Author, BlogServiceError> {
        let repos = self.require_repos()?;
        input.name = validate_author_name(&input.name)?;
        validate_email(input.email.as_deref())?;
        let author = self.timed("create_author", repos.authors.create(&input)).await?;
        tracing::info!("Created author {} ({})", author.id, author.name);
        Ok(author)
    }

    pub async fn update_author(&self, id: i64, mut input: UpdateAuthorInput) -> Result<Author, BlogServiceError> {
        let repos = self.require_repos()?;
        if let Some(name) = &input.name {
            input.name = Some(validate_author_name(name)?);
        }
        validate_email(input.email.as_deref())?;

        let author = self
            .timed("update_author", repos.authors.update(id, &input))
            .await?
            .ok_or_else(|| BlogServiceError::NotFound(format!("author {}", id)))?;
        // Authors are embedded in cached posts
        self.invalidate_posts().await;
        Ok(author)
    }

    pub async fn delete_author(&self, id: i64) -> Result<(), BlogServiceError> {
        let repos = self.require_repos()?;
        if !self.timed("delete_author", repos.authors.delete(id)).await? {
            return Err(BlogServiceError::NotFound(format!("author {}", id)));
        }
        self.invalidate_posts().await;
        Ok(())
    }

    pub async fn create_tag(&self, name: &str) -> Result<Tag, BlogServiceError> {
        let repos = self.require_repos()?;
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(BlogServiceError::Validation(
                "Tag name must contain letters or digits".to_string(),
            ));
        }
        if self
            .timed("get_tag", repos.tags.get_by_slug(&slug))
            .await?
            .is_some()
        {
            return Err(BlogServiceError::DuplicateSlug(slug));
        }
        match self.timed("create_tag", repos.tags.create(name)).await {
            Ok(tag) => Ok(tag),
            Err(QueryFailure::Database(e)) if is_unique_violation(&e) => {
                Err(BlogServiceError::DuplicateSlug(slug))
            }
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Canonical supported locale for `tag`; empty means the default
    fn resolve_locale(&self, tag: &str) -> Result<String, BlogServiceError> {
        if tag.trim().is_empty() {
            return Ok(self.locales.default_locale().to_string());
        }
        self.locales
            .find(tag)
            .map(|l| l.to_string())
            .ok_or_else(|| BlogServiceError::Validation(format!("Unsupported locale: {}", tag)))
    }

    async fn ensure_authors_exist(&self, repos: &BlogRepositories, author_ids: &[i64]) -> Result<(), BlogServiceError> {
        for &author_id in author_ids {
            if self
                .timed("get_author", repos.authors.get_by_id(author_id))
                .await?
                .is_none()
            {
                return Err(BlogServiceError::Validation(format!(
                    "Author {} does not exist",
                    author_id
                )));
            }
        }
        Ok(())
    }

    /// Replace the author and tag links given as `Some`
    async fn link_relations(
        &self,
        repos: &BlogRepositories,
        post_id: i64,
        author_ids: Option<&[i64]>,
        tags: Option<&[String]>,
    ) -> Result<(), QueryFailure> {
        if let Some(author_ids) = author_ids {
            self.timed("set_authors", repos.posts.set_authors(post_id, author_ids))
                .await?;
        }
        if let Some(tags) = tags {
            self.timed("set_tags", repos.tags.set_for_post(post_id, tags))
                .await?;
        }
        Ok(())
    }

    async fn invalidate_posts(&self) {
        for pattern in [format!("{}*", CACHE_KEY_POSTS), format!("{}*", CACHE_KEY_POST)] {
            if let Err(e) = self.cache.delete_pattern(&pattern).await {
                tracing::warn!("Failed to invalidate {}: {}", pattern, e);
            }
        }
    }
}

fn validate_title(title: &str) -> Result<(), BlogServiceError> {
    if title.trim().is_empty() {
        return Err(BlogServiceError::Validation("Title cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), BlogServiceError> {
    if content.trim().is_empty() {
        return Err(BlogServiceError::Validation("Content cannot be empty".to_string()));
    }
    Ok(())
}

fn validate_author_name(name: &str) -> Result<String, BlogServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BlogServiceError::Validation("Author name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: Option<&str>) -> Result<(), BlogServiceError> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() && !email.contains('@') => Err(
            BlogServiceError::Validation(format!("Invalid email address: {}", email)),
        ),
        _ => Ok(()),
    }
}

/// Use `slug` when given, otherwise derive one from the title
fn resolve_slug(slug: &str, title: &str) -> Result<String, BlogServiceError> {
    let slug = slug.trim();
    if slug.is_empty() {
        let generated = slugify(title);
        if generated.is_empty() {
            return Err(BlogServiceError::Validation(
                "Cannot derive a slug from the title".to_string(),
            ));
        }
        return Ok(generated);
    }
    if !is_valid_slug(slug) {
        return Err(BlogServiceError::Validation(format!(
            "Slug may only contain lowercase letters, digits and single hyphens: {}",
            slug
        )));
    }
    Ok(slug.to_string())
}
