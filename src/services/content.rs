//! Markdown content store
//!
//! Reads posts from `<content_dir>/<locale>/<slug>.md`. Each file starts
//! with a YAML front matter block:
//!
//! ```text
//! ---
//! title: Hello
//! date: 2024-05-01
//! authors: [Ada]
//! tags: [rust]
//! ---
//! Body in Markdown.
//! ```
//!
//! Files with unusable front matter are skipped with a warning so one bad
//! file never hides the rest.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Author, BlogPost, Tag as PostTag};
use crate::tools::text::{is_valid_slug, slugify};

/// Maximum excerpt length in characters
pub const EXCERPT_MAX_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: no front matter block")]
    MissingFrontMatter { path: PathBuf },

    #[error("{path}: invalid front matter: {message}")]
    InvalidFrontMatter { path: PathBuf, message: String },

    #[error("{path}: front matter has no title")]
    MissingTitle { path: PathBuf },

    #[error("Content loader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Deserialize)]
struct FrontMatter {
    title: Option<String>,
    slug: Option<String>,
    excerpt: Option<String>,
    date: Option<String>,
    updated: Option<String>,
    cover_image: Option<String>,
    #[serde(default = "default_published")]
    published: bool,
    #[serde(default)]
    authors: Vec<AuthorEntry>,
    #[serde(default)]
    tags: Vec<String>,
}

fn default_published() -> bool {
    true
}

/// Authors may be listed by name or with full details
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        picture: Option<String>,
        #[serde(default)]
        bio: Option<String>,
    },
}

impl From<AuthorEntry> for Author {
    fn from(entry: AuthorEntry) -> Self {
        match entry {
            AuthorEntry::Name(name) => Author::named(name),
            AuthorEntry::Detailed {
                name,
                email,
                picture,
                bio,
            } => Author {
                id: 0,
                name,
                email,
                picture,
                bio,
            },
        }
    }
}

/// Split `---` delimited front matter from the body
fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw
        .strip_prefix("---\r\n")
        .or_else(|| raw.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parse `RFC 3339`, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        })
}

/// Plain text of the first paragraph, cut to [`EXCERPT_MAX_CHARS`]
pub fn first_paragraph_excerpt(markdown: &str) -> Option<String> {
    let mut in_paragraph = false;
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Start(Tag::Paragraph) => in_paragraph = true,
            Event::End(TagEnd::Paragraph) if in_paragraph => {
                if !text.trim().is_empty() {
                    break;
                }
                in_paragraph = false;
            }
            Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
            _ => {}
        }
    }

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.chars().count() <= EXCERPT_MAX_CHARS {
        return Some(text.to_string());
    }
    let cut: String = text.chars().take(EXCERPT_MAX_CHARS).collect();
    Some(format!("{}…", cut.trim_end()))
}

/// Parse one Markdown file into a post
pub fn parse_post(path: &Path, raw: &str, locale: &str, modified: Option<DateTime<Utc>>) -> Result<BlogPost, ContentError> {
    let (yaml, body) = split_front_matter(raw).ok_or_else(|| ContentError::MissingFrontMatter {
        path: path.to_path_buf(),
    })?;
    let front: FrontMatter =
        serde_yaml::from_str(yaml).map_err(|e| ContentError::InvalidFrontMatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let title = front
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ContentError::MissingTitle {
            path: path.to_path_buf(),
        })?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let slug = front
        .slug
        .filter(|s| is_valid_slug(s))
        .unwrap_or_else(|| slugify(&stem));

    let fallback_date = modified.unwrap_or_else(Utc::now);
    let created_at = front.date.as_deref().and_then(parse_date).unwrap_or(fallback_date);
    let updated_at = front
        .updated
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(created_at);

    let content = body.trim_start_matches(['\r', '\n']).to_string();
    let excerpt = front
        .excerpt
        .filter(|e| !e.trim().is_empty())
        .or_else(|| first_paragraph_excerpt(&content));

    let mut tags: Vec<PostTag> = Vec::new();
    for tag in front.tags.iter().map(|name| PostTag::from_name(name)) {
        if !tag.slug.is_empty() && !tags.iter().any(|t| t.slug == tag.slug) {
            tags.push(tag);
        }
    }

    Ok(BlogPost {
        id: 0,
        slug,
        title,
        excerpt,
        content,
        cover_image: front.cover_image.filter(|c| !c.trim().is_empty()),
        published: front.published,
        locale: locale.to_string(),
        created_at,
        updated_at,
        published_at: front.published.then_some(created_at),
        authors: front.authors.into_iter().map(Author::from).collect(),
        tags,
    })
}

/// File-backed post store
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the content directory exists
    pub fn is_present(&self) -> bool {
        self.root.is_dir()
    }

    /// Load every parsable post of a locale, published or not.
    ///
    /// A missing locale directory yields an empty list.
    pub fn load_locale(&self, locale: &str) -> Result<Vec<BlogPost>, ContentError> {
        let dir = self.root.join(locale);
        if !dir.is_dir() {
            tracing::debug!("No content directory for locale {} at {:?}", locale, dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| ContentError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut posts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ContentError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") || !path.is_file() {
                continue;
            }

            let raw = match fs::read_to_string(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Skipping unreadable content file {:?}: {}", path, e);
                    continue;
                }
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .map(DateTime::<Utc>::from);

            match parse_post(&path, &raw, locale, modified) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!("Skipping content file: {}", e),
            }
        }

        Ok(posts)
    }

    /// Published posts of a locale, newest first
    pub fn published_posts(&self, locale: &str) -> Result<Vec<BlogPost>, ContentError> {
        let mut posts: Vec<BlogPost> = self
            .load_locale(locale)?
            .into_iter()
            .filter(BlogPost::is_visible)
            .collect();
        posts.sort_by(|a, b| b.published_at.cmp(&a.published_at).then_with(|| a.slug.cmp(&b.slug)));
        Ok(posts)
    }

    /// Async variant of [`published_posts`](Self::published_posts) run on the blocking pool
    pub async fn list_published(&self, locale: &str) -> Result<Vec<BlogPost>, ContentError> {
        let store = self.clone();
        let locale = locale.to_string();
        tokio::task::spawn_blocking(move || store.published_posts(&locale)).await?
    }

    /// Find a published post by slug
    pub async fn get_post(&self, slug: &str, locale: &str) -> Result<Option<BlogPost>, ContentError> {
        let posts = self.list_published(locale).await?;
        Ok(posts.into_iter().find(|p| p.slug == slug))
    }
}
