//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod author;
pub mod post;
pub mod tag;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use tag::{SqlxTagRepository, TagRepository};
