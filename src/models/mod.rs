//! Data models
//!
//! Entities persisted by the blog (posts, authors, tags), their input types,
//! and the pagination containers used by list endpoints.

mod author;
mod post;
mod tag;

pub use author::{Author, CreateAuthorInput, UpdateAuthorInput};
pub use post::{
    BlogPost, CreatePostInput, ListParams, PagedResult, PostList, PostSource, UpdatePostInput,
};
pub use tag::Tag;
