//! Data models
//!
//! Database entities (User, Post, Tag, TagPost, Comment), the form inputs that
//! create them, and the pagination containers used by list pages.

mod comment;
mod pagination;
mod post;
mod tag;
mod user;

pub use comment::{Comment, CommentInput, CommentWithAuthor};
pub use pagination::{ListParams, PagedResult, DEFAULT_PER_PAGE};
pub use post::{ImageUpload, Post, PostDetail, PostInput};
pub use tag::{Tag, TagPost, TagWithCount};
pub use user::{LoginInput, RegisterInput, UpdateUserInput, User};
