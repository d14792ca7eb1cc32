//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CommentWithAuthor, Tag};

/// A blog post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    /// Stored image name inside the upload directory
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An uploaded image as received from the form
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    /// Name of the file on the client
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Fields submitted by the post create and edit forms
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    /// Free-text tag; blank means "no tag"
    pub tag: String,
    pub image: Option<ImageUpload>,
}

/// A post with everything the detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    /// Author name, if the account still exists
    pub author_name: Option<String>,
    pub tag: Option<Tag>,
    pub comments: Vec<CommentWithAuthor>,
}
