//! Tag model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag. The name is already normalized: lower-case ASCII letters and digits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Association row between a post and a tag
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagPost {
    pub id: i64,
    pub post_id: i64,
    pub tag_id: i64,
}

/// Tag with the number of posts pointing at it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub post_count: i64,
}
