//! Tag service
//!
//! Tag names are canonicalised by [`normalize_tag_name`] before they touch the
//! database, so "C++ Tips!" and "c tips" end up on the same row.

use sqlx::SqliteConnection;

use super::validation::FieldErrors;
use crate::db::repositories::{post as post_repo, tag as tag_repo};
use crate::models::{ListParams, PagedResult, Post, Tag, TagWithCount};

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    #[error("Tag not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Keep ASCII letters and digits, lower-cased.
///
/// May return an empty string; callers decide whether that means "no tag" or
/// a validation failure.
pub fn normalize_tag_name(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn empty_name_error() -> TagServiceError {
    TagServiceError::ValidationError(FieldErrors::single(
        "name",
        "Name must contain at least one letter or digit.",
    ))
}

/// Find the tag called `canonical`, creating it when missing.
///
/// Returns the tag and whether this call created it. A concurrent insert of
/// the same name is resolved by looking the winner up again.
pub async fn find_or_create(
    conn: &mut SqliteConnection,
    canonical: &str,
) -> Result<(Tag, bool), TagServiceError> {
    if canonical.is_empty() {
        return Err(empty_name_error());
    }

    if let Some(existing) = tag_repo::get_by_name(conn, canonical).await? {
        return Ok((existing, false));
    }

    match tag_repo::create(conn, canonical).await? {
        Some(created) => {
            tracing::debug!(tag = canonical, "Created tag");
            Ok((created, true))
        }
        None => {
            tracing::debug!(tag = canonical, "Tag created concurrently, reusing it");
            let existing = tag_repo::get_by_name(conn, canonical)
                .await?
                .ok_or_else(|| TagServiceError::NotFound(canonical.to_string()))?;
            Ok((existing, false))
        }
    }
}

/// Normalize free text and find-or-create the resulting tag
pub async fn create_from_input(
    conn: &mut SqliteConnection,
    raw: &str,
) -> Result<(Tag, bool), TagServiceError> {
    let canonical = normalize_tag_name(raw);
    if canonical.is_empty() {
        return Err(empty_name_error());
    }
    find_or_create(conn, &canonical).await
}

pub async fn list(
    conn: &mut SqliteConnection,
    params: &ListParams,
) -> Result<PagedResult<TagWithCount>, TagServiceError> {
    Ok(tag_repo::list(conn, params).await?)
}

/// Look a tag up by the name used in URLs
pub async fn get_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Tag, TagServiceError> {
    let canonical = normalize_tag_name(name);
    tag_repo::get_by_name(conn, &canonical)
        .await?
        .ok_or_else(|| TagServiceError::NotFound(name.to_string()))
}

/// A tag and one page of the posts associated with it
pub async fn posts_for_tag(
    conn: &mut SqliteConnection,
    name: &str,
    params: &ListParams,
) -> Result<(Tag, PagedResult<Post>), TagServiceError> {
    let tag = get_by_name(conn, name).await?;
    let posts = post_repo::list_by_tag(conn, tag.id, params).await?;
    Ok((tag, posts))
}

/// Delete a tag by name. Association rows referencing it stay behind.
pub async fn delete(conn: &mut SqliteConnection, name: &str) -> Result<Tag, TagServiceError> {
    let tag = get_by_name(conn, name).await?;
    tag_repo::delete(conn, tag.id).await?;
    tracing::info!(tag = %tag.name, "Deleted tag");
    Ok(tag)
}
