//! Comment service
//!
//! Any signed-in user may comment on a post. Editing and deleting is limited to
//! the comment's author and administrators.

use sqlx::SqliteConnection;

use super::validation::{string_is_present, validate, FieldErrors};
use crate::db::repositories::{comment as comment_repo, post as post_repo};
use crate::models::{Comment, User};

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Comment not found: {0}")]
    NotFound(i64),

    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    /// The acting user is neither the author nor an admin. Carries the post id
    /// so callers can send the user back to it.
    #[error("Not allowed to modify comment on post {post_id}")]
    Forbidden { post_id: i64 },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn validate_content(content: &str) -> Result<(), CommentServiceError> {
    validate([string_is_present("content", "Content", content)])
        .into_result()
        .map_err(CommentServiceError::ValidationError)
}

pub async fn create(
    conn: &mut SqliteConnection,
    author: &User,
    post_id: i64,
    content: &str,
) -> Result<Comment, CommentServiceError> {
    if post_repo::get_by_id(conn, post_id).await?.is_none() {
        return Err(CommentServiceError::PostNotFound(post_id));
    }
    validate_content(content)?;

    let comment = comment_repo::create(conn, post_id, author.id, content).await?;
    tracing::debug!(comment_id = comment.id, post_id, "Created comment");
    Ok(comment)
}

/// Load a comment that `actor` is allowed to modify
pub async fn get_editable(
    conn: &mut SqliteConnection,
    actor: &User,
    id: i64,
) -> Result<Comment, CommentServiceError> {
    let comment = comment_repo::get_by_id(conn, id)
        .await?
        .ok_or(CommentServiceError::NotFound(id))?;

    if !actor.can_edit(comment.author_id) {
        tracing::warn!(
            comment_id = id,
            user_id = actor.id,
            "Rejected comment modification by non-author"
        );
        return Err(CommentServiceError::Forbidden {
            post_id: comment.post_id,
        });
    }
    Ok(comment)
}

pub async fn update(
    conn: &mut SqliteConnection,
    actor: &User,
    id: i64,
    content: &str,
) -> Result<Comment, CommentServiceError> {
    let comment = get_editable(conn, actor, id).await?;
    validate_content(content)?;
    Ok(comment_repo::update_content(conn, &comment, content).await?)
}

/// Delete a comment, returning the removed row
pub async fn delete(
    conn: &mut SqliteConnection,
    actor: &User,
    id: i64,
) -> Result<Comment, CommentServiceError> {
    let comment = get_editable(conn, actor, id).await?;
    comment_repo::delete(conn, id).await?;
    tracing::info!(comment_id = id, user_id = actor.id, "Deleted comment");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{test_support::migrated_pool, user as user_repo};
    use crate::db::repositories::user::NewUser;

    async fn user(conn: &mut SqliteConnection, username: &str, admin: bool) -> User {
        let email = format!("{username}@example.com");
        user_repo::create(
            conn,
            &NewUser {
                name: username,
                username,
                email: &email,
                password_hash: "hash",
                admin,
                provider: "",
                provider_id: "",
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_requires_post_and_content() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let ada = user(&mut conn, "ada", false).await;

        assert!(matches!(
            create(&mut conn, &ada, 1, "hello").await,
            Err(CommentServiceError::PostNotFound(1))
        ));

        let post = post_repo::create(&mut conn, "t", "c", ada.id, None).await.unwrap();
        assert!(matches!(
            create(&mut conn, &ada, post.id, "   ").await,
            Err(CommentServiceError::ValidationError(_))
        ));

        let comment = create(&mut conn, &ada, post.id, " hello\n").await.unwrap();
        assert_eq!(comment.author_id, ada.id);
        let stored = comment_repo::get_by_id(&mut conn, comment.id).await.unwrap().unwrap();
        assert_eq!(stored.content, " hello\n");
    }

    #[tokio::test]
    async fn test_only_author_or_admin_may_modify() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let admin = user(&mut conn, "root", true).await;
        let ada = user(&mut conn, "ada", false).await;
        let bob = user(&mut conn, "bob", false).await;

        let post = post_repo::create(&mut conn, "t", "c", admin.id, None).await.unwrap();
        let comment = create(&mut conn, &ada, post.id, "mine").await.unwrap();

        let denied = delete(&mut conn, &bob, comment.id).await;
        assert!(matches!(
            denied,
            Err(CommentServiceError::Forbidden { post_id }) if post_id == post.id
        ));
        assert!(comment_repo::get_by_id(&mut conn, comment.id).await.unwrap().is_some());

        let edited = update(&mut conn, &ada, comment.id, "  edited  ").await.unwrap();
        assert_eq!(edited.content, "  edited  ");

        delete(&mut conn, &admin, comment.id).await.unwrap();
        assert!(comment_repo::get_by_id(&mut conn, comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_comment() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let ada = user(&mut conn, "ada", false).await;

        assert!(matches!(
            get_editable(&mut conn, &ada, 404).await,
            Err(CommentServiceError::NotFound(404))
        ));
    }
}
