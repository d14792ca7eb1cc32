//! Comment repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::models::{Comment, CommentWithAuthor};

pub async fn create(
    conn: &mut SqliteConnection,
    post_id: i64,
    author_id: i64,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO comments (content, author_id, post_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(content)
    .bind(author_id)
    .bind(post_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        content: content.to_string(),
        author_id,
        post_id,
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, content, author_id, post_id, created_at, updated_at FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to get comment by ID")?;

    row.map(|r| row_to_comment(&r)).transpose()
}

/// Comments on a post, oldest first, with author names
pub async fn list_for_post(
    conn: &mut SqliteConnection,
    post_id: i64,
) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.content, c.author_id, c.post_id, c.created_at, c.updated_at,
               u.name AS author_name
        FROM comments c
        INNER JOIN users u ON u.id = c.author_id
        WHERE c.post_id = ?
        ORDER BY c.created_at, c.id
        "#,
    )
    .bind(post_id)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list comments")?;

    rows.iter()
        .map(|row| {
            Ok(CommentWithAuthor {
                comment: row_to_comment(row)?,
                author_name: row.try_get("author_name")?,
            })
        })
        .collect()
}

pub async fn update_content(
    conn: &mut SqliteConnection,
    comment: &Comment,
    content: &str,
) -> Result<Comment> {
    let now = Utc::now();

    sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
        .bind(content)
        .bind(now)
        .bind(comment.id)
        .execute(&mut *conn)
        .await
        .context("Failed to update comment")?;

    Ok(Comment {
        content: content.to_string(),
        updated_at: now,
        ..comment.clone()
    })
}

/// Returns `false` when no row matched
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to delete comment")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        post_id: row.try_get("post_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    async fn seed(conn: &mut SqliteConnection) {
        sqlx::query(
            "INSERT INTO users (name, username, email, password_hash) VALUES ('Ada', 'ada', 'ada@x.io', 'h')",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        sqlx::query("INSERT INTO posts (title, content, author_id) VALUES ('t', 'c', 1)")
            .execute(&mut *conn)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_list_update_delete() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        let comment = create(&mut conn, 1, 1, "first").await.unwrap();
        create(&mut conn, 1, 1, "second").await.unwrap();

        let listed = list_for_post(&mut conn, 1).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].comment.content, "first");
        assert_eq!(listed[0].author_name, "Ada");

        let updated = update_content(&mut conn, &comment, "edited").await.unwrap();
        assert_eq!(updated.content, "edited");
        let reloaded = get_by_id(&mut conn, comment.id).await.unwrap().unwrap();
        assert_eq!(reloaded.content, "edited");

        assert!(delete(&mut conn, comment.id).await.unwrap());
        assert!(get_by_id(&mut conn, comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_comment_requires_existing_post() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        seed(&mut conn).await;

        let orphan = create(&mut conn, 99, 1, "nowhere").await;
        assert!(orphan.is_err());
    }
}
