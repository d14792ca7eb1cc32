//! Post repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::models::{ListParams, PagedResult, Post};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.author_id, p.file_name, p.created_at, p.updated_at";

pub async fn create(
    conn: &mut SqliteConnection,
    title: &str,
    content: &str,
    author_id: i64,
    file_name: Option<&str>,
) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, content, author_id, file_name, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .bind(file_name)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        title: title.to_string(),
        content: content.to_string(),
        author_id,
        file_name: file_name.map(str::to_string),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(&format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get post by ID")?;

    row.map(|r| row_to_post(&r)).transpose()
}

/// Newest first
pub async fn list(conn: &mut SqliteConnection, params: &ListParams) -> Result<PagedResult<Post>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
        .fetch_one(&mut *conn)
        .await
        .context("Failed to count posts")?;

    let rows = sqlx::query(&format!(
        "SELECT {POST_COLUMNS} FROM posts p ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list posts")?;

    let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(posts, total, params))
}

/// Posts associated with a tag, following `tags_posts`
pub async fn list_by_tag(
    conn: &mut SqliteConnection,
    tag_id: i64,
    params: &ListParams,
) -> Result<PagedResult<Post>> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT p.id)
        FROM posts p
        INNER JOIN tags_posts tp ON tp.post_id = p.id
        WHERE tp.tag_id = ?
        "#,
    )
    .bind(tag_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to count posts by tag")?;

    let rows = sqlx::query(&format!(
        r#"
        SELECT DISTINCT {POST_COLUMNS}
        FROM posts p
        INNER JOIN tags_posts tp ON tp.post_id = p.id
        WHERE tp.tag_id = ?
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ? OFFSET ?
        "#
    ))
    .bind(tag_id)
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list posts by tag")?;

    let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(posts, total, params))
}

/// Write title, content and file name, bumping `updated_at`
pub async fn update(conn: &mut SqliteConnection, post: &Post) -> Result<Post> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, content = ?, file_name = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.file_name)
    .bind(now)
    .bind(post.id)
    .execute(&mut *conn)
    .await
    .context("Failed to update post")?;

    let mut updated = post.clone();
    updated.updated_at = now;
    Ok(updated)
}

/// Returns `false` when no row matched
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected() > 0)
}

/// Number of posts whose stored image is `file_name`
pub async fn count_by_file_name(conn: &mut SqliteConnection, file_name: &str) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE file_name = ?")
        .bind(file_name)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to count posts by file name")
}

fn row_to_post(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        file_name: row.try_get("file_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
