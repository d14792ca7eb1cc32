//! Tag repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use super::is_unique_violation;
use crate::models::{ListParams, PagedResult, Tag, TagWithCount};

/// Insert a tag.
///
/// Returns `Ok(None)` when another row already holds `name`, so callers can
/// fall back to a lookup.
pub async fn create(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>> {
    let now = Utc::now();

    let result = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(now)
        .execute(&mut *conn)
        .await;

    match result {
        Ok(done) => Ok(Some(Tag {
            id: done.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
        })),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e).context("Failed to create tag"),
    }
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get tag by ID")?;

    row.map(|r| row_to_tag(&r)).transpose()
}

pub async fn get_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>> {
    let row = sqlx::query("SELECT id, name, created_at FROM tags WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get tag by name")?;

    row.map(|r| row_to_tag(&r)).transpose()
}

/// Tags in name order with the number of posts each one is attached to
pub async fn list(
    conn: &mut SqliteConnection,
    params: &ListParams,
) -> Result<PagedResult<TagWithCount>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags")
        .fetch_one(&mut *conn)
        .await
        .context("Failed to count tags")?;

    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.created_at, COUNT(p.id) AS post_count
        FROM tags t
        LEFT JOIN tags_posts tp ON tp.tag_id = t.id
        LEFT JOIN posts p ON p.id = tp.post_id
        GROUP BY t.id, t.name, t.created_at
        ORDER BY t.name
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list tags")?;

    let tags = rows
        .iter()
        .map(|row| {
            Ok(TagWithCount {
                tag: row_to_tag(row)?,
                post_count: row.try_get("post_count")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PagedResult::new(tags, total, params))
}

/// Returns `false` when no row matched. Association rows are left in place.
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to delete tag")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_tag(row: &SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::migrated_pool;

    #[tokio::test]
    async fn test_create_duplicate_returns_none() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = create(&mut conn, "rust").await.unwrap();
        assert!(first.is_some());

        let second = create(&mut conn, "rust").await.unwrap();
        assert!(second.is_none());

        let found = get_by_name(&mut conn, "rust").await.unwrap().unwrap();
        assert_eq!(Some(found.id), first.map(|t| t.id));
    }

    #[tokio::test]
    async fn test_list_counts_posts() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let rust = create(&mut conn, "rust").await.unwrap().unwrap();
        create(&mut conn, "go").await.unwrap().unwrap();
        sqlx::query("INSERT INTO posts (title, content, author_id) VALUES ('t', 'c', 1)")
            .execute(&mut *conn)
            .await
            .unwrap();
        sqlx::query("INSERT INTO tags_posts (post_id, tag_id) VALUES (1, ?)")
            .bind(rust.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let page = list(&mut conn, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].tag.name, "go");
        assert_eq!(page.items[0].post_count, 0);
        assert_eq!(page.items[1].tag.name, "rust");
        assert_eq!(page.items[1].post_count, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = migrated_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let tag = create(&mut conn, "rust").await.unwrap().unwrap();
        assert!(delete(&mut conn, tag.id).await.unwrap());
        assert!(get_by_id(&mut conn, tag.id).await.unwrap().is_none());
        assert!(!delete(&mut conn, tag.id).await.unwrap());
    }
}
