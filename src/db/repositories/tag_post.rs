//! Post–tag association repository
//!
//! The table has no composite key; the post service keeps at most one row per
//! post by repointing the existing row instead of inserting another.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::models::{Tag, TagPost};

pub async fn create(conn: &mut SqliteConnection, post_id: i64, tag_id: i64) -> Result<TagPost> {
    let result = sqlx::query("INSERT INTO tags_posts (post_id, tag_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await
        .context("Failed to associate tag with post")?;

    Ok(TagPost {
        id: result.last_insert_rowid(),
        post_id,
        tag_id,
    })
}

/// The association row of a post, oldest first if several exist
pub async fn get_by_post(conn: &mut SqliteConnection, post_id: i64) -> Result<Option<TagPost>> {
    let row = sqlx::query(
        "SELECT id, post_id, tag_id FROM tags_posts WHERE post_id = ? ORDER BY id LIMIT 1",
    )
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to get tag association")?;

    row.map(|r| row_to_tag_post(&r)).transpose()
}

/// Point an existing association at another tag
pub async fn set_tag(conn: &mut SqliteConnection, id: i64, tag_id: i64) -> Result<()> {
    sqlx::query("UPDATE tags_posts SET tag_id = ? WHERE id = ?")
        .bind(tag_id)
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to update tag association")?;
    Ok(())
}

/// The tag attached to a post, skipping rows whose tag was deleted
pub async fn tag_for_post(conn: &mut SqliteConnection, post_id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT t.id, t.name, t.created_at
        FROM tags_posts tp
        INNER JOIN tags t ON t.id = tp.tag_id
        WHERE tp.post_id = ?
        ORDER BY tp.id
        LIMIT 1
        "#,
    )
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to get tag for post")?;

    row.map(|r| {
        Ok(Tag {
            id: r.try_get("id")?,
            name: r.try_get("name")?,
            created_at: r.try_get("created_at")?,
        })
    })
    .transpose()
}

fn row_to_tag_post(row: &SqliteRow) -> Result<TagPost> {
    Ok(TagPost {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        tag_id: row.try_get("tag_id")?,
    })
}
