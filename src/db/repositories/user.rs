//! User repository

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::models::{ListParams, PagedResult, User};

/// Columns for a new account row
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub admin: bool,
    pub provider: &'a str,
    pub provider_id: &'a str,
}

const USER_COLUMNS: &str = "id, name, username, email, password_hash, admin, provider, provider_id, created_at, updated_at";

pub async fn create(conn: &mut SqliteConnection, user: &NewUser<'_>) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, username, email, password_hash, admin, provider, provider_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.name)
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.admin)
    .bind(user.provider)
    .bind(user.provider_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        name: user.name.to_string(),
        username: user.username.to_string(),
        email: user.email.to_string(),
        password_hash: user.password_hash.to_string(),
        admin: user.admin,
        provider: user.provider.to_string(),
        provider_id: user.provider_id.to_string(),
        created_at: now,
        updated_at: now,
    })
}

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get user by ID")?;

    row.map(|r| row_to_user(&r)).transpose()
}

pub async fn get_by_email(conn: &mut SqliteConnection, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?)"
    ))
    .bind(email)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to get user by email")?;

    row.map(|r| row_to_user(&r)).transpose()
}

pub async fn get_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get user by username")?;

    row.map(|r| row_to_user(&r)).transpose()
}

/// Look up an account created through a login provider
pub async fn get_by_provider(
    conn: &mut SqliteConnection,
    provider: &str,
    provider_id: &str,
) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE provider = ? AND provider_id = ?"
    ))
    .bind(provider)
    .bind(provider_id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to get user by provider")?;

    row.map(|r| row_to_user(&r)).transpose()
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await
        .context("Failed to count users")
}

pub async fn list(conn: &mut SqliteConnection, params: &ListParams) -> Result<PagedResult<User>> {
    let total = count(conn).await?;

    let rows = sqlx::query(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;
    Ok(PagedResult::new(users, total, params))
}

/// Write every mutable column of `user` and bump `updated_at`
pub async fn update(conn: &mut SqliteConnection, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, username = ?, email = ?, password_hash = ?, admin = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.admin)
    .bind(now)
    .bind(user.id)
    .execute(&mut *conn)
    .await
    .context("Failed to update user")?;

    let mut updated = user.clone();
    updated.updated_at = now;
    Ok(updated)
}

/// Returns `false` when no row matched
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to delete user")?;

    Ok(result.rows_affected() > 0)
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        admin: row.try_get("admin")?,
        provider: row.try_get("provider")?,
        provider_id: row.try_get("provider_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
