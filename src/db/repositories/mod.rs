//! Database repositories
//!
//! One module per entity. Every function takes a `&mut SqliteConnection`, so
//! callers decide whether it runs on a pooled connection or inside the
//! request's transaction.

pub mod comment;
pub mod post;
pub mod tag;
pub mod tag_post;
pub mod user;

/// Whether a query failed on a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
