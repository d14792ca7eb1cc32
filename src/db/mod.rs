//! Database layer
//!
//! SQLite pool creation, embedded migrations and the per-entity repositories.
//! Repositories operate on a `&mut SqliteConnection` so the same functions run
//! against a pooled connection or inside the per-request transaction.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{begin_write, create_pool, create_test_pool};
