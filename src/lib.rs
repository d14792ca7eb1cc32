//! Quillpad - a small server-rendered blog
//!
//! Users, posts with an optional image, tags, comments and an admin role,
//! served as HTML pages over axum and stored in SQLite.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod web;
