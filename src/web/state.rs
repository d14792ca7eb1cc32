//! Application context shared by every request

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

use super::render::Renderer;
use super::session::SessionCodec;
use crate::config::Config;
use crate::services::{GithubOAuth, LocalUploadStore, PostService, UploadStore};

/// Built once in `main` and cloned into each handler
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
    pub renderer: Arc<Renderer>,
    pub posts: Arc<PostService>,
    pub sessions: Arc<SessionCodec>,
    /// `None` when GitHub login is not configured
    pub oauth: Option<Arc<GithubOAuth>>,
}

impl AppState {
    pub async fn new(pool: SqlitePool, config: Config) -> Result<Self> {
        let store = LocalUploadStore::new(config.upload.path.clone());
        store
            .ensure_directory()
            .await
            .context("Failed to prepare upload directory")?;
        let posts = PostService::new(Arc::new(store), config.upload.max_file_size);

        let secret = if config.session.secret.is_empty() {
            tracing::warn!("No session secret configured; sessions will not survive a restart");
            random_secret()
        } else {
            config.session.secret.as_bytes().to_vec()
        };
        let sessions = SessionCodec::new(
            &secret,
            config.session.cookie_name.clone(),
            config.server.is_production(),
        )?;

        let oauth = match &config.oauth.github {
            Some(github) => {
                tracing::info!("GitHub login enabled");
                Some(Arc::new(GithubOAuth::new(github.clone())?))
            }
            None => None,
        };

        Ok(Self {
            pool,
            config: Arc::new(config),
            renderer: Arc::new(Renderer::new()?),
            posts: Arc::new(posts),
            sessions: Arc::new(sessions),
            oauth,
        })
    }
}

fn random_secret() -> Vec<u8> {
    let mut secret = Vec::with_capacity(32);
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
    secret
}
