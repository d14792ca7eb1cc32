//! Configuration management
//!
//! Configuration is read from `config.yml` and can be overridden through
//! `QUILLPAD_*` environment variables. Missing values fall back to defaults,
//! so a fresh checkout runs without any configuration file at all.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Third-party login providers
    #[serde(default)]
    pub oauth: OAuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Runtime environment, `development` or `production`
    #[serde(default = "default_env")]
    pub env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: default_env(),
        }
    }
}

impl ServerConfig {
    /// Whether the application runs in production mode
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_env() -> String {
    "development".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database path or URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/quillpad.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded post images are written to
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("public").join("uploads")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign session cookies.
    ///
    /// When empty a random secret is generated at startup, which logs
    /// everybody out on restart.
    #[serde(default)]
    pub secret: String,
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: default_cookie_name(),
        }
    }
}

fn default_cookie_name() -> String {
    "_quillpad_session".to_string()
}

/// Login provider configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// GitHub OAuth application; GitHub login is disabled when absent
    #[serde(default)]
    pub github: Option<GithubConfig>,
}

/// GitHub OAuth application credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Absolute URL of `/auth/github/callback` as registered with GitHub
    pub callback_url: String,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Recognised variables:
    /// - QUILLPAD_SERVER_HOST, QUILLPAD_SERVER_PORT, QUILLPAD_ENV
    /// - QUILLPAD_DATABASE_URL
    /// - QUILLPAD_UPLOAD_PATH, QUILLPAD_UPLOAD_MAX_FILE_SIZE
    /// - QUILLPAD_SESSION_SECRET
    /// - QUILLPAD_GITHUB_CLIENT_ID, QUILLPAD_GITHUB_CLIENT_SECRET,
    ///   QUILLPAD_GITHUB_CALLBACK_URL
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("QUILLPAD_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("QUILLPAD_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(env) = std::env::var("QUILLPAD_ENV") {
            self.server.env = env;
        }

        if let Ok(url) = std::env::var("QUILLPAD_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(path) = std::env::var("QUILLPAD_UPLOAD_PATH") {
            self.upload.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var("QUILLPAD_UPLOAD_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }

        if let Ok(secret) = std::env::var("QUILLPAD_SESSION_SECRET") {
            self.session.secret = secret;
        }

        let client_id = std::env::var("QUILLPAD_GITHUB_CLIENT_ID").ok();
        let client_secret = std::env::var("QUILLPAD_GITHUB_CLIENT_SECRET").ok();
        let callback_url = std::env::var("QUILLPAD_GITHUB_CALLBACK_URL").ok();
        if client_id.is_some() || client_secret.is_some() || callback_url.is_some() {
            let github = self.oauth.github.get_or_insert_with(|| GithubConfig {
                client_id: String::new(),
                client_secret: String::new(),
                callback_url: String::new(),
            });
            if let Some(client_id) = client_id {
                github.client_id = client_id;
            }
            if let Some(client_secret) = client_secret {
                github.client_secret = client_secret;
            }
            if let Some(callback_url) = callback_url {
                github.callback_url = callback_url;
            }
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
