use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen port (default: 5000)
    pub port: u16,

    /// Database connection string (Postgres or SQLite)
    pub database_url: String,

    /// Directory uploaded blobs are written to (default: "uploads")
    pub upload_dir: PathBuf,

    /// Base URL used when building retrieval URLs. When unset, the URL is
    /// derived from the request's Host header.
    pub public_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "sqlite://images.db?mode=rwc".to_string(),
            upload_dir: PathBuf::from("uploads"),
            public_base_url: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            public_base_url: env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string()),
        }
    }
}
