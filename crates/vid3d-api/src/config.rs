//! API configuration.

use std::path::PathBuf;

use vid3d_session::SessionConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size (video uploads go through here)
    pub max_body_size: usize,
    /// Directory extracted frames are written to and served from
    pub frames_dir: PathBuf,
    /// Directory generated artifacts are stored in and served from
    pub generated_dir: PathBuf,
    /// Public URL prefix for generated artifacts
    pub generated_url_base: String,
    /// Base URL of the external frame-extraction service
    pub extractor_url: String,
    /// Polling behavior for batch sessions
    pub session: SessionConfig,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 200 * 1024 * 1024, // 200MB, enough for short clips
            frames_dir: PathBuf::from("public/frames"),
            generated_dir: PathBuf::from("public/generated"),
            generated_url_base: "/generated".to_string(),
            extractor_url: "http://localhost:9000".to_string(),
            session: SessionConfig::default(),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let session = SessionConfig::from_env();
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(200 * 1024 * 1024),
            frames_dir: session.frames_dir.clone(),
            generated_dir: std::env::var("GENERATED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/generated")),
            generated_url_base: std::env::var("GENERATED_URL_BASE")
                .unwrap_or_else(|_| "/generated".to_string()),
            extractor_url: std::env::var("EXTRACTOR_URL")
                .unwrap_or_else(|_| "http://localhost:9000".to_string()),
            session,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
