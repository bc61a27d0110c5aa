//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a batch session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory the extracted frame images are read from.
    pub frames_dir: PathBuf,
    /// Fixed period between poll cycles.
    pub poll_interval: Duration,
    /// Overall deadline for a batch; still-generating records fail with a
    /// timeout error once it passes.
    pub max_poll_duration: Duration,
    /// Consecutive status-query failures tolerated per asset before the
    /// record is failed. Reset by any successful query.
    pub max_query_failures: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("public/frames"),
            poll_interval: Duration::from_secs(5),
            max_poll_duration: Duration::from_secs(600),
            max_query_failures: 3,
        }
    }
}

impl SessionConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            frames_dir: std::env::var("FRAMES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public/frames")),
            poll_interval: Duration::from_secs(
                std::env::var("POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            max_poll_duration: Duration::from_secs(
                std::env::var("POLL_MAX_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            max_query_failures: std::env::var("POLL_MAX_QUERY_FAILURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
        }
    }
}
