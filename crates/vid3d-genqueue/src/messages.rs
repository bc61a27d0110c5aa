//! Remote queue payload types and log normalization.

use serde_json::Value;

use vid3d_models::QueueStatus;

/// Snapshot of a remote job's state.
#[derive(Debug, Clone)]
pub struct JobStatusReport {
    /// Remote job status.
    pub status: QueueStatus,
    /// Position in the remote queue, while waiting.
    pub queue_position: Option<u32>,
    /// Human-readable progress log lines.
    pub logs: Vec<String>,
    /// Remote failure message, when the job failed.
    pub error: Option<String>,
}

/// Result payload of a completed job.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Remote URL of the generated artifact archive.
    pub model_url: Option<String>,
    /// Tokens the remote service billed for the generation.
    pub usage_tokens: Option<u64>,
}

/// Normalize the remote's log array into plain lines.
///
/// The queue reports logs as a mix of bare strings and `{message: ...}`
/// objects; anything else is dropped.
pub fn extract_logs(raw: &Value) -> Vec<String> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => obj
                .get("message")
                .map(|m| match m {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                }),
            _ => None,
        })
        .filter(|line| !line.is_empty())
        .collect()
}
