//! Job status polling.
//!
//! One poll of one record: query the remote queue, map its verdict onto the
//! record state machine, and materialize the artifact when the job is done.
//! A poll never panics and never aborts the cycle it runs in; everything it
//! learns is reported through [`PollOutcome`].

use tracing::{debug, info, warn};

use vid3d_genqueue::GenerationQueue;
use vid3d_models::{ModelRecord, QueueStatus};
use vid3d_storage::ArtifactStore;

/// What one poll of one record concluded.
#[derive(Debug)]
pub enum PollOutcome {
    /// Still in flight (or nothing to poll); the record stays as it is.
    Unchanged,
    /// The record reached a terminal state; merge it into the collection.
    Updated(ModelRecord),
    /// The status query itself failed. The record stays `Generating`; the
    /// scheduler counts these and fails the record only after its
    /// consecutive-failure cap.
    QueryError(String),
}

/// Poll the remote job backing `record`.
///
/// No-op for records without a request id or not currently generating, so
/// settled records can never be re-polled into a different state.
pub async fn check_record(
    record: &ModelRecord,
    queue: &dyn GenerationQueue,
    store: &ArtifactStore,
) -> PollOutcome {
    let Some(request_id) = record.request_id.clone() else {
        return PollOutcome::Unchanged;
    };
    if !record.is_generating() {
        return PollOutcome::Unchanged;
    }

    let report = match queue.status(&request_id).await {
        Ok(report) => report,
        Err(e) => {
            warn!(
                request_id = %request_id,
                asset_key = %record.asset_key,
                error = %e,
                "Status query failed"
            );
            return PollOutcome::QueryError(e.to_string());
        }
    };

    match report.status {
        QueueStatus::InQueue | QueueStatus::InProgress => {
            debug!(
                request_id = %request_id,
                status = %report.status,
                position = ?report.queue_position,
                "Job still in flight"
            );
            PollOutcome::Unchanged
        }
        QueueStatus::Failed => {
            let error = report
                .error
                .unwrap_or_else(|| "generation job failed".to_string());
            let mut updated = record.clone();
            updated.fail(error);
            PollOutcome::Updated(updated)
        }
        QueueStatus::Completed => resolve_completed(record, &request_id, queue, store).await,
    }
}

/// Turn a remote `COMPLETED` into a displayable artifact.
///
/// Prefers a model that is already on disk (materialized by an earlier poll
/// or by the job-status endpoint); otherwise fetches the result payload,
/// downloads the archive, and materializes it. The store's existence checks
/// make the write at-most-once under concurrent polls for the same key.
async fn resolve_completed(
    record: &ModelRecord,
    request_id: &vid3d_models::RequestId,
    queue: &dyn GenerationQueue,
    store: &ArtifactStore,
) -> PollOutcome {
    if let Some(url) = store.model_url(&record.asset_key).await {
        debug!(asset_key = %record.asset_key, "Model already materialized");
        let mut updated = record.clone();
        updated.complete(url);
        return PollOutcome::Updated(updated);
    }

    let result = match queue.result(request_id).await {
        Ok(result) => result,
        Err(e) => return PollOutcome::QueryError(e.to_string()),
    };

    let Some(model_url) = result.model_url else {
        // Completed but nothing to fetch; retrying cannot fix this.
        let mut updated = record.clone();
        updated.fail("generation completed without an artifact url");
        return PollOutcome::Updated(updated);
    };

    let archive_bytes = match queue.download(&model_url).await {
        Ok(bytes) => bytes,
        Err(e) => return PollOutcome::QueryError(e.to_string()),
    };

    let artifact = match store.materialize(&record.asset_key, &archive_bytes).await {
        Ok(artifact) => artifact,
        Err(e) => return PollOutcome::QueryError(e.to_string()),
    };

    match artifact.model_url {
        Some(url) => {
            info!(
                asset_key = %record.asset_key,
                tokens = ?result.usage_tokens,
                "Artifact materialized"
            );
            let mut updated = record.clone();
            updated.complete(url);
            PollOutcome::Updated(updated)
        }
        None => {
            // Archive landed but held no model entry. The archive stays on
            // disk; the record is a hard failure.
            let mut updated = record.clone();
            updated.fail("no model entry found in generated archive");
            PollOutcome::Updated(updated)
        }
    }
}
