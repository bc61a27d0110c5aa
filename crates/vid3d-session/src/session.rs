//! Batch session lifecycle and the polling scheduler.
//!
//! A [`BatchSession`] owns the record collection and the repeating poll
//! timer for one video's batch. Starting a new session for the next video
//! means cancelling this one; its task stops, its in-flight poll results
//! are discarded, and its records go away with it.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info, warn};

use vid3d_genqueue::GenerationQueue;
use vid3d_models::{AssetKey, Frame, FrameResult, ModelRecord, RecordStatus};
use vid3d_storage::ArtifactStore;

use crate::batch::{initial_records, submit_batch};
use crate::config::SessionConfig;
use crate::error::SessionResult;
use crate::event::SessionEvent;
use crate::poller::{check_record, PollOutcome};

/// A freshly started batch: the session, the immediate per-frame results,
/// and the outbound event queue.
pub struct StartedBatch {
    pub session: BatchSession,
    pub results: Vec<FrameResult>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

/// Handle to a running batch session.
///
/// Dropping the handle cancels the session.
pub struct BatchSession {
    cancel_tx: watch::Sender<bool>,
    records_rx: watch::Receiver<Vec<ModelRecord>>,
    task: Option<JoinHandle<()>>,
}

impl BatchSession {
    /// Submit a batch and start polling it.
    ///
    /// The submission itself is awaited so callers get the ordered
    /// [`FrameResult`]s back immediately; the poll loop then runs in its
    /// own task until every record settles, the deadline passes, or the
    /// session is cancelled.
    pub async fn start(
        config: SessionConfig,
        store: ArtifactStore,
        queue: Arc<dyn GenerationQueue>,
        frames: Vec<Frame>,
    ) -> SessionResult<StartedBatch> {
        let results = submit_batch(&frames, &config.frames_dir, &store, queue.as_ref()).await?;
        let records = initial_records(&frames, &results);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (records_tx, records_rx) = watch::channel(records.clone());

        let generating = records.iter().filter(|r| r.is_generating()).count();
        let cached = count_status(&records, RecordStatus::Cached);
        let failed = count_status(&records, RecordStatus::Failed);
        let _ = events_tx.send(SessionEvent::BatchStarted {
            total: records.len(),
            cached,
            generating,
            failed,
        });

        let task = tokio::spawn(run_poll_loop(
            config, store, queue, records, records_tx, events_tx, cancel_rx,
        ));

        Ok(StartedBatch {
            session: BatchSession {
                cancel_tx,
                records_rx,
                task: Some(task),
            },
            results,
            events: events_rx,
        })
    }

    /// Snapshot of the record collection as of the last committed cycle.
    pub fn records(&self) -> Vec<ModelRecord> {
        self.records_rx.borrow().clone()
    }

    /// Stop the poll loop. Results of any cycle still in flight are
    /// discarded.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Check whether the poll loop has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map(JoinHandle::is_finished).unwrap_or(true)
    }

    /// Wait for the poll loop task to stop.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for BatchSession {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

async fn run_poll_loop(
    config: SessionConfig,
    store: ArtifactStore,
    queue: Arc<dyn GenerationQueue>,
    mut records: Vec<ModelRecord>,
    records_tx: watch::Sender<Vec<ModelRecord>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    // First tick fires immediately, so the batch is checked right away.
    let mut ticker = interval(config.poll_interval);
    let deadline = Instant::now() + config.max_poll_duration;
    let mut query_failures: HashMap<AssetKey, u32> = HashMap::new();

    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    debug!("Batch session cancelled");
                    return;
                }
            }
            _ = ticker.tick() => {
                let generating: Vec<ModelRecord> = records
                    .iter()
                    .filter(|r| r.is_generating())
                    .cloned()
                    .collect();

                if generating.is_empty() {
                    emit_complete(&records, &events_tx);
                    return;
                }

                if Instant::now() >= deadline {
                    fail_remaining_on_timeout(&config, &mut records, &records_tx, &events_tx);
                    return;
                }

                debug!(pending = generating.len(), "Poll cycle");
                let outcomes = join_all(
                    generating
                        .iter()
                        .map(|record| check_record(record, queue.as_ref(), &store)),
                )
                .await;

                // The session may have been cancelled while the cycle's
                // requests were in flight; their results are stale.
                if *cancel_rx.borrow() {
                    debug!("Discarding poll results from cancelled cycle");
                    return;
                }

                let mut events = Vec::new();
                for (record, outcome) in generating.iter().zip(outcomes) {
                    match outcome {
                        PollOutcome::Unchanged => {
                            query_failures.remove(&record.asset_key);
                        }
                        PollOutcome::Updated(updated) => {
                            query_failures.remove(&record.asset_key);
                            apply_update(&mut records, updated, &mut events);
                        }
                        PollOutcome::QueryError(error) => {
                            let failures =
                                query_failures.entry(record.asset_key.clone()).or_insert(0);
                            *failures += 1;
                            if *failures >= config.max_query_failures {
                                warn!(
                                    asset_key = %record.asset_key,
                                    failures = *failures,
                                    "Giving up after repeated status-query failures"
                                );
                                let mut failed = record.clone();
                                failed.fail(error);
                                apply_update(&mut records, failed, &mut events);
                            } else {
                                debug!(
                                    asset_key = %record.asset_key,
                                    failures = *failures,
                                    "Transient status-query failure, will retry"
                                );
                            }
                        }
                    }
                }

                // Commit the cycle's merges in one step, then drain the
                // cycle's events in order.
                records_tx.send_replace(records.clone());
                for event in events {
                    let _ = events_tx.send(event);
                }

                if !records.iter().any(|r| r.is_generating()) {
                    emit_complete(&records, &events_tx);
                    return;
                }
            }
        }
    }
}

/// Merge one settled record back into the collection.
///
/// The transition is replayed on the authoritative copy through the record
/// state machine, so a stale poll can never clobber a settled record.
fn apply_update(
    records: &mut [ModelRecord],
    updated: ModelRecord,
    events: &mut Vec<SessionEvent>,
) {
    let Some(existing) = records
        .iter_mut()
        .find(|r| r.asset_key == updated.asset_key)
    else {
        warn!(asset_key = %updated.asset_key, "Poll result for unknown asset, dropping");
        return;
    };

    match updated.status {
        RecordStatus::Completed => {
            let url = updated.artifact_url.unwrap_or_default();
            if existing.complete(url.clone()) {
                events.push(SessionEvent::AssetReady {
                    asset_key: existing.asset_key.clone(),
                    filename: existing.filename.clone(),
                    artifact_url: url,
                });
            }
        }
        RecordStatus::Failed => {
            let error = updated
                .error
                .unwrap_or_else(|| "generation failed".to_string());
            if existing.fail(error.clone()) {
                events.push(SessionEvent::AssetFailed {
                    asset_key: existing.asset_key.clone(),
                    filename: existing.filename.clone(),
                    error,
                });
            }
        }
        RecordStatus::Cached | RecordStatus::Generating => {}
    }
}

fn fail_remaining_on_timeout(
    config: &SessionConfig,
    records: &mut [ModelRecord],
    records_tx: &watch::Sender<Vec<ModelRecord>>,
    events_tx: &mpsc::UnboundedSender<SessionEvent>,
) {
    let message = format!(
        "generation timed out after {}s",
        config.max_poll_duration.as_secs()
    );
    warn!(%message, "Poll deadline reached");

    let mut events = Vec::new();
    for record in records.iter_mut().filter(|r| r.is_generating()) {
        if record.fail(message.clone()) {
            events.push(SessionEvent::AssetFailed {
                asset_key: record.asset_key.clone(),
                filename: record.filename.clone(),
                error: message.clone(),
            });
        }
    }

    records_tx.send_replace(records.to_vec());
    for event in events {
        let _ = events_tx.send(event);
    }
    emit_complete(records, events_tx);
}

fn emit_complete(records: &[ModelRecord], events_tx: &mpsc::UnboundedSender<SessionEvent>) {
    let completed = count_status(records, RecordStatus::Completed);
    let failed = count_status(records, RecordStatus::Failed);
    let cached = count_status(records, RecordStatus::Cached);
    info!(completed, failed, cached, "Batch complete");
    let _ = events_tx.send(SessionEvent::BatchComplete {
        completed,
        failed,
        cached,
    });
}

fn count_status(records: &[ModelRecord], status: RecordStatus) -> usize {
    records.iter().filter(|r| r.status == status).count()
}
