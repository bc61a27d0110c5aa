//! Test support: a scripted fake of the generation queue.

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;

use vid3d_genqueue::{
    GenQueueError, GenQueueResult, GenerationQueue, GenerationResult, JobStatusReport,
};
use vid3d_models::{QueueStatus, RequestId};

/// Scripted [`GenerationQueue`] implementation.
///
/// Submissions pop pre-scripted outcomes in order; statuses pop per-request
/// sequences, holding the last entry once the script runs out.
#[derive(Default)]
pub struct FakeQueue {
    submit_script: Mutex<VecDeque<GenQueueResult<RequestId>>>,
    submitted: Mutex<Vec<String>>,
    status_scripts: Mutex<HashMap<String, VecDeque<GenQueueResult<JobStatusReport>>>>,
    results: Mutex<HashMap<String, GenQueueResult<GenerationResult>>>,
    downloads: Mutex<HashMap<String, GenQueueResult<Vec<u8>>>>,
    download_calls: Mutex<Vec<String>>,
}

impl FakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit_ok(&self, request_id: &str) {
        self.submit_script
            .lock()
            .unwrap()
            .push_back(Ok(RequestId::from_string(request_id)));
    }

    pub fn push_submit_err(&self, msg: &str) {
        self.submit_script
            .lock()
            .unwrap()
            .push_back(Err(GenQueueError::Submission(msg.to_string())));
    }

    pub fn push_status(&self, request_id: &str, status: QueueStatus) {
        self.push_status_report(
            request_id,
            JobStatusReport {
                status,
                queue_position: None,
                logs: Vec::new(),
                error: None,
            },
        );
    }

    pub fn push_status_failed(&self, request_id: &str, error: &str) {
        self.push_status_report(
            request_id,
            JobStatusReport {
                status: QueueStatus::Failed,
                queue_position: None,
                logs: Vec::new(),
                error: Some(error.to_string()),
            },
        );
    }

    pub fn push_status_report(&self, request_id: &str, report: JobStatusReport) {
        self.status_scripts
            .lock()
            .unwrap()
            .entry(request_id.to_string())
            .or_default()
            .push_back(Ok(report));
    }

    pub fn push_status_err(&self, request_id: &str, msg: &str) {
        self.status_scripts
            .lock()
            .unwrap()
            .entry(request_id.to_string())
            .or_default()
            .push_back(Err(GenQueueError::Status(msg.to_string())));
    }

    pub fn set_result(&self, request_id: &str, model_url: Option<&str>) {
        self.results.lock().unwrap().insert(
            request_id.to_string(),
            Ok(GenerationResult {
                model_url: model_url.map(str::to_string),
                usage_tokens: Some(100),
            }),
        );
    }

    pub fn set_download(&self, url: &str, bytes: Vec<u8>) {
        self.downloads
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(bytes));
    }

    pub fn submitted(&self) -> Vec<String> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn download_calls(&self) -> Vec<String> {
        self.download_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationQueue for FakeQueue {
    async fn submit(&self, image_data_uri: &str) -> GenQueueResult<RequestId> {
        self.submitted
            .lock()
            .unwrap()
            .push(image_data_uri.to_string());
        self.submit_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenQueueError::Submission("unscripted submit".into())))
    }

    async fn status(&self, request_id: &RequestId) -> GenQueueResult<JobStatusReport> {
        let mut scripts = self.status_scripts.lock().unwrap();
        let script = scripts.get_mut(request_id.as_str());
        match script {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if queue.len() == 1 => clone_status(queue.front().unwrap()),
            _ => Err(GenQueueError::Status(format!(
                "unscripted status for {}",
                request_id
            ))),
        }
    }

    async fn result(&self, request_id: &RequestId) -> GenQueueResult<GenerationResult> {
        let results = self.results.lock().unwrap();
        match results.get(request_id.as_str()) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(_)) | None => Err(GenQueueError::ResultFetch(format!(
                "unscripted result for {}",
                request_id
            ))),
        }
    }

    async fn download(&self, url: &str) -> GenQueueResult<Vec<u8>> {
        self.download_calls.lock().unwrap().push(url.to_string());
        let downloads = self.downloads.lock().unwrap();
        match downloads.get(url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(_)) | None => {
                Err(GenQueueError::Download(format!("unscripted download {}", url)))
            }
        }
    }
}

fn clone_status(entry: &GenQueueResult<JobStatusReport>) -> GenQueueResult<JobStatusReport> {
    match entry {
        Ok(report) => Ok(report.clone()),
        Err(e) => Err(GenQueueError::Status(e.to_string())),
    }
}

/// Build an in-memory zip archive holding one model entry.
pub fn archive_with_model(entry_name: &str) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    writer
        .start_file(entry_name, zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"glb-bytes").unwrap();
    writer.finish().unwrap();
    cursor.into_inner()
}

/// Build an in-memory zip archive with no model entry.
pub fn archive_without_model() -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = zip::ZipWriter::new(&mut cursor);
    writer
        .start_file("notes.txt", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"no model").unwrap();
    writer.finish().unwrap();
    cursor.into_inner()
}
