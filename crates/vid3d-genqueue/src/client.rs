//! HTTP client for the fal.ai-style generation queue.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use vid3d_models::{QueueStatus, RequestId};

use crate::error::{GenQueueError, GenQueueResult};
use crate::messages::{extract_logs, GenerationResult, JobStatusReport};
use crate::queue::GenerationQueue;

/// Default queue endpoint.
const DEFAULT_BASE_URL: &str = "https://queue.fal.run";
/// Default model path on the queue.
const DEFAULT_MODEL: &str = "fal-ai/bytedance/seed3d/image-to-3d";

/// Generation queue client.
pub struct SeedQueueClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    input: SubmitInput<'a>,
}

#[derive(Debug, Serialize)]
struct SubmitInput<'a> {
    image_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    request_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    queue_position: Option<u32>,
    #[serde(default)]
    logs: Value,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    #[serde(default)]
    model: Option<ModelPayload>,
    #[serde(default)]
    usage_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ModelPayload {
    #[serde(default)]
    url: Option<String>,
}

impl SeedQueueClient {
    /// Create a new client.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Create a client from environment variables.
    ///
    /// `GEN_QUEUE_API_KEY` is required; a missing key is a configuration
    /// error at construction, not at first use.
    pub fn from_env() -> GenQueueResult<Self> {
        let api_key = std::env::var("GEN_QUEUE_API_KEY")
            .map_err(|_| GenQueueError::config_error("GEN_QUEUE_API_KEY not set"))?;
        let base_url =
            std::env::var("GEN_QUEUE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEN_QUEUE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(base_url, model, api_key))
    }

    fn submit_url(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }

    fn status_url(&self, request_id: &RequestId) -> String {
        format!(
            "{}/{}/requests/{}/status?logs=1",
            self.base_url, self.model, request_id
        )
    }

    fn result_url(&self, request_id: &RequestId) -> String {
        format!("{}/{}/requests/{}", self.base_url, self.model, request_id)
    }

    fn auth_value(&self) -> String {
        format!("Key {}", self.api_key)
    }
}

#[async_trait]
impl GenerationQueue for SeedQueueClient {
    async fn submit(&self, image_data_uri: &str) -> GenQueueResult<RequestId> {
        let response = self
            .client
            .post(self.submit_url())
            .header("Authorization", self.auth_value())
            .json(&SubmitRequest {
                input: SubmitInput {
                    image_url: image_data_uri,
                },
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenQueueError::submission(format!(
                "queue returned {}: {}",
                status, body
            )));
        }

        let payload: SubmitResponse = response
            .json()
            .await
            .map_err(|e| GenQueueError::UnexpectedPayload(format!("submit response: {}", e)))?;

        debug!(request_id = %payload.request_id, "Submitted generation job");
        Ok(RequestId::from_string(payload.request_id))
    }

    async fn status(&self, request_id: &RequestId) -> GenQueueResult<JobStatusReport> {
        let response = self
            .client
            .get(self.status_url(request_id))
            .header("Authorization", self.auth_value())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenQueueError::status(format!(
                "queue returned {} for request {}",
                response.status(),
                request_id
            )));
        }

        let payload: StatusResponse = response
            .json()
            .await
            .map_err(|e| GenQueueError::UnexpectedPayload(format!("status response: {}", e)))?;

        let status = QueueStatus::parse(&payload.status).unwrap_or_else(|| {
            // Unknown statuses are treated as still in flight; the next
            // poll will pick up whatever the queue settles on.
            warn!(
                request_id = %request_id,
                status = %payload.status,
                "Unknown queue status, treating as in progress"
            );
            QueueStatus::InProgress
        });

        Ok(JobStatusReport {
            status,
            queue_position: payload.queue_position,
            logs: extract_logs(&payload.logs),
            error: payload.error.map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            }),
        })
    }

    async fn result(&self, request_id: &RequestId) -> GenQueueResult<GenerationResult> {
        let response = self
            .client
            .get(self.result_url(request_id))
            .header("Authorization", self.auth_value())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GenQueueError::ResultFetch(format!(
                "queue returned {} for request {}",
                response.status(),
                request_id
            )));
        }

        let payload: ResultResponse = response
            .json()
            .await
            .map_err(|e| GenQueueError::UnexpectedPayload(format!("result response: {}", e)))?;

        Ok(GenerationResult {
            model_url: payload.model.and_then(|m| m.url),
            usage_tokens: payload.usage_tokens,
        })
    }

    async fn download(&self, url: &str) -> GenQueueResult<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(GenQueueError::Download(format!(
                "fetch of {} returned {}",
                url,
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SeedQueueClient {
        SeedQueueClient::new(server.uri(), "fal-ai/seed3d/image-to-3d", "test-key")
    }

    #[tokio::test]
    async fn test_submit_returns_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fal-ai/seed3d/image-to-3d"))
            .and(header("Authorization", "Key test-key"))
            .and(body_partial_json(
                json!({"input": {"image_url": "data:image/png;base64,AAAA"}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"request_id": "req-1"})))
            .mount(&server)
            .await;

        let id = client(&server)
            .submit("data:image/png;base64,AAAA")
            .await
            .unwrap();
        assert_eq!(id.as_str(), "req-1");
    }

    #[tokio::test]
    async fn test_submit_rejection_is_submission_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad image"))
            .mount(&server)
            .await;

        let err = client(&server).submit("data:ugh").await.unwrap_err();
        assert!(matches!(err, GenQueueError::Submission(_)));
        assert!(err.to_string().contains("bad image"));
    }

    #[tokio::test]
    async fn test_status_maps_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fal-ai/seed3d/image-to-3d/requests/req-2/status"))
            .and(query_param("logs", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "IN_QUEUE",
                "queue_position": 4,
                "logs": [{"message": "queued"}, "starting"]
            })))
            .mount(&server)
            .await;

        let report = client(&server)
            .status(&RequestId::from_string("req-2"))
            .await
            .unwrap();
        assert_eq!(report.status, QueueStatus::InQueue);
        assert_eq!(report.queue_position, Some(4));
        assert_eq!(report.logs, vec!["queued", "starting"]);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_status_failed_carries_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "FAILED",
                "error": "mesh generation diverged"
            })))
            .mount(&server)
            .await;

        let report = client(&server)
            .status(&RequestId::from_string("req-3"))
            .await
            .unwrap();
        assert_eq!(report.status, QueueStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("mesh generation diverged"));
    }

    #[tokio::test]
    async fn test_unknown_status_is_treated_as_in_progress() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "WARMING_UP"})),
            )
            .mount(&server)
            .await;

        let report = client(&server)
            .status(&RequestId::from_string("req-4"))
            .await
            .unwrap();
        assert_eq!(report.status, QueueStatus::InProgress);
    }

    #[tokio::test]
    async fn test_status_http_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server)
            .status(&RequestId::from_string("req-5"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenQueueError::Status(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_result_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fal-ai/seed3d/image-to-3d/requests/req-6"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": {"url": "https://cdn.example/bundle.zip"},
                "usage_tokens": 321
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .result(&RequestId::from_string("req-6"))
            .await
            .unwrap();
        assert_eq!(
            result.model_url.as_deref(),
            Some("https://cdn.example/bundle.zip")
        );
        assert_eq!(result.usage_tokens, Some(321));
    }

    #[tokio::test]
    async fn test_download_rejects_non_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bundle.zip"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/bundle.zip", server.uri());
        let err = client(&server).download(&url).await.unwrap_err();
        assert!(matches!(err, GenQueueError::Download(_)));
    }

    #[tokio::test]
    async fn test_download_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bundle.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"zip-bytes".to_vec()))
            .mount(&server)
            .await;

        let url = format!("{}/bundle.zip", server.uri());
        let bytes = client(&server).download(&url).await.unwrap();
        assert_eq!(bytes, b"zip-bytes");
    }
}
