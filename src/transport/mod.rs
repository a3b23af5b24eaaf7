//! HTTP client for the media transport's cloud recording control plane.
//!
//! Every request carries a pre-computed `Authorization: Basic` credential.
//! Without one, operations fail before any network I/O happens.

pub mod messages;
pub mod storage;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{StorageConfig, TransportConfig};
use crate::error::{GatewayError, GatewayResult};
use messages::{
    select_file, AcquireClientRequest, AcquireRequest, AcquireResponse, ErrorBody,
    RecordingConfig, RecordingFileConfig, StartClientRequest, StartRequest, StartResponse,
    StopClientRequest, StopRequest, StopResponse,
};
use storage::{object_url, StorageDestination};

/// Remote error code for a stop request that did not complete.
pub const REQUEST_NOT_COMPLETED_CODE: i64 = 65;

/// Identifiers issued by the control plane when a recording starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRecording {
    pub resource_id: String,
    pub sid: String,
}

/// Outcome of a stopped recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordingResult {
    pub file_name: Option<String>,
    /// Object key of the selected file; the recorder uses the file name as key.
    pub storage_key: Option<String>,
    pub storage_url: Option<String>,
    pub file_list: Vec<String>,
    pub file_size: u64,
    pub duration_seconds: u64,
}

/// Backoff for stop requests that hit the transient "request not completed" error.
///
/// Retry `n` (1-based) waits `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// True for the one error class stop retries on.
pub fn is_transient(err: &GatewayError) -> bool {
    match err {
        GatewayError::Upstream { code, message, .. } => {
            *code == Some(REQUEST_NOT_COMPLETED_CODE)
                || message.to_ascii_lowercase().contains("request not completed")
        }
        _ => false,
    }
}

/// Remote recording operations the orchestrator depends on.
#[async_trait]
pub trait RecordingBackend: Send + Sync {
    async fn start_recording(
        &self,
        channel_name: &str,
        uid: &str,
        token: &str,
        entity_label: Option<&str>,
    ) -> GatewayResult<StartedRecording>;

    async fn stop_recording(
        &self,
        resource_id: &str,
        sid: &str,
        uid: &str,
        channel_name: &str,
    ) -> GatewayResult<RecordingResult>;

    async fn query_status(&self, resource_id: &str, sid: &str) -> GatewayResult<Value>;
}

pub struct TransportClient {
    client: reqwest::Client,
    base_url: String,
    credential: Option<String>,
    storage: StorageConfig,
    retry: RetryPolicy,
}

impl TransportClient {
    pub fn new(transport: &TransportConfig, storage: &StorageConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(transport.request_timeout_seconds))
            .build()
            .map_err(|e| GatewayError::configuration(format!("failed to build HTTP client: {}", e)))?;

        let base_url = format!(
            "{}/{}",
            transport.api_base_url.trim_end_matches('/'),
            transport.app_id
        );

        let credential = transport.credential();
        if credential.is_none() {
            warn!("No control plane credentials configured; recording will not work");
        }

        info!("Initialized recording client with base URL: {}", base_url);

        Ok(Self {
            client,
            base_url,
            credential,
            storage: storage.clone(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reserve a recording resource for `channel_name`/`uid`.
    pub async fn acquire_resource(&self, channel_name: &str, uid: &str) -> GatewayResult<String> {
        let body = AcquireRequest {
            cname: channel_name,
            uid,
            client_request: AcquireClientRequest::default(),
        };

        let response: AcquireResponse = self
            .request(Method::POST, "/cloud_recording/acquire", Some(&body))
            .await?;

        match response.resource_id {
            Some(resource_id) if !resource_id.is_empty() => {
                debug!("Acquired resource {} for channel {}", resource_id, channel_name);
                Ok(resource_id)
            }
            _ => Err(GatewayError::upstream(
                None,
                None,
                "acquire response did not include a resourceId",
            )),
        }
    }

    pub async fn start(
        &self,
        channel_name: &str,
        uid: &str,
        token: &str,
        entity_label: Option<&str>,
    ) -> GatewayResult<StartedRecording> {
        self.require_credentials()?;
        let destination = StorageDestination::from_config(&self.storage, entity_label)?;

        let resource_id = self.acquire_resource(channel_name, uid).await?;

        let body = StartRequest {
            cname: channel_name,
            uid,
            client_request: StartClientRequest {
                token,
                recording_config: RecordingConfig::default(),
                recording_file_config: RecordingFileConfig::default(),
                storage_config: &destination,
            },
        };

        let endpoint = format!("/cloud_recording/resourceid/{}/mode/mix/start", resource_id);
        let response: StartResponse = self.request(Method::POST, &endpoint, Some(&body)).await?;

        let sid = response
            .sid
            .filter(|sid| !sid.is_empty())
            .ok_or_else(|| {
                GatewayError::upstream(None, None, "start response did not include a sid")
            })?;

        info!(
            "Recording started for channel {} (resource {}, sid {})",
            channel_name, resource_id, sid
        );

        Ok(StartedRecording { resource_id, sid })
    }

    pub async fn stop(
        &self,
        resource_id: &str,
        sid: &str,
        uid: &str,
        channel_name: &str,
    ) -> GatewayResult<RecordingResult> {
        let endpoint = format!(
            "/cloud_recording/resourceid/{}/sid/{}/mode/mix/stop",
            resource_id, sid
        );
        let body = StopRequest {
            cname: channel_name,
            uid,
            client_request: StopClientRequest::default(),
        };

        let mut retry = 0;
        loop {
            match self
                .request::<StopResponse, _>(Method::POST, &endpoint, Some(&body))
                .await
            {
                Ok(response) => {
                    let result = self.recording_result(&response);
                    info!(
                        "Recording {} stopped: {} file(s), selected {:?}",
                        sid,
                        result.file_list.len(),
                        result.file_name
                    );
                    return Ok(result);
                }
                Err(err) if is_transient(&err) && retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.delay_for(retry);
                    warn!(
                        "Stop for sid {} did not complete ({}), retrying in {:?} ({}/{})",
                        sid, err, delay, retry, self.retry.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn query(&self, resource_id: &str, sid: &str) -> GatewayResult<Value> {
        let endpoint = format!(
            "/cloud_recording/resourceid/{}/sid/{}/mode/mix/query",
            resource_id, sid
        );
        self.request::<Value, ()>(Method::GET, &endpoint, None).await
    }

    fn recording_result(&self, response: &StopResponse) -> RecordingResult {
        let entries = response.file_entries();
        let mut result = RecordingResult {
            file_list: entries
                .iter()
                .filter_map(|entry| entry.file_name.clone())
                .collect(),
            ..RecordingResult::default()
        };

        if let Some(selected) = select_file(&entries) {
            if let Some(file_name) = &selected.file_name {
                result.storage_url = Some(object_url(
                    &self.storage.bucket,
                    &self.storage.region,
                    file_name,
                ));
                result.storage_key = Some(file_name.clone());
                result.file_name = Some(file_name.clone());
            }
            result.file_size = selected.file_size.map(|size| size as u64).unwrap_or(0);
            result.duration_seconds = selected.duration.map(|secs| secs as u64).unwrap_or(0);
        }

        result
    }

    fn require_credentials(&self) -> GatewayResult<&str> {
        self.credential.as_deref().ok_or_else(|| {
            GatewayError::configuration(
                "control plane credentials not configured; set encoded_key or customer_id and customer_secret",
            )
        })
    }

    async fn request<T, B>(&self, method: Method, endpoint: &str, body: Option<&B>) -> GatewayResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + fmt::Debug + ?Sized,
    {
        let credential = self.require_credentials()?;
        let url = format!("{}{}", self.base_url, endpoint);

        // Debug output of request bodies redacts storage credentials
        debug!("Control plane request {} {}: {:?}", method, endpoint, body);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Basic {}", credential))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            error!("Request to {} failed: {}", endpoint, e);
            GatewayError::upstream(None, None, format!("request to {} failed: {}", endpoint, e))
        })?;

        let status = response.status();
        let response_text = response.text().await.map_err(|e| {
            GatewayError::upstream(
                Some(status.as_u16()),
                None,
                format!("failed to read response body: {}", e),
            )
        })?;

        debug!(
            "Control plane response from {} (status {}): {}",
            endpoint, status, response_text
        );

        let parsed = serde_json::from_str::<Value>(&response_text);

        if !status.is_success() {
            let body = parsed
                .as_ref()
                .map(ErrorBody::from_value)
                .unwrap_or_default();

            let message = if status == StatusCode::UNAUTHORIZED {
                "invalid control plane credentials; verify customer_id and customer_secret (or encoded_key)"
                    .to_string()
            } else {
                body.message.unwrap_or_else(|| response_text.clone())
            };

            error!(
                "Control plane request to {} failed with status {}: {}",
                endpoint, status, response_text
            );
            return Err(GatewayError::upstream(
                Some(status.as_u16()),
                body.code,
                message,
            ));
        }

        let value = parsed.map_err(|e| {
            GatewayError::upstream(
                Some(status.as_u16()),
                None,
                format!("failed to parse response from {}: {}", endpoint, e),
            )
        })?;

        serde_json::from_value(value).map_err(|e| {
            GatewayError::upstream(
                Some(status.as_u16()),
                None,
                format!("unexpected response from {}: {}", endpoint, e),
            )
        })
    }
}

#[async_trait]
impl RecordingBackend for TransportClient {
    async fn start_recording(
        &self,
        channel_name: &str,
        uid: &str,
        token: &str,
        entity_label: Option<&str>,
    ) -> GatewayResult<StartedRecording> {
        self.start(channel_name, uid, token, entity_label).await
    }

    async fn stop_recording(
        &self,
        resource_id: &str,
        sid: &str,
        uid: &str,
        channel_name: &str,
    ) -> GatewayResult<RecordingResult> {
        self.stop(resource_id, sid, uid, channel_name).await
    }

    async fn query_status(&self, resource_id: &str, sid: &str) -> GatewayResult<Value> {
        self.query(resource_id, sid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(credential: Option<&str>) -> TransportClient {
        let transport = TransportConfig {
            app_id: "app".to_string(),
            encoded_key: credential.map(str::to_string),
            api_base_url: "http://127.0.0.1:9/v1/apps/".to_string(),
            ..TransportConfig::default()
        };
        let storage = StorageConfig {
            region: "us-west-2".to_string(),
            bucket: "media".to_string(),
            access_key: "AKIA".to_string(),
            secret_key: "shh".to_string(),
            ..StorageConfig::default()
        };
        TransportClient::new(&transport, &storage).unwrap()
    }

    #[test]
    fn test_base_url_includes_app_id() {
        assert_eq!(client(None).base_url(), "http://127.0.0.1:9/v1/apps/app");
    }

    #[test]
    fn test_retry_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.delay_for(2), Duration::from_secs(6));
        let total: Duration = (1..=policy.max_retries).map(|n| policy.delay_for(n)).sum();
        assert_eq!(total, Duration::from_secs(9));
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&GatewayError::upstream(Some(400), Some(65), "x")));
        assert!(is_transient(&GatewayError::upstream(
            Some(500),
            None,
            "Request Not Completed due to jitter"
        )));
        assert!(!is_transient(&GatewayError::upstream(Some(404), Some(404), "gone")));
        assert!(!is_transient(&GatewayError::configuration(
            "request not completed"
        )));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let client = client(None);

        let err = client.acquire_resource("c", "1").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = client.start("c", "1", "t", None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = client.stop("r", "s", "1", "c").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));

        let err = client.query("r", "s").await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(_)));
    }

    #[test]
    fn test_recording_result_prefers_mp4() {
        let client = client(Some("key"));
        let response: StopResponse = serde_json::from_value(serde_json::json!({
            "serverResponse": {"fileList": [
                {"fileName": "recordings/L1/sid_room.m3u8"},
                {"fileName": "recordings/L1/sid_room_0.mp4", "fileSize": 1048576, "duration": 125.8}
            ]}
        }))
        .unwrap();

        let result = client.recording_result(&response);
        assert_eq!(result.file_list.len(), 2);
        assert_eq!(result.file_name.as_deref(), Some("recordings/L1/sid_room_0.mp4"));
        assert_eq!(result.storage_key, result.file_name);
        assert_eq!(
            result.storage_url.as_deref(),
            Some("https://media.s3.us-west-2.amazonaws.com/recordings/L1/sid_room_0.mp4")
        );
        assert_eq!(result.file_size, 1048576);
        assert_eq!(result.duration_seconds, 125);
    }

    #[test]
    fn test_recording_result_tolerates_mistyped_size() {
        let client = client(Some("key"));
        let response: StopResponse = serde_json::from_value(serde_json::json!({
            "serverResponse": {"fileList": [
                {"fileName": "recordings/L1/a.mp4", "fileSize": "2048", "duration": "61"}
            ]}
        }))
        .unwrap();

        let result = client.recording_result(&response);
        assert_eq!(result.storage_key.as_deref(), Some("recordings/L1/a.mp4"));
        assert_eq!(result.file_size, 0);
        assert_eq!(result.duration_seconds, 0);
    }

    #[test]
    fn test_request_body_debug_redacts_storage_keys() {
        let destination = StorageDestination::from_config(
            &StorageConfig {
                bucket: "media".to_string(),
                access_key: "AKIAEXAMPLE".to_string(),
                secret_key: "very-secret".to_string(),
                ..StorageConfig::default()
            },
            Some("LOAD-1"),
        )
        .unwrap();
        let body = StartRequest {
            cname: "room-42",
            uid: "7",
            client_request: StartClientRequest {
                token: "006tok",
                recording_config: RecordingConfig::default(),
                recording_file_config: RecordingFileConfig::default(),
                storage_config: &destination,
            },
        };

        let logged = format!("{:?}", Some(&body));
        assert!(logged.contains("room-42"));
        assert!(logged.contains("media"));
        assert!(!logged.contains("AKIAEXAMPLE"));
        assert!(!logged.contains("very-secret"));
    }

    #[test]
    fn test_recording_result_without_files() {
        let client = client(Some("key"));
        let result = client.recording_result(&StopResponse::default());
        assert_eq!(result, RecordingResult::default());
    }
}
