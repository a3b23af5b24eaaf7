//! Recording lifecycle orchestrator.
//!
//! start: resolve room → acquire + start upstream → remember by sid
//! stop:  look up sid → validate identifiers → stop upstream → catalog → forget
//!
//! All dependencies are injected via constructor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{GatewayError, GatewayResult, MismatchField};
use crate::transport::RecordingBackend;

use super::collaborators::{MediaCatalog, MeetingLookup};
use super::store::{ActiveRecording, RecordingStore};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    pub room_id: String,
    pub channel_name: String,
    pub uid: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingResponse {
    pub success: bool,
    pub resource_id: String,
    pub sid: String,
    pub recording_id: String,
    pub cname: String,
    pub uid: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRecordingRequest {
    pub resource_id: String,
    pub sid: String,
    pub channel_name: String,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StopRecordingResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(rename = "s3Key", skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,
    #[serde(rename = "s3Url", skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_list: Vec<String>,
    pub file_size: u64,
    pub duration: u64,
    pub status: String,
    /// Set when the recording stopped but could not be added to the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub struct RecordingOrchestrator {
    backend: Arc<dyn RecordingBackend>,
    rooms: Arc<dyn MeetingLookup>,
    catalog: Arc<dyn MediaCatalog>,
    store: Arc<dyn RecordingStore>,
}

impl RecordingOrchestrator {
    pub fn new(
        backend: Arc<dyn RecordingBackend>,
        rooms: Arc<dyn MeetingLookup>,
        catalog: Arc<dyn MediaCatalog>,
        store: Arc<dyn RecordingStore>,
    ) -> Self {
        Self {
            backend,
            rooms,
            catalog,
            store,
        }
    }

    /// Start recording the channel of `request.room_id`.
    pub async fn start(&self, request: &StartRecordingRequest) -> GatewayResult<StartRecordingResponse> {
        let room = match self.rooms.find_room(&request.room_id).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                return Err(GatewayError::not_found(format!(
                    "meeting room not found: {}",
                    request.room_id
                )))
            }
            Err(e) => {
                error!("Room lookup for {} failed: {:#}", request.room_id, e);
                return Err(GatewayError::not_found(format!(
                    "meeting room {} could not be resolved: {}",
                    request.room_id, e
                )));
            }
        };

        if room.channel_name != request.channel_name {
            warn!(
                "Room {} is bound to channel {} but recording was requested for {}",
                request.room_id, room.channel_name, request.channel_name
            );
        }

        let started = self
            .backend
            .start_recording(
                &request.channel_name,
                &request.uid,
                &request.token,
                room.entity_label.as_deref(),
            )
            .await?;

        self.store
            .insert(ActiveRecording {
                resource_id: started.resource_id.clone(),
                sid: started.sid.clone(),
                channel_name: request.channel_name.clone(),
                uid: request.uid.clone(),
                entity_id: room.entity_id,
                entity_label: room.entity_label,
                started_at: chrono::Utc::now(),
            })
            .await;

        info!(
            "Recording {} active for room {} (entity {})",
            started.sid, request.room_id, room.entity_id
        );

        Ok(StartRecordingResponse {
            success: true,
            resource_id: started.resource_id,
            recording_id: started.sid.clone(),
            sid: started.sid,
            cname: request.channel_name.clone(),
            uid: request.uid.clone(),
        })
    }

    /// Stop a recording previously started through [`Self::start`].
    ///
    /// The identifiers must match the ones the recording was started with;
    /// nothing is sent upstream otherwise.
    pub async fn stop(&self, request: &StopRecordingRequest) -> GatewayResult<StopRecordingResponse> {
        let recording = self.store.get(&request.sid).await.ok_or_else(|| {
            GatewayError::not_found(format!(
                "recording not found for sid {}; it was never started here or the service restarted",
                request.sid
            ))
        })?;

        validate_identity(&recording, request)?;

        let result = self
            .backend
            .stop_recording(
                &recording.resource_id,
                &recording.sid,
                &recording.uid,
                &recording.channel_name,
            )
            .await?;

        let mut warning = None;
        if let Some(storage_key) = &result.storage_key {
            let file_name = result.file_name.as_deref().unwrap_or(storage_key);
            if let Err(e) = self
                .catalog
                .record(recording.entity_id, file_name, storage_key)
                .await
            {
                warn!(
                    "Recording {} stopped but could not be saved to the media catalog: {:#}",
                    recording.sid, e
                );
                warning = Some(format!("recording stopped but catalog update failed: {}", e));
            }
        }

        self.store.remove(&recording.sid).await;

        info!(
            "Recording {} stopped for entity {} ({:?})",
            recording.sid, recording.entity_id, result.storage_key
        );

        Ok(StopRecordingResponse {
            success: true,
            file_name: result.file_name,
            storage_key: result.storage_key,
            storage_url: result.storage_url,
            file_list: result.file_list,
            file_size: result.file_size,
            duration: result.duration_seconds,
            status: "completed".to_string(),
            warning,
        })
    }

    pub async fn query(&self, resource_id: &str, sid: &str) -> GatewayResult<Value> {
        self.backend.query_status(resource_id, sid).await
    }

    pub async fn active(&self) -> Vec<ActiveRecording> {
        self.store.list().await
    }
}

/// Checks resource id, channel name, then uid; the first difference wins.
fn validate_identity(recording: &ActiveRecording, request: &StopRecordingRequest) -> GatewayResult<()> {
    let checks = [
        (MismatchField::ResourceId, &recording.resource_id, &request.resource_id),
        (MismatchField::ChannelName, &recording.channel_name, &request.channel_name),
        (MismatchField::Uid, &recording.uid, &request.uid),
    ];

    for (field, expected, actual) in checks {
        if expected != actual {
            return Err(GatewayError::Mismatch {
                field,
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::collaborators::RoomBinding;
    use crate::recording::store::ActiveRecordings;
    use crate::transport::{RecordingResult, StartedRecording};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        starts: AtomicUsize,
        stops: AtomicUsize,
        labels: Mutex<Vec<Option<String>>>,
        fail_stop: bool,
        result: RecordingResult,
    }

    #[async_trait]
    impl RecordingBackend for FakeBackend {
        async fn start_recording(
            &self,
            _channel_name: &str,
            _uid: &str,
            _token: &str,
            entity_label: Option<&str>,
        ) -> GatewayResult<StartedRecording> {
            let n = self.starts.fetch_add(1, Ordering::SeqCst);
            self.labels
                .lock()
                .unwrap()
                .push(entity_label.map(str::to_string));
            Ok(StartedRecording {
                resource_id: format!("res-{}", n),
                sid: format!("sid-{}", n),
            })
        }

        async fn stop_recording(
            &self,
            _resource_id: &str,
            _sid: &str,
            _uid: &str,
            _channel_name: &str,
        ) -> GatewayResult<RecordingResult> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            if self.fail_stop {
                return Err(GatewayError::upstream(Some(404), Some(404), "failed to find worker"));
            }
            Ok(self.result.clone())
        }

        async fn query_status(&self, _resource_id: &str, sid: &str) -> GatewayResult<Value> {
            Ok(serde_json::json!({ "sid": sid }))
        }
    }

    struct FakeRooms(HashMap<String, RoomBinding>);

    #[async_trait]
    impl MeetingLookup for FakeRooms {
        async fn find_room(&self, room_id: &str) -> anyhow::Result<Option<RoomBinding>> {
            if room_id == "broken" {
                anyhow::bail!("database is locked");
            }
            Ok(self.0.get(room_id).cloned())
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        fail: bool,
        entries: Mutex<Vec<(i64, String, String)>>,
    }

    #[async_trait]
    impl MediaCatalog for FakeCatalog {
        async fn record(&self, entity_id: i64, file_name: &str, storage_key: &str) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("catalog offline");
            }
            self.entries.lock().unwrap().push((
                entity_id,
                file_name.to_string(),
                storage_key.to_string(),
            ));
            Ok(())
        }
    }

    struct Harness {
        orchestrator: RecordingOrchestrator,
        backend: Arc<FakeBackend>,
        catalog: Arc<FakeCatalog>,
        store: ActiveRecordings,
    }

    fn harness(backend: FakeBackend, catalog: FakeCatalog) -> Harness {
        let mut rooms = HashMap::new();
        rooms.insert(
            "room-1".to_string(),
            RoomBinding {
                channel_name: "room-42".to_string(),
                entity_id: 12,
                entity_label: Some("LOAD-2024-01!".to_string()),
            },
        );

        let backend = Arc::new(backend);
        let catalog = Arc::new(catalog);
        let store = ActiveRecordings::new();
        let orchestrator = RecordingOrchestrator::new(
            backend.clone(),
            Arc::new(FakeRooms(rooms)),
            catalog.clone(),
            Arc::new(store.clone()),
        );

        Harness {
            orchestrator,
            backend,
            catalog,
            store,
        }
    }

    fn mp4_result() -> RecordingResult {
        RecordingResult {
            file_name: Some("recordings/LOAD202401/sid-0_room-42_0.mp4".to_string()),
            storage_key: Some("recordings/LOAD202401/sid-0_room-42_0.mp4".to_string()),
            storage_url: None,
            file_list: vec!["recordings/LOAD202401/sid-0_room-42_0.mp4".to_string()],
            file_size: 2048,
            duration_seconds: 60,
        }
    }

    fn start_request(room_id: &str) -> StartRecordingRequest {
        StartRecordingRequest {
            room_id: room_id.to_string(),
            channel_name: "room-42".to_string(),
            uid: "7".to_string(),
            token: "006token".to_string(),
        }
    }

    fn stop_request(resource_id: &str, sid: &str, channel_name: &str, uid: &str) -> StopRecordingRequest {
        StopRecordingRequest {
            resource_id: resource_id.to_string(),
            sid: sid.to_string(),
            channel_name: channel_name.to_string(),
            uid: uid.to_string(),
        }
    }

    #[tokio::test]
    async fn test_start_unknown_room() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        let err = h.orchestrator.start(&start_request("nope")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
        assert_eq!(h.backend.starts.load(Ordering::SeqCst), 0);

        let err = h.orchestrator.start(&start_request("broken")).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(ref m) if m.contains("database is locked")));
    }

    #[tokio::test]
    async fn test_start_records_active_recording() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        let response = h.orchestrator.start(&start_request("room-1")).await.unwrap();

        assert!(response.success);
        assert_eq!(response.resource_id, "res-0");
        assert_eq!(response.sid, "sid-0");
        assert_eq!(response.recording_id, "sid-0");
        assert_eq!(response.cname, "room-42");
        assert_eq!(response.uid, "7");

        let stored = h.store.get("sid-0").await.unwrap();
        assert_eq!(stored.entity_id, 12);
        assert_eq!(stored.uid, "7");
        assert_eq!(
            h.backend.labels.lock().unwrap().as_slice(),
            &[Some("LOAD-2024-01!".to_string())]
        );
        assert_eq!(h.orchestrator.active().await.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_unknown_sid() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        let err = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "7"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
        assert_eq!(h.backend.stops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_uid_mismatch_skips_upstream() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let err = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "8"))
            .await
            .unwrap_err();

        match err {
            GatewayError::Mismatch { field, expected, actual } => {
                assert_eq!(field, MismatchField::Uid);
                assert_eq!(expected, "7");
                assert_eq!(actual, "8");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
        assert_eq!(h.backend.stops.load(Ordering::SeqCst), 0);
        assert!(h.store.get("sid-0").await.is_some());
    }

    #[tokio::test]
    async fn test_stop_reports_first_mismatching_field() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let err = h
            .orchestrator
            .stop(&stop_request("res-9", "sid-0", "other", "8"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Mismatch { field: MismatchField::ResourceId, .. }
        ));

        let err = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "other", "8"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Mismatch { field: MismatchField::ChannelName, .. }
        ));
    }

    #[tokio::test]
    async fn test_stop_catalogs_and_forgets() {
        let backend = FakeBackend {
            result: mp4_result(),
            ..FakeBackend::default()
        };
        let h = harness(backend, FakeCatalog::default());
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let response = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "7"))
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.status, "completed");
        assert_eq!(response.file_size, 2048);
        assert!(response.warning.is_none());
        assert!(h.store.get("sid-0").await.is_none());

        let entries = h.catalog.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, 12);
        assert_eq!(entries[0].2, "recordings/LOAD202401/sid-0_room-42_0.mp4");
    }

    #[tokio::test]
    async fn test_catalog_failure_is_not_an_error() {
        let backend = FakeBackend {
            result: mp4_result(),
            ..FakeBackend::default()
        };
        let catalog = FakeCatalog {
            fail: true,
            ..FakeCatalog::default()
        };
        let h = harness(backend, catalog);
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let response = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "7"))
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.warning.unwrap().contains("catalog offline"));
        assert!(h.store.get("sid-0").await.is_none());
    }

    #[tokio::test]
    async fn test_stop_without_files_skips_catalog() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let response = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "7"))
            .await
            .unwrap();

        assert!(response.file_name.is_none());
        assert!(h.catalog.entries.lock().unwrap().is_empty());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_upstream_stop_failure_keeps_recording() {
        let backend = FakeBackend {
            fail_stop: true,
            ..FakeBackend::default()
        };
        let h = harness(backend, FakeCatalog::default());
        h.orchestrator.start(&start_request("room-1")).await.unwrap();

        let err = h
            .orchestrator
            .stop(&stop_request("res-0", "sid-0", "room-42", "7"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed to find worker"));
        assert!(h.store.get("sid-0").await.is_some());
    }

    #[tokio::test]
    async fn test_query_passthrough() {
        let h = harness(FakeBackend::default(), FakeCatalog::default());
        let status = h.orchestrator.query("res-0", "sid-0").await.unwrap();
        assert_eq!(status["sid"], "sid-0");
    }

    #[test]
    fn test_stop_response_serialization() {
        let response = StopRecordingResponse {
            success: true,
            file_name: Some("a.mp4".to_string()),
            storage_key: Some("a.mp4".to_string()),
            storage_url: None,
            file_list: Vec::new(),
            file_size: 10,
            duration: 2,
            status: "completed".to_string(),
            warning: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["s3Key"], "a.mp4");
        assert_eq!(json["fileName"], "a.mp4");
        assert!(json.get("s3Url").is_none());
        assert!(json.get("fileList").is_none());
        assert!(json.get("warning").is_none());
    }
}
