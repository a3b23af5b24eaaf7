//! Request and response bodies for the cloud recording endpoints.
//!
//! Responses only decode the fields this crate reads; everything else the
//! control plane sends is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::storage::StorageDestination;

#[derive(Debug, Serialize)]
pub struct AcquireRequest<'a> {
    pub cname: &'a str,
    pub uid: &'a str,
    #[serde(rename = "clientRequest")]
    pub client_request: AcquireClientRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquireClientRequest {
    pub resource_expired_hour: u32,
    pub scene: u8,
}

impl Default for AcquireClientRequest {
    fn default() -> Self {
        Self {
            resource_expired_hour: 24,
            scene: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AcquireResponse {
    #[serde(rename = "resourceId", default)]
    pub resource_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartRequest<'a> {
    pub cname: &'a str,
    pub uid: &'a str,
    #[serde(rename = "clientRequest")]
    pub client_request: StartClientRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartClientRequest<'a> {
    pub token: &'a str,
    pub recording_config: RecordingConfig,
    pub recording_file_config: RecordingFileConfig,
    pub storage_config: &'a StorageDestination,
}

/// Mixed-layout audio+video recording of the whole channel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingConfig {
    pub channel_type: u8,
    pub stream_types: u8,
    pub max_idle_time: u32,
    pub stream_mode: &'static str,
    pub video_stream_type: u8,
    pub transcoding_config: TranscodingConfig,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            channel_type: 0,
            stream_types: 2,
            max_idle_time: 30,
            stream_mode: "standard",
            video_stream_type: 0,
            transcoding_config: TranscodingConfig::default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodingConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate: u32,
    pub mixed_video_layout: u8,
    pub background_color: &'static str,
}

impl Default for TranscodingConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 15,
            bitrate: 500,
            mixed_video_layout: 1,
            background_color: "#000000",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingFileConfig {
    pub av_file_type: Vec<&'static str>,
}

impl Default for RecordingFileConfig {
    fn default() -> Self {
        Self {
            av_file_type: vec!["hls", "mp4"],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub sid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopRequest<'a> {
    pub cname: &'a str,
    pub uid: &'a str,
    #[serde(rename = "clientRequest")]
    pub client_request: StopClientRequest,
}

#[derive(Debug, Default, Serialize)]
pub struct StopClientRequest {}

#[derive(Debug, Default, Deserialize)]
pub struct StopResponse {
    #[serde(rename = "fileList", default)]
    pub file_list: Option<Value>,
    #[serde(rename = "serverResponse", default)]
    pub server_response: Option<ServerResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerResponse {
    #[serde(rename = "fileList", default)]
    pub file_list: Option<Value>,
}

impl StopResponse {
    /// File entries, from the top level or from `serverResponse`.
    ///
    /// Each field is read on its own, so a mistyped sibling never hides the
    /// file name. Entries that are not objects decode as an empty entry so
    /// that list positions are preserved.
    pub fn file_entries(&self) -> Vec<FileEntry> {
        let list = self.file_list.as_ref().or_else(|| {
            self.server_response
                .as_ref()
                .and_then(|sr| sr.file_list.as_ref())
        });

        match list {
            Some(Value::Array(items)) => items
                .iter()
                .map(FileEntry::from_value)
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileEntry {
    pub file_name: Option<String>,
    pub file_size: Option<f64>,
    pub duration: Option<f64>,
}

impl FileEntry {
    pub fn from_value(item: &Value) -> Self {
        Self {
            file_name: item.get("fileName").and_then(Value::as_str).map(str::to_string),
            file_size: item.get("fileSize").and_then(Value::as_f64),
            duration: item.get("duration").and_then(Value::as_f64),
        }
    }

    pub fn is_mp4(&self) -> bool {
        self.file_name
            .as_deref()
            .is_some_and(|name| name.ends_with(".mp4"))
    }
}

/// Pick the entry to catalog: the first MP4, otherwise the first listed file.
pub fn select_file(entries: &[FileEntry]) -> Option<&FileEntry> {
    entries
        .iter()
        .find(|entry| entry.is_mp4())
        .or_else(|| entries.first())
}

/// Error details from a non-2xx response.
#[derive(Debug, Default, PartialEq)]
pub struct ErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Reads `code` and the first of `error`, `message`, `reason` that is a string.
    pub fn from_value(value: &Value) -> Self {
        let code = value.get("code").and_then(Value::as_i64);
        let message = ["error", "message", "reason"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Value::as_str))
            .map(str::to_string);
        Self { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_acquire_request_shape() {
        let body = AcquireRequest {
            cname: "room-42",
            uid: "7",
            client_request: AcquireClientRequest::default(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "cname": "room-42",
                "uid": "7",
                "clientRequest": {"resourceExpiredHour": 24, "scene": 0}
            })
        );
    }

    #[test]
    fn test_recording_config_shape() {
        let value = serde_json::to_value(RecordingConfig::default()).unwrap();
        assert_eq!(value["streamTypes"], 2);
        assert_eq!(value["maxIdleTime"], 30);
        assert_eq!(value["streamMode"], "standard");
        assert_eq!(value["transcodingConfig"]["mixedVideoLayout"], 1);
        assert_eq!(value["transcodingConfig"]["backgroundColor"], "#000000");

        let value = serde_json::to_value(RecordingFileConfig::default()).unwrap();
        assert_eq!(value, json!({"avFileType": ["hls", "mp4"]}));
    }

    #[test]
    fn test_stop_request_has_empty_client_request() {
        let body = StopRequest {
            cname: "c",
            uid: "1",
            client_request: StopClientRequest::default(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"cname": "c", "uid": "1", "clientRequest": {}})
        );
    }

    #[test]
    fn test_file_entries_from_server_response() {
        let response: StopResponse = serde_json::from_value(json!({
            "resourceId": "r",
            "sid": "s",
            "serverResponse": {
                "uploadingStatus": "uploaded",
                "fileList": [
                    {"fileName": "a.m3u8", "trackType": "audio_and_video"},
                    {"fileName": "a.mp4", "fileSize": 2048, "duration": 61.4}
                ]
            }
        }))
        .unwrap();

        let entries = response.file_entries();
        assert_eq!(entries.len(), 2);
        let selected = select_file(&entries).unwrap();
        assert_eq!(selected.file_name.as_deref(), Some("a.mp4"));
        assert_eq!(selected.file_size, Some(2048.0));
    }

    #[test]
    fn test_mistyped_fields_keep_file_name() {
        let response: StopResponse = serde_json::from_value(json!({
            "serverResponse": {"fileList": [
                {"fileName": "recordings/L1/a.mp4", "fileSize": "2048", "duration": "61"}
            ]}
        }))
        .unwrap();

        let entries = response.file_entries();
        assert_eq!(
            entries,
            vec![FileEntry {
                file_name: Some("recordings/L1/a.mp4".to_string()),
                file_size: None,
                duration: None,
            }]
        );
    }

    #[test]
    fn test_non_object_entry_is_empty() {
        let response: StopResponse = serde_json::from_value(json!({
            "fileList": ["a.mp4", {"fileName": "b.mp4", "fileSize": 10, "duration": 61}]
        }))
        .unwrap();

        let entries = response.file_entries();
        assert_eq!(entries[0], FileEntry::default());
        assert_eq!(entries[1].file_size, Some(10.0));
        assert_eq!(entries[1].duration, Some(61.0));
    }

    #[test]
    fn test_top_level_file_list_wins() {
        let response: StopResponse = serde_json::from_value(json!({
            "fileList": [{"fileName": "top.m3u8"}],
            "serverResponse": {"fileList": [{"fileName": "nested.mp4"}]}
        }))
        .unwrap();

        let entries = response.file_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            select_file(&entries).unwrap().file_name.as_deref(),
            Some("top.m3u8")
        );
    }

    #[test]
    fn test_non_array_file_list_is_ignored() {
        let response: StopResponse = serde_json::from_value(json!({
            "serverResponse": {"fileList": "a.m3u8"}
        }))
        .unwrap();
        assert!(response.file_entries().is_empty());
        assert!(select_file(&response.file_entries()).is_none());
    }

    #[test]
    fn test_error_body_extraction() {
        assert_eq!(
            ErrorBody::from_value(&json!({"code": 65, "reason": "request not completed"})),
            ErrorBody {
                code: Some(65),
                message: Some("request not completed".to_string()),
            }
        );
        assert_eq!(
            ErrorBody::from_value(&json!({"error": "bad", "message": "ignored"})).message,
            Some("bad".to_string())
        );
        assert_eq!(ErrorBody::from_value(&json!([])), ErrorBody::default());
    }
}
