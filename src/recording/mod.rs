pub mod collaborators;
pub mod orchestrator;
pub mod store;

pub use collaborators::{MediaCatalog, MeetingLookup, RoomBinding};
pub use orchestrator::{
    RecordingOrchestrator, StartRecordingRequest, StartRecordingResponse, StopRecordingRequest,
    StopRecordingResponse,
};
pub use store::{ActiveRecording, ActiveRecordings, RecordingStore};
