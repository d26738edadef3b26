//! Document Q&A client IO: backend HTTP calls, persistence and speech input.
mod api;
mod persist;
mod speech;
mod types;
mod worker;

pub use api::{ClientSettings, DocQaApi, ReqwestApi};
pub use persist::{ensure_data_dir, read_if_exists, AtomicFileWriter, PersistError};
pub use speech::{
    parse_script, RecognitionErrorKind, RecognitionEvent, RecognitionSink, ScriptStep,
    ScriptedRecognizer, SessionId, SpeechError, SpeechRecognizer, UnsupportedRecognizer,
};
pub use types::{
    ApiError, ClientEvent, FailureKind, HealthResponse, IngestResponse, QueryResponse, UploadFile,
};
pub use worker::{ChannelEventSink, ClientHandle, EventSink};
