//! Document Q&A client core: pure state machine and view-model helpers.
mod chat;
mod effect;
mod msg;
mod state;
mod update;
mod upload;
mod view_model;
mod voice;

pub use chat::{
    next_message_id, truncate_title, ChatPage, ChatStore, Message, MessageId, MessageKind, PageId,
    DEFAULT_TITLE, TITLE_MAX_CHARS,
};
pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, EpochMillis, QueryOutcome, QUERY_FAILED_TEXT};
pub use update::update;
pub use upload::{
    is_allowed_file, HealthOutcome, HealthReport, StagedFile, StatusKind, UploadManager,
    UploadOutcome, UploadStatus, ALLOWED_EXTENSIONS, BACKEND_UNREACHABLE_TEXT, CLEAR_DELAY_MS,
    NOTHING_STAGED_TEXT, REJECTED_FILES_TEXT, UPLOAD_FAILED_TEXT,
};
pub use view_model::{AppViewModel, MessageView, PageRowView, StagedFileView};
pub use voice::{
    StopReason, VoiceCapture, VoiceErrorKind, VoiceSessionId, VoiceSettings, VoiceState,
};
