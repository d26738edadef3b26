use crate::{EpochMillis, MessageId, MessageKind, PageId, UploadStatus, VoiceState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRowView {
    pub page_id: PageId,
    pub title: String,
    pub message_count: usize,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub message_id: MessageId,
    pub kind: MessageKind,
    pub content: String,
    pub context: Option<String>,
    /// Context is collapsed unless the user expanded it.
    pub context_expanded: bool,
    pub timestamp: EpochMillis,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFileView {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub pages: Vec<PageRowView>,
    pub current_page_id: Option<PageId>,
    pub current_title: String,
    pub messages: Vec<MessageView>,
    pub composer: String,
    pub sending: bool,
    pub staged_files: Vec<StagedFileView>,
    pub upload_status: Option<UploadStatus>,
    pub uploading: bool,
    pub voice: VoiceState,
    pub voice_timers_armed: bool,
    pub alert: Option<String>,
}
