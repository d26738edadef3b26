use crate::{
    ChatPage, EpochMillis, HealthOutcome, MessageId, PageId, QueryOutcome, StagedFile,
    UploadOutcome, VoiceErrorKind, VoiceSessionId,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Pages decoded from storage at startup (empty when nothing was stored).
    PagesRestored {
        pages: Vec<ChatPage>,
        now: EpochMillis,
    },
    NewPageClicked { now: EpochMillis },
    PageSelected { page_id: PageId },
    PageDeleted { page_id: PageId, now: EpochMillis },
    PageRenamed { page_id: PageId, title: String },
    /// User edited the message composer.
    ComposerChanged(String),
    SendClicked { now: EpochMillis },
    /// Backend completion for a query issued from `page_id`.
    QueryAnswered {
        page_id: PageId,
        now: EpochMillis,
        outcome: QueryOutcome,
    },
    /// Expand or collapse the supporting context of an answer.
    ContextToggled { message_id: MessageId },
    /// Files picked by the user, before extension filtering.
    FilesStaged(Vec<StagedFile>),
    FileUnstaged { index: usize },
    StagedCleared,
    UploadClicked,
    UploadFinished {
        now: EpochMillis,
        outcome: UploadOutcome,
    },
    HealthCheckClicked,
    HealthChecked(HealthOutcome),
    /// Microphone button: starts capture when idle, stops it otherwise.
    VoiceToggled,
    VoiceStarted {
        session: VoiceSessionId,
        now: EpochMillis,
    },
    VoiceTranscript {
        session: VoiceSessionId,
        now: EpochMillis,
        text: String,
        is_final: bool,
    },
    VoiceError {
        session: VoiceSessionId,
        kind: VoiceErrorKind,
    },
    VoiceEnded { session: VoiceSessionId },
    AlertDismissed,
    /// Periodic clock tick driving deadlines.
    Tick { now: EpochMillis },
    /// Fallback for placeholder wiring.
    NoOp,
}
