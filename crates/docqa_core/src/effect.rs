use crate::{PageId, StagedFile, VoiceSessionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write the full page list snapshot to durable storage.
    PersistPages,
    /// Ask the backend; the answer must be routed back to `page_id`.
    SendQuery { page_id: PageId, query: String },
    Upload { files: Vec<StagedFile> },
    CheckHealth,
    /// Open the microphone; every recognizer event must carry `session`.
    StartRecognizer { session: VoiceSessionId },
    StopRecognizer,
}
