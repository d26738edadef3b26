use std::path::PathBuf;

use docqa_logging::docqa_info;

use crate::EpochMillis;

/// File suffixes the ingestion endpoint accepts, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 4] = [".docx", ".pdf", ".csv", ".txt"];
/// How long a successful upload stays on screen before the list is cleared.
pub const CLEAR_DELAY_MS: EpochMillis = 2_000;

pub const REJECTED_FILES_TEXT: &str = "Only .docx, .pdf, .csv, and .txt files are allowed.";
pub const NOTHING_STAGED_TEXT: &str = "Please select at least one file to upload.";
pub const UPLOAD_FAILED_TEXT: &str =
    "Upload failed. Please check that the backend is running and try again.";
pub const BACKEND_UNREACHABLE_TEXT: &str = "Backend is not reachable.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl UploadStatus {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The backend accepted the files; carries its confirmation text.
    Accepted { message: String },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub models_initialized: bool,
    pub vectorstore_loaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthOutcome {
    Reachable(HealthReport),
    Unreachable,
}

pub fn is_allowed_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadManager {
    staged: Vec<StagedFile>,
    status: Option<UploadStatus>,
    /// Files sent by the upload in progress.
    in_flight: Option<Vec<StagedFile>>,
    pending_clear: Option<PendingClear>,
}

/// Files accepted by the backend, dropped from the list at `at`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingClear {
    at: EpochMillis,
    files: Vec<StagedFile>,
}

impl UploadManager {
    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn status(&self) -> Option<&UploadStatus> {
        self.status.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Appends the allowed subset of `files`; returns how many were rejected.
    ///
    /// Any rejection sets the error status, a clean batch clears it.
    pub fn stage(&mut self, files: Vec<StagedFile>) -> usize {
        let offered = files.len();
        let before = self.staged.len();
        self.staged
            .extend(files.into_iter().filter(|file| is_allowed_file(&file.name)));
        let rejected = offered - (self.staged.len() - before);

        self.status = if rejected > 0 {
            Some(UploadStatus::new(StatusKind::Error, REJECTED_FILES_TEXT))
        } else {
            None
        };
        rejected
    }

    pub fn unstage(&mut self, index: usize) -> bool {
        if index < self.staged.len() {
            self.staged.remove(index);
            true
        } else {
            false
        }
    }

    pub fn clear_all(&mut self) {
        self.staged.clear();
        self.status = None;
        self.pending_clear = None;
    }

    /// Starts an upload of everything staged, or explains why it cannot.
    ///
    /// Returns `None` while another upload is in flight or when nothing is staged.
    /// Files already accepted but still waiting for the delayed clear are
    /// dropped first, so they are never sent twice.
    pub fn begin_upload(&mut self) -> Option<Vec<StagedFile>> {
        if self.is_uploading() {
            return None;
        }
        if let Some(pending) = self.pending_clear.take() {
            self.drop_uploaded(pending.files);
        }
        if self.staged.is_empty() {
            self.status = Some(UploadStatus::new(StatusKind::Error, NOTHING_STAGED_TEXT));
            return None;
        }
        self.in_flight = Some(self.staged.clone());
        Some(self.staged.clone())
    }

    pub fn finish_upload(&mut self, now: EpochMillis, outcome: UploadOutcome) {
        let sent = self.in_flight.take().unwrap_or_default();
        match outcome {
            UploadOutcome::Accepted { message } => {
                self.status = Some(UploadStatus::new(StatusKind::Success, message));
                self.pending_clear = Some(PendingClear {
                    at: now + CLEAR_DELAY_MS,
                    files: sent,
                });
            }
            UploadOutcome::Failed => {
                self.status = Some(UploadStatus::new(StatusKind::Error, UPLOAD_FAILED_TEXT));
            }
        }
    }

    pub fn apply_health(&mut self, outcome: HealthOutcome) {
        self.status = Some(match outcome {
            HealthOutcome::Reachable(report) => UploadStatus::new(
                StatusKind::Info,
                format!(
                    "Backend status: {} | Models initialized: {} | Vector store loaded: {}",
                    report.status,
                    yes_no(report.models_initialized),
                    yes_no(report.vectorstore_loaded)
                ),
            ),
            HealthOutcome::Unreachable => {
                UploadStatus::new(StatusKind::Error, BACKEND_UNREACHABLE_TEXT)
            }
        });
    }

    /// Drops the uploaded files from the list once the post-upload delay has
    /// elapsed. Files staged after that upload started stay.
    pub fn on_tick(&mut self, now: EpochMillis) -> bool {
        match self.pending_clear.take() {
            Some(pending) if now >= pending.at => {
                docqa_info!("Clearing {} uploaded file(s)", pending.files.len());
                self.drop_uploaded(pending.files);
                true
            }
            other => {
                self.pending_clear = other;
                false
            }
        }
    }

    /// Removes one staged entry per uploaded file; duplicates staged later survive.
    fn drop_uploaded(&mut self, uploaded: Vec<StagedFile>) {
        for file in uploaded {
            if let Some(index) = self.staged.iter().position(|staged| *staged == file) {
                self.staged.remove(index);
            }
        }
    }
}
