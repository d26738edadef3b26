use std::collections::BTreeSet;

use docqa_logging::docqa_warn;

use crate::view_model::{AppViewModel, MessageView, PageRowView, StagedFileView};
use crate::{
    next_message_id, ChatPage, ChatStore, Message, MessageId, PageId, UploadManager,
    VoiceCapture, VoiceSettings,
};

/// Milliseconds since the Unix epoch, supplied by the shell.
pub type EpochMillis = u64;

pub const QUERY_FAILED_TEXT: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Answered {
        answer: String,
        context: Option<String>,
    },
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    chat: ChatStore,
    composer: String,
    sending: bool,
    expanded_context: BTreeSet<MessageId>,
    upload: UploadManager,
    voice: VoiceCapture,
    alert: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice_settings(settings: VoiceSettings) -> Self {
        Self {
            voice: VoiceCapture::new(settings),
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let current = self.chat.current();
        AppViewModel {
            pages: self
                .chat
                .pages()
                .iter()
                .map(|page| PageRowView {
                    page_id: page.id.clone(),
                    title: page.title.clone(),
                    message_count: page.messages.len(),
                    is_current: current.is_some_and(|c| c.id == page.id),
                })
                .collect(),
            current_page_id: current.map(|page| page.id.clone()),
            current_title: current.map(|page| page.title.clone()).unwrap_or_default(),
            messages: current
                .map(|page| {
                    page.messages
                        .iter()
                        .map(|message| MessageView {
                            message_id: message.id.clone(),
                            kind: message.kind,
                            content: message.content.clone(),
                            context: message.context.clone(),
                            context_expanded: self.expanded_context.contains(&message.id),
                            timestamp: message.timestamp,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            composer: self.composer.clone(),
            sending: self.sending,
            staged_files: self
                .upload
                .staged()
                .iter()
                .map(|file| StagedFileView {
                    name: file.name.clone(),
                    size: file.size,
                })
                .collect(),
            upload_status: self.upload.status().cloned(),
            uploading: self.upload.is_uploading(),
            voice: self.voice.state(),
            voice_timers_armed: self.voice.timers_armed(),
            alert: self.alert.clone(),
        }
    }

    /// Returns whether anything changed since the last call and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Copy of every page, in order, for persistence.
    pub fn pages_snapshot(&self) -> Vec<ChatPage> {
        self.chat.pages().to_vec()
    }

    pub fn chat(&self) -> &ChatStore {
        &self.chat
    }

    pub(crate) fn chat_mut(&mut self) -> &mut ChatStore {
        &mut self.chat
    }

    pub(crate) fn upload_mut(&mut self) -> &mut UploadManager {
        &mut self.upload
    }

    pub(crate) fn voice_mut(&mut self) -> &mut VoiceCapture {
        &mut self.voice
    }

    /// Replaces the store with a restored snapshot; true if a page was synthesized.
    pub(crate) fn restore_pages(&mut self, pages: Vec<ChatPage>, now: EpochMillis) -> bool {
        let (chat, created) = ChatStore::restore(pages, now);
        self.chat = chat;
        self.expanded_context.clear();
        created
    }

    pub(crate) fn set_composer(&mut self, text: String) -> bool {
        if self.composer == text {
            return false;
        }
        self.composer = text;
        true
    }

    pub(crate) fn clear_composer(&mut self) {
        self.composer.clear();
    }

    pub(crate) fn set_alert(&mut self, text: impl Into<String>) {
        self.alert = Some(text.into());
    }

    pub(crate) fn take_alert(&mut self) -> bool {
        self.alert.take().is_some()
    }

    /// Optimistically appends the composer text as a user message.
    ///
    /// Returns the page and raw query to send, or `None` when the composer is
    /// blank or a send is already in flight.
    pub(crate) fn begin_send(&mut self, now: EpochMillis) -> Option<(PageId, String)> {
        if self.sending || self.composer.trim().is_empty() {
            return None;
        }
        let page = self.chat.current()?;
        let page_id = page.id.clone();
        let is_first = page.messages.is_empty();
        let mut messages = page.messages.clone();

        let query = std::mem::take(&mut self.composer);
        messages.push(Message::user(next_message_id(&messages, now), query.clone(), now));
        self.chat.replace_messages(&page_id, messages);
        if is_first {
            self.chat.rename_title(&page_id, &query);
        }
        self.sending = true;
        Some((page_id, query))
    }

    /// Appends the answer (or failure notice) to the page that asked.
    ///
    /// Returns false if that page no longer exists; the send is finished either way.
    pub(crate) fn finish_send(
        &mut self,
        page_id: &str,
        now: EpochMillis,
        outcome: QueryOutcome,
    ) -> bool {
        self.sending = false;
        let Some(page) = self.chat.page(page_id) else {
            docqa_warn!("Dropping answer for deleted page {}", page_id);
            return false;
        };
        let mut messages = page.messages.clone();
        let id = next_message_id(&messages, now);
        messages.push(match outcome {
            QueryOutcome::Answered { answer, context } => {
                Message::assistant(id, answer, context, now)
            }
            QueryOutcome::Failed => Message::error(id, QUERY_FAILED_TEXT, now),
        });
        self.chat.replace_messages(page_id, messages)
    }

    pub(crate) fn toggle_context(&mut self, message_id: &str) -> bool {
        let has_context = self.chat.current().is_some_and(|page| {
            page.messages
                .iter()
                .any(|m| m.id == message_id && m.context.is_some())
        });
        if !has_context {
            return false;
        }
        if !self.expanded_context.remove(message_id) {
            self.expanded_context.insert(message_id.to_string());
        }
        true
    }
}
