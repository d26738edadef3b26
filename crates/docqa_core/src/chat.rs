use docqa_logging::docqa_warn;

use crate::EpochMillis;

/// Title given to pages that have not received a message yet.
pub const DEFAULT_TITLE: &str = "New Chat";
/// Titles are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 50;

pub type PageId = String;
pub type MessageId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub content: String,
    /// Supporting passages returned with an answer.
    pub context: Option<String>,
    pub timestamp: EpochMillis,
}

impl Message {
    pub fn user(id: MessageId, content: impl Into<String>, timestamp: EpochMillis) -> Self {
        Self {
            id,
            kind: MessageKind::User,
            content: content.into(),
            context: None,
            timestamp,
        }
    }

    pub fn assistant(
        id: MessageId,
        content: impl Into<String>,
        context: Option<String>,
        timestamp: EpochMillis,
    ) -> Self {
        Self {
            id,
            kind: MessageKind::Assistant,
            content: content.into(),
            context,
            timestamp,
        }
    }

    pub fn error(id: MessageId, content: impl Into<String>, timestamp: EpochMillis) -> Self {
        Self {
            id,
            kind: MessageKind::Error,
            content: content.into(),
            context: None,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPage {
    pub id: PageId,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: EpochMillis,
}

impl ChatPage {
    pub fn new(id: PageId, created_at: EpochMillis) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at,
        }
    }
}

/// Cuts `text` to at most [`TITLE_MAX_CHARS`] characters.
pub fn truncate_title(text: &str) -> String {
    text.chars().take(TITLE_MAX_CHARS).collect()
}

/// Time-derived id for a new message, bumped until it is unique within `existing`.
pub fn next_message_id(existing: &[Message], now: EpochMillis) -> MessageId {
    unique_token(now, |candidate| existing.iter().any(|m| m.id == candidate))
}

fn unique_token(now: EpochMillis, taken: impl Fn(&str) -> bool) -> String {
    let mut stamp = now;
    loop {
        let candidate = stamp.to_string();
        if !taken(&candidate) {
            return candidate;
        }
        stamp += 1;
    }
}

/// All chat pages plus the current selection.
///
/// Pages keep insertion order. Once restored, `current` always names an
/// existing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatStore {
    pages: Vec<ChatPage>,
    current: Option<PageId>,
}

impl ChatStore {
    /// Rebuilds the store from a persisted snapshot.
    ///
    /// Returns the store and whether a fresh page had to be synthesized.
    pub fn restore(pages: Vec<ChatPage>, now: EpochMillis) -> (Self, bool) {
        let mut store = Self::default();
        for page in pages {
            if store.page(&page.id).is_some() {
                docqa_warn!("Dropping persisted page with duplicate id {}", page.id);
                continue;
            }
            store.pages.push(page);
        }

        match store.most_recent_id() {
            Some(id) => {
                store.current = Some(id);
                (store, false)
            }
            None => {
                store.create_page(now);
                (store, true)
            }
        }
    }

    pub fn pages(&self) -> &[ChatPage] {
        &self.pages
    }

    pub fn current(&self) -> Option<&ChatPage> {
        self.current.as_deref().and_then(|id| self.page(id))
    }

    pub fn page(&self, id: &str) -> Option<&ChatPage> {
        self.pages.iter().find(|page| page.id == id)
    }

    fn page_mut(&mut self, id: &str) -> Option<&mut ChatPage> {
        self.pages.iter_mut().find(|page| page.id == id)
    }

    /// Appends an empty page and makes it current.
    pub fn create_page(&mut self, now: EpochMillis) -> PageId {
        let id = unique_token(now, |candidate| self.page(candidate).is_some());
        self.pages.push(ChatPage::new(id.clone(), now));
        self.current = Some(id.clone());
        id
    }

    /// Removes a page. When the current page goes, the most recently created
    /// remaining page takes over, or a fresh page is created.
    pub fn delete_page(&mut self, id: &str, now: EpochMillis) -> bool {
        let Some(index) = self.pages.iter().position(|page| page.id == id) else {
            return false;
        };
        self.pages.remove(index);

        if self.current.as_deref() == Some(id) {
            self.current = self.most_recent_id();
            if self.current.is_none() {
                self.create_page(now);
            }
        }
        true
    }

    pub fn select_page(&mut self, id: &str) -> bool {
        if self.page(id).is_none() || self.current.as_deref() == Some(id) {
            return false;
        }
        self.current = Some(id.to_string());
        true
    }

    pub fn rename_title(&mut self, id: &str, text: &str) -> bool {
        match self.page_mut(id) {
            Some(page) => {
                page.title = truncate_title(text);
                true
            }
            None => false,
        }
    }

    /// Replaces a page's whole message list.
    pub fn replace_messages(&mut self, id: &str, messages: Vec<Message>) -> bool {
        match self.page_mut(id) {
            Some(page) => {
                page.messages = messages;
                true
            }
            None => false,
        }
    }

    fn most_recent_id(&self) -> Option<PageId> {
        // max_by_key keeps the last maximum, so ties resolve to the later page.
        self.pages
            .iter()
            .max_by_key(|page| page.created_at)
            .map(|page| page.id.clone())
    }
}
