use std::fs;
use std::path::{Path, PathBuf};

use docqa_client::{read_if_exists, AtomicFileWriter};
use docqa_core::{ChatPage, Message, MessageKind};
use docqa_logging::{docqa_error, docqa_info, docqa_warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clock::{from_rfc3339, to_rfc3339};

/// The single storage key holding every chat page.
pub const PAGES_FILENAME: &str = "chat_pages.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedPage {
    id: String,
    title: String,
    messages: Vec<PersistedMessage>,
    created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedMessage {
    id: String,
    #[serde(rename = "type")]
    kind: PersistedKind,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PersistedKind {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp {0:?}")]
    Timestamp(String),
}

pub fn encode_pages(pages: &[ChatPage]) -> Result<String, serde_json::Error> {
    let persisted: Vec<PersistedPage> = pages
        .iter()
        .map(|page| PersistedPage {
            id: page.id.clone(),
            title: page.title.clone(),
            messages: page
                .messages
                .iter()
                .map(|message| PersistedMessage {
                    id: message.id.clone(),
                    kind: match message.kind {
                        MessageKind::User => PersistedKind::User,
                        MessageKind::Assistant => PersistedKind::Assistant,
                        MessageKind::Error => PersistedKind::Error,
                    },
                    content: message.content.clone(),
                    context: message.context.clone(),
                    timestamp: to_rfc3339(message.timestamp),
                })
                .collect(),
            created_at: to_rfc3339(page.created_at),
        })
        .collect();
    serde_json::to_string(&persisted)
}

pub fn decode_pages(text: &str) -> Result<Vec<ChatPage>, DecodeError> {
    let persisted: Vec<PersistedPage> = serde_json::from_str(text)?;
    persisted
        .into_iter()
        .map(|page| {
            let messages = page
                .messages
                .into_iter()
                .map(|message| {
                    Ok(Message {
                        id: message.id,
                        kind: match message.kind {
                            PersistedKind::User => MessageKind::User,
                            PersistedKind::Assistant => MessageKind::Assistant,
                            PersistedKind::Error => MessageKind::Error,
                        },
                        content: message.content,
                        context: message.context,
                        timestamp: parse_timestamp(&message.timestamp)?,
                    })
                })
                .collect::<Result<Vec<_>, DecodeError>>()?;
            Ok(ChatPage {
                id: page.id,
                title: page.title,
                messages,
                created_at: parse_timestamp(&page.created_at)?,
            })
        })
        .collect()
}

fn parse_timestamp(text: &str) -> Result<u64, DecodeError> {
    from_rfc3339(text).ok_or_else(|| DecodeError::Timestamp(text.to_string()))
}

/// Reads the snapshot; a missing or unusable one yields no pages.
///
/// An undecodable snapshot is moved aside so the next save does not erase it.
pub fn load_pages(data_dir: &Path) -> Vec<ChatPage> {
    let path = data_dir.join(PAGES_FILENAME);
    let content = match read_if_exists(&path) {
        Ok(Some(text)) => text,
        Ok(None) => return Vec::new(),
        Err(err) => {
            docqa_warn!("Failed to read chat pages from {:?}: {}", path, err);
            return Vec::new();
        }
    };

    match decode_pages(&content) {
        Ok(pages) => {
            docqa_info!("Loaded {} chat page(s) from {:?}", pages.len(), path);
            pages
        }
        Err(err) => {
            docqa_warn!("Failed to parse chat pages from {:?}: {}", path, err);
            set_aside(&path);
            Vec::new()
        }
    }
}

fn set_aside(path: &Path) {
    let mut aside = PathBuf::from(path);
    aside.set_extension("json.corrupt");
    match fs::rename(path, &aside) {
        Ok(()) => docqa_warn!("Moved unreadable snapshot to {:?}", aside),
        Err(err) => docqa_error!("Failed to move unreadable snapshot {:?}: {}", path, err),
    }
}

/// Rewrites the whole snapshot.
pub fn save_pages(data_dir: &Path, pages: &[ChatPage]) {
    let content = match encode_pages(pages) {
        Ok(text) => text,
        Err(err) => {
            docqa_error!("Failed to serialize chat pages: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(data_dir));
    if let Err(err) = writer.write(PAGES_FILENAME, &content) {
        docqa_error!("Failed to write chat pages to {:?}: {}", data_dir, err);
    }
}
