//! Console rendering: turns successive view models into printable lines.

use std::collections::HashMap;

use docqa_core::{AppViewModel, MessageKind, MessageView, StatusKind, VoiceState};

/// Remembers the last rendered view and prints only what changed since.
#[derive(Debug, Default)]
pub struct Renderer {
    last: Option<AppViewModel>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<String> {
        let lines = match &self.last {
            None => full_page(view),
            Some(prev) => diff(prev, view),
        };
        self.last = Some(view.clone());
        lines
    }
}

fn full_page(view: &AppViewModel) -> Vec<String> {
    let mut lines = page_lines(view);
    lines.extend(side_panel_lines(None, view));
    lines
}

fn diff(prev: &AppViewModel, view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.current_page_id != view.current_page_id {
        lines.extend(page_lines(view));
    } else {
        if prev.current_title != view.current_title {
            lines.push(format!("Page renamed: {}", view.current_title));
        }
        let before: HashMap<&str, &MessageView> = prev
            .messages
            .iter()
            .map(|message| (message.message_id.as_str(), message))
            .collect();
        for (index, message) in view.messages.iter().enumerate() {
            match before.get(message.message_id.as_str()) {
                None => lines.extend(message_lines(index + 1, message)),
                Some(old) if old.context_expanded != message.context_expanded => {
                    lines.extend(context_lines(index + 1, message));
                }
                Some(_) => {}
            }
        }
    }

    if view.sending && !prev.sending {
        lines.push("... waiting for an answer".to_string());
    }

    lines.extend(side_panel_lines(Some(prev), view));
    lines
}

/// Upload, voice and alert lines; `prev` is `None` on the first render.
fn side_panel_lines(prev: Option<&AppViewModel>, view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    let staged_changed = prev.is_none_or(|prev| prev.staged_files != view.staged_files);
    if staged_changed && (prev.is_some() || !view.staged_files.is_empty()) {
        lines.extend(file_list_lines(view));
    }

    if view.uploading && !prev.is_some_and(|prev| prev.uploading) {
        lines.push(format!(
            "Uploading {} file(s)...",
            view.staged_files.len()
        ));
    }

    let status_changed = prev.is_none_or(|prev| prev.upload_status != view.upload_status);
    if let (true, Some(status)) = (status_changed, &view.upload_status) {
        let tag = match status.kind {
            StatusKind::Success => "[ok]",
            StatusKind::Error => "[error]",
            StatusKind::Info => "[info]",
        };
        lines.push(format!("{tag} {}", status.message));
    }

    let prev_voice = prev.map_or(VoiceState::Idle, |prev| prev.voice);
    if prev_voice != view.voice {
        lines.push(match view.voice {
            VoiceState::Starting => "[mic] starting...".to_string(),
            VoiceState::Listening => "[mic] listening (/voice to stop)".to_string(),
            VoiceState::Idle if view.composer.trim().is_empty() => "[mic] off".to_string(),
            VoiceState::Idle => format!("[mic] off; dictated: {} (/send to send)", view.composer),
        });
    } else if view.voice != VoiceState::Idle
        && !view.composer.is_empty()
        && prev.is_some_and(|prev| prev.composer != view.composer)
    {
        lines.push(format!("[mic] {}", view.composer));
    }

    let prev_alert = prev.and_then(|prev| prev.alert.as_ref());
    if let Some(alert) = &view.alert {
        if prev_alert != Some(alert) {
            lines.push(format!("[!] {alert}"));
        }
    }

    lines
}

fn page_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", view.current_title)];
    if view.messages.is_empty() {
        lines.push("(no messages yet)".to_string());
    }
    for (index, message) in view.messages.iter().enumerate() {
        lines.extend(message_lines(index + 1, message));
    }
    lines
}

fn message_lines(number: usize, message: &MessageView) -> Vec<String> {
    let speaker = match message.kind {
        MessageKind::User => "You",
        MessageKind::Assistant => "Assistant",
        MessageKind::Error => "Error",
    };
    let mut lines = vec![format!("{number}. {speaker}: {}", message.content)];
    lines.extend(context_lines(number, message));
    lines
}

fn context_lines(number: usize, message: &MessageView) -> Vec<String> {
    let Some(context) = &message.context else {
        return Vec::new();
    };
    if message.context_expanded {
        let mut lines = vec!["   Context:".to_string()];
        lines.extend(context.lines().map(|line| format!("   | {line}")));
        lines
    } else {
        vec![format!("   (context available: /context {number})")]
    }
}

pub fn page_list_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = vec!["Pages:".to_string()];
    for (index, page) in view.pages.iter().enumerate() {
        let marker = if page.is_current { '*' } else { ' ' };
        lines.push(format!(
            "{marker} {}. {} ({} message{})",
            index + 1,
            page.title,
            page.message_count,
            if page.message_count == 1 { "" } else { "s" }
        ));
    }
    lines
}

pub fn file_list_lines(view: &AppViewModel) -> Vec<String> {
    if view.staged_files.is_empty() {
        return vec!["No files staged.".to_string()];
    }
    let mut lines = vec!["Staged files:".to_string()];
    for (index, file) in view.staged_files.iter().enumerate() {
        lines.push(format!(
            "  {}. {} ({})",
            index + 1,
            file.name,
            format_size(file.size)
        ));
    }
    lines
}

fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{bytes} B")
    }
}
