//! Console input: one line is either a message to send or a `/command`.
//!
//! Numbers typed by the user are 1-based positions as printed by `/pages`,
//! `/files` and the transcript.

use std::fs;
use std::path::PathBuf;

use docqa_core::{AppViewModel, EpochMillis, Msg, StagedFile};
use docqa_logging::docqa_warn;
use thiserror::Error;

use super::ui;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Send,
    NewPage,
    ListPages,
    OpenPage(usize),
    DeletePage(Option<usize>),
    Rename(String),
    ToggleContext(usize),
    AddFiles(Vec<PathBuf>),
    RemoveFile(usize),
    ClearFiles,
    ListFiles,
    Upload,
    Health,
    Voice,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command /{0} (try /help)")]
    Unknown(String),
    #[error("/{command} needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("/{command}: {value:?} is not a positive number")]
    BadNumber { command: &'static str, value: String },
    #[error("no page #{0} (see /pages)")]
    NoSuchPage(usize),
    #[error("no message #{0} on this page")]
    NoSuchMessage(usize),
    #[error("none of the given paths could be read ({})", .0.join("; "))]
    NoReadableFiles(Vec<String>),
    #[error("still waiting for the previous answer; your text was not sent")]
    StillWaiting,
}

/// What the app loop should do with a parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Dispatch(Vec<Msg>),
    Show(Vec<String>),
    /// Dispatch, then print notes about what was left out.
    DispatchAndShow(Vec<Msg>, Vec<String>),
    Quit,
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        // Sent verbatim; the raw text also becomes the page title.
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "send" => Command::Send,
        "new" => Command::NewPage,
        "pages" => Command::ListPages,
        "open" => Command::OpenPage(number("open", argument)?),
        "delete" => Command::DeletePage(if argument.is_empty() {
            None
        } else {
            Some(number("delete", argument)?)
        }),
        "rename" => {
            if argument.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "rename",
                    what: "a title",
                });
            }
            Command::Rename(argument.to_string())
        }
        "context" => Command::ToggleContext(number("context", argument)?),
        "add" => {
            let paths: Vec<PathBuf> = split_args(argument).into_iter().map(PathBuf::from).collect();
            if paths.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "add",
                    what: "one or more file paths",
                });
            }
            Command::AddFiles(paths)
        }
        "remove" => Command::RemoveFile(number("remove", argument)?),
        "clear" => Command::ClearFiles,
        "files" => Command::ListFiles,
        "upload" => Command::Upload,
        "health" => Command::Health,
        "voice" => Command::Voice,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn number(command: &'static str, argument: &str) -> Result<usize, CommandError> {
    if argument.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            what: "a number",
        });
    }
    match argument.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(CommandError::BadNumber {
            command,
            value: argument.to_string(),
        }),
    }
}

/// Splits shell-style arguments: whitespace separates, quotes group, and a
/// backslash escapes the next character (as terminals do for dropped files).
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_arg = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }
    if in_arg {
        args.push(current);
    }
    args
}

/// Turns a command into core messages, or into something to print.
pub fn resolve(
    command: Command,
    view: &AppViewModel,
    now: EpochMillis,
) -> Result<Action, CommandError> {
    let action = match command {
        Command::Say(_) | Command::Send if view.sending => return Err(CommandError::StillWaiting),
        Command::Say(text) => Action::Dispatch(vec![
            Msg::ComposerChanged(text),
            Msg::SendClicked { now },
        ]),
        Command::Send => Action::Dispatch(vec![Msg::SendClicked { now }]),
        Command::NewPage => Action::Dispatch(vec![Msg::NewPageClicked { now }]),
        Command::ListPages => Action::Show(ui::render::page_list_lines(view)),
        Command::OpenPage(n) => Action::Dispatch(vec![Msg::PageSelected {
            page_id: page_id_at(view, n)?,
        }]),
        Command::DeletePage(n) => {
            let page_id = match n {
                Some(n) => page_id_at(view, n)?,
                None => view
                    .current_page_id
                    .clone()
                    .ok_or(CommandError::NoSuchPage(0))?,
            };
            Action::Dispatch(vec![Msg::PageDeleted { page_id, now }])
        }
        Command::Rename(title) => match view.current_page_id.clone() {
            Some(page_id) => Action::Dispatch(vec![Msg::PageRenamed { page_id, title }]),
            None => return Err(CommandError::NoSuchPage(0)),
        },
        Command::ToggleContext(n) => {
            let message = view
                .messages
                .get(n.wrapping_sub(1))
                .ok_or(CommandError::NoSuchMessage(n))?;
            Action::Dispatch(vec![Msg::ContextToggled {
                message_id: message.message_id.clone(),
            }])
        }
        Command::AddFiles(paths) => {
            let (files, skipped) = stat_files(paths);
            if files.is_empty() {
                return Err(CommandError::NoReadableFiles(skipped));
            }
            let msgs = vec![Msg::FilesStaged(files)];
            if skipped.is_empty() {
                Action::Dispatch(msgs)
            } else {
                Action::DispatchAndShow(msgs, skipped)
            }
        }
        Command::RemoveFile(n) => Action::Dispatch(vec![Msg::FileUnstaged {
            index: n.wrapping_sub(1),
        }]),
        Command::ClearFiles => Action::Dispatch(vec![Msg::StagedCleared]),
        Command::ListFiles => Action::Show(ui::render::file_list_lines(view)),
        Command::Upload => Action::Dispatch(vec![Msg::UploadClicked]),
        Command::Health => Action::Dispatch(vec![Msg::HealthCheckClicked]),
        Command::Voice => Action::Dispatch(vec![Msg::VoiceToggled]),
        Command::Help => Action::Show(ui::layout::help_lines()),
        Command::Quit => Action::Quit,
    };
    Ok(action)
}

fn page_id_at(view: &AppViewModel, n: usize) -> Result<String, CommandError> {
    view.pages
        .get(n.wrapping_sub(1))
        .map(|page| page.page_id.clone())
        .ok_or(CommandError::NoSuchPage(n))
}

/// Looks up name and size for each path. Unreadable paths come back as
/// one note each.
fn stat_files(paths: Vec<PathBuf>) -> (Vec<StagedFile>, Vec<String>) {
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        let reason = match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => match path.file_name() {
                Some(name) => {
                    files.push(StagedFile {
                        name: name.to_string_lossy().into_owned(),
                        size: meta.len(),
                        path,
                    });
                    continue;
                }
                None => "no file name".to_string(),
            },
            Ok(_) => "not a regular file".to_string(),
            Err(err) => err.to_string(),
        };
        docqa_warn!("Skipping {:?}: {}", path, reason);
        skipped.push(format!("Skipped {}: {}", path.display(), reason));
    }
    (files, skipped)
}
