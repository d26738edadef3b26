//! Line editing on a dedicated thread.
//!
//! The thread owns the `rustyline` editor and hands an external printer back
//! to the app loop, so answers and transcripts arriving while the user types
//! are printed above the prompt instead of through it.

use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;

use anyhow::Context;
use docqa_logging::{docqa_debug, docqa_warn};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};

use super::app::LoopEvent;
use super::ui;

type Printer = Box<dyn ExternalPrinter + Send>;

/// Where the app loop writes its output.
pub enum Console {
    /// Printed through the editor, which redraws the prompt afterwards.
    Editor(Printer),
    /// Stdin is not a terminal.
    Plain(io::Stdout),
}

impl Console {
    pub fn print(&mut self, lines: &[String]) -> anyhow::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        match self {
            Console::Editor(printer) => {
                let mut text = lines.join("\n");
                text.push('\n');
                printer
                    .print(text)
                    .context("printing through the line editor")
            }
            Console::Plain(out) => {
                let mut out = out.lock();
                for line in lines {
                    writeln!(out, "{line}")?;
                }
                out.flush()?;
                Ok(())
            }
        }
    }
}

/// The editing half that the reader loop needs.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError>;
    fn remember(&mut self, line: &str);
}

impl LineSource for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.readline(prompt)
    }

    fn remember(&mut self, line: &str) {
        let _ = self.add_history_entry(line);
    }
}

/// Lets the reader prompt again once the loop has handled the last line.
/// Dropping it ends the reader without reopening the prompt.
pub struct ResumeInput(mpsc::Sender<()>);

impl ResumeInput {
    pub fn resume(&self) {
        let _ = self.0.send(());
    }
}

/// Starts the editor thread and waits until its printer is ready.
pub fn spawn_line_reader(tx: mpsc::Sender<LoopEvent>) -> anyhow::Result<(Console, ResumeInput)> {
    let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<Option<Printer>, ReadlineError>>(1);
    let (resume_tx, resume_rx) = mpsc::channel();

    thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                let _ = ready_tx.send(Err(err));
                return;
            }
        };
        let printer = match editor.create_external_printer() {
            Ok(printer) => Some(Box::new(printer) as Printer),
            Err(err) => {
                docqa_debug!("No external printer, writing to stdout: {}", err);
                None
            }
        };
        if ready_tx.send(Ok(printer)).is_err() {
            return;
        }
        read_lines(&mut editor, &tx, &resume_rx);
    });

    let printer = ready_rx
        .recv()
        .context("input thread stopped during setup")?
        .context("initializing the line editor")?;
    let console = match printer {
        Some(printer) => Console::Editor(printer),
        None => Console::Plain(io::stdout()),
    };
    Ok((console, ResumeInput(resume_tx)))
}

/// Reads until end of input. After each line or Ctrl-C the reader waits for
/// the loop to resume it, so the prompt never reappears after `/quit`.
pub fn read_lines(
    source: &mut impl LineSource,
    tx: &mpsc::Sender<LoopEvent>,
    resume: &mpsc::Receiver<()>,
) {
    loop {
        let event = match source.read_line(ui::layout::PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    source.remember(&line);
                }
                LoopEvent::Line(line)
            }
            Err(ReadlineError::Interrupted) => LoopEvent::Interrupted,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                docqa_warn!("Reading input failed: {}", err);
                break;
            }
        };
        if tx.send(event).is_err() || resume.recv().is_err() {
            return;
        }
    }
    let _ = tx.send(LoopEvent::InputClosed);
}
