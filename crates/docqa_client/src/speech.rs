//! Speech recognizer abstraction.
//!
//! A recognizer is started with a session id and a sink, and reports
//! everything through the sink tagged with that id: `Started` once the
//! microphone is live, any number of `Transcript`s, then either `Error` or
//! `Ended`. `stop()` may be called at any time and must be idempotent; a
//! stopped session may still deliver events already in flight, which the
//! receiver tells apart by session id.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use docqa_logging::{docqa_debug, docqa_info};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    NotAllowed,
    NoSpeech,
    Aborted,
    Other(String),
}

impl RecognitionErrorKind {
    /// Maps a recognizer error code (`not-allowed`, `no-speech`, ...) to a kind.
    pub fn from_code(code: &str) -> Self {
        match code {
            "not-allowed" | "service-not-allowed" => RecognitionErrorKind::NotAllowed,
            "no-speech" => RecognitionErrorKind::NoSpeech,
            "aborted" => RecognitionErrorKind::Aborted,
            other => RecognitionErrorKind::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Started,
    Transcript { text: String, is_final: bool },
    Error(RecognitionErrorKind),
    Ended,
}

/// Capture session an event belongs to.
pub type SessionId = u64;

pub trait RecognitionSink: Send + Sync {
    fn emit(&self, session: SessionId, event: RecognitionEvent);
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech recognition is not available")]
    Unsupported,
    #[error("failed to read recognition script {path:?}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid recognition script at line {line}: {message}")]
    ScriptSyntax { line: usize, message: String },
}

pub trait SpeechRecognizer: Send {
    fn start(
        &mut self,
        session: SessionId,
        sink: Arc<dyn RecognitionSink>,
    ) -> Result<(), SpeechError>;

    fn stop(&mut self);
}

/// Recognizer for systems without speech input.
#[derive(Debug, Default)]
pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn start(
        &mut self,
        _session: SessionId,
        _sink: Arc<dyn RecognitionSink>,
    ) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Interim(String),
    Final(String),
    Pause(Duration),
    Error(RecognitionErrorKind),
}

/// Parses a recognition script.
///
/// One step per line: `interim: TEXT`, `final: TEXT`, `pause: MILLIS` or
/// `error: CODE`. Blank lines and lines starting with `#` are skipped. Text
/// after `interim:`/`final:` is kept verbatim apart from the single space
/// following the colon.
pub fn parse_script(source: &str) -> Result<Vec<ScriptStep>, SpeechError> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
            continue;
        }
        let Some((keyword, rest)) = raw.split_once(':') else {
            return Err(SpeechError::ScriptSyntax {
                line,
                message: "expected `keyword: value`".into(),
            });
        };
        let value = rest.strip_prefix(' ').unwrap_or(rest);
        let step = match keyword.trim() {
            "interim" => ScriptStep::Interim(value.to_string()),
            "final" => ScriptStep::Final(value.to_string()),
            "pause" => {
                let millis = value.trim().parse::<u64>().map_err(|err| SpeechError::ScriptSyntax {
                    line,
                    message: err.to_string(),
                })?;
                ScriptStep::Pause(Duration::from_millis(millis))
            }
            "error" => ScriptStep::Error(RecognitionErrorKind::from_code(value.trim())),
            other => {
                return Err(SpeechError::ScriptSyntax {
                    line,
                    message: format!("unknown keyword `{other}`"),
                })
            }
        };
        steps.push(step);
    }
    Ok(steps)
}

/// Replays a script file as if it were live speech.
///
/// Each transcript step is followed by `step_delay`. An `error` step ends the
/// session the way a real recognizer failure would; an error before the first
/// transcript is reported before `Started`, like a refused microphone. Once
/// stopped, the replay emits nothing further.
pub struct ScriptedRecognizer {
    path: PathBuf,
    step_delay: Duration,
    stop_flag: Option<Arc<AtomicBool>>,
}

impl ScriptedRecognizer {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            step_delay: Duration::from_millis(300),
            stop_flag: None,
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(
        &mut self,
        session: SessionId,
        sink: Arc<dyn RecognitionSink>,
    ) -> Result<(), SpeechError> {
        self.stop();
        let source = fs::read_to_string(&self.path).map_err(|source| SpeechError::ScriptRead {
            path: self.path.clone(),
            source,
        })?;
        let steps = parse_script(&source)?;
        docqa_info!(
            "Replaying {} recognition step(s) from {:?} as session {}",
            steps.len(),
            self.path,
            session
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        self.stop_flag = Some(stop_flag.clone());
        let step_delay = self.step_delay;
        thread::spawn(move || {
            let out = Replay {
                session,
                stop_flag: &stop_flag,
                sink: sink.as_ref(),
            };
            replay(steps, step_delay, &out);
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(flag) = self.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

struct Replay<'a> {
    session: SessionId,
    stop_flag: &'a AtomicBool,
    sink: &'a dyn RecognitionSink,
}

impl Replay<'_> {
    fn stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    /// Emits unless the session was stopped; returns false once stopped.
    fn emit(&self, event: RecognitionEvent) -> bool {
        if self.stopped() {
            return false;
        }
        self.sink.emit(self.session, event);
        true
    }
}

fn replay(steps: Vec<ScriptStep>, step_delay: Duration, out: &Replay<'_>) {
    let mut started = false;
    for step in steps {
        let delivered = match step {
            ScriptStep::Error(kind) => {
                out.emit(RecognitionEvent::Error(kind));
                return;
            }
            ScriptStep::Pause(duration) => {
                thread::sleep(duration);
                true
            }
            ScriptStep::Interim(text) | ScriptStep::Final(text) if text.is_empty() => true,
            ScriptStep::Interim(text) => transcript(out, &mut started, text, false, step_delay),
            ScriptStep::Final(text) => transcript(out, &mut started, text, true, step_delay),
        };
        if !delivered || out.stopped() {
            docqa_debug!("Recognition session {} stopped", out.session);
            return;
        }
    }
    docqa_debug!("Recognition script finished");
    if ensure_started(out, &mut started) {
        out.emit(RecognitionEvent::Ended);
    }
}

fn transcript(
    out: &Replay<'_>,
    started: &mut bool,
    text: String,
    is_final: bool,
    step_delay: Duration,
) -> bool {
    if !ensure_started(out, started) || !out.emit(RecognitionEvent::Transcript { text, is_final }) {
        return false;
    }
    thread::sleep(step_delay);
    true
}

fn ensure_started(out: &Replay<'_>, started: &mut bool) -> bool {
    if *started {
        return !out.stopped();
    }
    *started = out.emit(RecognitionEvent::Started);
    *started
}
