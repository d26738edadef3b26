use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use docqa_client::{
    ClientEvent, ClientHandle, EventSink, RecognitionErrorKind, RecognitionEvent,
    RecognitionSink, SessionId, SpeechError, SpeechRecognizer, UploadFile,
};
use docqa_core::{
    AppState, Effect, EpochMillis, HealthOutcome, HealthReport, Msg, QueryOutcome, UploadOutcome,
    VoiceErrorKind,
};
use docqa_logging::{docqa_info, docqa_warn};

use super::app::LoopEvent;
use super::clock::now_millis;
use super::persistence::save_pages;

/// Executes core effects against the backend client, the recognizer and disk.
pub struct EffectRunner {
    client: ClientHandle,
    recognizer: Box<dyn SpeechRecognizer>,
    sink: Arc<MsgSink>,
    data_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        client: ClientHandle,
        recognizer: Box<dyn SpeechRecognizer>,
        sink: Arc<MsgSink>,
        data_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            recognizer,
            sink,
            data_dir,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>, state: &AppState) {
        for effect in effects {
            match effect {
                Effect::PersistPages => save_pages(&self.data_dir, &state.pages_snapshot()),
                Effect::SendQuery { page_id, query } => {
                    docqa_info!("SendQuery page_id={} query_len={}", page_id, query.len());
                    self.client.query(page_id, query);
                }
                Effect::Upload { files } => {
                    docqa_info!("Upload files={}", files.len());
                    let files = files
                        .into_iter()
                        .map(|file| UploadFile {
                            name: file.name,
                            path: file.path,
                        })
                        .collect();
                    self.client.ingest(files);
                }
                Effect::CheckHealth => self.client.health(),
                Effect::StartRecognizer { session } => {
                    let sink: Arc<dyn RecognitionSink> = self.sink.clone();
                    if let Err(err) = self.recognizer.start(session, sink) {
                        docqa_warn!("Speech recognizer failed to start: {}", err);
                        self.sink.send(Msg::VoiceError {
                            session,
                            kind: map_start_error(&err),
                        });
                    }
                }
                Effect::StopRecognizer => self.recognizer.stop(),
            }
        }
    }
}

/// Feeds client and recognizer completions back into the app loop as messages.
pub struct MsgSink {
    tx: mpsc::Sender<LoopEvent>,
}

impl MsgSink {
    pub fn new(tx: mpsc::Sender<LoopEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, msg: Msg) {
        let _ = self.tx.send(LoopEvent::Msg(msg));
    }
}

impl EventSink for MsgSink {
    fn emit(&self, event: ClientEvent) {
        self.send(map_client_event(event, now_millis()));
    }
}

impl RecognitionSink for MsgSink {
    fn emit(&self, session: SessionId, event: RecognitionEvent) {
        self.send(map_recognition_event(session, event, now_millis()));
    }
}

pub fn map_client_event(event: ClientEvent, now: EpochMillis) -> Msg {
    match event {
        ClientEvent::IngestCompleted(result) => Msg::UploadFinished {
            now,
            outcome: match result {
                Ok(response) => UploadOutcome::Accepted {
                    message: response.message,
                },
                Err(err) => {
                    docqa_warn!("Upload failed: {}", err);
                    UploadOutcome::Failed
                }
            },
        },
        ClientEvent::HealthChecked(result) => Msg::HealthChecked(match result {
            Ok(health) => HealthOutcome::Reachable(HealthReport {
                status: health.status,
                models_initialized: health.models_initialized,
                vectorstore_loaded: health.vectorstore_loaded,
            }),
            Err(err) => {
                docqa_warn!("Health check failed: {}", err);
                HealthOutcome::Unreachable
            }
        }),
        ClientEvent::QueryCompleted { page_id, result } => Msg::QueryAnswered {
            page_id,
            now,
            outcome: match result {
                Ok(response) => QueryOutcome::Answered {
                    answer: response.answer,
                    context: response.context,
                },
                Err(err) => {
                    docqa_warn!("Query failed: {}", err);
                    QueryOutcome::Failed
                }
            },
        },
    }
}

pub fn map_recognition_event(session: SessionId, event: RecognitionEvent, now: EpochMillis) -> Msg {
    match event {
        RecognitionEvent::Started => Msg::VoiceStarted { session, now },
        RecognitionEvent::Transcript { text, is_final } => Msg::VoiceTranscript {
            session,
            now,
            text,
            is_final,
        },
        RecognitionEvent::Error(kind) => Msg::VoiceError {
            session,
            kind: match kind {
                RecognitionErrorKind::NotAllowed => VoiceErrorKind::PermissionDenied,
                RecognitionErrorKind::NoSpeech => VoiceErrorKind::NoSpeech,
                RecognitionErrorKind::Aborted => VoiceErrorKind::Aborted,
                RecognitionErrorKind::Other(code) => VoiceErrorKind::Other(code),
            },
        },
        RecognitionEvent::Ended => Msg::VoiceEnded { session },
    }
}

fn map_start_error(err: &SpeechError) -> VoiceErrorKind {
    match err {
        SpeechError::Unsupported => VoiceErrorKind::Unsupported,
        other => VoiceErrorKind::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_client::{ApiError, FailureKind, HealthResponse, QueryResponse};
    use pretty_assertions::assert_eq;

    fn network_error() -> ApiError {
        ApiError {
            kind: FailureKind::Network,
            message: "connection refused".into(),
        }
    }

    #[test]
    fn query_results_keep_their_page() {
        let answered = map_client_event(
            ClientEvent::QueryCompleted {
                page_id: "42".into(),
                result: Ok(QueryResponse {
                    answer: "Yes.".into(),
                    context: Some("source".into()),
                }),
            },
            7,
        );
        assert_eq!(
            answered,
            Msg::QueryAnswered {
                page_id: "42".into(),
                now: 7,
                outcome: QueryOutcome::Answered {
                    answer: "Yes.".into(),
                    context: Some("source".into()),
                },
            }
        );

        let failed = map_client_event(
            ClientEvent::QueryCompleted {
                page_id: "42".into(),
                result: Err(network_error()),
            },
            8,
        );
        assert_eq!(
            failed,
            Msg::QueryAnswered {
                page_id: "42".into(),
                now: 8,
                outcome: QueryOutcome::Failed,
            }
        );
    }

    #[test]
    fn ingest_and_health_results_map_to_outcomes() {
        assert_eq!(
            map_client_event(ClientEvent::IngestCompleted(Err(network_error())), 3),
            Msg::UploadFinished {
                now: 3,
                outcome: UploadOutcome::Failed,
            }
        );
        assert_eq!(
            map_client_event(
                ClientEvent::HealthChecked(Ok(HealthResponse {
                    status: "healthy".into(),
                    models_initialized: true,
                    vectorstore_loaded: false,
                })),
                3,
            ),
            Msg::HealthChecked(HealthOutcome::Reachable(HealthReport {
                status: "healthy".into(),
                models_initialized: true,
                vectorstore_loaded: false,
            }))
        );
        assert_eq!(
            map_client_event(ClientEvent::HealthChecked(Err(network_error())), 3),
            Msg::HealthChecked(HealthOutcome::Unreachable)
        );
    }

    #[test]
    fn recognition_events_keep_their_session() {
        assert_eq!(
            map_recognition_event(3, RecognitionEvent::Started, 10),
            Msg::VoiceStarted {
                session: 3,
                now: 10
            }
        );
        assert_eq!(
            map_recognition_event(
                3,
                RecognitionEvent::Error(RecognitionErrorKind::NotAllowed),
                10
            ),
            Msg::VoiceError {
                session: 3,
                kind: VoiceErrorKind::PermissionDenied,
            }
        );
        assert_eq!(
            map_recognition_event(4, RecognitionEvent::Ended, 10),
            Msg::VoiceEnded { session: 4 }
        );
    }

    #[test]
    fn unsupported_recognizer_reports_unsupported() {
        assert_eq!(
            map_start_error(&SpeechError::Unsupported),
            VoiceErrorKind::Unsupported
        );
    }
}
