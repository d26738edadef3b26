use std::io;
use std::sync::{mpsc, Arc};
use std::thread;

use docqa_logging::{docqa_debug, docqa_warn};

use crate::{ClientEvent, DocQaApi, UploadFile};

/// Receives completions from the worker thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ClientEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<ClientEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<ClientEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ClientEvent) {
        let _ = self.tx.send(event);
    }
}

enum ClientCommand {
    Ingest { files: Vec<UploadFile> },
    Health,
    Query { page_id: String, query: String },
}

/// Runs backend calls on a dedicated tokio runtime.
///
/// Commands are fire-and-forget; every command produces exactly one event on
/// the sink. Calls run concurrently and are never cancelled.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub fn new(api: Arc<dyn DocQaApi>, sink: Arc<dyn EventSink>) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                let api = api.clone();
                let sink = sink.clone();
                runtime.spawn(async move {
                    handle_command(api.as_ref(), command, sink.as_ref()).await;
                });
            }
            docqa_debug!("Client worker shutting down");
        });

        Ok(Self { cmd_tx })
    }

    pub fn ingest(&self, files: Vec<UploadFile>) {
        self.send(ClientCommand::Ingest { files });
    }

    pub fn health(&self) {
        self.send(ClientCommand::Health);
    }

    pub fn query(&self, page_id: impl Into<String>, query: impl Into<String>) {
        self.send(ClientCommand::Query {
            page_id: page_id.into(),
            query: query.into(),
        });
    }

    fn send(&self, command: ClientCommand) {
        if self.cmd_tx.send(command).is_err() {
            docqa_warn!("Client worker is gone; command dropped");
        }
    }
}

async fn handle_command(api: &dyn DocQaApi, command: ClientCommand, sink: &dyn EventSink) {
    let event = match command {
        ClientCommand::Ingest { files } => ClientEvent::IngestCompleted(api.ingest(&files).await),
        ClientCommand::Health => ClientEvent::HealthChecked(api.health().await),
        ClientCommand::Query { page_id, query } => ClientEvent::QueryCompleted {
            page_id,
            result: api.query(&query).await,
        },
    };
    sink.emit(event);
}
