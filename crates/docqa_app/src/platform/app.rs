use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use docqa_client::{
    ensure_data_dir, ClientHandle, EventSink, ReqwestApi, ScriptedRecognizer, SpeechRecognizer,
    UnsupportedRecognizer,
};
use docqa_core::{update, AppState, Effect, Msg};
use docqa_logging::{docqa_debug, docqa_info};

use super::cli::{Args, LogTarget};
use super::clock::now_millis;
use super::commands::{self, Action};
use super::config::AppConfig;
use super::effects::{EffectRunner, MsgSink};
use super::input::{self, Console};
use super::logging::{self, LogDestination};
use super::persistence::load_pages;
use super::ui;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Everything the main loop reacts to, in arrival order.
#[derive(Debug, PartialEq)]
pub enum LoopEvent {
    Msg(Msg),
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    InputClosed,
}

pub fn run_app(args: Args) -> anyhow::Result<()> {
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    if let Some(url) = args.api_url {
        config.api_base_url = url;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    logging::initialize(log_destination(args.log), &config.data_dir);
    docqa_info!(
        "Starting docqa backend={} data_dir={:?}",
        config.api_base_url,
        config.data_dir
    );
    ensure_data_dir(&config.data_dir)
        .with_context(|| format!("preparing data directory {}", config.data_dir.display()))?;

    let (loop_tx, loop_rx) = mpsc::channel::<LoopEvent>();
    let sink = Arc::new(MsgSink::new(loop_tx.clone()));

    let api = ReqwestApi::new(config.client_settings()).context("configuring backend client")?;
    let event_sink: Arc<dyn EventSink> = sink.clone();
    let client = ClientHandle::new(Arc::new(api), event_sink).context("starting backend worker")?;

    let recognizer: Box<dyn SpeechRecognizer> = match &config.voice.script {
        Some(script) => {
            docqa_info!("Voice input replays {:?}", script);
            Box::new(ScriptedRecognizer::new(script.clone()))
        }
        None => Box::new(UnsupportedRecognizer),
    };

    let (console, line_input) = input::spawn_line_reader(loop_tx.clone())?;
    let mut shell = Shell {
        state: AppState::with_voice_settings(config.voice_settings()),
        effects: EffectRunner::new(client, recognizer, sink, config.data_dir.clone()),
        renderer: ui::render::Renderer::new(),
        console,
    };

    shell.print(&ui::layout::banner_lines(&config.api_base_url))?;
    shell.dispatch(Msg::PagesRestored {
        pages: load_pages(&config.data_dir),
        now: now_millis(),
    });
    shell.flush_view()?;

    spawn_ticker(loop_tx);

    while let Ok(event) = loop_rx.recv() {
        match event {
            LoopEvent::Msg(msg) => shell.dispatch(msg),
            LoopEvent::Line(line) => {
                if !shell.handle_line(&line)? {
                    break;
                }
                shell.flush_view()?;
                line_input.resume();
                continue;
            }
            LoopEvent::Interrupted => {
                shell.print(&["Type /quit or press Ctrl-D to exit.".to_string()])?;
                line_input.resume();
            }
            LoopEvent::InputClosed => {
                docqa_debug!("Input closed");
                break;
            }
        }
        shell.flush_view()?;
    }

    drop(line_input);
    // Releases the microphone if a capture is still running.
    shell.effects.run(vec![Effect::StopRecognizer], &shell.state);
    docqa_info!("docqa exiting");
    Ok(())
}

fn log_destination(target: LogTarget) -> LogDestination {
    match target {
        LogTarget::File => LogDestination::File,
        LogTarget::Terminal => LogDestination::Terminal,
        LogTarget::Both => LogDestination::Both,
    }
}

struct Shell {
    state: AppState,
    effects: EffectRunner,
    renderer: ui::render::Renderer,
    console: Console,
}

impl Shell {
    fn dispatch(&mut self, msg: Msg) {
        let (state, effects) = update(std::mem::take(&mut self.state), msg);
        self.state = state;
        self.effects.run(effects, &self.state);
    }

    /// Returns false when the user asked to quit.
    fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        let command = match commands::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(true),
            Err(err) => {
                self.print(&[err.to_string()])?;
                return Ok(true);
            }
        };
        match commands::resolve(command, &self.state.view(), now_millis()) {
            Ok(Action::Dispatch(msgs)) => {
                for msg in msgs {
                    self.dispatch(msg);
                }
            }
            Ok(Action::Show(lines)) => self.print(&lines)?,
            Ok(Action::DispatchAndShow(msgs, notes)) => {
                for msg in msgs {
                    self.dispatch(msg);
                }
                self.print(&notes)?;
            }
            Ok(Action::Quit) => return Ok(false),
            Err(err) => self.print(&[err.to_string()])?,
        }
        Ok(true)
    }

    fn flush_view(&mut self) -> anyhow::Result<()> {
        if !self.state.consume_dirty() {
            return Ok(());
        }
        let view = self.state.view();
        let lines = self.renderer.render(&view);
        self.print(&lines)?;
        if view.alert.is_some() {
            // Printed once; the console has no modal to keep open.
            self.dispatch(Msg::AlertDismissed);
            self.state.consume_dirty();
            self.renderer.render(&self.state.view());
        }
        Ok(())
    }

    fn print(&mut self, lines: &[String]) -> anyhow::Result<()> {
        self.console.print(lines)
    }
}

fn spawn_ticker(tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || loop {
        thread::sleep(TICK_INTERVAL);
        if tx
            .send(LoopEvent::Msg(Msg::Tick { now: now_millis() }))
            .is_err()
        {
            break;
        }
    });
}
