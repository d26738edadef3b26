use std::fs;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use docqa_client::{
    RecognitionErrorKind, RecognitionEvent, RecognitionSink, ScriptedRecognizer, SessionId,
    SpeechError, SpeechRecognizer, UnsupportedRecognizer,
};
use tempfile::TempDir;

type Tagged = (SessionId, RecognitionEvent);

struct TestSink {
    tx: Mutex<mpsc::Sender<Tagged>>,
}

impl RecognitionSink for TestSink {
    fn emit(&self, session: SessionId, event: RecognitionEvent) {
        let _ = self.tx.lock().unwrap().send((session, event));
    }
}

fn sink() -> (Arc<TestSink>, mpsc::Receiver<Tagged>) {
    let (tx, rx) = mpsc::channel();
    (Arc::new(TestSink { tx: Mutex::new(tx) }), rx)
}

fn script(temp: &TempDir, body: &str) -> PathBuf {
    let path = temp.path().join("speech.txt");
    fs::write(&path, body).unwrap();
    path
}

/// Collects events up to and including the end of `session`.
fn collect_until_done(rx: &mpsc::Receiver<Tagged>, session: SessionId) -> Vec<Tagged> {
    let mut events = Vec::new();
    while let Ok((from, event)) = rx.recv_timeout(Duration::from_secs(5)) {
        let done = from == session
            && matches!(event, RecognitionEvent::Ended | RecognitionEvent::Error(_));
        events.push((from, event));
        if done {
            break;
        }
    }
    events
}

fn events_of(tagged: Vec<Tagged>) -> Vec<RecognitionEvent> {
    tagged.into_iter().map(|(_, event)| event).collect()
}

#[test]
fn unsupported_recognizer_refuses_to_start() {
    let (sink, _rx) = sink();
    let err = UnsupportedRecognizer.start(1, sink).unwrap_err();
    assert!(matches!(err, SpeechError::Unsupported));
}

#[test]
fn scripted_recognizer_replays_in_order() {
    let temp = TempDir::new().unwrap();
    let path = script(&temp, "interim: how\nfinal: how many pages\n");
    let mut recognizer = ScriptedRecognizer::new(path).with_step_delay(Duration::from_millis(1));
    let (sink, rx) = sink();

    recognizer.start(7, sink).unwrap();
    let events = collect_until_done(&rx, 7);

    assert!(events.iter().all(|(session, _)| *session == 7));
    assert_eq!(
        events_of(events),
        vec![
            RecognitionEvent::Started,
            RecognitionEvent::Transcript {
                text: "how".into(),
                is_final: false,
            },
            RecognitionEvent::Transcript {
                text: "how many pages".into(),
                is_final: true,
            },
            RecognitionEvent::Ended,
        ]
    );
}

#[test]
fn leading_error_is_reported_before_start() {
    let temp = TempDir::new().unwrap();
    let path = script(&temp, "error: not-allowed\nfinal: never heard\n");
    let mut recognizer = ScriptedRecognizer::new(path);
    let (sink, rx) = sink();

    recognizer.start(1, sink).unwrap();
    let events = collect_until_done(&rx, 1);

    assert_eq!(
        events,
        vec![(1, RecognitionEvent::Error(RecognitionErrorKind::NotAllowed))]
    );
}

#[test]
fn stopped_session_goes_quiet_while_the_next_one_runs() {
    let temp = TempDir::new().unwrap();
    let path = script(&temp, "final: one\nfinal: two\nfinal: three\n");
    let mut recognizer =
        ScriptedRecognizer::new(path).with_step_delay(Duration::from_millis(200));
    let (sink, rx) = sink();

    recognizer.start(1, sink.clone()).unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        (1, RecognitionEvent::Started)
    );
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        (
            1,
            RecognitionEvent::Transcript {
                text: "one".into(),
                is_final: true,
            }
        )
    );
    recognizer.stop();
    recognizer.start(2, sink).unwrap();

    let mut after_stop = collect_until_done(&rx, 2);
    // Give the first replay time to wake from its step delay.
    std::thread::sleep(Duration::from_millis(400));
    after_stop.extend(rx.try_iter());

    assert!(
        after_stop.iter().all(|(session, _)| *session == 2),
        "stopped session still emitted: {after_stop:?}"
    );
    let events = events_of(after_stop);
    assert_eq!(events.first(), Some(&RecognitionEvent::Started));
    assert_eq!(events.last(), Some(&RecognitionEvent::Ended));
    assert_eq!(events.len(), 5);
}

#[test]
fn missing_script_fails_to_start() {
    let mut recognizer = ScriptedRecognizer::new(PathBuf::from("/no/such/script.txt"));
    let (sink, _rx) = sink();
    let err = recognizer.start(1, sink).unwrap_err();
    assert!(matches!(err, SpeechError::ScriptRead { .. }));
}
