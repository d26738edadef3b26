//! Speech capture state machine.
//!
//! The recognizer itself lives outside the core; this type only tracks the
//! lifecycle (`Idle -> Starting -> Listening -> Idle`), the transcript built
//! from recognizer results, and the two stop deadlines:
//! - max duration, armed when listening starts,
//! - silence, re-armed by every result.
//!
//! Deadlines are plain timestamps checked on tick. Every path back to `Idle`
//! clears both, so a tick after a session ended has nothing to act on.
//!
//! Each start request opens a new session id. Recognizer events carry the id
//! of the session they belong to; events from any other session are dropped.

use std::fmt;

use docqa_logging::docqa_debug;

use crate::EpochMillis;

/// Generation number of a capture session.
pub type VoiceSessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSettings {
    pub max_duration_ms: EpochMillis,
    pub silence_timeout_ms: EpochMillis,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            max_duration_ms: 15_000,
            silence_timeout_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    /// Microphone requested, recognizer not confirmed yet.
    Starting,
    Listening,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Starting => write!(f, "Starting"),
            VoiceState::Listening => write!(f, "Listening"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceErrorKind {
    PermissionDenied,
    /// No recognizer is available on this system.
    Unsupported,
    NoSpeech,
    Aborted,
    Other(String),
}

impl VoiceErrorKind {
    /// Text for a blocking alert, for errors the user has to fix outside the app.
    pub fn alert_text(&self) -> Option<&'static str> {
        match self {
            VoiceErrorKind::PermissionDenied => Some(
                "Microphone access was denied. Allow microphone access and try again.",
            ),
            VoiceErrorKind::Unsupported => {
                Some("Speech recognition is not supported on this system.")
            }
            VoiceErrorKind::NoSpeech | VoiceErrorKind::Aborted | VoiceErrorKind::Other(_) => None,
        }
    }
}

impl fmt::Display for VoiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceErrorKind::PermissionDenied => write!(f, "permission denied"),
            VoiceErrorKind::Unsupported => write!(f, "unsupported"),
            VoiceErrorKind::NoSpeech => write!(f, "no speech"),
            VoiceErrorKind::Aborted => write!(f, "aborted"),
            VoiceErrorKind::Other(detail) => write!(f, "{detail}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Manual,
    MaxDuration,
    Silence,
    Ended,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoiceCapture {
    settings: VoiceSettings,
    state: VoiceState,
    session: VoiceSessionId,
    final_text: String,
    interim_text: String,
    max_deadline: Option<EpochMillis>,
    silence_deadline: Option<EpochMillis>,
}

impl VoiceCapture {
    pub fn new(settings: VoiceSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != VoiceState::Idle
    }

    pub fn timers_armed(&self) -> bool {
        self.max_deadline.is_some() || self.silence_deadline.is_some()
    }

    /// Finalized segments followed by the current interim segment.
    pub fn transcript(&self) -> String {
        format!("{}{}", self.final_text, self.interim_text)
    }

    /// True if `session` is the session currently starting or listening.
    pub fn is_current(&self, session: VoiceSessionId) -> bool {
        self.is_active() && session == self.session
    }

    /// `Idle -> Starting` under a fresh session id. Returns `None` if a
    /// session is already active.
    pub fn request_start(&mut self) -> Option<VoiceSessionId> {
        if self.is_active() {
            return None;
        }
        self.session += 1;
        self.final_text.clear();
        self.interim_text.clear();
        self.transition(VoiceState::Starting);
        Some(self.session)
    }

    /// `Starting -> Listening`, arming the max-duration deadline.
    pub fn on_started(&mut self, session: VoiceSessionId, now: EpochMillis) -> bool {
        if self.state != VoiceState::Starting || session != self.session {
            return false;
        }
        self.max_deadline = Some(now + self.settings.max_duration_ms);
        self.transition(VoiceState::Listening);
        true
    }

    /// Folds a recognizer result into the transcript and returns the new
    /// composer text. Results outside `Listening` or from another session
    /// are ignored.
    pub fn on_transcript(
        &mut self,
        session: VoiceSessionId,
        now: EpochMillis,
        text: &str,
        is_final: bool,
    ) -> Option<String> {
        if self.state != VoiceState::Listening || session != self.session {
            return None;
        }
        if is_final {
            self.final_text.push_str(text);
            self.interim_text.clear();
        } else {
            self.interim_text = text.to_string();
        }
        self.silence_deadline = Some(now + self.settings.silence_timeout_ms);
        Some(self.transcript())
    }

    /// Returns the reason to stop if a deadline has been reached.
    pub fn on_tick(&mut self, now: EpochMillis) -> Option<StopReason> {
        if self.state != VoiceState::Listening {
            return None;
        }
        let reason = if self.max_deadline.is_some_and(|deadline| now >= deadline) {
            StopReason::MaxDuration
        } else if self.silence_deadline.is_some_and(|deadline| now >= deadline) {
            StopReason::Silence
        } else {
            return None;
        };
        self.stop(reason);
        Some(reason)
    }

    /// Ends `session` if it is the current one; see [`VoiceCapture::stop`].
    pub fn end_session(&mut self, session: VoiceSessionId, reason: StopReason) -> bool {
        if !self.is_current(session) {
            docqa_debug!(
                "Ignoring {:?} from session {} (current {})",
                reason,
                session,
                self.session
            );
            return false;
        }
        self.stop(reason)
    }

    /// Back to `Idle` with both deadlines cleared. Returns false if already idle.
    pub fn stop(&mut self, reason: StopReason) -> bool {
        self.max_deadline = None;
        self.silence_deadline = None;
        if !self.is_active() {
            return false;
        }
        docqa_debug!("Voice capture stopping: {:?}", reason);
        self.transition(VoiceState::Idle);
        true
    }

    fn transition(&mut self, target: VoiceState) {
        docqa_debug!("Voice state: {} -> {}", self.state, target);
        self.state = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listening_at(now: EpochMillis) -> (VoiceCapture, VoiceSessionId) {
        let mut voice = VoiceCapture::new(VoiceSettings::default());
        let session = voice.request_start().unwrap();
        assert!(voice.on_started(session, now));
        (voice, session)
    }

    #[test]
    fn interim_segment_is_replaced_and_finals_accumulate() {
        let (mut voice, s) = listening_at(0);
        assert_eq!(voice.on_transcript(s, 10, "hel", false).as_deref(), Some("hel"));
        assert_eq!(voice.on_transcript(s, 20, "hello ", true).as_deref(), Some("hello "));
        assert_eq!(voice.on_transcript(s, 30, "wor", false).as_deref(), Some("hello wor"));
        assert_eq!(voice.on_transcript(s, 40, "world", true).as_deref(), Some("hello world"));
    }

    #[test]
    fn silence_deadline_is_reset_by_each_result() {
        let (mut voice, s) = listening_at(0);
        voice.on_transcript(s, 1_000, "a", false);
        assert_eq!(voice.on_tick(2_500), None);
        voice.on_transcript(s, 2_500, "ab", false);
        assert_eq!(voice.on_tick(4_000), None);
        assert_eq!(voice.on_tick(4_500), Some(StopReason::Silence));
        assert!(!voice.timers_armed());
    }

    #[test]
    fn results_before_start_confirmation_are_ignored() {
        let mut voice = VoiceCapture::new(VoiceSettings::default());
        let session = voice.request_start().unwrap();
        assert_eq!(voice.on_transcript(session, 5, "early", true), None);
        assert_eq!(voice.transcript(), "");
    }

    #[test]
    fn each_start_opens_a_new_session() {
        let (mut voice, first) = listening_at(0);
        assert!(voice.stop(StopReason::Manual));
        let second = voice.request_start().unwrap();

        assert_ne!(first, second);
        assert!(!voice.is_current(first));
        assert!(voice.is_current(second));
        assert!(!voice.on_started(first, 10));
        assert!(!voice.end_session(first, StopReason::Ended));
        assert_eq!(voice.state(), VoiceState::Starting);
    }

    #[test]
    fn only_blocking_errors_have_alert_text() {
        assert!(VoiceErrorKind::PermissionDenied.alert_text().is_some());
        assert!(VoiceErrorKind::Unsupported.alert_text().is_some());
        assert!(VoiceErrorKind::NoSpeech.alert_text().is_none());
        assert!(VoiceErrorKind::Aborted.alert_text().is_none());
        assert!(VoiceErrorKind::Other("network".into()).alert_text().is_none());
    }
}
