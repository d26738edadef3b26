use docqa_logging::{docqa_debug, docqa_info, docqa_warn};

use crate::{AppState, Effect, Msg, StopReason, VoiceErrorKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::PagesRestored { pages, now } => {
            let created = state.restore_pages(pages, now);
            state.mark_dirty();
            if created {
                vec![Effect::PersistPages]
            } else {
                Vec::new()
            }
        }
        Msg::NewPageClicked { now } => {
            state.chat_mut().create_page(now);
            state.clear_composer();
            state.mark_dirty();
            vec![Effect::PersistPages]
        }
        Msg::PageSelected { page_id } => {
            if state.chat_mut().select_page(&page_id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::PageDeleted { page_id, now } => {
            if state.chat_mut().delete_page(&page_id, now) {
                state.mark_dirty();
                vec![Effect::PersistPages]
            } else {
                Vec::new()
            }
        }
        Msg::PageRenamed { page_id, title } => {
            if state.chat_mut().rename_title(&page_id, &title) {
                state.mark_dirty();
                vec![Effect::PersistPages]
            } else {
                Vec::new()
            }
        }
        Msg::ComposerChanged(text) => {
            if state.set_composer(text) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SendClicked { now } => match state.begin_send(now) {
            Some((page_id, query)) => {
                state.mark_dirty();
                let mut effects = vec![Effect::PersistPages];
                // Dictation would otherwise keep refilling the cleared composer.
                if state.voice_mut().stop(StopReason::Manual) {
                    effects.push(Effect::StopRecognizer);
                }
                effects.push(Effect::SendQuery { page_id, query });
                effects
            }
            None => Vec::new(),
        },
        Msg::QueryAnswered {
            page_id,
            now,
            outcome,
        } => {
            let appended = state.finish_send(&page_id, now, outcome);
            state.mark_dirty();
            if appended {
                vec![Effect::PersistPages]
            } else {
                Vec::new()
            }
        }
        Msg::ContextToggled { message_id } => {
            if state.toggle_context(&message_id) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FilesStaged(files) => {
            if !files.is_empty() {
                let rejected = state.upload_mut().stage(files);
                if rejected > 0 {
                    docqa_info!("Rejected {} file(s) with unsupported extensions", rejected);
                }
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::FileUnstaged { index } => {
            if state.upload_mut().unstage(index) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StagedCleared => {
            state.upload_mut().clear_all();
            state.mark_dirty();
            Vec::new()
        }
        Msg::UploadClicked => {
            let files = state.upload_mut().begin_upload();
            state.mark_dirty();
            match files {
                Some(files) => vec![Effect::Upload { files }],
                None => Vec::new(),
            }
        }
        Msg::UploadFinished { now, outcome } => {
            state.upload_mut().finish_upload(now, outcome);
            state.mark_dirty();
            Vec::new()
        }
        Msg::HealthCheckClicked => vec![Effect::CheckHealth],
        Msg::HealthChecked(outcome) => {
            state.upload_mut().apply_health(outcome);
            state.mark_dirty();
            Vec::new()
        }
        Msg::VoiceToggled => {
            state.mark_dirty();
            if state.voice_mut().stop(StopReason::Manual) {
                vec![Effect::StopRecognizer]
            } else if let Some(session) = state.voice_mut().request_start() {
                vec![Effect::StartRecognizer { session }]
            } else {
                Vec::new()
            }
        }
        Msg::VoiceStarted { session, now } => {
            if state.voice_mut().on_started(session, now) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::VoiceTranscript {
            session,
            now,
            text,
            is_final,
        } => {
            if let Some(composer) = state
                .voice_mut()
                .on_transcript(session, now, &text, is_final)
            {
                state.set_composer(composer);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::VoiceError { session, kind } => {
            if !state.voice_mut().is_current(session) {
                docqa_debug!("Dropping voice error from session {}: {}", session, kind);
                return (state, Vec::new());
            }
            match kind.alert_text() {
                Some(text) => {
                    docqa_warn!("Voice capture failed: {}", kind);
                    state.set_alert(text);
                }
                None if matches!(kind, VoiceErrorKind::Other(_)) => {
                    docqa_warn!("Voice capture error: {}", kind);
                }
                None => docqa_debug!("Voice capture ended: {}", kind),
            }
            state.voice_mut().end_session(session, StopReason::Error);
            state.mark_dirty();
            Vec::new()
        }
        Msg::VoiceEnded { session } => {
            if state.voice_mut().end_session(session, StopReason::Ended) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::AlertDismissed => {
            if state.take_alert() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick { now } => {
            if state.upload_mut().on_tick(now) {
                state.mark_dirty();
            }
            match state.voice_mut().on_tick(now) {
                Some(reason) => {
                    docqa_info!("Voice capture timed out: {:?}", reason);
                    state.mark_dirty();
                    vec![Effect::StopRecognizer]
                }
                None => Vec::new(),
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
