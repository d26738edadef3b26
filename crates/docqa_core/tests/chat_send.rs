use std::sync::Once;

use docqa_core::{
    update, AppState, Effect, MessageKind, Msg, QueryOutcome, DEFAULT_TITLE, QUERY_FAILED_TEXT,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(docqa_logging::initialize_for_tests);
}

fn fresh() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::PagesRestored {
            pages: Vec::new(),
            now: 1_000,
        },
    );
    state
}

fn send(state: AppState, text: &str, now: u64) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::ComposerChanged(text.to_string()));
    update(state, Msg::SendClicked { now })
}

fn answered(answer: &str, context: Option<&str>) -> QueryOutcome {
    QueryOutcome::Answered {
        answer: answer.to_string(),
        context: context.map(str::to_string),
    }
}

#[test]
fn send_appends_user_message_before_any_response() {
    init_logging();
    let (state, effects) = send(fresh(), "What is in the report?", 2_000);
    let view = state.view();

    assert_eq!(
        effects,
        vec![
            Effect::PersistPages,
            Effect::SendQuery {
                page_id: "1000".into(),
                query: "What is in the report?".into(),
            },
        ]
    );
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].kind, MessageKind::User);
    assert_eq!(view.messages[0].content, "What is in the report?");
    assert!(view.sending);
    assert_eq!(view.composer, "");
}

#[test]
fn answer_appends_one_assistant_message_and_persists() {
    init_logging();
    let (state, _) = send(fresh(), "question", 2_000);
    let (state, effects) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: answered("the answer", Some("page 4 says so")),
        },
    );
    let view = state.view();

    assert_eq!(effects, vec![Effect::PersistPages]);
    assert!(!view.sending);
    let kinds: Vec<_> = view.messages.iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![MessageKind::User, MessageKind::Assistant]);
    assert_eq!(view.messages[1].content, "the answer");
    assert_eq!(view.messages[1].context.as_deref(), Some("page 4 says so"));
    assert!(!view.messages[1].context_expanded);
}

#[test]
fn failure_appends_fixed_error_message() {
    init_logging();
    let (state, _) = send(fresh(), "question", 2_000);
    let (state, _) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: QueryOutcome::Failed,
        },
    );
    let view = state.view();

    assert!(!view.sending);
    assert_eq!(view.messages.len(), 2);
    assert_eq!(view.messages[1].kind, MessageKind::Error);
    assert_eq!(view.messages[1].content, QUERY_FAILED_TEXT);
}

#[test]
fn blank_composer_and_in_flight_sends_are_ignored() {
    init_logging();
    let mut state = fresh();
    state.consume_dirty();

    let (mut state, effects) = send(state, "   \n\t", 2_000);
    assert!(effects.is_empty());
    assert!(state.view().messages.is_empty());
    state.consume_dirty();

    let (state, _) = send(state, "first", 2_100);
    let (state, effects) = send(state, "second", 2_200);
    assert!(effects.is_empty());
    assert_eq!(state.view().messages.len(), 1);
    // The ignored text stays in the composer for a later send.
    assert_eq!(state.view().composer, "second");
}

#[test]
fn first_send_titles_page_from_raw_text() {
    init_logging();
    let raw = "  Tell me everything about the quarterly revenue figures for 2023 please";
    let (state, _) = send(fresh(), raw, 2_000);
    let expected: String = raw.chars().take(50).collect();
    assert_eq!(state.view().current_title, expected);
    assert_eq!(state.view().messages[0].content, raw);

    let (state, _) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: answered("ok", None),
        },
    );
    let (state, _) = send(state, "follow-up", 4_000);
    assert_eq!(state.view().current_title, expected);
}

#[test]
fn title_stays_default_until_first_send() {
    init_logging();
    let state = fresh();
    assert_eq!(state.view().current_title, DEFAULT_TITLE);
}

#[test]
fn answer_lands_on_origin_page_after_user_switches() {
    init_logging();
    let (state, _) = send(fresh(), "asked on first page", 2_000);
    let (state, _) = update(state, Msg::NewPageClicked { now: 2_500 });
    assert_eq!(state.view().current_page_id.as_deref(), Some("2500"));

    let (state, effects) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: answered("late answer", None),
        },
    );

    assert_eq!(effects, vec![Effect::PersistPages]);
    let view = state.view();
    assert_eq!(view.current_page_id.as_deref(), Some("2500"));
    assert!(view.messages.is_empty());
    let origin = state.chat().page("1000").expect("origin page");
    assert_eq!(origin.messages.len(), 2);
    assert_eq!(origin.messages[1].content, "late answer");
}

#[test]
fn answer_for_deleted_page_is_dropped_and_releases_send() {
    init_logging();
    let (state, _) = send(fresh(), "question", 2_000);
    let (state, _) = update(state, Msg::NewPageClicked { now: 2_500 });
    let (state, _) = update(
        state,
        Msg::PageDeleted {
            page_id: "1000".into(),
            now: 2_600,
        },
    );

    let (state, effects) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: answered("nobody is listening", None),
        },
    );

    assert!(effects.is_empty());
    assert!(!state.view().sending);
    assert_eq!(state.view().pages.len(), 1);
    assert!(state.view().messages.is_empty());
}

#[test]
fn message_ids_stay_unique_within_a_page() {
    init_logging();
    let (state, _) = send(fresh(), "q", 2_000);
    let (state, _) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 2_000,
            outcome: answered("a", None),
        },
    );
    let ids: Vec<_> = state
        .view()
        .messages
        .iter()
        .map(|m| m.message_id.clone())
        .collect();
    assert_eq!(ids, vec!["2000".to_string(), "2001".to_string()]);
}

#[test]
fn context_toggle_only_applies_to_messages_with_context() {
    init_logging();
    let (state, _) = send(fresh(), "q", 2_000);
    let (state, _) = update(
        state,
        Msg::QueryAnswered {
            page_id: "1000".into(),
            now: 3_000,
            outcome: answered("a", Some("ctx")),
        },
    );

    let (state, _) = update(state, Msg::ContextToggled { message_id: "3000".into() });
    assert!(state.view().messages[1].context_expanded);
    let (state, _) = update(state, Msg::ContextToggled { message_id: "3000".into() });
    assert!(!state.view().messages[1].context_expanded);

    let (mut state, _) = update(state, Msg::ContextToggled { message_id: "2000".into() });
    state.consume_dirty();
    let (mut state, _) = update(state, Msg::ContextToggled { message_id: "2000".into() });
    assert!(!state.consume_dirty());
}
