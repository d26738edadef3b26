use std::sync::Once;

use docqa_core::{
    update, AppState, ChatPage, Effect, Message, Msg, DEFAULT_TITLE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(docqa_logging::initialize_for_tests);
}

fn mounted(pages: Vec<ChatPage>, now: u64) -> (AppState, Vec<Effect>) {
    update(AppState::new(), Msg::PagesRestored { pages, now })
}

fn page_with(id: &str, created_at: u64, title: &str) -> ChatPage {
    ChatPage {
        id: id.to_string(),
        title: title.to_string(),
        messages: vec![Message::user(format!("{id}-m"), "hello", created_at)],
        created_at,
    }
}

#[test]
fn empty_storage_synthesizes_one_current_page() {
    init_logging();
    let (mut state, effects) = mounted(Vec::new(), 1_000);
    let view = state.view();

    assert_eq!(view.pages.len(), 1);
    assert_eq!(view.pages[0].title, DEFAULT_TITLE);
    assert_eq!(view.pages[0].message_count, 0);
    assert_eq!(view.current_page_id.as_deref(), Some("1000"));
    assert!(view.messages.is_empty());
    assert_eq!(effects, vec![Effect::PersistPages]);
    assert!(state.consume_dirty());
}

#[test]
fn restored_pages_select_most_recent_and_load_its_messages() {
    init_logging();
    let pages = vec![
        page_with("100", 100, "older"),
        page_with("300", 300, "newest"),
        page_with("200", 200, "middle"),
    ];
    let (state, effects) = mounted(pages, 5_000);
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.current_page_id.as_deref(), Some("300"));
    assert_eq!(view.current_title, "newest");
    assert_eq!(view.messages.len(), 1);
    assert_eq!(view.messages[0].message_id, "300-m");
}

#[test]
fn new_page_becomes_current_and_clears_composer() {
    init_logging();
    let (state, _) = mounted(Vec::new(), 1_000);
    let (state, _) = update(state, Msg::ComposerChanged("draft".into()));
    let (state, effects) = update(state, Msg::NewPageClicked { now: 2_000 });
    let view = state.view();

    assert_eq!(effects, vec![Effect::PersistPages]);
    assert_eq!(view.pages.len(), 2);
    assert_eq!(view.current_page_id.as_deref(), Some("2000"));
    assert_eq!(view.composer, "");
    assert!(view.pages[1].is_current);
}

#[test]
fn deleting_current_page_selects_most_recently_created_remaining() {
    init_logging();
    let pages = vec![
        page_with("100", 100, "a"),
        page_with("300", 300, "b"),
        page_with("200", 200, "c"),
    ];
    let (state, _) = mounted(pages, 5_000);
    let (state, effects) = update(
        state,
        Msg::PageDeleted {
            page_id: "300".into(),
            now: 6_000,
        },
    );
    let view = state.view();

    assert_eq!(effects, vec![Effect::PersistPages]);
    assert_eq!(view.pages.len(), 2);
    assert_eq!(view.current_page_id.as_deref(), Some("200"));
}

#[test]
fn deleting_a_background_page_keeps_selection() {
    init_logging();
    let pages = vec![page_with("100", 100, "a"), page_with("300", 300, "b")];
    let (state, _) = mounted(pages, 5_000);
    let (state, _) = update(
        state,
        Msg::PageDeleted {
            page_id: "100".into(),
            now: 6_000,
        },
    );

    assert_eq!(state.view().current_page_id.as_deref(), Some("300"));
    assert_eq!(state.view().pages.len(), 1);
}

#[test]
fn deleting_last_page_leaves_exactly_one_fresh_page() {
    init_logging();
    let (state, _) = mounted(vec![page_with("100", 100, "only")], 5_000);
    let (state, effects) = update(
        state,
        Msg::PageDeleted {
            page_id: "100".into(),
            now: 6_000,
        },
    );
    let view = state.view();

    assert_eq!(effects, vec![Effect::PersistPages]);
    assert_eq!(view.pages.len(), 1);
    assert_eq!(view.pages[0].title, DEFAULT_TITLE);
    assert_eq!(view.pages[0].message_count, 0);
    assert_eq!(view.current_page_id.as_deref(), Some("6000"));
}

#[test]
fn unknown_ids_are_ignored() {
    init_logging();
    let (state, _) = mounted(vec![page_with("100", 100, "only")], 5_000);
    let mut state = state;
    state.consume_dirty();

    let (mut state, effects) = update(state, Msg::PageSelected { page_id: "nope".into() });
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());

    let (mut state, effects) = update(
        state,
        Msg::PageDeleted {
            page_id: "nope".into(),
            now: 6_000,
        },
    );
    assert!(effects.is_empty());
    assert!(!state.consume_dirty());
    assert_eq!(state.view().pages.len(), 1);
}

#[test]
fn selecting_a_page_switches_messages_without_persisting() {
    init_logging();
    let pages = vec![page_with("100", 100, "a"), page_with("300", 300, "b")];
    let (state, _) = mounted(pages, 5_000);
    let (state, effects) = update(state, Msg::PageSelected { page_id: "100".into() });

    assert!(effects.is_empty());
    assert_eq!(state.view().current_page_id.as_deref(), Some("100"));
    assert_eq!(state.view().messages[0].message_id, "100-m");
}

#[test]
fn rename_truncates_to_fifty_characters() {
    init_logging();
    let (state, _) = mounted(Vec::new(), 1_000);
    let long = "x".repeat(80);
    let (state, effects) = update(
        state,
        Msg::PageRenamed {
            page_id: "1000".into(),
            title: long,
        },
    );

    assert_eq!(effects, vec![Effect::PersistPages]);
    assert_eq!(state.view().current_title, "x".repeat(50));
}

#[test]
fn snapshot_preserves_page_order_and_content() {
    init_logging();
    let pages = vec![page_with("100", 100, "a"), page_with("300", 300, "b")];
    let (state, _) = mounted(pages.clone(), 5_000);

    assert_eq!(state.pages_snapshot(), pages);
}
