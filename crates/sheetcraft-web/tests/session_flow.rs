#![forbid(unsafe_code)]

//! End-to-end editor flows over JSON host input and the in-memory store.

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use sheetcraft_core::{BoardConfig, BoardEvent, NoopReason, NoticeLevel, Slot};
use sheetcraft_web::{
    CharacterRecord, EditorSession, MemoryCharacterStore, SessionOutcome, StoreError,
};

fn open(sections: Value, capacity: usize) -> EditorSession<MemoryCharacterStore> {
    let record: CharacterRecord = serde_json::from_value(json!({
        "id": "c1",
        "title": "Ayla",
        "sections": sections,
    }))
    .unwrap();
    let mut store = MemoryCharacterStore::new();
    store.insert(record);
    EditorSession::open(store, "c1", BoardConfig::default().capacity(capacity)).unwrap()
}

fn slot_ids(session: &EditorSession<MemoryCharacterStore>) -> Vec<String> {
    session.board().slots().iter().map(Slot::id).collect()
}

fn stored_layout(session: &EditorSession<MemoryCharacterStore>) -> Vec<(String, Option<usize>)> {
    let mut layout: Vec<(String, Option<usize>)> = session
        .store()
        .get("c1")
        .unwrap()
        .sections
        .iter()
        .map(|s| (s.id.clone(), s.position))
        .collect();
    layout.sort_by_key(|(_, position)| *position);
    layout
}

#[test]
fn palette_drop_then_move_then_delete() {
    let mut session = open(json!([]), 5);

    let created = session
        .dispatch_json(r#"{"kind":"drag_end","active_id":"type-Lore","over_id":"empty-3"}"#)
        .unwrap()
        .unwrap();
    let id = created.creation.unwrap().section.id().to_string();
    assert_eq!(stored_layout(&session), [(id.clone(), Some(3))]);

    let moved = session
        .dispatch_json(&format!(
            r#"{{"kind":"drag_end","active_id":"{id}","over_id":"empty-0"}}"#
        ))
        .unwrap()
        .unwrap();
    assert_eq!(moved.log.outcome, SessionOutcome::Applied);
    assert_eq!(
        slot_ids(&session),
        [id.as_str(), "empty-1", "empty-2", "empty-3", "empty-4"]
    );
    assert_eq!(stored_layout(&session), [(id.clone(), Some(0))]);

    session
        .dispatch_json(&format!(
            r#"{{"kind":"drag_end","active_id":"{id}","over_id":"palette"}}"#
        ))
        .unwrap()
        .unwrap();
    assert!(session.board().slots().sections().next().is_none());
    assert!(stored_layout(&session).is_empty());
}

#[test]
fn reorder_persists_backend_ids() {
    let mut session = open(
        json!([
            {"id": "10", "type": "Lore", "position": 0},
            {"id": "11", "type": "Contact", "position": 1},
        ]),
        3,
    );
    let dispatch = session
        .dispatch_json(r#"{"kind":"drag_end","active_id":"sec-10","over_id":"sec-11"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(dispatch.log.outcome, SessionOutcome::Applied);
    assert_eq!(slot_ids(&session), ["sec-11", "sec-10", "empty-2"]);
    assert_eq!(
        stored_layout(&session),
        [("11".to_owned(), Some(0)), ("10".to_owned(), Some(1))]
    );
}

#[test]
fn duplicate_palette_drop_is_ignored() {
    let mut session = open(json!([{"id": "1", "type": "Lore", "position": 0}]), 3);
    let dispatch = session
        .dispatch_json(r#"{"kind":"drag_end","active_id":"type-Lore","over_id":"empty-2"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        dispatch.log.outcome,
        SessionOutcome::Ignored(NoopReason::DuplicateSectionType)
    );
    assert!(session.store().calls().is_empty());
}

#[test]
fn backend_failure_keeps_board_and_raises_error_notice() {
    let mut session = open(json!([]), 3);
    let levels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&levels);
    let _sub = session.board().events().subscribe(move |event| {
        if let BoardEvent::Notify(notice) = event {
            sink.borrow_mut().push(notice.level);
        }
    });
    session
        .store_mut()
        .fail_next(StoreError::Rejected("quota".into()));

    let dispatch = session
        .dispatch_json(r#"{"kind":"drag_end","active_id":"type-Contact","over_id":"empty-1"}"#)
        .unwrap()
        .unwrap();

    assert_eq!(dispatch.log.persist_failures, 1);
    assert_eq!(slot_ids(&session)[0], "empty-0");
    assert!(slot_ids(&session)[1].starts_with("sec-"));
    assert!(stored_layout(&session).is_empty());
    assert_eq!(*levels.borrow(), [NoticeLevel::Error]);
}

#[test]
fn unknown_host_kind_is_skipped() {
    let mut session = open(json!([]), 2);
    assert_eq!(
        session.dispatch_json(r#"{"kind":"drag_over","active_id":"x"}"#),
        Ok(None)
    );
    assert!(session.dispatch_json("not json").is_err());
}

#[test]
fn deleting_character_removes_it_from_store() {
    let mut session = open(json!([]), 2);
    session.delete_character().unwrap();
    assert!(session.store().get("c1").is_none());
    assert!(matches!(
        session.delete_character(),
        Err(sheetcraft_web::SessionError::Store(StoreError::NotFound(_)))
    ));
}
