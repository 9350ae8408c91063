#![forbid(unsafe_code)]

//! Stateful owner of the slot grid.
//!
//! [`SlotBoard`] is the only writer of the grid's structure. Gesture-end
//! callbacks from the rendering layer land in [`SlotBoard::drag_end`]; content
//! editors write through [`SlotBoard::set_content`] and
//! [`SlotBoard::set_collapsed`], which touch one section and never move it.
//!
//! # Invariants
//!
//! 1. `slots().len()` equals `config().capacity` for the board's lifetime.
//! 2. Every placeholder's index equals its position.
//! 3. At most one section per section type.
//! 4. `version()` increments by exactly 1 on each change to the slots.
//!
//! One gesture is processed at a time, synchronously; nothing here is `Send`.

use serde_json::Value;
use tracing::{debug, debug_span, info};

use crate::config::BoardConfig;
use crate::error::BoardError;
use crate::events::{BoardEvent, EventChannel, Notice};
use crate::ids::{SectionId, SectionIdFactory, SectionType};
use crate::reconcile::{ReconcileContext, Transition, TransitionEffect, reconcile};
use crate::slot::{Section, Slot, SlotGrid};
use crate::target::{DragSource, DropTarget, parse_active_id, parse_over_id};

/// The slot grid plus everything needed to evolve it.
#[derive(Debug)]
pub struct SlotBoard {
    config: BoardConfig,
    slots: SlotGrid,
    ids: SectionIdFactory,
    active_id: Option<String>,
    version: u64,
    events: EventChannel<BoardEvent>,
}

impl SlotBoard {
    /// Fresh board of `config.capacity` placeholders (plus the avatar section
    /// in slot 0 when `seed_avatar` is set).
    pub fn new(config: BoardConfig) -> Result<Self, BoardError> {
        Self::hydrate(config, std::iter::empty())
    }

    /// Board populated from persisted sections.
    ///
    /// Sections with an explicit position go there; the rest fill the lowest
    /// free slots in input order. With `seed_avatar` set, a missing avatar
    /// section is added to the lowest free slot afterwards. An `Avatar`
    /// section stored under another id counts as present.
    pub fn hydrate(
        config: BoardConfig,
        sections: impl IntoIterator<Item = (Option<usize>, Section)>,
    ) -> Result<Self, BoardError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(BoardError::InvalidConfig(errors));
        }
        let capacity = config.capacity;
        let sections: Vec<(Option<usize>, Section)> = sections.into_iter().collect();
        if sections.len() > capacity {
            return Err(BoardError::CapacityExceeded {
                sections: sections.len(),
                capacity,
            });
        }

        let mut slots = SlotGrid::new(capacity);
        let mut ids = SectionIdFactory::new();
        let mut pending: Vec<Section> = Vec::new();
        for (position, section) in sections {
            if slots.position_of(section.id()).is_some()
                || pending.iter().any(|s| s.id() == section.id())
            {
                return Err(BoardError::DuplicateSectionId(section.id().clone()));
            }
            if slots.contains_type(section.section_type())
                || pending
                    .iter()
                    .any(|s| s.section_type() == section.section_type())
            {
                return Err(BoardError::DuplicateSectionType(
                    section.section_type().clone(),
                ));
            }
            ids.observe(section.id());
            match position {
                Some(position) if position >= capacity => {
                    return Err(BoardError::PositionOutOfRange { position, capacity });
                }
                Some(position) => {
                    if !slots.get(position).is_some_and(Slot::is_empty) {
                        return Err(BoardError::PositionTaken(position));
                    }
                    slots.replace(position, Slot::Occupied(section));
                }
                None => pending.push(section),
            }
        }
        for section in pending {
            let Some(index) = slots.first_empty() else {
                return Err(BoardError::CapacityExceeded {
                    sections: slots.len() + 1,
                    capacity,
                });
            };
            slots.replace(index, Slot::Occupied(section));
        }

        if config.seed_avatar
            && slots.position_of(&config.avatar_section_id).is_none()
            && !slots.contains_type(&SectionType::avatar())
            && let Some(index) = slots.first_empty()
        {
            let avatar = Section::new(config.avatar_section_id.clone(), SectionType::avatar());
            ids.observe(avatar.id());
            slots.replace(index, Slot::Occupied(avatar));
        }

        debug!(capacity, sections = slots.occupied(), "board hydrated");
        Ok(Self {
            config,
            slots,
            ids,
            active_id: None,
            version: 0,
            events: EventChannel::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Current slots, in render order.
    #[must_use]
    pub fn slots(&self) -> &SlotGrid {
        &self.slots
    }

    /// Bumped on every change to the slots (structure, content, collapse).
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Id being dragged, for the drag overlay.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Handle to the board's event channel.
    #[must_use]
    pub fn events(&self) -> &EventChannel<BoardEvent> {
        &self.events
    }

    /// Whether a palette drop of `section_type` would create a section.
    #[must_use]
    pub fn can_create(&self, section_type: &SectionType) -> bool {
        self.config.allows(section_type)
            && !self.slots.contains_type(section_type)
            && self.slots.first_empty().is_some()
    }

    /// Gesture start. Only tracks the active id; the slots are not touched.
    pub fn drag_start(&mut self, active_id: &str) {
        debug!(active_id, "drag start");
        self.active_id = Some(active_id.to_owned());
    }

    /// Gesture aborted by the rendering layer.
    pub fn drag_cancel(&mut self) {
        if let Some(active_id) = self.active_id.take() {
            debug!(active_id = active_id.as_str(), "drag cancelled");
        }
    }

    /// Gesture end: normalize both ids, reconcile, commit.
    pub fn drag_end(&mut self, active_id: &str, over_id: Option<&str>) -> Transition {
        let _span = debug_span!("board.drag_end", active_id, over_id).entered();
        let source = parse_active_id(active_id);
        let target = parse_over_id(over_id, self.slots.as_slice());
        self.apply(&source, &target)
    }

    /// Typed gesture end.
    pub fn apply(&mut self, source: &DragSource, target: &DropTarget) -> Transition {
        self.active_id = None;
        let transition = reconcile(
            &self.slots,
            source,
            target,
            &mut ReconcileContext {
                config: &self.config,
                ids: &mut self.ids,
            },
        );

        if let Some(reason) = transition.noop_reason() {
            debug!(
                source = source.kind(),
                target = target.kind(),
                reason = reason.as_str(),
                "gesture ignored"
            );
            return transition;
        }

        self.slots = transition.slots.clone();
        self.version += 1;
        info!(
            effect = transition.effect.label(),
            version = self.version,
            "slots updated"
        );
        if let Some(event) = event_for(&transition.effect) {
            self.events.publish(&event);
        }
        transition
    }

    /// Replace a section's content.
    pub fn set_content(&mut self, id: &SectionId, content: Value) -> Result<(), BoardError> {
        let section = self
            .slots
            .section_mut(id)
            .ok_or_else(|| BoardError::UnknownSection(id.clone()))?;
        section.set_content(content);
        self.version += 1;
        self.events
            .publish(&BoardEvent::ContentChanged { id: id.clone() });
        Ok(())
    }

    /// Set a section's collapsed flag. Returns whether it changed.
    pub fn set_collapsed(&mut self, id: &SectionId, collapsed: bool) -> Result<bool, BoardError> {
        let section = self
            .slots
            .section_mut(id)
            .ok_or_else(|| BoardError::UnknownSection(id.clone()))?;
        if section.collapsed() == collapsed {
            return Ok(false);
        }
        section.set_collapsed(collapsed);
        self.version += 1;
        self.events.publish(&BoardEvent::SectionResized {
            id: id.clone(),
            collapsed,
        });
        Ok(true)
    }

    /// Flip a section's collapsed flag, returning the new value.
    pub fn toggle_collapsed(&mut self, id: &SectionId) -> Result<bool, BoardError> {
        let collapsed = self
            .slots
            .section(id)
            .map(Section::collapsed)
            .ok_or_else(|| BoardError::UnknownSection(id.clone()))?;
        self.set_collapsed(id, !collapsed)?;
        Ok(!collapsed)
    }

    /// Forward a user-visible notice.
    pub fn notify(&self, notice: Notice) {
        self.events.publish(&BoardEvent::Notify(notice));
    }
}

fn event_for(effect: &TransitionEffect) -> Option<BoardEvent> {
    match effect {
        TransitionEffect::Created { section, index } => Some(BoardEvent::SectionCreated {
            section: section.clone(),
            index: *index,
        }),
        TransitionEffect::Moved { id, from, to } => Some(BoardEvent::SectionMoved {
            id: id.clone(),
            from: *from,
            to: *to,
        }),
        TransitionEffect::Reordered { id, from, to } => Some(BoardEvent::SectionsReordered {
            id: id.clone(),
            from: *from,
            to: *to,
        }),
        TransitionEffect::Deleted { section, index } => Some(BoardEvent::SectionDeleted {
            id: section.id().clone(),
            section_type: section.section_type().clone(),
            index: *index,
        }),
        TransitionEffect::Unchanged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing::Subscriber;
    use tracing_subscriber::Layer;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    use super::*;
    use crate::events::NoticeLevel;
    use crate::reconcile::NoopReason;

    fn board(capacity: usize) -> SlotBoard {
        SlotBoard::new(BoardConfig::default().capacity(capacity)).unwrap()
    }

    fn record(board: &SlotBoard) -> (Rc<RefCell<Vec<BoardEvent>>>, crate::events::Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = board
            .events()
            .subscribe(move |e: &BoardEvent| sink.borrow_mut().push(e.clone()));
        (log, sub)
    }

    fn section(raw: &str, ty: &str) -> Section {
        Section::new(SectionId::new(raw).unwrap(), SectionType::new(ty).unwrap())
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = SlotBoard::new(BoardConfig::default().capacity(0)).unwrap_err();
        assert!(matches!(err, BoardError::InvalidConfig(_)));
    }

    #[test]
    fn seed_avatar_occupies_slot_zero() {
        let board = SlotBoard::new(BoardConfig::default().seed_avatar(true)).unwrap();
        let first = board.slots().get(0).and_then(Slot::as_section).unwrap();
        assert_eq!(first.id(), &SectionId::avatar());
        assert_eq!(board.slots().len(), 15);
    }

    #[test]
    fn drag_lifecycle_tracks_active_id() {
        let mut board = board(5);
        board.drag_start("type-Lore");
        assert_eq!(board.active_id(), Some("type-Lore"));
        board.drag_cancel();
        assert_eq!(board.active_id(), None);

        board.drag_start("type-Lore");
        let _ = board.drag_end("type-Lore", Some("empty-2"));
        assert_eq!(board.active_id(), None);
    }

    #[test]
    fn creation_publishes_event_and_bumps_version() {
        let mut board = board(5);
        let (log, _sub) = record(&board);
        let t = board.drag_end("type-Lore", Some("empty-2"));
        assert_eq!(board.version(), 1);
        assert_eq!(board.slots(), &t.slots);
        let events = log.borrow();
        assert!(matches!(
            events.as_slice(),
            [BoardEvent::SectionCreated { index: 2, .. }]
        ));
    }

    #[test]
    fn noop_publishes_nothing_and_keeps_version() {
        let mut board = board(5);
        let (log, _sub) = record(&board);
        let before = board.slots().clone();
        let t = board.drag_end("nonsense", Some("empty-2"));
        assert_eq!(t.noop_reason(), Some(NoopReason::UnknownSource));
        assert_eq!(board.slots(), &before);
        assert_eq!(board.version(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn can_create_respects_duplicates_and_capacity() {
        let mut board = board(1);
        let lore = SectionType::new("Lore").unwrap();
        assert!(board.can_create(&lore));
        let _ = board.drag_end("type-Lore", Some("empty-0"));
        assert!(!board.can_create(&lore));
        assert!(!board.can_create(&SectionType::new("Contact").unwrap()));
    }

    #[test]
    fn content_and_collapse_writes() {
        let mut board = board(3);
        let created = board.drag_end("type-Lore", Some("empty-0")).creation().unwrap();
        let id = created.section.id().clone();
        let (log, _sub) = record(&board);

        board.set_content(&id, json!({"text": "once upon"})).unwrap();
        assert_eq!(
            board.slots().section(&id).unwrap().content(),
            &json!({"text": "once upon"})
        );
        assert!(board.toggle_collapsed(&id).unwrap());
        assert!(!board.set_collapsed(&id, true).unwrap());
        assert_eq!(board.version(), 3);

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            BoardEvent::SectionResized {
                id: id.clone(),
                collapsed: true
            }
        );
    }

    #[test]
    fn writes_to_unknown_sections_fail() {
        let mut board = board(3);
        let ghost = SectionId::new("sec-ghost").unwrap();
        assert_eq!(
            board.set_content(&ghost, Value::Null),
            Err(BoardError::UnknownSection(ghost.clone()))
        );
        assert!(board.toggle_collapsed(&ghost).is_err());
    }

    #[test]
    fn hydrate_places_explicit_positions_then_fills() {
        let board = SlotBoard::hydrate(
            BoardConfig::default().capacity(4),
            [
                (Some(2), section("sec-9", "Lore")),
                (None, section("sec-avatar", "Avatar")),
                (None, section("sec-3", "Contact")),
            ],
        )
        .unwrap();
        let order: Vec<String> = board.slots().iter().map(Slot::id).collect();
        assert_eq!(order, ["sec-avatar", "sec-3", "sec-9", "empty-3"]);
        assert!(board.slots().is_consistent());
    }

    #[test]
    fn hydrate_seeds_missing_avatar() {
        let board = SlotBoard::hydrate(
            BoardConfig::default().capacity(3).seed_avatar(true),
            [(Some(0), section("sec-1", "Lore"))],
        )
        .unwrap();
        assert_eq!(
            board.slots().position_of(&SectionId::avatar()),
            Some(1)
        );
        assert!(board.config().seed_avatar);
    }

    #[test]
    fn hydrate_keeps_single_avatar_stored_under_backend_id() {
        let board = SlotBoard::hydrate(
            BoardConfig::default().capacity(4).seed_avatar(true),
            [(Some(0), section("sec-9", "Avatar"))],
        )
        .unwrap();
        let avatars: Vec<&SectionId> = board
            .slots()
            .sections()
            .filter(|(_, s)| *s.section_type() == SectionType::avatar())
            .map(|(_, s)| s.id())
            .collect();
        assert_eq!(avatars, [&SectionId::new("sec-9").unwrap()]);
        assert_eq!(board.slots().occupied(), 1);
    }

    #[test]
    fn creation_after_hydrating_max_id_is_ignored() {
        let top = format!("sec-{}", u64::MAX);
        let mut board = SlotBoard::hydrate(
            BoardConfig::default().capacity(3),
            [(None, section(&top, "Lore"))],
        )
        .unwrap();
        let t = board.drag_end("type-Contact", Some("empty-1"));
        assert_eq!(t.noop_reason(), Some(NoopReason::IdsExhausted));
        assert_eq!(board.version(), 0);
        assert_eq!(board.slots().occupied(), 1);
    }

    #[test]
    fn hydrate_continues_ids_past_existing() {
        let mut board = SlotBoard::hydrate(
            BoardConfig::default().capacity(3),
            [(None, section("sec-41", "Lore"))],
        )
        .unwrap();
        let created = board
            .drag_end("type-Contact", Some("empty-1"))
            .creation()
            .unwrap();
        assert_eq!(created.section.id().as_str(), "sec-42");
    }

    #[test]
    fn hydrate_rejects_bad_input() {
        let config = BoardConfig::default().capacity(2);
        assert_eq!(
            SlotBoard::hydrate(config.clone(), [(Some(5), section("sec-1", "Lore"))]).unwrap_err(),
            BoardError::PositionOutOfRange {
                position: 5,
                capacity: 2
            }
        );
        assert!(matches!(
            SlotBoard::hydrate(
                config.clone(),
                [
                    (Some(0), section("sec-1", "Lore")),
                    (Some(0), section("sec-2", "Contact")),
                ],
            ),
            Err(BoardError::PositionTaken(0))
        ));
        assert!(matches!(
            SlotBoard::hydrate(
                config.clone(),
                [(None, section("sec-1", "Lore")), (None, section("sec-1", "Contact"))],
            ),
            Err(BoardError::DuplicateSectionId(_))
        ));
        assert!(matches!(
            SlotBoard::hydrate(
                config.clone(),
                [(None, section("sec-1", "Lore")), (None, section("sec-2", "Lore"))],
            ),
            Err(BoardError::DuplicateSectionType(_))
        ));
        assert!(matches!(
            SlotBoard::hydrate(
                config,
                [
                    (None, section("sec-1", "Lore")),
                    (None, section("sec-2", "Contact")),
                    (None, section("sec-3", "Identity")),
                ],
            ),
            Err(BoardError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn notify_reaches_subscribers() {
        let board = board(1);
        let (log, _sub) = record(&board);
        board.notify(Notice::error("save failed"));
        assert!(matches!(
            log.borrow().as_slice(),
            [BoardEvent::Notify(Notice { level: NoticeLevel::Error, .. })]
        ));
    }

    #[derive(Default)]
    struct GestureTraceCapture {
        ignored: Arc<Mutex<Vec<String>>>,
    }

    #[derive(Default)]
    struct GestureVisitor {
        message: Option<String>,
        reason: Option<String>,
    }

    impl tracing::field::Visit for GestureVisitor {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "reason" {
                self.reason = Some(value.to_owned());
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.message = Some(format!("{value:?}"));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for GestureTraceCapture {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = GestureVisitor::default();
            event.record(&mut visitor);
            if visitor.message.as_deref() == Some("gesture ignored")
                && let Some(reason) = visitor.reason
            {
                self.ignored.lock().expect("capture lock").push(reason);
            }
        }
    }

    #[test]
    fn ignored_gestures_log_their_reason() {
        let capture = GestureTraceCapture::default();
        let ignored = Arc::clone(&capture.ignored);
        let subscriber = tracing_subscriber::registry().with(capture);

        let mut board = board(3);
        tracing::subscriber::with_default(subscriber, || {
            let _ = board.drag_end("type-Lore", None);
            let _ = board.drag_end("bogus", Some("empty-1"));
            let _ = board.drag_end("type-Lore", Some("empty-1"));
        });

        assert_eq!(
            *ignored.lock().unwrap(),
            ["unknown_target".to_owned(), "unknown_source".to_owned()]
        );
    }
}
