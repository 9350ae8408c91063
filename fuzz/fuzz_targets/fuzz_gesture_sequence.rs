#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sheetcraft_core::{BoardConfig, SlotBoard};

const TYPES: [&str; 5] = ["Identity", "Lore", "Contact", "Skills", "Avatar"];

#[derive(Debug, Arbitrary)]
enum Gesture {
    Palette { ty: u8, over: Target },
    Section { slot: u8, over: Target },
    Raw { active: String, over: Option<String> },
    Cancel,
}

#[derive(Debug, Arbitrary)]
enum Target {
    Empty(u8),
    Slot(u8),
    Palette,
    Null,
    Garbage(String),
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u8,
    gestures: Vec<Gesture>,
}

fn over_id(board: &SlotBoard, target: &Target) -> Option<String> {
    match target {
        Target::Empty(n) => Some(format!("empty-{n}")),
        Target::Slot(n) => board
            .slots()
            .get(usize::from(*n) % board.slots().len())
            .map(|slot| slot.id()),
        Target::Palette => Some("palette".to_owned()),
        Target::Null => None,
        Target::Garbage(s) => Some(s.clone()),
    }
}

fuzz_target!(|input: Input| {
    let capacity = usize::from(input.capacity % 24) + 1;
    let Ok(mut board) = SlotBoard::new(BoardConfig::default().capacity(capacity)) else {
        return;
    };
    let mut seen_ids = HashSet::new();

    for gesture in input.gestures.iter().take(256) {
        let before = board.slots().clone();
        let transition = match gesture {
            Gesture::Palette { ty, over } => {
                let active = format!("type-{}", TYPES[usize::from(*ty) % TYPES.len()]);
                let over = over_id(&board, over);
                board.drag_end(&active, over.as_deref())
            }
            Gesture::Section { slot, over } => {
                let active = board
                    .slots()
                    .get(usize::from(*slot) % capacity)
                    .map(|s| s.id())
                    .unwrap_or_default();
                let over = over_id(&board, over);
                board.drag_end(&active, over.as_deref())
            }
            Gesture::Raw { active, over } => board.drag_end(active, over.as_deref()),
            Gesture::Cancel => {
                board.drag_cancel();
                continue;
            }
        };

        let slots = board.slots();
        assert_eq!(slots.len(), capacity, "slot count changed");
        assert!(slots.is_consistent(), "placeholder indices drifted");
        if transition.is_noop() {
            assert_eq!(*slots, before, "no-op changed the board");
        }

        let mut types = HashSet::new();
        let mut ids = HashSet::new();
        for (_, section) in slots.sections() {
            assert!(types.insert(section.section_type().clone()), "duplicate type");
            assert!(ids.insert(section.id().clone()), "duplicate id");
        }
        if let Some(creation) = transition.creation() {
            assert!(
                seen_ids.insert(creation.section.id().clone()),
                "section id reused"
            );
        }
    }
});
