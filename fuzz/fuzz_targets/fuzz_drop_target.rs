#![no_main]

use libfuzzer_sys::fuzz_target;
use sheetcraft_core::{DropTarget, Section, SectionId, SectionType, Slot, parse_over_id};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let slots = [
        Slot::empty(0),
        Slot::Occupied(Section::new(
            SectionId::avatar(),
            SectionType::avatar(),
        )),
        Slot::Occupied(
            Section::new(
                SectionId::new("sec-7").expect("valid id"),
                SectionType::new("Lore").expect("valid type"),
            )
            .with_origin_id("7"),
        ),
        Slot::empty(3),
    ];

    let target = parse_over_id(Some(raw), &slots);
    let prefixed = parse_over_id(Some(&format!("sec-{raw}")), &slots);
    assert_eq!(target, prefixed, "sec- prefix changed the target for {raw:?}");

    if let DropTarget::Empty { index: Some(index) } = target {
        assert!(raw.contains("empty-") || index < slots.len());
    }
});
