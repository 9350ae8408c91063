#![forbid(unsafe_code)]

//! Slot model: a fixed-length grid of empty placeholders and sections.
//!
//! # Invariants
//!
//! 1. A [`SlotGrid`] never changes length after construction.
//! 2. Every [`EmptySlot::index`] equals its position in the grid.
//! 3. A section's id and type never change once it is on the grid.
//!
//! Only the reconciler and board hydration restructure the grid; everything
//! else gets read access plus single-section content and collapse writes.

use serde::Serialize;
use serde_json::Value;

use crate::ids::{SectionId, SectionType, empty_slot_id};

/// Placeholder for an unoccupied position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptySlot {
    pub index: usize,
}

impl EmptySlot {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// `empty-<index>`.
    #[must_use]
    pub fn id(&self) -> String {
        empty_slot_id(self.index)
    }
}

/// A user-created section occupying one slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    id: SectionId,
    section_type: SectionType,
    content: Value,
    collapsed: bool,
    origin_id: Option<String>,
}

impl Section {
    /// New expanded section with empty (`null`) content.
    #[must_use]
    pub fn new(id: SectionId, section_type: SectionType) -> Self {
        Self {
            id,
            section_type,
            content: Value::Null,
            collapsed: false,
            origin_id: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: Value) -> Self {
        self.content = content;
        self
    }

    #[must_use]
    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    /// Alternate identifier the drop-target normalizer also matches on,
    /// e.g. the raw backend id of a hydrated section.
    #[must_use]
    pub fn with_origin_id(mut self, origin_id: impl Into<String>) -> Self {
        self.origin_id = Some(origin_id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.id
    }

    #[must_use]
    pub fn section_type(&self) -> &SectionType {
        &self.section_type
    }

    #[must_use]
    pub fn content(&self) -> &Value {
        &self.content
    }

    #[must_use]
    pub const fn collapsed(&self) -> bool {
        self.collapsed
    }

    #[must_use]
    pub fn origin_id(&self) -> Option<&str> {
        self.origin_id.as_deref()
    }

    pub(crate) fn set_content(&mut self, content: Value) {
        self.content = content;
    }

    pub(crate) fn set_collapsed(&mut self, collapsed: bool) {
        self.collapsed = collapsed;
    }
}

/// One grid position.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Empty(EmptySlot),
    Occupied(Section),
}

impl Slot {
    #[must_use]
    pub const fn empty(index: usize) -> Self {
        Self::Empty(EmptySlot::new(index))
    }

    /// Rendering id: `empty-<n>` or `sec-<token>`.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Self::Empty(empty) => empty.id(),
            Self::Occupied(section) => section.id().to_string(),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    #[must_use]
    pub const fn as_section(&self) -> Option<&Section> {
        match self {
            Self::Occupied(section) => Some(section),
            Self::Empty(_) => None,
        }
    }
}

/// JSON view of a slot for the rendering layer.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SlotView<'a> {
    Empty {
        id: String,
        index: usize,
    },
    Occupied {
        id: &'a str,
        #[serde(rename = "type")]
        section_type: &'a str,
        content: &'a Value,
        collapsed: bool,
    },
}

impl Serialize for Slot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let view = match self {
            Self::Empty(empty) => SlotView::Empty {
                id: empty.id(),
                index: empty.index,
            },
            Self::Occupied(section) => SlotView::Occupied {
                id: section.id.as_str(),
                section_type: section.section_type.as_str(),
                content: &section.content,
                collapsed: section.collapsed,
            },
        };
        view.serialize(serializer)
    }
}

/// Fixed-length ordered slot sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SlotGrid {
    slots: Vec<Slot>,
}

impl SlotGrid {
    /// `capacity` empty placeholders.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(Slot::empty).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot> {
        self.slots.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Slot] {
        &self.slots
    }

    /// Occupied slots in grid order, with their positions.
    pub fn sections(&self) -> impl Iterator<Item = (usize, &Section)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_section().map(|section| (index, section)))
    }

    /// Current position of the section with `id`.
    #[must_use]
    pub fn position_of(&self, id: &SectionId) -> Option<usize> {
        self.sections()
            .find(|(_, section)| section.id() == id)
            .map(|(index, _)| index)
    }

    #[must_use]
    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections()
            .find(|(_, section)| section.id() == id)
            .map(|(_, section)| section)
    }

    #[must_use]
    pub fn contains_type(&self, section_type: &SectionType) -> bool {
        self.sections()
            .any(|(_, section)| section.section_type() == section_type)
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.sections().count()
    }

    /// Lowest index holding a placeholder.
    #[must_use]
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Slot::is_empty)
    }

    /// Every placeholder index matches its position.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.slots.iter().enumerate().all(|(position, slot)| match slot {
            Slot::Empty(empty) => empty.index == position,
            Slot::Occupied(_) => true,
        })
    }

    /// Clamp `index` into `[0, len - 1]`.
    #[must_use]
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.slots.len().saturating_sub(1))
    }

    pub(crate) fn section_mut(&mut self, id: &SectionId) -> Option<&mut Section> {
        self.slots.iter_mut().find_map(|slot| match slot {
            Slot::Occupied(section) if section.id() == id => Some(section),
            _ => None,
        })
    }

    /// Put `slot` at `index`, returning what was there.
    pub(crate) fn replace(&mut self, index: usize, slot: Slot) -> Slot {
        std::mem::replace(&mut self.slots[index], slot)
    }

    /// Turn `index` back into a placeholder, returning the section it held.
    pub(crate) fn vacate(&mut self, index: usize) -> Option<Section> {
        match self.replace(index, Slot::empty(index)) {
            Slot::Occupied(section) => Some(section),
            Slot::Empty(_) => None,
        }
    }

    /// Remove the slot at `from` and reinsert it at `to`, shifting the slots
    /// in between by one.
    pub(crate) fn shift(&mut self, from: usize, to: usize) {
        let slot = self.slots.remove(from);
        self.slots.insert(to, slot);
        self.reindex();
    }

    /// Re-derive placeholder indices from positions.
    pub(crate) fn reindex(&mut self) {
        for (position, slot) in self.slots.iter_mut().enumerate() {
            if let Slot::Empty(empty) = slot {
                empty.index = position;
            }
        }
    }
}

impl<'a> IntoIterator for &'a SlotGrid {
    type Item = &'a Slot;
    type IntoIter = std::slice::Iter<'a, Slot>;

    fn into_iter(self) -> Self::IntoIter {
        self.slots.iter()
    }
}
