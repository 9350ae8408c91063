#![forbid(unsafe_code)]

//! Slot reconciliation: the transition function behind every drop.
//!
//! [`reconcile`] maps `(slots, source, target)` to the next slot grid plus a
//! [`TransitionEffect`] describing what happened. It is total: every input
//! produces a transition, and inputs that do not describe a valid gesture
//! produce [`TransitionEffect::Unchanged`] with the input slots untouched.
//!
//! # Transition table
//!
//! Evaluated top to bottom, first match wins:
//!
//! | source          | target        | effect                                   |
//! |-----------------|---------------|------------------------------------------|
//! | `type-<T>`      | empty *i*     | create a `T` section at clamp(*i*)       |
//! | `sec-<id>`      | empty *i*     | move the section to clamp(*i*)           |
//! | `sec-<id>`      | `sec-<other>` | reorder: shift `id` to `other`'s index   |
//! | `sec-<id>`      | palette       | delete (never the avatar section)        |
//! | anything else   |               | unchanged                                |
//!
//! Target indices beyond the grid clamp to the last slot. A section is
//! never written over another section.

use crate::config::BoardConfig;
use crate::ids::{SectionId, SectionIdFactory, SectionType};
use crate::slot::{Section, Slot, SlotGrid};
use crate::target::{DragSource, DropTarget};

/// Why a gesture left the slots unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoopReason {
    /// The drag source id was not recognized.
    UnknownSource,
    /// The drop target id was not recognized.
    UnknownTarget,
    /// `empty-<garbage>`: a placeholder target without an index.
    MissingEmptyIndex,
    /// The dragged section is not on the board.
    SourceNotFound,
    /// The section dropped onto is not on the board.
    TargetNotFound,
    /// The avatar section was dropped on the palette.
    AvatarProtected,
    /// A section of the dragged palette type already exists.
    DuplicateSectionType,
    /// The dragged palette type is not in the configured allow-list.
    SectionTypeNotAllowed,
    /// The clamped target index holds another section.
    TargetOccupied,
    /// The gesture ends where it started.
    SameSlot,
    /// The section id factory has no ids left.
    IdsExhausted,
    /// Recognized source and target, but no rule for the pair.
    UnsupportedGesture,
}

impl NoopReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownSource => "unknown_source",
            Self::UnknownTarget => "unknown_target",
            Self::MissingEmptyIndex => "missing_empty_index",
            Self::SourceNotFound => "source_not_found",
            Self::TargetNotFound => "target_not_found",
            Self::AvatarProtected => "avatar_protected",
            Self::DuplicateSectionType => "duplicate_section_type",
            Self::SectionTypeNotAllowed => "section_type_not_allowed",
            Self::TargetOccupied => "target_occupied",
            Self::SameSlot => "same_slot",
            Self::IdsExhausted => "ids_exhausted",
            Self::UnsupportedGesture => "unsupported_gesture",
        }
    }
}

/// What a transition did.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEffect {
    /// A palette type was dropped on a placeholder.
    Created { section: Section, index: usize },
    /// A section moved onto a placeholder; `from` became a placeholder.
    Moved { id: SectionId, from: usize, to: usize },
    /// A section was shifted to another section's position.
    Reordered { id: SectionId, from: usize, to: usize },
    /// A section was dropped on the palette; `index` became a placeholder.
    Deleted { section: Section, index: usize },
    /// Nothing changed.
    Unchanged(NoopReason),
}

impl TransitionEffect {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Moved { .. } => "moved",
            Self::Reordered { .. } => "reordered",
            Self::Deleted { .. } => "deleted",
            Self::Unchanged(_) => "unchanged",
        }
    }
}

/// Notification handed to the caller when a palette drop created a section,
/// so it can open a content editor.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationNotice {
    pub section: Section,
    pub index: usize,
}

/// Result of one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub slots: SlotGrid,
    pub effect: TransitionEffect,
}

impl Transition {
    fn unchanged(slots: &SlotGrid, reason: NoopReason) -> Self {
        Self {
            slots: slots.clone(),
            effect: TransitionEffect::Unchanged(reason),
        }
    }

    /// True when the slots were left as they were.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.effect, TransitionEffect::Unchanged(_))
    }

    /// Reason for a no-op, if this was one.
    #[must_use]
    pub const fn noop_reason(&self) -> Option<NoopReason> {
        match self.effect {
            TransitionEffect::Unchanged(reason) => Some(reason),
            _ => None,
        }
    }

    /// Creation notification for palette drops.
    #[must_use]
    pub fn creation(&self) -> Option<CreationNotice> {
        match &self.effect {
            TransitionEffect::Created { section, index } => Some(CreationNotice {
                section: section.clone(),
                index: *index,
            }),
            _ => None,
        }
    }
}

/// Inputs to [`reconcile`] beyond the gesture itself.
#[derive(Debug)]
pub struct ReconcileContext<'a> {
    pub config: &'a BoardConfig,
    pub ids: &'a mut SectionIdFactory,
}

/// Compute the transition for dropping `source` on `target`.
pub fn reconcile(
    slots: &SlotGrid,
    source: &DragSource,
    target: &DropTarget,
    ctx: &mut ReconcileContext<'_>,
) -> Transition {
    match (source, target) {
        (DragSource::Palette(section_type), DropTarget::Empty { index }) => {
            create(slots, section_type, *index, ctx)
        }
        (DragSource::Section(id), DropTarget::Empty { index }) => move_to_empty(slots, id, *index),
        (DragSource::Section(id), DropTarget::Section(other)) => reorder(slots, id, other),
        (DragSource::Section(id), DropTarget::Palette) => delete(slots, id, ctx.config),
        (DragSource::Unknown(_), _) => Transition::unchanged(slots, NoopReason::UnknownSource),
        (_, DropTarget::Unknown(_)) => Transition::unchanged(slots, NoopReason::UnknownTarget),
        _ => Transition::unchanged(slots, NoopReason::UnsupportedGesture),
    }
}

fn create(
    slots: &SlotGrid,
    section_type: &SectionType,
    index: Option<usize>,
    ctx: &mut ReconcileContext<'_>,
) -> Transition {
    let Some(index) = index else {
        return Transition::unchanged(slots, NoopReason::MissingEmptyIndex);
    };
    if slots.is_empty() {
        return Transition::unchanged(slots, NoopReason::TargetNotFound);
    }
    if !ctx.config.allows(section_type) {
        return Transition::unchanged(slots, NoopReason::SectionTypeNotAllowed);
    }
    if slots.contains_type(section_type) {
        return Transition::unchanged(slots, NoopReason::DuplicateSectionType);
    }
    let index = slots.clamp_index(index);
    if !slots.get(index).is_some_and(Slot::is_empty) {
        return Transition::unchanged(slots, NoopReason::TargetOccupied);
    }

    let id = loop {
        let Some(id) = ctx.ids.next_id() else {
            return Transition::unchanged(slots, NoopReason::IdsExhausted);
        };
        if slots.position_of(&id).is_none() {
            break id;
        }
    };
    let section = Section::new(id, section_type.clone());

    let mut next = slots.clone();
    next.replace(index, Slot::Occupied(section.clone()));
    Transition {
        slots: next,
        effect: TransitionEffect::Created { section, index },
    }
}

fn move_to_empty(slots: &SlotGrid, id: &SectionId, index: Option<usize>) -> Transition {
    let Some(index) = index else {
        return Transition::unchanged(slots, NoopReason::MissingEmptyIndex);
    };
    let Some(from) = slots.position_of(id) else {
        return Transition::unchanged(slots, NoopReason::SourceNotFound);
    };
    let to = slots.clamp_index(index);
    if to == from {
        return Transition::unchanged(slots, NoopReason::SameSlot);
    }
    if !slots.get(to).is_some_and(Slot::is_empty) {
        return Transition::unchanged(slots, NoopReason::TargetOccupied);
    }

    let mut next = slots.clone();
    let Some(section) = next.vacate(from) else {
        return Transition::unchanged(slots, NoopReason::SourceNotFound);
    };
    next.replace(to, Slot::Occupied(section));
    Transition {
        slots: next,
        effect: TransitionEffect::Moved {
            id: id.clone(),
            from,
            to,
        },
    }
}

fn reorder(slots: &SlotGrid, id: &SectionId, other: &SectionId) -> Transition {
    let Some(from) = slots.position_of(id) else {
        return Transition::unchanged(slots, NoopReason::SourceNotFound);
    };
    let Some(to) = slots.position_of(other) else {
        return Transition::unchanged(slots, NoopReason::TargetNotFound);
    };
    if from == to {
        return Transition::unchanged(slots, NoopReason::SameSlot);
    }

    let mut next = slots.clone();
    next.shift(from, to);
    Transition {
        slots: next,
        effect: TransitionEffect::Reordered {
            id: id.clone(),
            from,
            to,
        },
    }
}

fn delete(slots: &SlotGrid, id: &SectionId, config: &BoardConfig) -> Transition {
    if *id == config.avatar_section_id {
        return Transition::unchanged(slots, NoopReason::AvatarProtected);
    }
    let Some(index) = slots.position_of(id) else {
        return Transition::unchanged(slots, NoopReason::SourceNotFound);
    };

    let mut next = slots.clone();
    let Some(section) = next.vacate(index) else {
        return Transition::unchanged(slots, NoopReason::SourceNotFound);
    };
    Transition {
        slots: next,
        effect: TransitionEffect::Deleted { section, index },
    }
}
