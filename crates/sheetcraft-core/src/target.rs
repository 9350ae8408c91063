#![forbid(unsafe_code)]

//! Drop-target and drag-source normalization.
//!
//! The rendering layer emits drop-target ids in several shapes depending on
//! where a gesture started: `palette`, `empty-<n>`, `sec-<token>`, doubly
//! prefixed `sec-sec-<token>`, bare tokens, or backend ids like `s42`.
//! [`parse_over_id`] folds all of these into a [`DropTarget`] using the current
//! slots as lookup context. It never fails: anything it cannot place becomes
//! [`DropTarget::Unknown`], which the reconciler treats as a no-op.
//!
//! # Resolution order
//!
//! 1. Missing id: unknown.
//! 2. Strip every leading `sec-`.
//! 3. `palette`: the palette.
//! 4. `empty-<n>`: placeholder `n` (no index when `n` does not parse).
//! 5. Slot lookup, lowest position first: exact id (`sec-<r>` or `r`), then
//!    origin id (`r` or `s<r>`), then token equality.
//! 6. Fallback: `s…` or all-digit remainders are optimistic section ids,
//!    anything else is unknown.

use crate::ids::{
    EMPTY_ID_PREFIX, PALETTE_ID, PALETTE_TYPE_PREFIX, SECTION_ID_PREFIX, SectionId, SectionType,
};
use crate::slot::Slot;

/// Normalized drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// The palette; dropping a section here deletes it.
    Palette,
    /// A placeholder. `index` is `None` when the id was `empty-<garbage>`.
    Empty { index: Option<usize> },
    /// An occupied slot (or an optimistic guess at one).
    Section(SectionId),
    /// Unrecognized id, kept for logging.
    Unknown(Option<String>),
}

impl DropTarget {
    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Palette => "palette",
            Self::Empty { .. } => "empty",
            Self::Section(_) => "sec",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Normalized drag source (the `activeId` of a gesture).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// `type-<T>` from the palette.
    Palette(SectionType),
    /// `sec-<token>` from an occupied slot.
    Section(SectionId),
    /// Anything else.
    Unknown(String),
}

impl DragSource {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Palette(_) => "type",
            Self::Section(_) => "sec",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Classify a drag source id.
#[must_use]
pub fn parse_active_id(raw: &str) -> DragSource {
    if let Some(ty) = raw.strip_prefix(PALETTE_TYPE_PREFIX) {
        return SectionType::new(ty)
            .map(DragSource::Palette)
            .unwrap_or_else(|_| DragSource::Unknown(raw.to_owned()));
    }
    if raw.starts_with(SECTION_ID_PREFIX) {
        return SectionId::new(raw)
            .map(DragSource::Section)
            .unwrap_or_else(|_| DragSource::Unknown(raw.to_owned()));
    }
    DragSource::Unknown(raw.to_owned())
}

/// Normalize a drop-target id against the current slots.
#[must_use]
pub fn parse_over_id(raw: Option<&str>, slots: &[Slot]) -> DropTarget {
    let Some(raw) = raw else {
        return DropTarget::Unknown(None);
    };

    let mut rest = raw;
    while let Some(stripped) = rest.strip_prefix(SECTION_ID_PREFIX) {
        rest = stripped;
    }

    if rest == PALETTE_ID {
        return DropTarget::Palette;
    }
    if let Some(index) = rest.strip_prefix(EMPTY_ID_PREFIX) {
        return DropTarget::Empty {
            index: index.parse::<usize>().ok(),
        };
    }
    if rest.is_empty() {
        return DropTarget::Unknown(Some(String::new()));
    }

    if let Some(index) = find_slot(rest, slots) {
        return match &slots[index] {
            Slot::Empty(_) => DropTarget::Empty { index: Some(index) },
            Slot::Occupied(section) => DropTarget::Section(section.id().clone()),
        };
    }

    let optimistic = rest.starts_with('s') || rest.bytes().all(|b| b.is_ascii_digit());
    if optimistic && let Ok(id) = SectionId::from_token(rest) {
        return DropTarget::Section(id);
    }
    DropTarget::Unknown(Some(rest.to_owned()))
}

fn find_slot(rest: &str, slots: &[Slot]) -> Option<usize> {
    let prefixed = format!("{SECTION_ID_PREFIX}{rest}");
    let s_prefixed = format!("s{rest}");

    slots.iter().position(|slot| {
        let id = slot.id();
        if id == prefixed || id == rest {
            return true;
        }
        if let Some(origin) = slot.as_section().and_then(|section| section.origin_id())
            && (origin == rest || origin == s_prefixed)
        {
            return true;
        }
        id.strip_prefix(SECTION_ID_PREFIX) == Some(rest)
    })
}
