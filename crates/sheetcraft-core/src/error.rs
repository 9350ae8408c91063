#![forbid(unsafe_code)]

//! Board error types.
//!
//! Gesture handling never errors: malformed or inconsistent gestures become
//! no-op transitions. Errors are reserved for construction (bad config, bad
//! hydration input) and for single-section writes addressed to a section
//! that is not on the board.

use std::fmt;

use crate::ids::{SectionId, SectionType};

/// Errors raised by [`crate::board::SlotBoard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// Config failed [`crate::config::BoardConfig::validate`].
    InvalidConfig(Vec<String>),
    /// No section with this id is on the board.
    UnknownSection(SectionId),
    /// Hydration input placed a section outside the grid.
    PositionOutOfRange { position: usize, capacity: usize },
    /// Two hydrated sections asked for the same position.
    PositionTaken(usize),
    /// Two hydrated sections share an id.
    DuplicateSectionId(SectionId),
    /// Two hydrated sections share a type.
    DuplicateSectionType(SectionType),
    /// More sections than slots.
    CapacityExceeded { sections: usize, capacity: usize },
}

impl fmt::Display for BoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(errors) => {
                write!(f, "invalid board config: {}", errors.join("; "))
            }
            Self::UnknownSection(id) => write!(f, "no section {id} on the board"),
            Self::PositionOutOfRange { position, capacity } => {
                write!(f, "position {position} outside a board of {capacity} slots")
            }
            Self::PositionTaken(position) => {
                write!(f, "position {position} requested by more than one section")
            }
            Self::DuplicateSectionId(id) => write!(f, "section id {id} appears twice"),
            Self::DuplicateSectionType(ty) => {
                write!(f, "section type {ty} appears more than once")
            }
            Self::CapacityExceeded { sections, capacity } => {
                write!(f, "{sections} sections do not fit in {capacity} slots")
            }
        }
    }
}

impl std::error::Error for BoardError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offender() {
        let err = BoardError::UnknownSection(SectionId::new("sec-9").unwrap());
        assert_eq!(err.to_string(), "no section sec-9 on the board");
        let err = BoardError::PositionOutOfRange {
            position: 20,
            capacity: 15,
        };
        assert!(err.to_string().contains("20"));
    }
}
