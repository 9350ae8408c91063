#![forbid(unsafe_code)]

//! Identifier types for the slot grid and the section id factory.
//!
//! The rendering layer speaks in prefixed strings (`type-Lore`, `sec-12`,
//! `empty-3`, `palette`). Inside the crate those strings are lifted into
//! [`SectionId`] and [`SectionType`] as early as possible; only
//! [`crate::target`] deals with the raw forms.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix carried by every occupied-slot id.
pub const SECTION_ID_PREFIX: &str = "sec-";
/// Prefix of placeholder ids (`empty-<index>`).
pub const EMPTY_ID_PREFIX: &str = "empty-";
/// Prefix of palette drag sources (`type-<SectionType>`).
pub const PALETTE_TYPE_PREFIX: &str = "type-";
/// Drop-target id of the palette (the deletion zone).
pub const PALETTE_ID: &str = "palette";

const AVATAR_TOKEN: &str = "avatar";

/// Errors from constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Section id does not start with [`SECTION_ID_PREFIX`].
    MissingPrefix(String),
    /// Nothing follows the prefix.
    EmptyToken,
    /// Ids and types may not contain whitespace.
    Whitespace(String),
    /// Token would read as another namespace once the prefix is stripped
    /// (`palette`, `empty-<n>`, a second `sec-`).
    ReservedToken(String),
    /// Section type is the empty string.
    EmptySectionType,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPrefix(raw) => {
                write!(f, "section id {raw:?} lacks the {SECTION_ID_PREFIX:?} prefix")
            }
            Self::EmptyToken => write!(f, "section id has an empty token"),
            Self::Whitespace(raw) => write!(f, "identifier {raw:?} contains whitespace"),
            Self::ReservedToken(raw) => {
                write!(f, "section id {raw:?} collides with a reserved target id")
            }
            Self::EmptySectionType => write!(f, "section type must not be empty"),
        }
    }
}

impl std::error::Error for IdError {}

/// Identifier of an occupied slot: `sec-<token>`.
///
/// Assigned once when the section is created and never reused within a
/// session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionId(String);

impl SectionId {
    /// Validate a full `sec-<token>` id.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        let Some(token) = raw.strip_prefix(SECTION_ID_PREFIX) else {
            return Err(IdError::MissingPrefix(raw));
        };
        if token.is_empty() {
            return Err(IdError::EmptyToken);
        }
        if token == PALETTE_ID
            || token.starts_with(EMPTY_ID_PREFIX)
            || token.starts_with(SECTION_ID_PREFIX)
        {
            return Err(IdError::ReservedToken(raw));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(raw));
        }
        Ok(Self(raw))
    }

    /// Build `sec-<token>` from a bare token.
    pub fn from_token(token: &str) -> Result<Self, IdError> {
        Self::new(format!("{SECTION_ID_PREFIX}{token}"))
    }

    /// The reserved avatar section id, `sec-avatar`.
    #[must_use]
    pub fn avatar() -> Self {
        Self(format!("{SECTION_ID_PREFIX}{AVATAR_TOKEN}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part after `sec-`.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.0[SECTION_ID_PREFIX.len()..]
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SectionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionId> for String {
    fn from(value: SectionId) -> Self {
        value.0
    }
}

/// Kind of a section (`Identity`, `Lore`, `Contact`, ...).
///
/// Immutable once a section is created.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionType(String);

impl SectionType {
    pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdError::EmptySectionType);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(IdError::Whitespace(raw));
        }
        Ok(Self(raw))
    }

    /// Type of the reserved avatar section.
    #[must_use]
    pub fn avatar() -> Self {
        Self("Avatar".to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SectionType {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SectionType> for String {
    fn from(value: SectionType) -> Self {
        value.0
    }
}

/// Placeholder id for the slot at `index`.
#[must_use]
pub fn empty_slot_id(index: usize) -> String {
    format!("{EMPTY_ID_PREFIX}{index}")
}

/// Counter-based section id source.
///
/// Ids are `sec-<n>` with `n` strictly increasing, so two calls on the same
/// factory never return the same id. [`observe`](Self::observe) lifts the
/// floor past ids that already exist on a board. Once `u64::MAX` has been
/// issued or observed the factory is exhausted and issues nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionIdFactory {
    /// `None` once exhausted.
    next: Option<u64>,
}

impl Default for SectionIdFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionIdFactory {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Start issuing at `next` (clamped to at least 1).
    #[must_use]
    pub const fn starting_at(next: u64) -> Self {
        Self {
            next: Some(if next == 0 { 1 } else { next }),
        }
    }

    /// Value the next call to [`next_id`](Self::next_id) will use.
    #[must_use]
    pub const fn peek(&self) -> Option<u64> {
        self.next
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    /// Make sure ids issued from now on cannot equal `existing`.
    pub fn observe(&mut self, existing: &SectionId) {
        let (Some(next), Ok(n)) = (self.next, existing.token().parse::<u64>()) else {
            return;
        };
        if n >= next {
            self.next = n.checked_add(1);
        }
    }

    /// Issue a fresh id, or `None` when the counter is exhausted.
    pub fn next_id(&mut self) -> Option<SectionId> {
        let n = self.next?;
        self.next = n.checked_add(1);
        Some(SectionId(format!("{SECTION_ID_PREFIX}{n}")))
    }
}
