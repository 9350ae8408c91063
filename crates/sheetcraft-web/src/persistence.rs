#![forbid(unsafe_code)]

//! Persistence planning and the backend store seam.
//!
//! The board's in-memory transition is the source of truth. After each
//! structural transition, [`plan_persistence`] derives the backend calls that
//! bring the stored character in line, and the session executes them against
//! a [`CharacterStore`]. A failed call is reported, never rolled back.
//!
//! | transition  | command                               |
//! |-------------|---------------------------------------|
//! | created     | `SaveSection` (new section, position) |
//! | moved       | `SaveLayout` (every section)          |
//! | reordered   | `SaveLayout` (every section)          |
//! | deleted     | `DeleteSection`                       |
//! | unchanged   | nothing                               |

use std::collections::BTreeMap;
use std::fmt;

use sheetcraft_core::{SlotGrid, TransitionEffect};

use crate::record::{
    CharacterRecord, CreatedCharacter, SectionRecord, backend_id, records_from_grid,
};

/// Errors reported by a [`CharacterStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No such character.
    NotFound(String),
    /// The backend refused the request.
    Rejected(String),
    /// The backend could not be reached.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "character {id} not found"),
            Self::Rejected(msg) => write!(f, "request rejected: {msg}"),
            Self::Unavailable(msg) => write!(f, "backend unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Backend operations the editor needs.
///
/// Mirrors the REST surface (`GET/POST/DELETE /characters`, plus section
/// writes). Implementations may block; the editor calls them after the
/// in-memory transition has already been committed.
pub trait CharacterStore {
    /// `GET /characters/:id`
    fn fetch(&self, character_id: &str) -> Result<CharacterRecord, StoreError>;
    /// `POST /characters`
    fn create(&mut self, title: &str) -> Result<CreatedCharacter, StoreError>;
    /// `DELETE /characters/:id`
    fn delete(&mut self, character_id: &str) -> Result<(), StoreError>;
    /// Insert or update one section.
    fn save_section(&mut self, character_id: &str, section: &SectionRecord)
    -> Result<(), StoreError>;
    /// Remove one section.
    fn delete_section(&mut self, character_id: &str, section_id: &str) -> Result<(), StoreError>;
    /// Replace every section (positions included).
    fn save_layout(
        &mut self,
        character_id: &str,
        sections: &[SectionRecord],
    ) -> Result<(), StoreError>;
}

/// One backend call derived from a transition or an edit.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistCommand {
    SaveSection { section: SectionRecord },
    DeleteSection { section_id: String },
    SaveLayout { sections: Vec<SectionRecord> },
}

impl PersistCommand {
    /// Short label for logs.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SaveSection { .. } => "save_section",
            Self::DeleteSection { .. } => "delete_section",
            Self::SaveLayout { .. } => "save_layout",
        }
    }

    /// Run this command against `store`.
    pub fn execute<S: CharacterStore + ?Sized>(
        &self,
        store: &mut S,
        character_id: &str,
    ) -> Result<(), StoreError> {
        match self {
            Self::SaveSection { section } => store.save_section(character_id, section),
            Self::DeleteSection { section_id } => store.delete_section(character_id, section_id),
            Self::SaveLayout { sections } => store.save_layout(character_id, sections),
        }
    }
}

/// Backend calls for a transition. `grid` is the grid *after* the transition.
#[must_use]
pub fn plan_persistence(effect: &TransitionEffect, grid: &SlotGrid) -> Vec<PersistCommand> {
    match effect {
        TransitionEffect::Created { section, index } => vec![PersistCommand::SaveSection {
            section: SectionRecord::from_section(section, *index),
        }],
        TransitionEffect::Moved { .. } | TransitionEffect::Reordered { .. } => {
            vec![PersistCommand::SaveLayout {
                sections: records_from_grid(grid),
            }]
        }
        TransitionEffect::Deleted { section, .. } => vec![PersistCommand::DeleteSection {
            section_id: backend_id(section),
        }],
        TransitionEffect::Unchanged(_) => Vec::new(),
    }
}

/// In-process [`CharacterStore`] used by tests and offline mode.
///
/// `fail_next` makes the next mutating call return the given error without
/// touching stored state.
#[derive(Debug, Clone, Default)]
pub struct MemoryCharacterStore {
    characters: BTreeMap<String, CharacterRecord>,
    next_id: u64,
    fail_next: Option<StoreError>,
    calls: Vec<&'static str>,
}

impl MemoryCharacterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly.
    pub fn insert(&mut self, record: CharacterRecord) {
        self.characters.insert(record.id.clone(), record);
    }

    #[must_use]
    pub fn get(&self, character_id: &str) -> Option<&CharacterRecord> {
        self.characters.get(character_id)
    }

    /// Fail the next mutating call with `error`.
    pub fn fail_next(&mut self, error: StoreError) {
        self.fail_next = Some(error);
    }

    /// Names of the mutating calls received so far.
    #[must_use]
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    fn begin(&mut self, call: &'static str) -> Result<(), StoreError> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn character_mut(&mut self, character_id: &str) -> Result<&mut CharacterRecord, StoreError> {
        self.characters
            .get_mut(character_id)
            .ok_or_else(|| StoreError::NotFound(character_id.to_owned()))
    }
}

impl CharacterStore for MemoryCharacterStore {
    fn fetch(&self, character_id: &str) -> Result<CharacterRecord, StoreError> {
        self.characters
            .get(character_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(character_id.to_owned()))
    }

    fn create(&mut self, title: &str) -> Result<CreatedCharacter, StoreError> {
        self.begin("create")?;
        self.next_id += 1;
        let id = format!("c{}", self.next_id);
        self.characters.insert(
            id.clone(),
            CharacterRecord {
                id: id.clone(),
                title: title.to_owned(),
                sections: Vec::new(),
                avatar: serde_json::Value::Null,
            },
        );
        Ok(CreatedCharacter { id })
    }

    fn delete(&mut self, character_id: &str) -> Result<(), StoreError> {
        self.begin("delete")?;
        self.characters
            .remove(character_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(character_id.to_owned()))
    }

    fn save_section(
        &mut self,
        character_id: &str,
        section: &SectionRecord,
    ) -> Result<(), StoreError> {
        self.begin("save_section")?;
        let character = self.character_mut(character_id)?;
        match character.sections.iter_mut().find(|s| s.id == section.id) {
            Some(existing) => *existing = section.clone(),
            None => character.sections.push(section.clone()),
        }
        Ok(())
    }

    fn delete_section(&mut self, character_id: &str, section_id: &str) -> Result<(), StoreError> {
        self.begin("delete_section")?;
        let character = self.character_mut(character_id)?;
        character.sections.retain(|s| s.id != section_id);
        Ok(())
    }

    fn save_layout(
        &mut self,
        character_id: &str,
        sections: &[SectionRecord],
    ) -> Result<(), StoreError> {
        self.begin("save_layout")?;
        let character = self.character_mut(character_id)?;
        character.sections = sections.to_vec();
        Ok(())
    }
}
