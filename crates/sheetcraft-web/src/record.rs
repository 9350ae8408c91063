#![forbid(unsafe_code)]

//! Backend record contract.
//!
//! `GET /characters/:id` returns a [`CharacterRecord`]; `POST /characters`
//! returns a [`CreatedCharacter`]. Section ids in these records are whatever
//! the backend issued. On the board every section id carries the `sec-`
//! prefix, so a raw backend id `42` becomes `sec-42` with `42` kept as the
//! section's origin id. Converting back restores the backend id. Backend ids
//! that would read as a drop target once prefixed (`palette`, `empty-2`) are
//! rejected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sheetcraft_core::ids::SECTION_ID_PREFIX;
use sheetcraft_core::{
    BoardConfig, BoardError, IdError, Section, SectionId, SectionType, SlotBoard, SlotGrid,
};

/// One persisted section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub collapsed: bool,
    /// Slot index. Older records omit it and are packed in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// A persisted character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionRecord>,
    #[serde(default)]
    pub avatar: Value,
}

/// Response body of `POST /characters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCharacter {
    pub id: String,
}

/// Errors converting records into a board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A section record's id could not become a section id.
    SectionId { record_id: String, source: IdError },
    /// A section record's type is not a valid section type.
    SectionType { record_id: String, source: IdError },
    /// The sections do not fit the board.
    Board(BoardError),
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionId { record_id, source } => {
                write!(f, "section record {record_id:?}: {source}")
            }
            Self::SectionType { record_id, source } => {
                write!(f, "section record {record_id:?} type: {source}")
            }
            Self::Board(e) => write!(f, "record does not fit the board: {e}"),
        }
    }
}

impl std::error::Error for RecordError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SectionId { source, .. } | Self::SectionType { source, .. } => Some(source),
            Self::Board(e) => Some(e),
        }
    }
}

impl From<BoardError> for RecordError {
    fn from(e: BoardError) -> Self {
        Self::Board(e)
    }
}

impl SectionRecord {
    /// Board section for this record.
    pub fn to_section(&self) -> Result<Section, RecordError> {
        let section_type =
            SectionType::new(self.section_type.clone()).map_err(|source| RecordError::SectionType {
                record_id: self.id.clone(),
                source,
            })?;
        let section_id_err = |source| RecordError::SectionId {
            record_id: self.id.clone(),
            source,
        };
        let section = if self.id.starts_with(SECTION_ID_PREFIX) {
            Section::new(SectionId::new(self.id.clone()).map_err(section_id_err)?, section_type)
        } else {
            Section::new(SectionId::from_token(&self.id).map_err(section_id_err)?, section_type)
                .with_origin_id(self.id.clone())
        };
        Ok(section
            .with_content(self.content.clone())
            .with_collapsed(self.collapsed))
    }

    /// Record for a board section at `position`, restoring its backend id.
    #[must_use]
    pub fn from_section(section: &Section, position: usize) -> Self {
        Self {
            id: backend_id(section),
            section_type: section.section_type().to_string(),
            content: section.content().clone(),
            collapsed: section.collapsed(),
            position: Some(position),
        }
    }
}

/// Id the backend knows a section by.
#[must_use]
pub fn backend_id(section: &Section) -> String {
    section
        .origin_id()
        .map_or_else(|| section.id().to_string(), str::to_owned)
}

impl CharacterRecord {
    /// Hydrate a board from this record.
    pub fn to_board(&self, config: BoardConfig) -> Result<SlotBoard, RecordError> {
        let sections = self
            .sections
            .iter()
            .map(|record| Ok((record.position, record.to_section()?)))
            .collect::<Result<Vec<_>, RecordError>>()?;
        Ok(SlotBoard::hydrate(config, sections)?)
    }
}

/// Section records for every occupied slot, in grid order.
#[must_use]
pub fn records_from_grid(grid: &SlotGrid) -> Vec<SectionRecord> {
    grid.sections()
        .map(|(position, section)| SectionRecord::from_section(section, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sheetcraft_core::Slot;

    use super::*;

    fn sample() -> CharacterRecord {
        serde_json::from_value(json!({
            "id": "c1",
            "title": "Ayla",
            "sections": [
                {"id": "42", "type": "Lore", "content": {"text": "born"}, "collapsed": true},
                {"id": "sec-avatar", "type": "Avatar", "position": 0},
                {"id": "s7", "type": "Contact", "content": null, "collapsed": false, "position": 4}
            ],
            "avatar": {"hair": "red"}
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_backend_shape() {
        let record = sample();
        assert_eq!(record.sections.len(), 3);
        assert_eq!(record.sections[0].section_type, "Lore");
        assert_eq!(record.sections[1].content, Value::Null);
        assert_eq!(record.sections[2].position, Some(4));
    }

    #[test]
    fn hydrates_with_prefixed_ids_and_origins() {
        let board = sample().to_board(BoardConfig::default().capacity(6)).unwrap();
        let slots = board.slots();
        let ids: Vec<String> = slots.iter().map(Slot::id).collect();
        assert_eq!(
            ids,
            ["sec-avatar", "sec-42", "empty-2", "empty-3", "sec-s7", "empty-5"]
        );
        let lore = slots.get(1).and_then(Slot::as_section).unwrap();
        assert_eq!(lore.origin_id(), Some("42"));
        assert!(lore.collapsed());
        assert_eq!(lore.content(), &json!({"text": "born"}));
    }

    #[test]
    fn grid_records_restore_backend_ids() {
        let board = sample().to_board(BoardConfig::default().capacity(6)).unwrap();
        let records = records_from_grid(board.slots());
        let ids: Vec<(&str, Option<usize>)> = records
            .iter()
            .map(|r| (r.id.as_str(), r.position))
            .collect();
        assert_eq!(
            ids,
            [("sec-avatar", Some(0)), ("42", Some(1)), ("s7", Some(4))]
        );
    }

    #[test]
    fn invalid_type_is_reported() {
        let mut record = sample();
        record.sections[0].section_type = String::new();
        let err = record.to_board(BoardConfig::default()).unwrap_err();
        assert!(matches!(err, RecordError::SectionType { ref record_id, .. } if record_id == "42"));
    }

    #[test]
    fn overfull_record_is_board_error() {
        let err = sample()
            .to_board(BoardConfig::default().capacity(2))
            .unwrap_err();
        assert!(matches!(err, RecordError::Board(BoardError::CapacityExceeded { .. })));
    }

    #[test]
    fn backend_ids_shadowing_drop_targets_are_rejected() {
        for id in ["palette", "empty-2", "sec-palette", "sec-empty-0"] {
            let mut record = sample();
            record.sections[0].id = id.to_owned();
            let err = record.to_board(BoardConfig::default()).unwrap_err();
            assert!(
                matches!(
                    err,
                    RecordError::SectionId {
                        ref record_id,
                        source: IdError::ReservedToken(_),
                    } if record_id == id
                ),
                "{id}: {err:?}"
            );
        }
    }

    #[test]
    fn position_is_omitted_when_absent() {
        let record = SectionRecord {
            id: "1".into(),
            section_type: "Lore".into(),
            content: Value::Null,
            collapsed: false,
            position: None,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"id": "1", "type": "Lore", "content": null, "collapsed": false})
        );
    }
}
