#![forbid(unsafe_code)]

//! Browser host adapter for sheetcraft.
//!
//! The host (a JS shim around the drag/drop library) forwards gesture and
//! editor callbacks as JSON. This crate decodes them ([`input_parser`]),
//! drives a [`sheetcraft_core::SlotBoard`] ([`session`]), and mirrors each
//! committed change onto the character backend ([`persistence`], [`record`]).

pub mod input_parser;
pub mod persistence;
pub mod record;
pub mod session;

pub use input_parser::{HostInput, InputParseError, parse_host_input};
pub use persistence::{
    CharacterStore, MemoryCharacterStore, PersistCommand, StoreError, plan_persistence,
};
pub use record::{CharacterRecord, CreatedCharacter, RecordError, SectionRecord};
pub use session::{
    EditorSession, SessionDispatch, SessionError, SessionLogEntry, SessionOutcome, SessionPhase,
};
