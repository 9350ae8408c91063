#![forbid(unsafe_code)]

//! Editor session: the host-facing adapter around a [`SlotBoard`].
//!
//! The browser host pushes [`HostInput`] values (usually decoded from JSON via
//! [`EditorSession::dispatch_json`]). Each dispatch:
//!
//! 1. applies the input to the board (gesture, collapse toggle, or content
//!    write),
//! 2. plans the backend calls for whatever changed,
//! 3. runs them against the [`CharacterStore`], and
//! 4. returns a [`SessionDispatch`] with the effect, the creation notice (so
//!    the host can open an editor), the commands, and a log entry.
//!
//! Backend failures are logged and published as error notices on the board's
//! event channel. The in-memory transition is kept.

use serde_json::Value;
use sheetcraft_core::{
    BoardConfig, BoardError, BoardEvent, CreationNotice, DropTarget, NoopReason, Notice,
    SectionId, SlotBoard, TransitionEffect, parse_over_id,
};
use tracing::{debug, info, warn};

use crate::input_parser::{HostInput, InputParseError, parse_host_input};
use crate::persistence::{CharacterStore, PersistCommand, StoreError, plan_persistence};
use crate::record::{RecordError, SectionRecord};

/// Errors opening, creating, or deleting a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    Store(StoreError),
    Record(RecordError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Record(e) => write!(f, "record error: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Record(e) => Some(e),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<RecordError> for SessionError {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<BoardError> for SessionError {
    fn from(e: BoardError) -> Self {
        Self::Record(RecordError::Board(e))
    }
}

/// Which host input a dispatch handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    DragStart,
    DragEnd,
    DragCancel,
    ToggleCollapsed,
    SetContent,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The board changed.
    Applied,
    /// Drag start/cancel: only the active id changed.
    Tracked,
    /// Gesture degraded to a no-op.
    Ignored(NoopReason),
    /// Editor write aimed at a section that is not on the board.
    Rejected(String),
}

/// Structured log record for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLogEntry {
    pub sequence: u64,
    pub phase: SessionPhase,
    pub outcome: SessionOutcome,
    /// Backend calls that failed during this dispatch.
    pub persist_failures: usize,
}

/// Result of one host input.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDispatch {
    /// Transition effect for drag ends.
    pub effect: Option<TransitionEffect>,
    /// Set when a palette drop created a section.
    pub creation: Option<CreationNotice>,
    /// Backend calls issued.
    pub commands: Vec<PersistCommand>,
    pub log: SessionLogEntry,
}

/// One open character being edited.
#[derive(Debug)]
pub struct EditorSession<S> {
    store: S,
    character_id: String,
    board: SlotBoard,
    next_sequence: u64,
}

impl<S: CharacterStore> EditorSession<S> {
    /// Fetch `character_id` and hydrate a board from it.
    pub fn open(store: S, character_id: &str, config: BoardConfig) -> Result<Self, SessionError> {
        let record = store.fetch(character_id)?;
        let board = record.to_board(config)?;
        info!(
            character_id,
            sections = board.slots().occupied(),
            "character opened"
        );
        Ok(Self::with_board(store, character_id.to_owned(), board))
    }

    /// Create a new character and start with an empty board.
    pub fn create(mut store: S, title: &str, config: BoardConfig) -> Result<Self, SessionError> {
        let board = SlotBoard::new(config)?;
        let created = store.create(title)?;
        info!(character_id = created.id.as_str(), "character created");
        let mut session = Self::with_board(store, created.id, board);
        let seeded: Vec<PersistCommand> = session
            .board
            .slots()
            .sections()
            .map(|(position, section)| PersistCommand::SaveSection {
                section: SectionRecord::from_section(section, position),
            })
            .collect();
        session.run_commands(&seeded);
        Ok(session)
    }

    fn with_board(store: S, character_id: String, board: SlotBoard) -> Self {
        Self {
            store,
            character_id,
            board,
            next_sequence: 1,
        }
    }

    #[must_use]
    pub fn board(&self) -> &SlotBoard {
        &self.board
    }

    #[must_use]
    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Decode and dispatch one JSON host message. Unhandled kinds give
    /// `Ok(None)`.
    pub fn dispatch_json(
        &mut self,
        json: &str,
    ) -> Result<Option<SessionDispatch>, InputParseError> {
        Ok(parse_host_input(json)?.map(|input| self.dispatch(input)))
    }

    /// Dispatch one host input.
    pub fn dispatch(&mut self, input: HostInput) -> SessionDispatch {
        match input {
            HostInput::DragStart { active_id } => {
                self.board.drag_start(&active_id);
                self.finish(SessionPhase::DragStart, SessionOutcome::Tracked, None, Vec::new())
            }
            HostInput::DragCancel => {
                self.board.drag_cancel();
                self.finish(SessionPhase::DragCancel, SessionOutcome::Tracked, None, Vec::new())
            }
            HostInput::DragEnd { active_id, over_id } => {
                let transition = self.board.drag_end(&active_id, over_id.as_deref());
                let commands = plan_persistence(&transition.effect, &transition.slots);
                let outcome = match transition.noop_reason() {
                    Some(reason) => SessionOutcome::Ignored(reason),
                    None => SessionOutcome::Applied,
                };
                let mut dispatch = self.finish(
                    SessionPhase::DragEnd,
                    outcome,
                    Some(transition.effect.clone()),
                    commands,
                );
                dispatch.creation = transition.creation();
                dispatch
            }
            HostInput::ToggleCollapsed { section_id } => {
                let result = self
                    .resolve_section(&section_id)
                    .and_then(|id| {
                        self.board
                            .toggle_collapsed(&id)
                            .map(|_| id)
                            .map_err(|e| e.to_string())
                    });
                self.finish_edit(SessionPhase::ToggleCollapsed, result)
            }
            HostInput::SetContent {
                section_id,
                content,
            } => {
                let result = self
                    .resolve_section(&section_id)
                    .and_then(|id| self.write_content(id, content));
                self.finish_edit(SessionPhase::SetContent, result)
            }
        }
    }

    /// Delete the character on the backend and announce it.
    pub fn delete_character(&mut self) -> Result<(), SessionError> {
        self.store.delete(&self.character_id)?;
        info!(character_id = self.character_id.as_str(), "character deleted");
        self.board.events().publish(&BoardEvent::CharacterDeleted {
            character_id: self.character_id.clone(),
        });
        Ok(())
    }

    /// Editor ids come in the same loose shapes as drop targets.
    fn resolve_section(&self, raw: &str) -> Result<SectionId, String> {
        match parse_over_id(Some(raw), self.board.slots().as_slice()) {
            DropTarget::Section(id) if self.board.slots().position_of(&id).is_some() => Ok(id),
            _ => Err(format!("unknown section {raw:?}")),
        }
    }

    fn write_content(&mut self, id: SectionId, content: Value) -> Result<SectionId, String> {
        self.board
            .set_content(&id, content)
            .map_err(|e| e.to_string())?;
        Ok(id)
    }

    fn finish_edit(
        &mut self,
        phase: SessionPhase,
        result: Result<SectionId, String>,
    ) -> SessionDispatch {
        match result {
            Ok(id) => {
                let commands = self
                    .board
                    .slots()
                    .sections()
                    .find(|(_, section)| *section.id() == id)
                    .map(|(position, section)| PersistCommand::SaveSection {
                        section: SectionRecord::from_section(section, position),
                    })
                    .into_iter()
                    .collect();
                self.finish(phase, SessionOutcome::Applied, None, commands)
            }
            Err(reason) => {
                debug!(reason = reason.as_str(), "editor write rejected");
                self.finish(phase, SessionOutcome::Rejected(reason), None, Vec::new())
            }
        }
    }

    fn finish(
        &mut self,
        phase: SessionPhase,
        outcome: SessionOutcome,
        effect: Option<TransitionEffect>,
        commands: Vec<PersistCommand>,
    ) -> SessionDispatch {
        let persist_failures = self.run_commands(&commands);
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        SessionDispatch {
            effect,
            creation: None,
            commands,
            log: SessionLogEntry {
                sequence,
                phase,
                outcome,
                persist_failures,
            },
        }
    }

    /// Fire-and-forget: failures become notices, the board is left alone.
    fn run_commands(&mut self, commands: &[PersistCommand]) -> usize {
        let mut failures = 0;
        for command in commands {
            if let Err(e) = command.execute(&mut self.store, &self.character_id) {
                failures += 1;
                warn!(
                    character_id = self.character_id.as_str(),
                    command = command.label(),
                    error = %e,
                    "persist failed"
                );
                self.board
                    .notify(Notice::error(format!("Could not save changes: {e}")));
            }
        }
        failures
    }
}
