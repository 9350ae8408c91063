#![forbid(unsafe_code)]

//! Core: slot model, drop-target normalization, and drag/drop reconciliation
//! for the sheetcraft character-sheet editor.
//!
//! # Role in sheetcraft
//! The editor canvas is a fixed grid of slots, each an empty placeholder or a
//! section (Identity, Lore, Contact, ...). The rendering layer reports drag
//! gestures as loosely formatted id strings; this crate turns them into typed
//! sources and targets and decides what each gesture does to the grid.
//!
//! # Primary responsibilities
//! - **SlotGrid**: the fixed-length slot sequence and its invariants.
//! - **parse_over_id / parse_active_id**: id normalization.
//! - **reconcile**: the total transition function (create, move, reorder,
//!   delete, or no-op).
//! - **SlotBoard**: stateful owner that commits transitions and publishes
//!   [`BoardEvent`]s on a typed [`EventChannel`].
//!
//! # How it fits in the system
//! `sheetcraft-web` feeds host gestures into a [`SlotBoard`] and turns the
//! resulting transitions into backend persistence calls. Nothing in this
//! crate does I/O besides optional config file loading.

pub mod board;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod reconcile;
pub mod slot;
pub mod target;

pub use board::SlotBoard;
pub use config::{BoardConfig, BoardConfigError};
pub use error::BoardError;
pub use events::{BoardEvent, EventChannel, Notice, NoticeLevel, Subscription};
pub use ids::{IdError, SectionId, SectionIdFactory, SectionType};
pub use reconcile::{
    CreationNotice, NoopReason, ReconcileContext, Transition, TransitionEffect, reconcile,
};
pub use slot::{EmptySlot, Section, Slot, SlotGrid};
pub use target::{DragSource, DropTarget, parse_active_id, parse_over_id};
