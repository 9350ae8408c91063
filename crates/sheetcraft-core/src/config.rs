#![forbid(unsafe_code)]

//! Board configuration as data.
//!
//! ```toml
//! # sheetcraft.toml
//! capacity = 15
//! avatar_section_id = "sec-avatar"
//! section_types = ["Identity", "Lore", "Contact", "Skills"]
//! seed_avatar = true
//! ```
//!
//! ```rust,ignore
//! let config = BoardConfig::from_toml_file("sheetcraft.toml")?;
//! let config = BoardConfig::from_json_str(json)?;
//! ```
//!
//! Loaders validate before returning; [`BoardConfig::validate`] lists every
//! problem rather than stopping at the first.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ids::{SectionId, SectionType};

/// Default number of slots on a character canvas.
pub const DEFAULT_CAPACITY: usize = 15;

/// Tunables for a [`crate::board::SlotBoard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Number of slots. Fixed for the lifetime of a board.
    pub capacity: usize,
    /// Reserved section that can never be deleted by dropping it on the palette.
    pub avatar_section_id: SectionId,
    /// Palette types that may be created. Empty means any type.
    pub section_types: Vec<SectionType>,
    /// Start new boards with the avatar section in slot 0.
    pub seed_avatar: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            avatar_section_id: SectionId::avatar(),
            section_types: Vec::new(),
            seed_avatar: false,
        }
    }
}

impl BoardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of slots.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the reserved avatar section id.
    #[must_use]
    pub fn avatar_section_id(mut self, id: SectionId) -> Self {
        self.avatar_section_id = id;
        self
    }

    /// Restrict creatable palette types.
    #[must_use]
    pub fn section_types(mut self, types: impl IntoIterator<Item = SectionType>) -> Self {
        self.section_types = types.into_iter().collect();
        self
    }

    /// Seed the avatar section into slot 0 of new boards.
    #[must_use]
    pub fn seed_avatar(mut self, seed: bool) -> Self {
        self.seed_avatar = seed;
        self
    }

    /// Whether `section_type` may be created from the palette.
    #[must_use]
    pub fn allows(&self, section_type: &SectionType) -> bool {
        self.section_types.is_empty() || self.section_types.contains(section_type)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, BoardConfigError> {
        let config: Self = toml::from_str(s).map_err(BoardConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, BoardConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BoardConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, BoardConfigError> {
        let config: Self = serde_json::from_str(s).map_err(BoardConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BoardConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(BoardConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.capacity == 0 {
            errors.push("capacity must be > 0".into());
        }

        let mut seen = BTreeSet::new();
        for ty in &self.section_types {
            if !seen.insert(ty) {
                errors.push(format!("section_types lists {ty} more than once"));
            }
        }

        errors
    }

    fn validated(self) -> Result<Self, BoardConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(BoardConfigError::Validation(errors))
        }
    }
}

/// Errors from loading a [`BoardConfig`].
#[derive(Debug)]
pub enum BoardConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for BoardConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for BoardConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-file")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
