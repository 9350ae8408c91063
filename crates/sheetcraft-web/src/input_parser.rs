#![forbid(unsafe_code)]

//! JSON input parser for gesture and editor messages sent by the browser host.
//!
//! The host serializes each callback as one JSON object with a `kind` field:
//!
//! ```json
//! {"kind": "drag_start", "active_id": "type-Lore"}
//! {"kind": "drag_end", "active_id": "type-Lore", "over_id": "empty-3"}
//! {"kind": "drag_end", "active_id": "sec-4", "over_id": null}
//! {"kind": "drag_cancel"}
//! {"kind": "toggle_collapsed", "section_id": "sec-4"}
//! {"kind": "set_content", "section_id": "sec-4", "content": {"text": "..."}}
//! ```
//!
//! Kinds this adapter does not handle (hover, resize observers, ...) return
//! `Ok(None)`.

use serde::Deserialize;
use serde_json::Value;

/// Errors from parsing host input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
        }
    }
}

impl std::error::Error for InputParseError {}

/// Decoded host message.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    DragStart {
        active_id: String,
    },
    DragEnd {
        active_id: String,
        over_id: Option<String>,
    },
    DragCancel,
    ToggleCollapsed {
        section_id: String,
    },
    SetContent {
        section_id: String,
        content: Value,
    },
}

#[derive(Debug, Deserialize)]
struct RawInput {
    kind: String,
    #[serde(default)]
    active_id: Option<String>,
    #[serde(default)]
    over_id: Option<String>,
    #[serde(default)]
    section_id: Option<String>,
    #[serde(default)]
    content: Value,
}

/// Parse one host message.
pub fn parse_host_input(json: &str) -> Result<Option<HostInput>, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    let input = match raw.kind.as_str() {
        "drag_start" => HostInput::DragStart {
            active_id: raw
                .active_id
                .ok_or(InputParseError::MissingField("active_id"))?,
        },
        "drag_end" => HostInput::DragEnd {
            active_id: raw
                .active_id
                .ok_or(InputParseError::MissingField("active_id"))?,
            over_id: raw.over_id,
        },
        "drag_cancel" => HostInput::DragCancel,
        "toggle_collapsed" => HostInput::ToggleCollapsed {
            section_id: raw
                .section_id
                .ok_or(InputParseError::MissingField("section_id"))?,
        },
        "set_content" => HostInput::SetContent {
            section_id: raw
                .section_id
                .ok_or(InputParseError::MissingField("section_id"))?,
            content: raw.content,
        },
        _ => return Ok(None),
    };
    Ok(Some(input))
}
