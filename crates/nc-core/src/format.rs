//! On-disk note file formats.
//!
//! - Text notes: the first line is the title, the remainder is the body
//!   (markdown with `[[link]]` and `![[image]]` tokens).
//! - Drawing notes: a JSON document tagged with type/version/source that
//!   carries the element list, view state, and embedded-file map.

use crate::links::scan_tokens;
use crate::model::DrawingScene;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const DRAWING_TYPE: &str = "excalidraw";
pub const DRAWING_VERSION: u32 = 2;
pub const DRAWING_SOURCE: &str = "notecanvas";

pub const TEXT_NOTE_EXTENSION: &str = "md";
pub const DRAWING_NOTE_EXTENSION: &str = "excalidraw";

#[derive(Debug)]
pub enum FormatError {
    Json(serde_json::Error),
    WrongType(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "malformed drawing document: {err}"),
            Self::WrongType(found) => {
                write!(f, "not a drawing document: type `{found}`, expected `{DRAWING_TYPE}`")
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::WrongType(_) => None,
        }
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

// ─── Text notes ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextNoteFile {
    pub title: String,
    pub body: String,
}

/// Split a text-note file into title (first line) and body.
pub fn parse_text_note(text: &str) -> TextNoteFile {
    let (title, body) = text.split_once('\n').unwrap_or((text, ""));
    TextNoteFile {
        title: title.trim_end_matches('\r').to_string(),
        body: body.to_string(),
    }
}

pub fn emit_text_note(file: &TextNoteFile) -> String {
    format!("{}\n{}", file.title, file.body)
}

/// Targets of `![[image]]` embeds in a text body.
pub fn image_tokens(body: &str) -> Vec<&str> {
    scan_tokens(body)
        .into_iter()
        .filter(|t| t.embed)
        .map(|t| t.target)
        .collect()
}

// ─── Drawing notes ───────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawingDocument {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    version: u32,
    #[serde(default)]
    source: String,
    #[serde(default)]
    elements: Vec<Value>,
    #[serde(default)]
    app_state: Map<String, Value>,
    #[serde(default)]
    files: BTreeMap<String, Value>,
}

/// Decode a drawing-note file.
pub fn parse_drawing_document(bytes: &[u8]) -> Result<DrawingScene, FormatError> {
    let doc: DrawingDocument = serde_json::from_slice(bytes)?;
    if doc.kind != DRAWING_TYPE {
        return Err(FormatError::WrongType(doc.kind));
    }
    Ok(DrawingScene {
        elements: doc.elements,
        app_state: doc.app_state,
        files: doc.files,
    })
}

/// Encode a drawing scene as a tagged drawing document.
pub fn emit_drawing_document(scene: &DrawingScene) -> Result<Vec<u8>, FormatError> {
    let doc = DrawingDocument {
        kind: DRAWING_TYPE.to_string(),
        version: DRAWING_VERSION,
        source: DRAWING_SOURCE.to_string(),
        elements: scene.elements.clone(),
        app_state: scene.app_state.clone(),
        files: scene.files.clone(),
    };
    Ok(serde_json::to_vec_pretty(&doc)?)
}
