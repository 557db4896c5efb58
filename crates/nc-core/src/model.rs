//! Note data model.
//!
//! A canvas holds an ordered set of notes (paint order, last = topmost).
//! Each note is a positioned, sized box in world space carrying one of three
//! payloads: text, a drawing scene, or a link card to another canvas.

use crate::id::{CanvasId, NoteId};
use crate::transform::WorldRect;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Smallest width/height a resizable note may take, in world units.
pub const MIN_NOTE_SIZE: f64 = 100.0;

pub const DEFAULT_TEXT_NOTE_SIZE: (f64, f64) = (240.0, 160.0);
pub const DEFAULT_DRAWING_NOTE_SIZE: (f64, f64) = (320.0, 240.0);
pub const DEFAULT_LINK_CARD_SIZE: (f64, f64) = (200.0, 100.0);
pub const DEFAULT_NOTE_COLOR: &str = "#FFF9C4";

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    DuplicateNote(NoteId),
    NoteNotFound(NoteId),
    DuplicateCanvas(CanvasId),
    CanvasNotFound(CanvasId),
    /// The home canvas cannot be removed or renamed.
    HomeCanvasLocked,
    InvalidColor(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNote(id) => write!(f, "note already on canvas: {id}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::DuplicateCanvas(id) => write!(f, "canvas already exists: {id}"),
            Self::CanvasNotFound(id) => write!(f, "canvas not found: {id}"),
            Self::HomeCanvasLocked => f.write_str("the home canvas cannot be removed or renamed"),
            Self::InvalidColor(value) => write!(f, "invalid hex color: `{value}`"),
        }
    }
}

impl std::error::Error for ModelError {}

// ─── Colors ──────────────────────────────────────────────────────────────

/// Accepts `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 4 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

// ─── Drawing payload ─────────────────────────────────────────────────────

/// Structured drawing-scene payload: element list, view state, and the
/// embedded-file map keyed by file id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingScene {
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default)]
    pub app_state: Map<String, Value>,
    #[serde(default)]
    pub files: BTreeMap<String, Value>,
}

impl DrawingScene {
    /// Stable id of an element, if it carries one.
    pub fn element_id(element: &Value) -> Option<&str> {
        element.get("id").and_then(Value::as_str)
    }

    /// Elements ordered by id. Elements without an id keep their relative
    /// order after all id-bearing elements.
    pub fn sorted_elements(&self) -> Vec<&Value> {
        let mut sorted: Vec<&Value> = self.elements.iter().collect();
        sorted.sort_by(|a, b| match (Self::element_id(a), Self::element_id(b)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        sorted
    }
}

// ─── Notes ───────────────────────────────────────────────────────────────

/// Variant payload of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NoteKind {
    TextNote { content: String },
    DrawingNote { scene: DrawingScene },
    CanvasLinkCard { target: CanvasId },
}

impl NoteKind {
    pub fn text(content: impl Into<String>) -> Self {
        Self::TextNote {
            content: content.into(),
        }
    }

    /// Only drawing notes expose resize handles.
    pub fn is_resizable(&self) -> bool {
        matches!(self, Self::DrawingNote { .. })
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::TextNote { .. } => "text-note",
            Self::DrawingNote { .. } => "drawing-note",
            Self::CanvasLinkCard { .. } => "canvas-link-card",
        }
    }

    fn default_size(&self) -> (f64, f64) {
        match self {
            Self::TextNote { .. } => DEFAULT_TEXT_NOTE_SIZE,
            Self::DrawingNote { .. } => DEFAULT_DRAWING_NOTE_SIZE,
            Self::CanvasLinkCard { .. } => DEFAULT_LINK_CARD_SIZE,
        }
    }
}

/// A positioned, sized item on a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: NoteId,
    pub world_x: f64,
    pub world_y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub file_path: Option<PathBuf>,
    pub title: Option<String>,
    pub kind: NoteKind,
}

impl Note {
    /// A note of default size for its kind, top-left at `(world_x, world_y)`.
    pub fn new(id: NoteId, world_x: f64, world_y: f64, kind: NoteKind) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id,
            world_x,
            world_y,
            width,
            height,
            color: DEFAULT_NOTE_COLOR.to_string(),
            file_path: None,
            title: None,
            kind,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Finite position and positive finite size. Renderers and hit testing
    /// skip notes that fail this check.
    pub fn is_well_formed(&self) -> bool {
        self.world_x.is_finite()
            && self.world_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    pub fn bounds(&self) -> WorldRect {
        WorldRect {
            x: self.world_x,
            y: self.world_y,
            width: self.width,
            height: self.height,
        }
    }

    /// Backing file name (with extension), if persisted.
    pub fn file_name(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str())
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.kind {
            NoteKind::TextNote { content } => Some(content),
            _ => None,
        }
    }

    /// Width / height at this instant.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

// ─── Note set ────────────────────────────────────────────────────────────

/// Ordered note collection for one canvas with O(1) lookup by id.
#[derive(Debug, Clone, Default)]
pub struct NoteSet {
    notes: Vec<Note>,
    id_index: HashMap<NoteId, usize>,
}

impl NoteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Result<Self, ModelError> {
        let mut set = Self::new();
        for note in notes {
            set.insert(note)?;
        }
        Ok(set)
    }

    /// Append a note on top of the paint order.
    pub fn insert(&mut self, note: Note) -> Result<(), ModelError> {
        if self.id_index.contains_key(&note.id) {
            return Err(ModelError::DuplicateNote(note.id));
        }
        self.id_index.insert(note.id, self.notes.len());
        self.notes.push(note);
        Ok(())
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.id_index.get(&id).and_then(|&i| self.notes.get(i))
    }

    pub fn get_mut(&mut self, id: NoteId) -> Option<&mut Note> {
        let i = *self.id_index.get(&id)?;
        self.notes.get_mut(i)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Remove a note from the set. Its backing file is not touched.
    pub fn detach(&mut self, id: NoteId) -> Option<Note> {
        let i = self.id_index.remove(&id)?;
        let note = self.notes.remove(i);
        for idx in self.id_index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(note)
    }

    /// Bottom-to-top paint order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

// ─── Canvas index ────────────────────────────────────────────────────────

/// Ordered list of canvases. The home canvas is always present and first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CanvasId>", into = "Vec<CanvasId>")]
pub struct CanvasIndex {
    canvases: Vec<CanvasId>,
}

impl Default for CanvasIndex {
    fn default() -> Self {
        Self {
            canvases: vec![CanvasId::home()],
        }
    }
}

impl From<Vec<CanvasId>> for CanvasIndex {
    fn from(ids: Vec<CanvasId>) -> Self {
        Self::from_ids(ids)
    }
}

impl From<CanvasIndex> for Vec<CanvasId> {
    fn from(index: CanvasIndex) -> Self {
        index.canvases
    }
}

impl CanvasIndex {
    /// Build from a stored list, putting home first and
    /// dropping duplicates.
    pub fn from_ids(ids: impl IntoIterator<Item = CanvasId>) -> Self {
        let mut index = Self::default();
        for id in ids {
            if !index.contains(&id) {
                index.canvases.push(id);
            }
        }
        index
    }

    pub fn ids(&self) -> &[CanvasId] {
        &self.canvases
    }

    pub fn contains(&self, id: &CanvasId) -> bool {
        self.canvases.contains(id)
    }

    pub fn add(&mut self, id: CanvasId) -> Result<(), ModelError> {
        if self.contains(&id) {
            return Err(ModelError::DuplicateCanvas(id));
        }
        self.canvases.push(id);
        Ok(())
    }

    pub fn remove(&mut self, id: &CanvasId) -> Result<(), ModelError> {
        if id.is_home() {
            return Err(ModelError::HomeCanvasLocked);
        }
        let pos = self
            .canvases
            .iter()
            .position(|c| c == id)
            .ok_or_else(|| ModelError::CanvasNotFound(id.clone()))?;
        self.canvases.remove(pos);
        Ok(())
    }

    pub fn rename(&mut self, from: &CanvasId, to: CanvasId) -> Result<(), ModelError> {
        if from.is_home() || to.is_home() {
            return Err(ModelError::HomeCanvasLocked);
        }
        if self.contains(&to) {
            return Err(ModelError::DuplicateCanvas(to));
        }
        let slot = self
            .canvases
            .iter_mut()
            .find(|c| *c == from)
            .ok_or_else(|| ModelError::CanvasNotFound(from.clone()))?;
        *slot = to;
        Ok(())
    }
}
