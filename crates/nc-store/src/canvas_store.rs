//! Canvas layout persistence: the canvas index plus, per canvas, the camera
//! and note placements. Note content lives in the note files themselves.
//!
//! Layout files sit under `<vault>/<meta_dir>/`:
//!
//! ```text
//! canvases.json          ["home", "research", ...]
//! canvases/<id>.json     { "camera": {...}, "notes": [...] }
//! ```

use crate::error::{StoreError, StoreResult};
use crate::persistence::PersistenceService;
use async_trait::async_trait;
use nc_core::model::{CanvasIndex, DrawingScene, Note, NoteKind, is_hex_color};
use nc_core::{Camera, CanvasId, NoteId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const INDEX_FILE: &str = "canvases.json";
const CANVAS_DIR: &str = "canvases";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    #[default]
    TextNote,
    DrawingNote,
    CanvasLinkCard,
}

impl From<&NoteKind> for RecordKind {
    fn from(kind: &NoteKind) -> Self {
        match kind {
            NoteKind::TextNote { .. } => Self::TextNote,
            NoteKind::DrawingNote { .. } => Self::DrawingNote,
            NoteKind::CanvasLinkCard { .. } => Self::CanvasLinkCard,
        }
    }
}

/// Stored placement of one note.
///
/// Older layouts wrote `x`/`y`/`w`/`h`; those names are still accepted.
/// Absent values fall back to the note's current placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: NoteId,
    #[serde(rename = "type", default)]
    pub kind: RecordKind,
    #[serde(default, alias = "x", skip_serializing_if = "Option::is_none")]
    pub world_x: Option<f64>,
    #[serde(default, alias = "y", skip_serializing_if = "Option::is_none")]
    pub world_y: Option<f64>,
    #[serde(default, alias = "w", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, alias = "h", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Destination canvas of a link card.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<CanvasId>,
}

impl NoteRecord {
    pub fn from_note(note: &Note) -> Self {
        let target = match &note.kind {
            NoteKind::CanvasLinkCard { target } => Some(target.clone()),
            _ => None,
        };
        Self {
            id: note.id,
            kind: RecordKind::from(&note.kind),
            world_x: Some(note.world_x),
            world_y: Some(note.world_y),
            width: Some(note.width),
            height: Some(note.height),
            color: Some(note.color.clone()),
            file_path: note.file_path.clone(),
            title: note.title.clone(),
            target,
        }
    }

    /// Build the note this record describes. `existing` supplies content
    /// and any placement the record leaves out.
    pub fn into_note(self, existing: Option<&Note>) -> Note {
        let existing_kind = existing.map(|n| &n.kind);
        let kind = match (self.kind, existing_kind) {
            (RecordKind::TextNote, Some(k @ NoteKind::TextNote { .. }))
            | (RecordKind::DrawingNote, Some(k @ NoteKind::DrawingNote { .. })) => k.clone(),
            (RecordKind::CanvasLinkCard, existing_kind) => {
                let fallback = match existing_kind {
                    Some(NoteKind::CanvasLinkCard { target }) => target.clone(),
                    _ => CanvasId::home(),
                };
                NoteKind::CanvasLinkCard {
                    target: self.target.unwrap_or(fallback),
                }
            }
            (RecordKind::TextNote, _) => NoteKind::text(""),
            (RecordKind::DrawingNote, _) => NoteKind::DrawingNote {
                scene: DrawingScene::default(),
            },
        };

        let mut note = Note::new(self.id, 0.0, 0.0, kind);
        if let Some(e) = existing {
            note.world_x = e.world_x;
            note.world_y = e.world_y;
            note.width = e.width;
            note.height = e.height;
            note.color = e.color.clone();
            note.file_path = e.file_path.clone();
            note.title = e.title.clone();
        }
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        let positive = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        note.world_x = finite(self.world_x).unwrap_or(note.world_x);
        note.world_y = finite(self.world_y).unwrap_or(note.world_y);
        note.width = positive(self.width).unwrap_or(note.width);
        note.height = positive(self.height).unwrap_or(note.height);
        if let Some(color) = self.color.filter(|c| is_hex_color(c)) {
            note.color = color;
        }
        if self.file_path.is_some() {
            note.file_path = self.file_path;
        }
        if self.title.is_some() {
            note.title = self.title;
        }
        note
    }
}

/// Saved layout of one canvas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasState {
    pub camera: Camera,
    pub notes: Vec<NoteRecord>,
}

impl CanvasState {
    pub fn capture<'a>(camera: Camera, notes: impl IntoIterator<Item = &'a Note>) -> Self {
        Self {
            camera,
            notes: notes.into_iter().map(NoteRecord::from_note).collect(),
        }
    }
}

#[async_trait]
pub trait CanvasStateStore: Send + Sync {
    /// The canvas list. A vault with no index yet has just the home canvas.
    async fn load_index(&self) -> StoreResult<CanvasIndex>;

    async fn save_index(&self, index: &CanvasIndex) -> StoreResult<()>;

    /// Layout for `id`, or an empty default layout if none was saved.
    async fn load_canvas(&self, id: &CanvasId) -> StoreResult<CanvasState>;

    async fn save_canvas(&self, id: &CanvasId, state: &CanvasState) -> StoreResult<()>;

    /// Remove a canvas's layout. The home canvas is refused.
    async fn delete_canvas(&self, id: &CanvasId) -> StoreResult<()>;
}

/// File-name stem for a canvas id. Ids that are not plain names are
/// hex-encoded behind a `~` so they stay portable and cannot escape the
/// canvas directory.
pub fn canvas_file_stem(id: &CanvasId) -> String {
    let raw = id.as_str();
    let plain = !raw.is_empty()
        && !raw.starts_with('~')
        && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if plain {
        return raw.to_string();
    }
    let mut out = String::with_capacity(1 + raw.len() * 2);
    out.push('~');
    for b in raw.as_bytes() {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// JSON layout files stored through a [`PersistenceService`].
pub struct JsonCanvasStore {
    root: PathBuf,
    persistence: Arc<dyn PersistenceService>,
}

impl JsonCanvasStore {
    pub fn new(vault: &Path, meta_dir: &str, persistence: Arc<dyn PersistenceService>) -> Self {
        Self {
            root: vault.join(meta_dir),
            persistence,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    pub fn canvas_path(&self, id: &CanvasId) -> PathBuf {
        self.root
            .join(CANVAS_DIR)
            .join(format!("{}.json", canvas_file_stem(id)))
    }

    async fn write_json<T: Serialize + Sync>(&self, path: &Path, value: &T) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.persistence.write_file_atomic(path, &bytes).await
    }
}

#[async_trait]
impl CanvasStateStore for JsonCanvasStore {
    async fn load_index(&self) -> StoreResult<CanvasIndex> {
        let path = self.index_path();
        match self.persistence.read_file(&path).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::decode(&path, e)),
            None => Ok(CanvasIndex::default()),
        }
    }

    async fn save_index(&self, index: &CanvasIndex) -> StoreResult<()> {
        self.write_json(&self.index_path(), index).await
    }

    async fn load_canvas(&self, id: &CanvasId) -> StoreResult<CanvasState> {
        let path = self.canvas_path(id);
        let Some(bytes) = self.persistence.read_file(&path).await? else {
            log::debug!("no saved layout for canvas {id}");
            return Ok(CanvasState::default());
        };
        let mut state: CanvasState = serde_json::from_slice(&bytes).map_err(|e| StoreError::decode(&path, e))?;
        state.camera = state.camera.sanitized();
        Ok(state)
    }

    async fn save_canvas(&self, id: &CanvasId, state: &CanvasState) -> StoreResult<()> {
        self.write_json(&self.canvas_path(id), state).await
    }

    async fn delete_canvas(&self, id: &CanvasId) -> StoreResult<()> {
        if id.is_home() {
            return Err(StoreError::HomeCanvasLocked(id.to_string()));
        }
        match self.persistence.delete_file(&self.canvas_path(id)).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        }
    }
}
