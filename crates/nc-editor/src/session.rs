//! Canvas session: the single owner of one canvas's notes and camera.
//!
//! The session is the hot path for interaction. It feeds input to the
//! `InteractionMachine`, applies the camera/note effects it returns, and
//! hands the remaining host requests (color picker, navigation, pointer
//! capture, note creation) back to the caller. The link graph is a derived
//! view cached until note content or the note set changes.

use crate::input::InputEvent;
use crate::interaction::{Effect, InteractionConfig, InteractionContext, InteractionMachine, Response};
use nc_core::links::{Connector, LinkGraph, connectors};
use nc_core::model::{DrawingScene, ModelError, Note, NoteKind, NoteSet, is_hex_color};
use nc_core::transform::{Point, ViewportRect, screen_to_world, world_to_screen};
use nc_core::{Camera, CanvasId, NoteId};
use std::path::Path;

/// Lets components outside the canvas (e.g. a file sidebar) place notes on
/// it without reaching for global state. The owning container passes an
/// implementation down to whoever needs it.
pub trait NoteCanvasHost {
    /// Put a note backed by `path` on the canvas and return its id.
    fn create_note_on_canvas(&mut self, path: &Path, kind: NoteKind) -> NoteId;
}

/// A note's footprint in screen space, for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub struct CanvasSession {
    canvas_id: CanvasId,
    camera: Camera,
    notes: NoteSet,
    viewport: ViewportRect,
    machine: InteractionMachine,
    /// `None` when note content or membership changed since the last build.
    links: Option<LinkGraph>,
}

impl CanvasSession {
    pub fn new(canvas_id: CanvasId, camera: Camera, notes: NoteSet, config: InteractionConfig) -> Self {
        Self {
            canvas_id,
            camera: camera.sanitized(),
            notes,
            viewport: ViewportRect::default(),
            machine: InteractionMachine::new(config),
            links: None,
        }
    }

    /// A fresh canvas with the default camera and no notes.
    pub fn empty(canvas_id: CanvasId) -> Self {
        Self::new(canvas_id, Camera::default(), NoteSet::new(), InteractionConfig::default())
    }

    pub fn canvas_id(&self) -> &CanvasId {
        &self.canvas_id
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn notes(&self) -> &NoteSet {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn viewport(&self) -> &ViewportRect {
        &self.viewport
    }

    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    pub fn set_viewport(&mut self, viewport: ViewportRect) {
        self.viewport = viewport;
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Camera and note effects are applied here; the
    /// full effect list is returned so the host can act on the rest.
    pub fn handle_input(&mut self, event: &InputEvent) -> Response {
        let ctx = InteractionContext {
            notes: &self.notes,
            camera: &self.camera,
            viewport: &self.viewport,
        };
        let response = self.machine.handle(event, &ctx);
        for effect in &response.effects {
            self.apply(effect);
        }
        response
    }

    /// Apply a camera or note effect. Returns `true` if state changed.
    /// Host-only effects are ignored.
    pub fn apply(&mut self, effect: &Effect) -> bool {
        match effect {
            Effect::SetPan { pan_x, pan_y } => {
                if !pan_x.is_finite() || !pan_y.is_finite() {
                    return false;
                }
                self.camera.pan_x = *pan_x;
                self.camera.pan_y = *pan_y;
                true
            }
            Effect::ZoomAt { anchor, zoom } => {
                let before = self.camera;
                self.camera.zoom_at(anchor.x, anchor.y, &self.viewport, *zoom);
                before != self.camera
            }
            Effect::MoveNote { id, world_x, world_y } => match self.notes.get_mut(*id) {
                Some(note) if world_x.is_finite() && world_y.is_finite() => {
                    note.world_x = *world_x;
                    note.world_y = *world_y;
                    true
                }
                _ => false,
            },
            Effect::ResizeNote {
                id,
                world_x,
                world_y,
                width,
                height,
            } => match self.notes.get_mut(*id) {
                Some(note)
                    if note.kind.is_resizable()
                        && [*world_x, *world_y, *width, *height].iter().all(|v| v.is_finite())
                        && *width > 0.0
                        && *height > 0.0 =>
                {
                    note.world_x = *world_x;
                    note.world_y = *world_y;
                    note.width = *width;
                    note.height = *height;
                    true
                }
                _ => false,
            },
            Effect::CapturePointer
            | Effect::ReleasePointer
            | Effect::OpenColorPicker(_)
            | Effect::NavigateToCanvas(_)
            | Effect::OpenNote(_)
            | Effect::CreateTextNote { .. } => false,
        }
    }

    // ─── Camera ──────────────────────────────────────────────────────────

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.camera.pan(dx, dy);
    }

    /// External zoom request (toolbar, keyboard). Anchored at the viewport
    /// center so it matches wheel zoom.
    pub fn zoom_to(&mut self, zoom: f64) {
        self.camera.zoom_at_center(&self.viewport, zoom);
    }

    /// World point currently at the center of the viewport.
    pub fn viewport_center_world(&self) -> Point {
        let c = self.viewport.center();
        screen_to_world(c.x, c.y, &self.viewport, &self.camera)
    }

    // ─── Notes ───────────────────────────────────────────────────────────

    pub fn add_note(&mut self, note: Note) -> Result<(), ModelError> {
        self.notes.insert(note)?;
        self.links = None;
        Ok(())
    }

    /// Remove a note from this canvas. Its backing file stays on disk.
    pub fn detach_note(&mut self, id: NoteId) -> Result<Note, ModelError> {
        let note = self.notes.detach(id).ok_or(ModelError::NoteNotFound(id))?;
        self.links = None;
        self.machine.reset();
        log::debug!("detached {id} from canvas {}", self.canvas_id);
        Ok(note)
    }

    pub fn set_color(&mut self, id: NoteId, color: &str) -> Result<(), ModelError> {
        if !is_hex_color(color) {
            return Err(ModelError::InvalidColor(color.to_string()));
        }
        let note = self.notes.get_mut(id).ok_or(ModelError::NoteNotFound(id))?;
        note.color = color.to_string();
        Ok(())
    }

    /// Replace a text note's content. No-op for other kinds.
    pub fn set_text_content(&mut self, id: NoteId, content: impl Into<String>) -> Result<bool, ModelError> {
        let note = self.notes.get_mut(id).ok_or(ModelError::NoteNotFound(id))?;
        let NoteKind::TextNote { content: current } = &mut note.kind else {
            return Ok(false);
        };
        let content = content.into();
        if *current == content {
            return Ok(false);
        }
        *current = content;
        self.links = None;
        Ok(true)
    }

    pub fn set_drawing_scene(&mut self, id: NoteId, scene: DrawingScene) -> Result<bool, ModelError> {
        let note = self.notes.get_mut(id).ok_or(ModelError::NoteNotFound(id))?;
        let NoteKind::DrawingNote { scene: current } = &mut note.kind else {
            return Ok(false);
        };
        *current = scene;
        Ok(true)
    }

    pub fn set_file_path(&mut self, id: NoteId, path: &Path) -> Result<(), ModelError> {
        let note = self.notes.get_mut(id).ok_or(ModelError::NoteNotFound(id))?;
        note.file_path = Some(path.to_path_buf());
        self.links = None;
        Ok(())
    }

    pub fn set_title(&mut self, id: NoteId, title: Option<String>) -> Result<(), ModelError> {
        let note = self.notes.get_mut(id).ok_or(ModelError::NoteNotFound(id))?;
        note.title = title;
        Ok(())
    }

    /// Screen-space rectangle of a note, `None` for unknown or malformed notes.
    pub fn screen_rect_of(&self, id: NoteId) -> Option<ScreenRect> {
        let note = self.notes.get(id).filter(|n| n.is_well_formed())?;
        let tl = world_to_screen(note.world_x, note.world_y, &self.viewport, &self.camera);
        let rect = ScreenRect {
            x: tl.x,
            y: tl.y,
            width: note.width * self.camera.zoom,
            height: note.height * self.camera.zoom,
        };
        [rect.x, rect.y, rect.width, rect.height]
            .iter()
            .all(|v| v.is_finite())
            .then_some(rect)
    }

    // ─── Links ───────────────────────────────────────────────────────────

    pub fn links(&mut self) -> &LinkGraph {
        self.links.get_or_insert_with(|| LinkGraph::build(&self.notes))
    }

    pub fn connectors(&mut self) -> Vec<Connector> {
        let edges = self.links().edges().to_vec();
        connectors(&self.notes, &edges)
    }
}

impl NoteCanvasHost for CanvasSession {
    fn create_note_on_canvas(&mut self, path: &Path, kind: NoteKind) -> NoteId {
        let center = self.viewport_center_world();
        let id = NoteId::generate();
        let mut note = Note::new(id, center.x, center.y, kind).with_file(path);
        note.world_x -= note.width / 2.0;
        note.world_y -= note.height / 2.0;
        note.title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if !note.is_well_formed() {
            note.world_x = 0.0;
            note.world_y = 0.0;
        }
        // Fresh ids never collide.
        let _ = self.add_note(note);
        log::info!("created {id} on canvas {} from {}", self.canvas_id, path.display());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, PointerButton};
    use pretty_assertions::assert_eq;

    fn session_with(notes: Vec<Note>) -> CanvasSession {
        let mut s = CanvasSession::new(
            CanvasId::home(),
            Camera::default(),
            NoteSet::from_notes(notes).unwrap(),
            InteractionConfig::default(),
        );
        s.set_viewport(ViewportRect::new(0.0, 0.0, 800.0, 600.0));
        s
    }

    #[test]
    fn panning_shifts_note_on_screen_one_to_one() {
        let id = NoteId::intern("sess_note1");
        let mut s = session_with(vec![
            Note::new(id, 0.0, 0.0, NoteKind::text("Note 1")).with_title("Note 1"),
        ]);
        let before = s.screen_rect_of(id).unwrap();
        s.pan_by(50.0, 50.0);
        let after = s.screen_rect_of(id).unwrap();
        assert_eq!((after.x - before.x, after.y - before.y), (50.0, 50.0));
    }

    #[test]
    fn drag_gesture_moves_note() {
        let id = NoteId::intern("sess_drag");
        let mut s = session_with(vec![Note::new(id, 100.0, 100.0, NoteKind::text(""))]);
        s.handle_input(&InputEvent::pointer_down(150.0, 150.0, PointerButton::Primary, Modifiers::NONE, 0.0));
        s.handle_input(&InputEvent::pointer_move(190.0, 170.0, 16.0));
        s.handle_input(&InputEvent::pointer_up(190.0, 170.0, 32.0));
        let note = s.note(id).unwrap();
        assert_eq!((note.world_x, note.world_y), (140.0, 120.0));
    }

    #[test]
    fn click_leaves_note_in_place() {
        let id = NoteId::intern("sess_click");
        let mut s = session_with(vec![Note::new(id, 100.0, 100.0, NoteKind::text(""))]);
        s.handle_input(&InputEvent::pointer_down(150.0, 150.0, PointerButton::Primary, Modifiers::NONE, 0.0));
        s.handle_input(&InputEvent::pointer_move(151.0, 152.0, 30.0));
        let r = s.handle_input(&InputEvent::pointer_up(151.0, 152.0, 60.0));
        assert!(r.effects.contains(&Effect::OpenColorPicker(id)));
        let note = s.note(id).unwrap();
        assert_eq!((note.world_x, note.world_y), (100.0, 100.0));
    }

    #[test]
    fn wheel_zoom_keeps_cursor_world_point() {
        let mut s = session_with(vec![]);
        let before = screen_to_world(400.0, 300.0, s.viewport(), s.camera());
        s.handle_input(&InputEvent::wheel(400.0, 300.0, -1.0, Modifiers::CTRL));
        assert!((s.camera().zoom - 1.1).abs() < 1e-12);
        let after = screen_to_world(400.0, 300.0, s.viewport(), s.camera());
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn toolbar_zoom_anchors_on_viewport_center() {
        let mut s = session_with(vec![]);
        s.pan_by(-30.0, 12.0);
        let before = s.viewport_center_world();
        s.zoom_to(2.5);
        let after = s.viewport_center_world();
        assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);
    }

    #[test]
    fn link_cache_tracks_content_changes() {
        let a = NoteId::intern("sess_link_a");
        let b = NoteId::intern("sess_link_b");
        let mut s = session_with(vec![
            Note::new(a, 0.0, 0.0, NoteKind::text("nothing yet")).with_file("A.md"),
            Note::new(b, 400.0, 0.0, NoteKind::text("")).with_file("B.md"),
        ]);
        assert!(s.links().edges().is_empty());
        assert!(s.set_text_content(a, "see [[B]]").unwrap());
        assert_eq!(s.links().edges().len(), 1);
        assert_eq!(s.connectors().len(), 1);
        s.detach_note(b).unwrap();
        assert!(s.links().edges().is_empty());
    }

    #[test]
    fn host_creates_note_at_viewport_center() {
        let mut s = session_with(vec![]);
        let id = s.create_note_on_canvas(Path::new("vault/Ideas.md"), NoteKind::text(""));
        let note = s.note(id).unwrap();
        assert_eq!(note.title.as_deref(), Some("Ideas"));
        assert_eq!(note.bounds().center(), Point::new(400.0, 300.0));
    }

    #[test]
    fn invalid_color_is_rejected() {
        let id = NoteId::intern("sess_color");
        let mut s = session_with(vec![Note::new(id, 0.0, 0.0, NoteKind::text(""))]);
        assert!(s.set_color(id, "red").is_err());
        s.set_color(id, "#C8E6C9").unwrap();
        assert_eq!(s.note(id).unwrap().color, "#C8E6C9");
    }

    #[test]
    fn resize_effect_ignored_for_text_notes() {
        let id = NoteId::intern("sess_resize_text");
        let mut s = session_with(vec![Note::new(id, 0.0, 0.0, NoteKind::text(""))]);
        let changed = s.apply(&Effect::ResizeNote {
            id,
            world_x: 0.0,
            world_y: 0.0,
            width: 500.0,
            height: 500.0,
        });
        assert!(!changed);
    }
}
