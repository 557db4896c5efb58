//! Integration tests: full pointer gestures driven through a `CanvasSession`.

use nc_core::model::{DrawingScene, Note, NoteKind, NoteSet};
use nc_core::transform::{ViewportRect, screen_to_world};
use nc_core::{Camera, CanvasId, NoteId};
use nc_editor::session::{CanvasSession, NoteCanvasHost};
use nc_editor::{Effect, InputEvent, InteractionConfig, InteractionState, Modifiers, PointerButton};
use pretty_assertions::assert_eq;
use std::path::Path;

fn drawing(id: &str, x: f64, y: f64, w: f64, h: f64) -> Note {
    Note::new(
        NoteId::intern(id),
        x,
        y,
        NoteKind::DrawingNote {
            scene: DrawingScene::default(),
        },
    )
    .with_size(w, h)
}

fn session(notes: Vec<Note>, camera: Camera) -> CanvasSession {
    let mut s = CanvasSession::new(
        CanvasId::home(),
        camera,
        NoteSet::from_notes(notes).unwrap(),
        InteractionConfig::default(),
    );
    s.set_viewport(ViewportRect::new(0.0, 0.0, 800.0, 600.0));
    s
}

fn press(s: &mut CanvasSession, x: f64, y: f64, t: f64) {
    s.handle_input(&InputEvent::pointer_down(x, y, PointerButton::Primary, Modifiers::NONE, t));
}

// ─── Resize ──────────────────────────────────────────────────────────────

#[test]
fn resize_keeps_aspect_through_whole_gesture() {
    let id = NoteId::intern("gest_resize");
    let mut s = session(vec![drawing("gest_resize", 100.0, 100.0, 300.0, 150.0)], Camera::default());
    // South-east handle at (400, 250).
    press(&mut s, 400.0, 250.0, 0.0);
    assert!(matches!(s.machine().state(), InteractionState::ResizingNote { .. }));

    for (i, (x, y)) in [(420.0, 255.0), (380.0, 400.0), (-500.0, -500.0), (900.0, 260.0)]
        .into_iter()
        .enumerate()
    {
        s.handle_input(&InputEvent::pointer_move(x, y, 16.0 * (i as f64 + 1.0)));
        let note = s.note(id).unwrap();
        assert!((note.width / note.height - 2.0).abs() < 1e-9);
        assert!(note.width >= 100.0);
        // North-west corner never moves for a south-east drag.
        assert_eq!((note.world_x, note.world_y), (100.0, 100.0));
    }
    s.handle_input(&InputEvent::pointer_up(900.0, 260.0, 100.0));
    assert_eq!(s.machine().state(), &InteractionState::Idle);
    assert_eq!(s.note(id).unwrap().width, 800.0);
}

#[test]
fn resize_under_zoom_uses_world_units() {
    let id = NoteId::intern("gest_resize_zoom");
    let mut s = session(
        vec![drawing("gest_resize_zoom", 0.0, 0.0, 200.0, 200.0)],
        Camera::new(0.0, 0.0, 2.0),
    );
    // South-east handle at world (200, 200) → screen (400, 400).
    press(&mut s, 400.0, 400.0, 0.0);
    s.handle_input(&InputEvent::pointer_move(500.0, 400.0, 10.0));
    let note = s.note(id).unwrap();
    assert_eq!((note.width, note.height), (250.0, 250.0));
}

// ─── Drag / click ────────────────────────────────────────────────────────

#[test]
fn drag_at_half_zoom_moves_twice_the_screen_distance() {
    let id = NoteId::intern("gest_drag_half");
    let mut s = session(
        vec![Note::new(id, 0.0, 0.0, NoteKind::text("x"))],
        Camera::new(0.0, 0.0, 0.5),
    );
    press(&mut s, 20.0, 20.0, 0.0);
    s.handle_input(&InputEvent::pointer_move(70.0, 45.0, 20.0));
    s.handle_input(&InputEvent::pointer_up(70.0, 45.0, 40.0));
    let note = s.note(id).unwrap();
    assert_eq!((note.world_x, note.world_y), (100.0, 50.0));
}

#[test]
fn link_card_click_requests_navigation_without_moving() {
    let id = NoteId::intern("gest_card");
    let card = Note::new(
        id,
        10.0,
        10.0,
        NoteKind::CanvasLinkCard {
            target: CanvasId::new("research"),
        },
    );
    let mut s = session(vec![card], Camera::default());
    press(&mut s, 50.0, 50.0, 1_000.0);
    let r = s.handle_input(&InputEvent::pointer_up(51.0, 50.0, 1_120.0));
    assert_eq!(
        r.effects.to_vec(),
        vec![Effect::NavigateToCanvas(CanvasId::new("research")), Effect::ReleasePointer]
    );
    let note = s.note(id).unwrap();
    assert_eq!((note.world_x, note.world_y), (10.0, 10.0));
}

// ─── Pan / zoom ──────────────────────────────────────────────────────────

#[test]
fn pan_then_zoom_keeps_cursor_anchor() {
    let mut s = session(vec![], Camera::default());
    press(&mut s, 100.0, 100.0, 0.0);
    s.handle_input(&InputEvent::pointer_move(160.0, 70.0, 10.0));
    s.handle_input(&InputEvent::pointer_up(160.0, 70.0, 20.0));
    assert_eq!((s.camera().pan_x, s.camera().pan_y), (60.0, -30.0));

    let anchor = screen_to_world(250.0, 420.0, s.viewport(), s.camera());
    for _ in 0..3 {
        s.handle_input(&InputEvent::wheel(250.0, 420.0, 120.0, Modifiers::CTRL));
    }
    assert!((s.camera().zoom - 0.9f64.powi(3)).abs() < 1e-12);
    let after = screen_to_world(250.0, 420.0, s.viewport(), s.camera());
    assert!((anchor.x - after.x).abs() < 1e-9 && (anchor.y - after.y).abs() < 1e-9);
}

// ─── Host injection ──────────────────────────────────────────────────────

fn add_from_sidebar(host: &mut dyn NoteCanvasHost, file: &str) -> NoteId {
    host.create_note_on_canvas(Path::new(file), NoteKind::text(""))
}

#[test]
fn sidebar_creates_notes_through_host_trait() {
    let mut s = session(vec![], Camera::default());
    let a = add_from_sidebar(&mut s, "Inbox.md");
    let b = add_from_sidebar(&mut s, "Later.md");
    assert_ne!(a, b);
    assert_eq!(s.notes().len(), 2);
    assert_eq!(s.note(b).unwrap().file_name(), Some("Later.md"));
}
