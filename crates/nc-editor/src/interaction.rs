//! Pointer interaction state machine.
//!
//! Consumes raw pointer and wheel events, classifies intent, and emits
//! camera/note mutations as `Effect`s. All gesture state lives in one
//! `InteractionState` value updated through [`InteractionMachine::handle`];
//! there are no side flags.
//!
//! ## Gestures
//!
//! | Press | Over | State |
//! |-------|------|-------|
//! | Primary | empty canvas | `Panning` |
//! | Middle | anywhere | `Panning` |
//! | Primary + Alt/Ctrl/⌘ | anywhere | `Panning` |
//! | Primary | note body | `DraggingNote` |
//! | Primary | resize handle (drawing notes) | `ResizingNote` |
//!
//! A press/release on a note that stays inside the click slop and finishes
//! within the click window is a click: it opens the color picker, or
//! navigates for canvas-link cards. Wheel + Ctrl/⌘ zooms at the cursor;
//! a bare wheel is left to the host.

use crate::hit::{Hit, ResizeHandle, hit_test};
use crate::input::{InputEvent, Modifiers, PointerButton};
use nc_core::model::{MIN_NOTE_SIZE, NoteKind, NoteSet};
use nc_core::transform::{Point, ViewportRect, screen_to_world};
use nc_core::{Camera, CanvasId, NoteId};
use serde::Deserialize;
use smallvec::SmallVec;

// ─── Config ───────────────────────────────────────────────────────────────

/// Tunables for gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InteractionConfig {
    /// Max screen displacement (px) for a press/release to count as a click.
    pub click_slop_px: f64,
    /// Max press duration (ms) for a click.
    pub click_max_ms: f64,
    /// Multiplicative zoom change per wheel notch.
    pub zoom_step: f64,
    /// On-screen side length of resize handles.
    pub handle_size_px: f64,
    /// Width floor while resizing, in world units.
    pub min_note_size: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_slop_px: 3.0,
            click_max_ms: 300.0,
            zoom_step: 0.1,
            handle_size_px: 12.0,
            min_note_size: MIN_NOTE_SIZE,
        }
    }
}

// ─── State ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionState {
    Idle,
    Panning {
        start_screen: Point,
        start_pan: Point,
    },
    DraggingNote {
        id: NoteId,
        start_note: Point,
        start_pointer_world: Point,
        start_screen: Point,
        start_time_ms: f64,
        /// Pointer has left the click slop at least once.
        moved: bool,
    },
    ResizingNote {
        id: NoteId,
        handle: ResizeHandle,
        start_width: f64,
        start_height: f64,
        start_note: Point,
        start_pointer_world: Point,
        aspect_ratio: f64,
    },
}

/// Mutation or host request produced by an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetPan { pan_x: f64, pan_y: f64 },
    ZoomAt { anchor: Point, zoom: f64 },
    MoveNote { id: NoteId, world_x: f64, world_y: f64 },
    ResizeNote { id: NoteId, world_x: f64, world_y: f64, width: f64, height: f64 },
    CapturePointer,
    ReleasePointer,
    OpenColorPicker(NoteId),
    NavigateToCanvas(CanvasId),
    OpenNote(NoteId),
    CreateTextNote { world_x: f64, world_y: f64 },
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub effects: SmallVec<[Effect; 2]>,
    /// Whether the host should suppress the browser/OS default action.
    pub prevent_default: bool,
}

impl Response {
    fn none() -> Self {
        Self::default()
    }

    fn with(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self {
            effects: effects.into_iter().collect(),
            prevent_default: true,
        }
    }
}

/// Read-only view of the canvas the machine reasons about.
#[derive(Debug, Clone, Copy)]
pub struct InteractionContext<'a> {
    pub notes: &'a NoteSet,
    pub camera: &'a Camera,
    pub viewport: &'a ViewportRect,
}

impl InteractionContext<'_> {
    fn to_world(&self, x: f64, y: f64) -> Point {
        screen_to_world(x, y, self.viewport, self.camera)
    }
}

// ─── Machine ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InteractionMachine {
    state: InteractionState,
    config: InteractionConfig,
}

impl Default for InteractionMachine {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl InteractionMachine {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            config,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Abandon any gesture in progress (e.g. the canvas is being switched).
    pub fn reset(&mut self) -> Response {
        if matches!(self.state, InteractionState::Idle) {
            return Response::none();
        }
        self.state = InteractionState::Idle;
        Response::with([Effect::ReleasePointer])
    }

    /// Single entry point: feed one event, get the resulting effects.
    pub fn handle(&mut self, event: &InputEvent, ctx: &InteractionContext<'_>) -> Response {
        if !event.is_finite() {
            log::trace!("dropping non-finite input event {event:?}");
            return Response::none();
        }
        match *event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
                time_ms,
            } => self.pointer_down(x, y, button, modifiers, time_ms, ctx),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(x, y, ctx),
            InputEvent::PointerUp { x, y, time_ms, .. } => self.pointer_up(x, y, time_ms, ctx),
            InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers,
            } => self.wheel(x, y, delta_y, modifiers, ctx),
            InputEvent::DoubleClick { x, y, .. } => self.double_click(x, y, ctx),
        }
    }

    fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: PointerButton,
        modifiers: Modifiers,
        time_ms: f64,
        ctx: &InteractionContext<'_>,
    ) -> Response {
        if !matches!(self.state, InteractionState::Idle) {
            return Response::none();
        }
        let hit = hit_test(ctx.notes, ctx.camera, ctx.viewport, x, y, self.config.handle_size_px);
        let pan = match button {
            PointerButton::Middle => true,
            PointerButton::Primary => hit.is_none() || modifiers.pan(),
            PointerButton::Secondary => return Response::none(),
        };

        if pan {
            self.state = InteractionState::Panning {
                start_screen: Point::new(x, y),
                start_pan: Point::new(ctx.camera.pan_x, ctx.camera.pan_y),
            };
            log::trace!("idle → panning at ({x}, {y})");
            return Response::with([Effect::CapturePointer]);
        }

        let pointer_world = ctx.to_world(x, y);
        match hit {
            Some(Hit::Handle(id, handle)) => {
                let Some(note) = ctx.notes.get(id).filter(|n| n.kind.is_resizable()) else {
                    return Response::none();
                };
                let aspect_ratio = note.aspect_ratio();
                if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
                    return Response::none();
                }
                self.state = InteractionState::ResizingNote {
                    id,
                    handle,
                    start_width: note.width,
                    start_height: note.height,
                    start_note: Point::new(note.world_x, note.world_y),
                    start_pointer_world: pointer_world,
                    aspect_ratio,
                };
                log::trace!("idle → resizing {id} via {handle:?}");
                Response::with([Effect::CapturePointer])
            }
            Some(Hit::Note(id)) => {
                let Some(note) = ctx.notes.get(id) else {
                    return Response::none();
                };
                self.state = InteractionState::DraggingNote {
                    id,
                    start_note: Point::new(note.world_x, note.world_y),
                    start_pointer_world: pointer_world,
                    start_screen: Point::new(x, y),
                    start_time_ms: time_ms,
                    moved: false,
                };
                log::trace!("idle → dragging {id}");
                Response::with([Effect::CapturePointer])
            }
            None => Response::none(),
        }
    }

    fn pointer_move(&mut self, x: f64, y: f64, ctx: &InteractionContext<'_>) -> Response {
        match self.state {
            InteractionState::Idle => Response::none(),
            InteractionState::Panning {
                start_screen,
                start_pan,
            } => Response::with([Effect::SetPan {
                pan_x: start_pan.x + (x - start_screen.x),
                pan_y: start_pan.y + (y - start_screen.y),
            }]),
            InteractionState::DraggingNote {
                id,
                start_note,
                start_pointer_world,
                start_screen,
                moved,
                ..
            } => {
                if !ctx.notes.contains(id) {
                    return self.reset();
                }
                if !moved && start_screen.distance(Point::new(x, y)) < self.config.click_slop_px {
                    return Response::none();
                }
                if let InteractionState::DraggingNote { moved, .. } = &mut self.state {
                    *moved = true;
                }
                let now = ctx.to_world(x, y);
                let world_x = start_note.x + (now.x - start_pointer_world.x);
                let world_y = start_note.y + (now.y - start_pointer_world.y);
                if !world_x.is_finite() || !world_y.is_finite() {
                    return Response::none();
                }
                Response::with([Effect::MoveNote { id, world_x, world_y }])
            }
            InteractionState::ResizingNote {
                id,
                handle,
                start_width,
                start_height,
                start_note,
                start_pointer_world,
                aspect_ratio,
            } => {
                if !ctx.notes.contains(id) {
                    return self.reset();
                }
                let now = ctx.to_world(x, y);
                let geometry = resize_geometry(
                    handle,
                    start_note,
                    start_width,
                    start_height,
                    aspect_ratio,
                    (now.x - start_pointer_world.x, now.y - start_pointer_world.y),
                    self.config.min_note_size,
                );
                match geometry {
                    Some((world_x, world_y, width, height)) => Response::with([Effect::ResizeNote {
                        id,
                        world_x,
                        world_y,
                        width,
                        height,
                    }]),
                    None => Response::none(),
                }
            }
        }
    }

    fn pointer_up(&mut self, x: f64, y: f64, time_ms: f64, ctx: &InteractionContext<'_>) -> Response {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let mut effects: SmallVec<[Effect; 2]> = SmallVec::new();
        match state {
            InteractionState::Idle => return Response::none(),
            InteractionState::DraggingNote {
                id,
                start_screen,
                start_time_ms,
                moved,
                ..
            } => {
                let displacement = start_screen.distance(Point::new(x, y));
                let is_click = !moved
                    && displacement < self.config.click_slop_px
                    && (time_ms - start_time_ms) < self.config.click_max_ms;
                if is_click && let Some(note) = ctx.notes.get(id) {
                    log::trace!("click on {id}");
                    effects.push(match &note.kind {
                        NoteKind::CanvasLinkCard { target } => Effect::NavigateToCanvas(target.clone()),
                        _ => Effect::OpenColorPicker(id),
                    });
                }
            }
            InteractionState::Panning { .. } | InteractionState::ResizingNote { .. } => {}
        }
        effects.push(Effect::ReleasePointer);
        Response {
            effects,
            prevent_default: true,
        }
    }

    fn wheel(
        &mut self,
        x: f64,
        y: f64,
        delta_y: f64,
        modifiers: Modifiers,
        ctx: &InteractionContext<'_>,
    ) -> Response {
        if !modifiers.zoom() {
            // Plain scrolling belongs to whatever else is under the cursor.
            return Response::none();
        }
        if delta_y == 0.0 {
            return Response {
                effects: SmallVec::new(),
                prevent_default: true,
            };
        }
        let anchor = Point::new(x, y);
        let notches = if delta_y < 0.0 { 1 } else { -1 };
        let mut zoomed = *ctx.camera;
        zoomed.zoom_by_steps(anchor, ctx.viewport, notches, self.config.zoom_step);
        Response::with([Effect::ZoomAt {
            anchor,
            zoom: zoomed.zoom,
        }])
    }

    fn double_click(&mut self, x: f64, y: f64, ctx: &InteractionContext<'_>) -> Response {
        if !matches!(self.state, InteractionState::Idle) {
            return Response::none();
        }
        match hit_test(ctx.notes, ctx.camera, ctx.viewport, x, y, self.config.handle_size_px) {
            Some(hit) => Response::with([Effect::OpenNote(hit.note_id())]),
            None => {
                let world = ctx.to_world(x, y);
                Response::with([Effect::CreateTextNote {
                    world_x: world.x,
                    world_y: world.y,
                }])
            }
        }
    }
}

/// Aspect-locked resize from `handle`, keeping the opposite corner fixed.
/// Returns `(world_x, world_y, width, height)`.
pub fn resize_geometry(
    handle: ResizeHandle,
    start_note: Point,
    start_width: f64,
    start_height: f64,
    aspect_ratio: f64,
    pointer_delta: (f64, f64),
    min_width: f64,
) -> Option<(f64, f64, f64, f64)> {
    let (sx, sy) = handle.outward();
    // Growth along each axis, positive = away from the fixed corner.
    let grow_x = pointer_delta.0 * sx;
    let grow_y = pointer_delta.1 * sy;
    let delta = if grow_x.abs() >= grow_y.abs() { grow_x } else { grow_y };

    let width = (start_width + delta).max(min_width);
    let height = width / aspect_ratio;

    let anchor_x = if sx < 0.0 { start_note.x + start_width } else { start_note.x };
    let anchor_y = if sy < 0.0 { start_note.y + start_height } else { start_note.y };
    let world_x = if sx < 0.0 { anchor_x - width } else { anchor_x };
    let world_y = if sy < 0.0 { anchor_y - height } else { anchor_y };

    [world_x, world_y, width, height]
        .iter()
        .all(|v| v.is_finite())
        .then_some((world_x, world_y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nc_core::model::{DrawingScene, Note};
    use pretty_assertions::assert_eq;

    const VP: ViewportRect = ViewportRect::new(0.0, 0.0, 800.0, 600.0);

    fn notes() -> NoteSet {
        let text = Note::new(NoteId::intern("im_text"), 0.0, 0.0, NoteKind::text("t"))
            .with_size(200.0, 100.0);
        let drawing = Note::new(
            NoteId::intern("im_draw"),
            400.0,
            300.0,
            NoteKind::DrawingNote {
                scene: DrawingScene::default(),
            },
        )
        .with_size(200.0, 100.0);
        NoteSet::from_notes([text, drawing]).unwrap()
    }

    fn ctx<'a>(notes: &'a NoteSet, camera: &'a Camera) -> InteractionContext<'a> {
        InteractionContext {
            notes,
            camera,
            viewport: &VP,
        }
    }

    fn down(x: f64, y: f64, t: f64) -> InputEvent {
        InputEvent::pointer_down(x, y, PointerButton::Primary, Modifiers::NONE, t)
    }

    #[test]
    fn press_on_empty_canvas_pans() {
        let notes = notes();
        let cam = Camera::new(10.0, 20.0, 1.0);
        let mut m = InteractionMachine::default();
        let r = m.handle(&down(700.0, 50.0, 0.0), &ctx(&notes, &cam));
        assert_eq!(r.effects.as_slice(), &[Effect::CapturePointer]);
        let r = m.handle(&InputEvent::pointer_move(730.0, 40.0, 5.0), &ctx(&notes, &cam));
        assert_eq!(
            r.effects.as_slice(),
            &[Effect::SetPan {
                pan_x: 40.0,
                pan_y: 10.0
            }]
        );
        let r = m.handle(&InputEvent::pointer_up(730.0, 40.0, 9.0), &ctx(&notes, &cam));
        assert_eq!(r.effects.as_slice(), &[Effect::ReleasePointer]);
        assert_eq!(*m.state(), InteractionState::Idle);
    }

    #[test]
    fn middle_button_pans_over_notes() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        m.handle(
            &InputEvent::pointer_down(50.0, 50.0, PointerButton::Middle, Modifiers::NONE, 0.0),
            &ctx(&notes, &cam),
        );
        assert!(matches!(m.state(), InteractionState::Panning { .. }));
    }

    #[test]
    fn modifier_press_pans_over_notes() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        m.handle(
            &InputEvent::pointer_down(50.0, 50.0, PointerButton::Primary, alt, 0.0),
            &ctx(&notes, &cam),
        );
        assert!(matches!(m.state(), InteractionState::Panning { .. }));
    }

    #[test]
    fn drag_tracks_world_units_at_any_zoom() {
        let notes = notes();
        let cam = Camera::new(0.0, 0.0, 2.0);
        let mut m = InteractionMachine::default();
        // Text note spans world (0..200, 0..100) → screen (0..400, 0..200).
        m.handle(&down(100.0, 100.0, 0.0), &ctx(&notes, &cam));
        let r = m.handle(&InputEvent::pointer_move(140.0, 120.0, 50.0), &ctx(&notes, &cam));
        assert_eq!(
            r.effects.as_slice(),
            &[Effect::MoveNote {
                id: NoteId::intern("im_text"),
                world_x: 20.0,
                world_y: 10.0
            }]
        );
    }

    #[test]
    fn small_quick_press_is_a_click() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        m.handle(&down(50.0, 50.0, 1000.0), &ctx(&notes, &cam));
        let r = m.handle(&InputEvent::pointer_move(51.0, 51.0, 1050.0), &ctx(&notes, &cam));
        assert!(r.effects.is_empty(), "moves inside the slop are suppressed");
        let r = m.handle(&InputEvent::pointer_up(51.0, 51.0, 1100.0), &ctx(&notes, &cam));
        assert_eq!(
            r.effects.as_slice(),
            &[
                Effect::OpenColorPicker(NoteId::intern("im_text")),
                Effect::ReleasePointer
            ]
        );
    }

    #[test]
    fn slow_press_is_not_a_click() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        m.handle(&down(50.0, 50.0, 0.0), &ctx(&notes, &cam));
        let r = m.handle(&InputEvent::pointer_up(50.0, 50.0, 900.0), &ctx(&notes, &cam));
        assert_eq!(r.effects.as_slice(), &[Effect::ReleasePointer]);
    }

    #[test]
    fn drag_past_slop_is_not_a_click() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        m.handle(&down(50.0, 50.0, 0.0), &ctx(&notes, &cam));
        m.handle(&InputEvent::pointer_move(80.0, 50.0, 40.0), &ctx(&notes, &cam));
        let r = m.handle(&InputEvent::pointer_up(51.0, 50.0, 80.0), &ctx(&notes, &cam));
        assert_eq!(r.effects.as_slice(), &[Effect::ReleasePointer]);
    }

    #[test]
    fn clicking_a_link_card_navigates() {
        let card = Note::new(
            NoteId::intern("im_card"),
            0.0,
            0.0,
            NoteKind::CanvasLinkCard {
                target: CanvasId::new("projects"),
            },
        );
        let notes = NoteSet::from_notes([card]).unwrap();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        m.handle(&down(10.0, 10.0, 0.0), &ctx(&notes, &cam));
        let r = m.handle(&InputEvent::pointer_up(10.0, 10.0, 20.0), &ctx(&notes, &cam));
        assert_eq!(r.effects[0], Effect::NavigateToCanvas(CanvasId::new("projects")));
    }

    #[test]
    fn resize_from_northwest_keeps_southeast_fixed() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        // Drawing spans (400..600, 300..400); NW handle at (400, 300).
        m.handle(&down(400.0, 300.0, 0.0), &ctx(&notes, &cam));
        assert!(matches!(m.state(), InteractionState::ResizingNote { .. }));
        let r = m.handle(&InputEvent::pointer_move(350.0, 290.0, 10.0), &ctx(&notes, &cam));
        let Effect::ResizeNote {
            world_x,
            world_y,
            width,
            height,
            ..
        } = r.effects[0]
        else {
            panic!("expected ResizeNote, got {:?}", r.effects);
        };
        assert_eq!(width, 250.0);
        assert_eq!(height, 125.0);
        assert_eq!(world_x + width, 600.0);
        assert_eq!(world_y + height, 400.0);
    }

    #[test]
    fn resize_floors_width_and_keeps_aspect() {
        let out = resize_geometry(
            ResizeHandle::SouthEast,
            Point::new(0.0, 0.0),
            200.0,
            100.0,
            2.0,
            (-500.0, -10.0),
            100.0,
        )
        .unwrap();
        assert_eq!(out, (0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn resize_is_aspect_locked_for_every_handle() {
        for handle in ResizeHandle::ALL {
            for delta in [(37.0, -12.0), (-80.0, 90.0), (5.0, 400.0), (-300.0, -300.0)] {
                let (_, _, w, h) =
                    resize_geometry(handle, Point::new(10.0, 20.0), 300.0, 200.0, 1.5, delta, 100.0)
                        .unwrap();
                assert!(w >= 100.0);
                assert!((w / h - 1.5).abs() < 1e-9, "{handle:?} {delta:?}");
            }
        }
    }

    #[test]
    fn text_notes_never_enter_resize() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        // Bottom-right corner of the text note.
        m.handle(&down(200.0, 100.0, 0.0), &ctx(&notes, &cam));
        assert!(matches!(m.state(), InteractionState::DraggingNote { .. }));
    }

    #[test]
    fn ctrl_wheel_zooms_at_cursor() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        let r = m.handle(
            &InputEvent::wheel(400.0, 300.0, -100.0, Modifiers::CTRL),
            &ctx(&notes, &cam),
        );
        assert!(r.prevent_default);
        assert_eq!(
            r.effects.as_slice(),
            &[Effect::ZoomAt {
                anchor: Point::new(400.0, 300.0),
                zoom: 1.1
            }]
        );
    }

    #[test]
    fn ctrl_wheel_out_shrinks_by_one_notch() {
        let notes = notes();
        let cam = Camera::new(0.0, 0.0, 2.0);
        let mut m = InteractionMachine::default();
        let r = m.handle(
            &InputEvent::wheel(
                400.0,
                300.0,
                100.0,
                Modifiers {
                    meta: true,
                    ..Modifiers::NONE
                },
            ),
            &ctx(&notes, &cam),
        );
        let [Effect::ZoomAt { zoom, .. }] = r.effects.as_slice() else {
            panic!("expected one zoom effect, got {:?}", r.effects);
        };
        assert!((zoom - 1.8).abs() < 1e-9);
    }

    #[test]
    fn bare_wheel_is_left_alone() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        let r = m.handle(&InputEvent::wheel(10.0, 10.0, 120.0, Modifiers::NONE), &ctx(&notes, &cam));
        assert!(r.effects.is_empty());
        assert!(!r.prevent_default);
    }

    #[test]
    fn double_click_on_empty_canvas_creates_note() {
        let notes = notes();
        let cam = Camera::new(100.0, 0.0, 2.0);
        let mut m = InteractionMachine::default();
        let r = m.handle(
            &InputEvent::DoubleClick {
                x: 700.0,
                y: 20.0,
                modifiers: Modifiers::NONE,
            },
            &ctx(&notes, &cam),
        );
        assert_eq!(
            r.effects.as_slice(),
            &[Effect::CreateTextNote {
                world_x: 300.0,
                world_y: 10.0
            }]
        );
    }

    #[test]
    fn non_finite_events_are_dropped() {
        let notes = notes();
        let cam = Camera::default();
        let mut m = InteractionMachine::default();
        let r = m.handle(&down(f64::NAN, 0.0, 0.0), &ctx(&notes, &cam));
        assert_eq!(r, Response::default());
        assert_eq!(*m.state(), InteractionState::Idle);
    }
}
