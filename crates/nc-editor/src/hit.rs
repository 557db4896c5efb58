//! Hit testing: screen point → note or resize handle.
//!
//! Reverse-walks the note set (front-to-back) so the topmost note wins.
//! Resize handles are tested in screen space so they keep a constant
//! on-screen size at every zoom level.

use nc_core::model::NoteSet;
use nc_core::transform::{Point, ViewportRect, screen_to_world, world_to_screen};
use nc_core::{Camera, NoteId, WorldRect};

/// Corner handle of a resizable note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [
        ResizeHandle::NorthWest,
        ResizeHandle::NorthEast,
        ResizeHandle::SouthWest,
        ResizeHandle::SouthEast,
    ];

    /// Unit direction pointing away from the note at this corner.
    pub fn outward(self) -> (f64, f64) {
        match self {
            Self::NorthWest => (-1.0, -1.0),
            Self::NorthEast => (1.0, -1.0),
            Self::SouthWest => (-1.0, 1.0),
            Self::SouthEast => (1.0, 1.0),
        }
    }

    /// World position of this corner on `rect`.
    pub fn corner(self, rect: &WorldRect) -> Point {
        let (sx, sy) = self.outward();
        Point::new(
            if sx < 0.0 { rect.x } else { rect.x + rect.width },
            if sy < 0.0 { rect.y } else { rect.y + rect.height },
        )
    }

    /// The corner that stays fixed while this handle is dragged.
    pub fn opposite(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::NorthEast => Self::SouthWest,
            Self::SouthWest => Self::NorthEast,
            Self::SouthEast => Self::NorthWest,
        }
    }
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Note(NoteId),
    Handle(NoteId, ResizeHandle),
}

impl Hit {
    pub fn note_id(&self) -> NoteId {
        match self {
            Self::Note(id) | Self::Handle(id, _) => *id,
        }
    }
}

fn hit_square(px: f64, py: f64, center: Point, size: f64) -> bool {
    let half = size / 2.0;
    px >= center.x - half && px <= center.x + half && py >= center.y - half && py <= center.y + half
}

/// Find the topmost note or handle at screen position `(sx, sy)`.
/// Malformed notes (non-finite geometry) are never hit.
pub fn hit_test(
    notes: &NoteSet,
    camera: &Camera,
    viewport: &ViewportRect,
    sx: f64,
    sy: f64,
    handle_size_px: f64,
) -> Option<Hit> {
    let world = screen_to_world(sx, sy, viewport, camera);
    if !world.is_finite() {
        return None;
    }
    for note in notes.iter().rev() {
        if !note.is_well_formed() {
            continue;
        }
        let rect = note.bounds();
        if note.kind.is_resizable() {
            for handle in ResizeHandle::ALL {
                let corner = handle.corner(&rect);
                let screen = world_to_screen(corner.x, corner.y, viewport, camera);
                if hit_square(sx, sy, screen, handle_size_px) {
                    return Some(Hit::Handle(note.id, handle));
                }
            }
        }
        if rect.contains(world) {
            return Some(Hit::Note(note.id));
        }
    }
    None
}
