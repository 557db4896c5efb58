//! Per-canvas camera: pan offset plus zoom factor.

use crate::transform::{Point, ViewportRect, screen_to_world};
use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 3.0;

/// Pan (screen px) and zoom for one canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Clamp a requested zoom into `[MIN_ZOOM, MAX_ZOOM]`.
pub fn clamp_zoom(zoom: f64) -> f64 {
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

impl Camera {
    pub fn new(pan_x: f64, pan_y: f64, zoom: f64) -> Self {
        Self {
            pan_x,
            pan_y,
            zoom: clamp_zoom(zoom),
        }
    }

    /// Repair a camera loaded from disk: non-finite fields fall back to
    /// defaults and the zoom is clamped.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            pan_x: if self.pan_x.is_finite() { self.pan_x } else { d.pan_x },
            pan_y: if self.pan_y.is_finite() { self.pan_y } else { d.pan_y },
            zoom: if self.zoom.is_finite() { clamp_zoom(self.zoom) } else { d.zoom },
        }
    }

    /// Translate by a screen-space delta. Zoom is untouched.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Change zoom while keeping the world point under `(anchor_x, anchor_y)`
    /// pinned to that same screen position.
    pub fn zoom_at(&mut self, anchor_x: f64, anchor_y: f64, viewport: &ViewportRect, new_zoom: f64) {
        if !anchor_x.is_finite() || !anchor_y.is_finite() || !new_zoom.is_finite() {
            return;
        }
        let new_zoom = clamp_zoom(new_zoom);
        let anchor_world = screen_to_world(anchor_x, anchor_y, viewport, self);
        if !anchor_world.is_finite() {
            return;
        }
        // Solve world_to_screen(anchor_world, new camera) == anchor for pan.
        self.pan_x = anchor_x - viewport.left - anchor_world.x * new_zoom;
        self.pan_y = anchor_y - viewport.top - anchor_world.y * new_zoom;
        self.zoom = new_zoom;
    }

    /// Zoom anchored at the viewport center; used by toolbar-style requests
    /// so they behave like wheel zoom.
    pub fn zoom_at_center(&mut self, viewport: &ViewportRect, new_zoom: f64) {
        let Point { x, y } = viewport.center();
        self.zoom_at(x, y, viewport, new_zoom);
    }

    /// Apply `steps` wheel notches about `anchor`. Each notch in multiplies
    /// the zoom by `1 + step`, each notch out by `1 - step`.
    pub fn zoom_by_steps(&mut self, anchor: Point, viewport: &ViewportRect, steps: i32, step: f64) {
        let factor = if steps >= 0 {
            (1.0 + step).powi(steps)
        } else {
            (1.0 - step).powi(-steps)
        };
        self.zoom_at(anchor.x, anchor.y, viewport, self.zoom * factor);
    }
}
