//! Screen ↔ world coordinate transforms.
//!
//! Screen space is the page-pixel space pointer events arrive in. World
//! space is the stable, pan/zoom-independent space note positions live in.
//! Both directions are pure functions of a `Camera` and the viewport's
//! bounding box in page coordinates.

use crate::camera::Camera;
use serde::{Deserialize, Serialize};

/// Side length of the world surface. Notes are expected to live inside
/// `[-WORLD_SIZE / 2, WORLD_SIZE / 2]` on both axes; this is a rendering
/// hint and is never enforced by clamping note positions.
pub const WORLD_SIZE: f64 = 100_000.0;

/// A 2D point. Which space it lives in is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Returns the point only if both coordinates are finite.
pub fn finite_point(point: Point) -> Option<Point> {
    point.is_finite().then_some(point)
}

/// The viewport's bounding box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }
}

impl ViewportRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Center of the viewport in page coordinates.
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Axis-aligned rectangle in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WorldRect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// The full world surface, centered on the origin.
pub fn world_bounds() -> WorldRect {
    WorldRect {
        x: -WORLD_SIZE / 2.0,
        y: -WORLD_SIZE / 2.0,
        width: WORLD_SIZE,
        height: WORLD_SIZE,
    }
}

/// Map a page-space point to world space.
pub fn screen_to_world(screen_x: f64, screen_y: f64, viewport: &ViewportRect, camera: &Camera) -> Point {
    Point {
        x: (screen_x - viewport.left - camera.pan_x) / camera.zoom,
        y: (screen_y - viewport.top - camera.pan_y) / camera.zoom,
    }
}

/// Map a world-space point to page space. Inverse of [`screen_to_world`].
pub fn world_to_screen(world_x: f64, world_y: f64, viewport: &ViewportRect, camera: &Camera) -> Point {
    Point {
        x: world_x * camera.zoom + camera.pan_x + viewport.left,
        y: world_y * camera.zoom + camera.pan_y + viewport.top,
    }
}
