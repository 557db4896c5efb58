pub mod camera;
pub mod format;
pub mod id;
pub mod links;
pub mod model;
pub mod name;
pub mod transform;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM, clamp_zoom};
pub use format::{FormatError, TextNoteFile};
pub use id::{CanvasId, NoteId};
pub use links::{Connector, LinkEdge, LinkGraph, connectors, resolve_links};
pub use model::*;
pub use name::normalize_name;
pub use transform::{Point, ViewportRect, WORLD_SIZE, WorldRect, screen_to_world, world_to_screen};
