pub mod hit;
pub mod input;
pub mod interaction;
pub mod session;

pub use hit::{Hit, ResizeHandle, hit_test};
pub use input::{InputEvent, Modifiers, PointerButton};
pub use interaction::{
    Effect, InteractionConfig, InteractionContext, InteractionMachine, InteractionState, Response,
};
pub use session::{CanvasSession, NoteCanvasHost, ScreenRect};
