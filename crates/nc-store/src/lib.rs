pub mod atomic;
pub mod canvas_store;
pub mod config;
pub mod digest;
pub mod error;
pub mod persistence;
pub mod save;

pub use atomic::{StagedWrite, WriteDurability, write_atomic};
pub use canvas_store::{CanvasState, CanvasStateStore, JsonCanvasStore, NoteRecord};
pub use config::StoreConfig;
pub use digest::{ContentDigest, Snapshot, TextSnapshot};
pub use error::{StoreError, StoreResult};
pub use persistence::{FileEntry, FilesChanged, FsPersistence, MemoryPersistence, PersistenceService};
pub use save::{SaveManager, SaveState, SaveStatus, ScheduleOutcome};
