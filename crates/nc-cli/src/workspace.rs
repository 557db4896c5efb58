//! Vault workspace: the canvas index, the active canvas session, and one
//! save scheduler per open note editor.
//!
//! Switching canvases flushes every open editor and persists the outgoing
//! layout before the incoming canvas is loaded, so no write for one canvas
//! can race with the next.

use crate::config::AppConfig;
use anyhow::{Context, bail};
use nc_core::format::{
    TEXT_NOTE_EXTENSION, TextNoteFile, emit_text_note, parse_drawing_document, parse_text_note,
};
use nc_core::model::{CanvasIndex, DrawingScene, Note, NoteKind, NoteSet};
use nc_core::name::normalize_name;
use nc_core::{CanvasId, LinkEdge, NoteId};
use nc_editor::session::{CanvasSession, NoteCanvasHost};
use nc_store::persistence::validate_file_name;
use nc_store::{
    CanvasState, CanvasStateStore, FsPersistence, JsonCanvasStore, PersistenceService, SaveManager,
    SaveStatus, ScheduleOutcome, StoreError, StoreResult, TextSnapshot,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

enum Editor {
    Text(SaveManager<TextSnapshot>),
    Drawing(SaveManager<DrawingScene>),
}

impl Editor {
    async fn flush(&self) -> StoreResult<bool> {
        match self {
            Self::Text(saves) => saves.flush_save().await,
            Self::Drawing(saves) => saves.flush_save().await,
        }
    }

    fn set_file_path(&self, path: Option<PathBuf>) {
        match self {
            Self::Text(saves) => saves.set_file_path(path),
            Self::Drawing(saves) => saves.set_file_path(path),
        }
    }

    fn discard_pending(&self) {
        match self {
            Self::Text(saves) => saves.discard_pending(),
            Self::Drawing(saves) => saves.discard_pending(),
        }
    }

    async fn wait_idle(&self) {
        match self {
            Self::Text(saves) => saves.wait_idle().await,
            Self::Drawing(saves) => saves.wait_idle().await,
        }
    }

    fn status(&self) -> SaveStatus {
        match self {
            Self::Text(saves) => saves.status(),
            Self::Drawing(saves) => saves.status(),
        }
    }
}

pub struct Workspace {
    vault: PathBuf,
    config: AppConfig,
    persistence: Arc<dyn PersistenceService>,
    store: JsonCanvasStore,
    index: CanvasIndex,
    session: CanvasSession,
    editors: HashMap<NoteId, Editor>,
}

impl Workspace {
    /// Open a vault directory with its `notecanvas.json` (if any) on the
    /// real filesystem.
    pub async fn open(vault: &Path) -> anyhow::Result<Self> {
        let config = AppConfig::load(vault).await?;
        let persistence: Arc<dyn PersistenceService> = Arc::new(FsPersistence::new(config.store.durability));
        Self::open_with(vault, config, persistence).await
    }

    pub async fn open_with(
        vault: &Path,
        config: AppConfig,
        persistence: Arc<dyn PersistenceService>,
    ) -> anyhow::Result<Self> {
        let store = JsonCanvasStore::new(vault, &config.store.meta_dir, Arc::clone(&persistence));
        let index = store.load_index().await.context("loading canvas index")?;
        let mut workspace = Self {
            vault: vault.to_path_buf(),
            config,
            persistence,
            store,
            index,
            session: CanvasSession::empty(CanvasId::home()),
            editors: HashMap::new(),
        };
        workspace.session = workspace.load_session(CanvasId::home()).await?;
        log::info!(
            "opened vault {} ({} canvas(es))",
            vault.display(),
            workspace.index.ids().len()
        );
        Ok(workspace)
    }

    pub fn vault(&self) -> &Path {
        &self.vault
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn canvases(&self) -> &[CanvasId] {
        self.index.ids()
    }

    pub fn session(&self) -> &CanvasSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut CanvasSession {
        &mut self.session
    }

    /// Absolute location of a vault-relative note path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.vault.join(path)
    }

    // ─── Loading ─────────────────────────────────────────────────────────

    async fn load_session(&self, id: CanvasId) -> anyhow::Result<CanvasSession> {
        let state = self
            .store
            .load_canvas(&id)
            .await
            .with_context(|| format!("loading canvas {id}"))?;
        let mut notes = NoteSet::new();
        for record in state.notes {
            let mut note = record.into_note(None);
            self.load_content(&mut note).await;
            if let Err(e) = notes.insert(note) {
                log::warn!("canvas {id}: {e}");
            }
        }
        let mut session = CanvasSession::new(id, state.camera, notes, self.config.interaction);
        session.set_viewport(*self.session.viewport());
        Ok(session)
    }

    /// Fill a note's content from its backing file. A missing or unreadable
    /// file leaves the note empty rather than failing the whole canvas.
    async fn load_content(&self, note: &mut Note) {
        let Some(path) = note.file_path.as_deref().map(|p| self.resolve(p)) else {
            return;
        };
        let bytes = match self.persistence.read_file(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::warn!("backing file missing: {}", path.display());
                return;
            }
            Err(e) => {
                log::warn!("{e}");
                return;
            }
        };
        match &mut note.kind {
            NoteKind::TextNote { content } => {
                let file = parse_text_note(&String::from_utf8_lossy(&bytes));
                *content = file.body;
                if !file.title.is_empty() {
                    note.title = Some(file.title);
                }
            }
            NoteKind::DrawingNote { scene } => match parse_drawing_document(&bytes) {
                Ok(loaded) => *scene = loaded,
                Err(e) => log::warn!("{}: {e}", path.display()),
            },
            NoteKind::CanvasLinkCard { .. } => {}
        }
    }

    // ─── Editors ─────────────────────────────────────────────────────────

    /// Start tracking saves for a note. The note's current content counts
    /// as already saved.
    pub fn open_editor(&mut self, id: NoteId) -> anyhow::Result<()> {
        if self.editors.contains_key(&id) {
            return Ok(());
        }
        let note = self
            .session
            .note(id)
            .with_context(|| format!("note {id} is not on canvas {}", self.session.canvas_id()))?;
        let path = note.file_path.as_deref().map(|p| self.resolve(p));
        let persistence = Arc::clone(&self.persistence);
        let editor = match &note.kind {
            NoteKind::TextNote { content } => {
                let saves = SaveManager::new(persistence, path, self.config.store.text_debounce());
                saves.mark_saved(&TextSnapshot::new(note.title.clone().unwrap_or_default(), content.clone()));
                Editor::Text(saves)
            }
            NoteKind::DrawingNote { scene } => {
                let saves = SaveManager::new(persistence, path, self.config.store.drawing_debounce());
                saves.mark_saved(scene);
                Editor::Drawing(saves)
            }
            NoteKind::CanvasLinkCard { .. } => bail!("canvas link cards have no editor"),
        };
        self.editors.insert(id, editor);
        Ok(())
    }

    /// Flush and stop tracking a note's editor.
    pub async fn close_editor(&mut self, id: NoteId) -> anyhow::Result<bool> {
        let Some(editor) = self.editors.get(&id) else {
            return Ok(false);
        };
        let wrote = editor.flush().await?;
        self.editors.remove(&id);
        Ok(wrote)
    }

    pub fn save_status(&self, id: NoteId) -> Option<SaveStatus> {
        self.editors.get(&id).map(Editor::status)
    }

    pub fn edit_text(&mut self, id: NoteId, body: &str) -> anyhow::Result<ScheduleOutcome> {
        self.open_editor(id)?;
        self.session.set_text_content(id, body)?;
        let title = self
            .session
            .note(id)
            .and_then(|n| n.title.clone())
            .unwrap_or_default();
        let Some(Editor::Text(saves)) = self.editors.get(&id) else {
            bail!("note {id} is not a text note");
        };
        Ok(saves.schedule_save(TextSnapshot::new(title, body)))
    }

    pub fn edit_drawing(&mut self, id: NoteId, scene: DrawingScene) -> anyhow::Result<ScheduleOutcome> {
        self.open_editor(id)?;
        self.session.set_drawing_scene(id, scene.clone())?;
        let Some(Editor::Drawing(saves)) = self.editors.get(&id) else {
            bail!("note {id} is not a drawing note");
        };
        Ok(saves.schedule_save(scene))
    }

    /// Flush every open editor. Returns how many wrote.
    pub async fn flush_all(&self) -> anyhow::Result<usize> {
        let mut written = 0;
        let mut failures = Vec::new();
        for (id, editor) in &self.editors {
            match editor.flush().await {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => failures.push(format!("{id}: {e}")),
            }
        }
        if !failures.is_empty() {
            bail!("could not save {} note(s): {}", failures.len(), failures.join("; "));
        }
        Ok(written)
    }

    // ─── Canvases ────────────────────────────────────────────────────────

    pub async fn save_layout(&self) -> anyhow::Result<()> {
        let state = CanvasState::capture(*self.session.camera(), self.session.notes().iter());
        self.store
            .save_canvas(self.session.canvas_id(), &state)
            .await
            .with_context(|| format!("saving layout of canvas {}", self.session.canvas_id()))
    }

    pub async fn switch_canvas(&mut self, id: &CanvasId) -> anyhow::Result<()> {
        if !self.index.contains(id) {
            bail!("no canvas named {id}");
        }
        if self.session.canvas_id() == id {
            return Ok(());
        }
        self.flush_all().await?;
        self.save_layout().await?;
        let incoming = self.load_session(id.clone()).await?;
        self.editors.clear();
        let outgoing = std::mem::replace(&mut self.session, incoming);
        log::info!("switched canvas {} → {id}", outgoing.canvas_id());
        Ok(())
    }

    pub async fn create_canvas(&mut self, name: &str) -> anyhow::Result<CanvasId> {
        let name = name.trim();
        if name.is_empty() {
            bail!("canvas name cannot be empty");
        }
        let wanted = normalize_name(name);
        if self.index.ids().iter().any(|c| normalize_name(c.as_str()) == wanted) {
            bail!("a canvas named {name:?} already exists");
        }
        let id = CanvasId::new(name);
        self.index.add(id.clone())?;
        self.store.save_index(&self.index).await?;
        log::info!("created canvas {id}");
        Ok(id)
    }

    /// Remove a canvas. Deleting the active canvas switches to home first.
    pub async fn delete_canvas(&mut self, id: &CanvasId) -> anyhow::Result<()> {
        if id.is_home() {
            return Err(StoreError::HomeCanvasLocked(id.to_string()).into());
        }
        if self.session.canvas_id() == id {
            self.switch_canvas(&CanvasId::home()).await?;
        }
        self.index.remove(id)?;
        self.store.delete_canvas(id).await?;
        self.store.save_index(&self.index).await?;
        log::info!("deleted canvas {id}");
        Ok(())
    }

    // ─── Notes ───────────────────────────────────────────────────────────

    /// Create `<vault>/<title>.md` and place it at the viewport center.
    pub async fn add_text_note(&mut self, title: &str) -> anyhow::Result<NoteId> {
        let title = title.trim();
        let file_name = format!("{title}.{TEXT_NOTE_EXTENSION}");
        validate_file_name(&file_name)?;
        let wanted = normalize_name(&file_name);
        let taken = self
            .persistence
            .list_files(&self.vault)
            .await?
            .iter()
            .any(|entry| normalize_name(&entry.name) == wanted);
        if taken {
            bail!("a note named {title:?} already exists");
        }

        let relative = PathBuf::from(&file_name);
        let text = emit_text_note(&TextNoteFile {
            title: title.to_string(),
            body: String::new(),
        });
        self.persistence
            .write_file_atomic(&self.resolve(&relative), text.as_bytes())
            .await?;
        let id = self.session.create_note_on_canvas(&relative, NoteKind::text(""));
        self.session.set_title(id, Some(title.to_string()))?;
        self.save_layout().await?;
        Ok(id)
    }

    /// Place a card that navigates to `target` at the viewport center.
    pub async fn add_canvas_card(&mut self, target: &CanvasId) -> anyhow::Result<NoteId> {
        if !self.index.contains(target) {
            bail!("no canvas named {target}");
        }
        let center = self.session.viewport_center_world();
        let note = Note::new(
            NoteId::generate(),
            center.x,
            center.y,
            NoteKind::CanvasLinkCard {
                target: target.clone(),
            },
        )
        .with_title(target.as_str());
        let id = note.id;
        self.session.add_note(note)?;
        self.save_layout().await?;
        Ok(id)
    }

    /// Delete a note's backing file, then take it off the canvas.
    pub async fn delete_note_permanently(&mut self, id: NoteId) -> anyhow::Result<()> {
        let note = self
            .session
            .note(id)
            .with_context(|| format!("note {id} is not on this canvas"))?;
        let path = note.file_path.as_deref().map(|p| self.resolve(p));
        if let Some(editor) = self.editors.remove(&id) {
            // A write already under way would land after the delete.
            editor.discard_pending();
            editor.wait_idle().await;
        }
        if let Some(path) = path {
            match self.persistence.delete_file(&path).await {
                Err(e) if e.is_not_found() => {}
                other => other?,
            }
        }
        self.session.detach_note(id)?;
        self.save_layout().await
    }

    /// Rename a note's backing file. On a name conflict nothing changes
    /// and the error is returned for the user to see.
    pub async fn rename_note_file(&mut self, id: NoteId, new_name: &str) -> anyhow::Result<PathBuf> {
        let note = self
            .session
            .note(id)
            .with_context(|| format!("note {id} is not on this canvas"))?;
        let Some(relative) = note.file_path.clone() else {
            bail!("note {id} has no backing file");
        };
        let renames_title = !matches!(note.kind, NoteKind::TextNote { .. });

        // Pending edits land at the old path before it moves.
        if let Some(editor) = self.editors.get(&id) {
            editor.flush().await?;
        }
        let new_path = self
            .persistence
            .rename_file(&self.resolve(&relative), new_name)
            .await?;

        let new_relative = relative.with_file_name(new_path.file_name().unwrap_or_default());
        self.session.set_file_path(id, &new_relative)?;
        if renames_title {
            let stem = new_relative.file_stem().and_then(|s| s.to_str()).map(str::to_string);
            self.session.set_title(id, stem)?;
        }
        if let Some(editor) = self.editors.get(&id) {
            editor.set_file_path(Some(new_path.clone()));
        }
        self.save_layout().await?;
        Ok(new_path)
    }

    pub fn links(&mut self) -> Vec<LinkEdge> {
        self.session.links().edges().to_vec()
    }

    /// Flush everything and persist the layout. Call before exit.
    pub async fn shutdown(&mut self) -> anyhow::Result<()> {
        self.flush_all().await?;
        self.save_layout().await?;
        self.editors.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nc_store::{FileEntry, FilesChanged, MemoryPersistence, SaveState, StoreConfig};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::{Semaphore, broadcast};

    async fn workspace() -> (Workspace, Arc<MemoryPersistence>) {
        let mem = Arc::new(MemoryPersistence::new());
        let config = AppConfig {
            store: StoreConfig {
                text_debounce_ms: 60_000,
                drawing_debounce_ms: 60_000,
                ..Default::default()
            },
            ..Default::default()
        };
        let ws = Workspace::open_with(Path::new("vault"), config, Arc::clone(&mem) as Arc<dyn PersistenceService>)
            .await
            .unwrap();
        (ws, mem)
    }

    async fn read(mem: &MemoryPersistence, path: &str) -> Option<String> {
        mem.read_file(Path::new(path))
            .await
            .unwrap()
            .map(|b| String::from_utf8(b).unwrap())
    }

    #[tokio::test]
    async fn fresh_vault_opens_on_home() {
        let (ws, _) = workspace().await;
        assert_eq!(ws.canvases(), &[CanvasId::home()]);
        assert!(ws.session().canvas_id().is_home());
        assert!(ws.session().notes().is_empty());
    }

    #[tokio::test]
    async fn links_follow_text_edits() {
        let (mut ws, _) = workspace().await;
        let a = ws.add_text_note("Alpha").await.unwrap();
        let b = ws.add_text_note("Beta").await.unwrap();
        ws.edit_text(a, "see [[beta]]").unwrap();
        assert_eq!(ws.links(), vec![LinkEdge { from: a, to: b }]);
    }

    #[tokio::test]
    async fn switching_canvas_flushes_open_editors() {
        let (mut ws, mem) = workspace().await;
        let id = ws.add_text_note("Plan").await.unwrap();
        assert_eq!(ws.edit_text(id, "step one").unwrap(), ScheduleOutcome::Scheduled);
        assert!(ws.save_status(id).unwrap().dirty);

        let research = ws.create_canvas("research").await.unwrap();
        ws.switch_canvas(&research).await.unwrap();
        assert_eq!(read(&mem, "vault/Plan.md").await.as_deref(), Some("Plan\nstep one"));
        assert!(ws.session().notes().is_empty());

        ws.switch_canvas(&CanvasId::home()).await.unwrap();
        let note = ws.session().note(id).unwrap();
        assert_eq!(note.text_content(), Some("step one"));
        assert_eq!(note.title.as_deref(), Some("Plan"));
    }

    #[tokio::test]
    async fn shutdown_flushes_pending_edits() {
        let (mut ws, mem) = workspace().await;
        let id = ws.add_text_note("Later").await.unwrap();
        ws.edit_text(id, "unsaved").unwrap();
        ws.shutdown().await.unwrap();
        assert_eq!(read(&mem, "vault/Later.md").await.as_deref(), Some("Later\nunsaved"));
    }

    #[tokio::test]
    async fn duplicate_note_names_are_refused() {
        let (mut ws, _) = workspace().await;
        ws.add_text_note("Idea").await.unwrap();
        assert!(ws.add_text_note("idea").await.is_err());
        assert_eq!(ws.session().notes().len(), 1);
    }

    #[tokio::test]
    async fn rename_conflict_changes_nothing() {
        let (mut ws, mem) = workspace().await;
        let a = ws.add_text_note("Alpha").await.unwrap();
        ws.add_text_note("Beta").await.unwrap();

        let err = ws.rename_note_file(a, "BETA").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::RenameConflict { .. })
        ));
        assert_eq!(ws.session().note(a).unwrap().file_name(), Some("Alpha.md"));
        assert!(read(&mem, "vault/Alpha.md").await.is_some());

        let moved = ws.rename_note_file(a, "Gamma").await.unwrap();
        assert_eq!(moved, PathBuf::from("vault/Gamma.md"));
        assert_eq!(ws.session().note(a).unwrap().file_name(), Some("Gamma.md"));
        assert!(read(&mem, "vault/Alpha.md").await.is_none());
    }

    #[tokio::test]
    async fn permanent_delete_removes_file_and_note() {
        let (mut ws, mem) = workspace().await;
        let id = ws.add_text_note("Scrap").await.unwrap();
        ws.edit_text(id, "pending").unwrap();
        ws.delete_note_permanently(id).await.unwrap();
        assert!(ws.session().note(id).is_none());
        assert!(read(&mem, "vault/Scrap.md").await.is_none());
        ws.shutdown().await.unwrap();
        assert!(read(&mem, "vault/Scrap.md").await.is_none());
    }

    /// Memory persistence whose writes block while armed.
    struct HeldWrites {
        mem: MemoryPersistence,
        armed: AtomicBool,
        gate: Semaphore,
    }

    impl HeldWrites {
        fn new() -> Self {
            Self {
                mem: MemoryPersistence::new(),
                armed: AtomicBool::new(false),
                gate: Semaphore::new(0),
            }
        }

        fn release(&self) {
            self.armed.store(false, Ordering::SeqCst);
            self.gate.add_permits(1);
        }
    }

    #[async_trait]
    impl PersistenceService for HeldWrites {
        async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
            self.mem.read_file(path).await
        }

        async fn write_file_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
            if self.armed.load(Ordering::SeqCst)
                && let Ok(permit) = self.gate.acquire().await
            {
                permit.forget();
            }
            self.mem.write_file_atomic(path, bytes).await
        }

        async fn delete_file(&self, path: &Path) -> StoreResult<()> {
            self.mem.delete_file(path).await
        }

        async fn rename_file(&self, old: &Path, new_name: &str) -> StoreResult<PathBuf> {
            self.mem.rename_file(old, new_name).await
        }

        async fn list_files(&self, dir: &Path) -> StoreResult<Vec<FileEntry>> {
            self.mem.list_files(dir).await
        }

        fn subscribe(&self) -> broadcast::Receiver<FilesChanged> {
            self.mem.subscribe()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_delete_outlasts_a_write_in_flight() {
        let held = Arc::new(HeldWrites::new());
        let config = AppConfig {
            store: StoreConfig {
                text_debounce_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut ws = Workspace::open_with(Path::new("vault"), config, Arc::clone(&held) as Arc<dyn PersistenceService>)
            .await
            .unwrap();
        let id = ws.add_text_note("Scrap").await.unwrap();

        held.armed.store(true, Ordering::SeqCst);
        ws.edit_text(id, "pending").unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ws.save_status(id).unwrap().state, SaveState::Saving);

        let (deleted, ()) = tokio::join!(ws.delete_note_permanently(id), async {
            for _ in 0..10 {
                tokio::task::yield_now().await;
            }
            held.release();
        });
        deleted.unwrap();
        assert!(ws.session().note(id).is_none());
        assert!(read(&held.mem, "vault/Scrap.md").await.is_none());
    }

    #[tokio::test]
    async fn canvas_lifecycle() {
        let (mut ws, _) = workspace().await;
        let err = ws.delete_canvas(&CanvasId::home()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::HomeCanvasLocked(_))
        ));

        let research = ws.create_canvas("research").await.unwrap();
        assert!(ws.create_canvas("Research").await.is_err());
        ws.add_canvas_card(&research).await.unwrap();
        ws.switch_canvas(&research).await.unwrap();
        ws.delete_canvas(&research).await.unwrap();
        assert!(ws.session().canvas_id().is_home());
        assert_eq!(ws.canvases(), &[CanvasId::home()]);
    }

    #[tokio::test]
    async fn layout_reloads_from_store() {
        let (mut ws, mem) = workspace().await;
        let id = ws.add_text_note("Pinned").await.unwrap();
        ws.session_mut().pan_by(25.0, -10.0);
        ws.shutdown().await.unwrap();

        let reopened = Workspace::open_with(
            Path::new("vault"),
            AppConfig::default(),
            Arc::clone(&mem) as Arc<dyn PersistenceService>,
        )
        .await
        .unwrap();
        assert_eq!(reopened.session().camera().pan_x, 25.0);
        assert_eq!(reopened.session().note(id).unwrap().file_name(), Some("Pinned.md"));
    }
}
