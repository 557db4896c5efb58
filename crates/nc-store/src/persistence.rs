//! File-level persistence behind an async trait.
//!
//! `FsPersistence` is the real implementation over `tokio::fs`;
//! `MemoryPersistence` keeps everything in a map for tests and previews.
//! Both broadcast a [`FilesChanged`] event after every successful mutation.

use crate::atomic::{self, WriteDurability, is_temp_file};
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use nc_core::name::normalize_name;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub size: u64,
}

/// Change notification emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesChanged {
    Written(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
}

#[async_trait]
pub trait PersistenceService: Send + Sync {
    /// `Ok(None)` when the file does not exist.
    async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>>;

    async fn write_file_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()>;

    async fn delete_file(&self, path: &Path) -> StoreResult<()>;

    /// Rename within the same directory. Fails with
    /// [`StoreError::RenameConflict`] if a sibling already has the same
    /// normalized name; the original is left untouched.
    async fn rename_file(&self, old: &Path, new_name: &str) -> StoreResult<PathBuf>;

    /// Regular files directly inside `dir`, sorted by name. Hidden and
    /// temporary files are skipped.
    async fn list_files(&self, dir: &Path) -> StoreResult<Vec<FileEntry>>;

    fn subscribe(&self) -> broadcast::Receiver<FilesChanged>;
}

/// Reject names that would escape the directory or cannot be a file name.
pub fn validate_file_name(name: &str) -> StoreResult<&str> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\', '\0'])
        || normalize_name(trimmed).is_empty();
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// Final file name for a rename: the old extension is kept when the new
/// name carries none.
fn target_name(old: &Path, new_name: &str) -> StoreResult<String> {
    let name = validate_file_name(new_name)?;
    match old.extension().and_then(|e| e.to_str()) {
        Some(ext) if Path::new(name).extension().is_none() => Ok(format!("{name}.{ext}")),
        _ => Ok(name.to_string()),
    }
}

fn has_conflict<'a>(old: &Path, new_name: &str, siblings: impl IntoIterator<Item = &'a Path>) -> bool {
    let wanted = normalize_name(new_name);
    let own = old.file_name();
    siblings
        .into_iter()
        .filter(|p| p.file_name() != own)
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .any(|n| normalize_name(n) == wanted)
}

fn is_listed(name: &str) -> bool {
    !name.starts_with('.') && !is_temp_file(Path::new(name))
}

// ─── Filesystem ──────────────────────────────────────────────────────────

pub struct FsPersistence {
    durability: WriteDurability,
    changes: broadcast::Sender<FilesChanged>,
}

impl FsPersistence {
    pub fn new(durability: WriteDurability) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { durability, changes }
    }

    fn notify(&self, event: FilesChanged) {
        // No subscribers is fine.
        let _ = self.changes.send(event);
    }
}

impl Default for FsPersistence {
    fn default() -> Self {
        Self::new(WriteDurability::default())
    }
}

#[async_trait]
impl PersistenceService for FsPersistence {
    async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    async fn write_file_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        atomic::write_atomic(path, bytes, self.durability).await?;
        self.notify(FilesChanged::Written(path.to_path_buf()));
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> StoreResult<()> {
        fs::remove_file(path)
            .await
            .map_err(|e| StoreError::io(path, e))?;
        self.notify(FilesChanged::Deleted(path.to_path_buf()));
        Ok(())
    }

    async fn rename_file(&self, old: &Path, new_name: &str) -> StoreResult<PathBuf> {
        if !fs::try_exists(old).await.map_err(|e| StoreError::io(old, e))? {
            return Err(StoreError::NotFound(old.to_path_buf()));
        }
        let name = target_name(old, new_name)?;
        let dir = old
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let siblings: Vec<PathBuf> = self
            .list_files(dir)
            .await?
            .into_iter()
            .map(|e| e.path)
            .collect();
        if has_conflict(old, &name, siblings.iter().map(PathBuf::as_path)) {
            log::warn!("rename of {} to {name:?} refused: name taken", old.display());
            return Err(StoreError::RenameConflict {
                from: old.to_path_buf(),
                new_name: name,
            });
        }
        let new_path = old.with_file_name(&name);
        fs::rename(old, &new_path)
            .await
            .map_err(|e| StoreError::io(old, e))?;
        self.notify(FilesChanged::Renamed {
            from: old.to_path_buf(),
            to: new_path.clone(),
        });
        Ok(new_path)
    }

    async fn list_files(&self, dir: &Path) -> StoreResult<Vec<FileEntry>> {
        let mut read_dir = fs::read_dir(dir).await.map_err(|e| StoreError::io(dir, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(|e| StoreError::io(dir, e))? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_listed(&name) {
                continue;
            }
            let meta = entry
                .metadata()
                .await
                .map_err(|e| StoreError::io(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            entries.push(FileEntry {
                name,
                path: entry.path(),
                modified: meta.modified().ok(),
                size: meta.len(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn subscribe(&self) -> broadcast::Receiver<FilesChanged> {
        self.changes.subscribe()
    }
}

// ─── In-memory ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    modified: SystemTime,
}

pub struct MemoryPersistence {
    files: Mutex<BTreeMap<PathBuf, MemoryFile>>,
    changes: broadcast::Sender<FilesChanged>,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            files: Mutex::new(BTreeMap::new()),
            changes,
        }
    }
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    fn files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MemoryFile>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.files().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files().is_empty()
    }

    fn notify(&self, event: FilesChanged) {
        let _ = self.changes.send(event);
    }
}

#[async_trait]
impl PersistenceService for MemoryPersistence {
    async fn read_file(&self, path: &Path) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.files().get(path).map(|f| f.bytes.clone()))
    }

    async fn write_file_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        self.files().insert(
            path.to_path_buf(),
            MemoryFile {
                bytes: bytes.to_vec(),
                modified: SystemTime::now(),
            },
        );
        self.notify(FilesChanged::Written(path.to_path_buf()));
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> StoreResult<()> {
        if self.files().remove(path).is_none() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        self.notify(FilesChanged::Deleted(path.to_path_buf()));
        Ok(())
    }

    async fn rename_file(&self, old: &Path, new_name: &str) -> StoreResult<PathBuf> {
        let name = target_name(old, new_name)?;
        let new_path = old.with_file_name(&name);
        {
            let mut files = self.files();
            if !files.contains_key(old) {
                return Err(StoreError::NotFound(old.to_path_buf()));
            }
            let dir = old.parent();
            let siblings = files.keys().filter(|p| p.parent() == dir).map(PathBuf::as_path);
            if has_conflict(old, &name, siblings) {
                return Err(StoreError::RenameConflict {
                    from: old.to_path_buf(),
                    new_name: name,
                });
            }
            if let Some(file) = files.remove(old) {
                files.insert(new_path.clone(), file);
            }
        }
        self.notify(FilesChanged::Renamed {
            from: old.to_path_buf(),
            to: new_path.clone(),
        });
        Ok(new_path)
    }

    async fn list_files(&self, dir: &Path) -> StoreResult<Vec<FileEntry>> {
        Ok(self
            .files()
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir))
            .filter_map(|(p, f)| {
                let name = p.file_name()?.to_str()?.to_string();
                is_listed(&name).then(|| FileEntry {
                    name,
                    path: p.clone(),
                    modified: Some(f.modified),
                    size: f.bytes.len() as u64,
                })
            })
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<FilesChanged> {
        self.changes.subscribe()
    }
}
