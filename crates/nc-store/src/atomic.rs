//! Crash-safe file replacement.
//!
//! A write goes to a sibling `<name>.tmp`, is synced to disk, then renamed
//! over the target. The rename is the commit point: `path` either holds the
//! old bytes or the new bytes, never a mix. A crash between steps can strand
//! a `.tmp` file, which is inert.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const TEMP_SUFFIX: &str = ".tmp";

/// How hard a commit tries to reach stable storage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WriteDurability {
    /// Sync the temp file's data, then rename.
    #[default]
    BestEffort,

    /// Additionally sync the parent directory after the rename so the new
    /// directory entry survives power loss. Platform-dependent.
    Durable,
}

/// `path` with `.tmp` appended to its file name.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

pub fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(TEMP_SUFFIX))
}

/// Bytes written and synced to the temp file but not yet visible at the target.
#[derive(Debug)]
#[must_use = "a staged write does nothing until committed or discarded"]
pub struct StagedWrite {
    target: PathBuf,
    temp: PathBuf,
}

impl StagedWrite {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp(&self) -> &Path {
        &self.temp
    }

    /// Rename the temp file onto the target.
    pub async fn commit(self, durability: WriteDurability) -> StoreResult<()> {
        if let Err(err) = fs::rename(&self.temp, &self.target).await {
            remove_quietly(&self.temp).await;
            return Err(StoreError::io(&self.target, err));
        }
        if durability == WriteDurability::Durable {
            sync_parent(&self.target).await;
        }
        Ok(())
    }

    /// Abandon the write. The target is untouched.
    pub async fn discard(self) {
        remove_quietly(&self.temp).await;
    }
}

/// Write `bytes` to the temp sibling of `path` and sync it, creating missing
/// parent directories first.
pub async fn stage(path: &Path, bytes: &[u8]) -> StoreResult<StagedWrite> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }
    let temp = temp_path(path);
    if let Err(err) = write_synced(&temp, bytes).await {
        remove_quietly(&temp).await;
        return Err(StoreError::io(&temp, err));
    }
    Ok(StagedWrite {
        target: path.to_path_buf(),
        temp,
    })
}

/// Replace `path` with `bytes` atomically.
pub async fn write_atomic(path: &Path, bytes: &[u8], durability: WriteDurability) -> StoreResult<()> {
    let staged = stage(path, bytes).await?;
    staged.commit(durability).await?;
    log::debug!("wrote {} byte(s) to {}", bytes.len(), path.display());
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

async fn remove_quietly(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove temp file {}: {e}", path.display()),
    }
}

async fn sync_parent(path: &Path) {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };
    // Directories cannot be opened for sync on every platform.
    match fs::File::open(parent).await {
        Ok(dir) => {
            if let Err(e) = dir.sync_all().await {
                log::debug!("directory sync failed for {}: {e}", parent.display());
            }
        }
        Err(e) => log::debug!("directory open failed for {}: {e}", parent.display()),
    }
}
