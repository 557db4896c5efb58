//! Debounced, hash-gated save scheduler.
//!
//! One `SaveManager` per editing session. Editors report every content
//! change with [`SaveManager::schedule_save`]; the manager decides when to
//! write. Writes for one target never overlap: a change that arrives while
//! a write is in flight stays pending and is written by the same in-flight
//! loop once the current write finishes.
//!
//! State: `Idle → Debouncing → Saving → Idle`. A debounce timer can be
//! cancelled and superseded at any point before it fires; once a write has
//! begun it runs to completion.

use crate::digest::{ContentDigest, Snapshot};
use crate::error::{StoreError, StoreResult};
use crate::persistence::PersistenceService;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Content matches what is already saved or pending. Nothing changed.
    Unchanged,
    /// Content stored as pending and the debounce timer (re)started.
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Debouncing,
    Saving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStatus {
    pub state: SaveState,
    /// A snapshot is waiting to be written.
    pub dirty: bool,
    /// Message of the most recent failed write, cleared by the next success.
    pub last_error: Option<String>,
    pub writes: u64,
}

struct Pending<S> {
    snapshot: S,
    digest: ContentDigest,
}

struct Inner<S> {
    file_path: Option<PathBuf>,
    last_saved: Option<ContentDigest>,
    pending: Option<Pending<S>>,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the timer is replaced or cancelled; a timer that
    /// wakes with a stale generation does nothing.
    timer_generation: u64,
    saving: bool,
    /// Digest of the snapshot currently being written.
    writing: Option<ContentDigest>,
    last_error: Option<String>,
    writes: u64,
}

struct Shared<S> {
    inner: Mutex<Inner<S>>,
    /// Signalled whenever an in-flight write loop finishes.
    idle: Notify,
    persistence: Arc<dyn PersistenceService>,
    debounce: Duration,
}

impl<S> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct SaveManager<S: Snapshot> {
    shared: Arc<Shared<S>>,
}

impl<S: Snapshot> SaveManager<S> {
    pub fn new(persistence: Arc<dyn PersistenceService>, file_path: Option<PathBuf>, debounce: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    file_path,
                    last_saved: None,
                    pending: None,
                    timer: None,
                    timer_generation: 0,
                    saving: false,
                    writing: None,
                    last_error: None,
                    writes: 0,
                }),
                idle: Notify::new(),
                persistence,
                debounce,
            }),
        }
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.shared.lock().file_path.clone()
    }

    /// Point subsequent writes at `path` (after a rename, or once an
    /// untitled note gets a file).
    pub fn set_file_path(&self, path: Option<PathBuf>) {
        self.shared.lock().file_path = path;
    }

    /// Record `snapshot` as already on disk, e.g. right after loading it.
    pub fn mark_saved(&self, snapshot: &S) {
        self.shared.lock().last_saved = Some(snapshot.digest());
    }

    pub fn last_saved_digest(&self) -> Option<ContentDigest> {
        self.shared.lock().last_saved
    }

    pub fn status(&self) -> SaveStatus {
        let inner = self.shared.lock();
        let state = if inner.saving {
            SaveState::Saving
        } else if inner.timer.is_some() {
            SaveState::Debouncing
        } else {
            SaveState::Idle
        };
        SaveStatus {
            state,
            dirty: inner.pending.is_some(),
            last_error: inner.last_error.clone(),
            writes: inner.writes,
        }
    }

    /// Report new content. Must be called from within a Tokio runtime.
    pub fn schedule_save(&self, snapshot: S) -> ScheduleOutcome {
        let digest = snapshot.digest();
        let mut inner = self.shared.lock();

        // What the target will hold once any in-flight write lands.
        let on_disk = inner.writing.or(inner.last_saved);
        if on_disk == Some(digest) {
            // Edited back to what is on disk: whatever was pending is moot.
            if inner.pending.take().is_some() {
                cancel_timer(&mut inner);
                log::debug!("content reverted to saved state; pending save dropped");
            }
            return ScheduleOutcome::Unchanged;
        }
        if inner.pending.as_ref().is_some_and(|p| p.digest == digest) {
            return ScheduleOutcome::Unchanged;
        }

        cancel_timer(&mut inner);
        inner.pending = Some(Pending { snapshot, digest });
        let generation = inner.timer_generation;
        let shared = Arc::clone(&self.shared);
        inner.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            timer_fired(shared, generation).await;
        }));
        log::debug!("save scheduled ({digest:?})");
        ScheduleOutcome::Scheduled
    }

    /// Drop the pending snapshot and stop the timer, e.g. when the backing
    /// file is being deleted. An in-flight write still completes.
    pub fn discard_pending(&self) {
        let mut inner = self.shared.lock();
        cancel_timer(&mut inner);
        if inner.pending.take().is_some() {
            log::debug!("pending save discarded");
        }
    }

    /// Write any pending snapshot now. Waits for an in-flight write first.
    /// Returns whether a snapshot pending during this call reached disk,
    /// whichever write loop wrote it.
    ///
    /// The write itself runs on its own task: dropping this future does
    /// not abandon a write that has begun.
    pub async fn flush_save(&self) -> StoreResult<bool> {
        // Write count when a pending snapshot was first seen.
        let mut seen_pending: Option<u64> = None;
        loop {
            let idle = {
                let mut inner = self.shared.lock();
                cancel_timer(&mut inner);
                if seen_pending.is_none() && inner.pending.is_some() {
                    seen_pending = Some(inner.writes);
                }
                if !inner.saving {
                    if inner.pending.is_none() {
                        return Ok(seen_pending.is_some_and(|before| inner.writes > before));
                    }
                    inner.saving = true;
                    break;
                }
                self.shared.idle.notified()
            };
            idle.await;
        }
        let guard = WriteLoop {
            shared: Arc::clone(&self.shared),
        };
        let wrote = tokio::spawn(run_writes(guard))
            .await
            .map_err(|err| StoreError::WriteTask(err.to_string()))??;
        Ok(wrote || seen_pending.is_some_and(|before| self.shared.lock().writes > before))
    }

    /// Wait until no write is in flight. Never starts one.
    pub async fn wait_idle(&self) {
        loop {
            let idle = {
                let inner = self.shared.lock();
                if !inner.saving {
                    return;
                }
                self.shared.idle.notified()
            };
            idle.await;
        }
    }
}

fn cancel_timer<S>(inner: &mut Inner<S>) {
    inner.timer_generation += 1;
    if let Some(timer) = inner.timer.take() {
        timer.abort();
    }
}

async fn timer_fired<S: Snapshot>(shared: Arc<Shared<S>>, generation: u64) {
    {
        let mut inner = shared.lock();
        if inner.timer_generation != generation {
            return;
        }
        inner.timer = None;
        if inner.saving {
            // The in-flight loop picks up the pending snapshot.
            return;
        }
        inner.saving = true;
    }
    if let Err(err) = run_writes(WriteLoop { shared }).await {
        log::warn!("background save failed: {err}");
    }
}

/// Clears the in-flight markers and wakes waiters however the write loop
/// ends, including by panic or by its task never running.
struct WriteLoop<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Drop for WriteLoop<S> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        inner.saving = false;
        inner.writing = None;
        self.shared.idle.notify_waiters();
    }
}

/// Drain pending snapshots one write at a time. The caller has set
/// `saving` and handed over the guard that clears it.
async fn run_writes<S: Snapshot>(guard: WriteLoop<S>) -> StoreResult<bool> {
    let shared = &guard.shared;
    let mut wrote = false;
    loop {
        let (pending, path) = {
            let mut inner = shared.lock();
            let Some(pending) = inner.pending.take() else {
                return Ok(wrote);
            };
            if inner.last_saved == Some(pending.digest) {
                continue;
            }
            let Some(path) = inner.file_path.clone() else {
                inner.pending = Some(pending);
                inner.last_error = Some(StoreError::NoSaveTarget.to_string());
                return Err(StoreError::NoSaveTarget);
            };
            inner.writing = Some(pending.digest);
            (pending, path)
        };

        let result = write_snapshot(shared.persistence.as_ref(), &path, &pending.snapshot).await;

        let mut inner = shared.lock();
        inner.writing = None;
        match result {
            Ok(()) => {
                inner.last_saved = Some(pending.digest);
                inner.last_error = None;
                inner.writes += 1;
                wrote = true;
                log::debug!("saved {} ({:?})", path.display(), pending.digest);
            }
            Err(err) => {
                // A newer snapshot scheduled during the write supersedes this one.
                if inner.pending.is_none() {
                    inner.pending = Some(pending);
                }
                inner.last_error = Some(err.to_string());
                return Err(err);
            }
        }
    }
}

async fn write_snapshot<S: Snapshot>(persistence: &dyn PersistenceService, path: &Path, snapshot: &S) -> StoreResult<()> {
    let bytes = snapshot.encode()?;
    persistence.write_file_atomic(path, &bytes).await
}
