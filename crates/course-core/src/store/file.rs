//! Store persisted as a JSON file
//!
//! Records are served from memory. Writes mark the state dirty and
//! [`EntityStore::flush`] writes the whole state back once. Loading takes a
//! shared lock on the file; saving writes a temp file and renames it over the
//! target under an exclusive lock.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use fs2::FileExt;

use super::memory::{CurriculumState, MemoryStore, Table};
use super::{EntityStore, StoreError, StoreResult, UpsertRequest};
use crate::model::{EntityFields, Record};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: AtomicBool,
}

impl FileStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.is_file() {
            load_state(&path)?
        } else {
            tracing::debug!(?path, "Store file not found, starting empty");
            CurriculumState::default()
        };

        Ok(Self {
            path,
            inner: MemoryStore::from_state(state),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> CurriculumState {
        self.inner.snapshot()
    }

    /// Whether there are writes not yet flushed to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    async fn persist(&self) -> StoreResult<()> {
        let state = self.inner.snapshot();
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_state(&path, &state))
            .await
            .map_err(|e| StoreError::unavailable(format!("store writer failed: {e}")))?
    }
}

fn load_state(path: &Path) -> StoreResult<CurriculumState> {
    let file = File::open(path)?;
    file.lock_shared()?;

    let mut content = String::new();
    (&file).read_to_string(&mut content)?;
    if content.trim().is_empty() {
        return Ok(CurriculumState::default());
    }
    Ok(serde_json::from_str(&content)?)
}

fn save_state(path: &Path, state: &CurriculumState) -> StoreResult<()> {
    let content = serde_json::to_string_pretty(state)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, &content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

#[async_trait]
impl<F> EntityStore<F> for FileStore
where
    F: EntityFields,
    CurriculumState: Table<F>,
{
    async fn find_children(&self, parent_id: &str) -> StoreResult<Vec<Record<F>>> {
        self.inner.find_children(parent_id).await
    }

    async fn upsert(&self, request: UpsertRequest<F>) -> StoreResult<()> {
        self.inner.upsert(request).await?;
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        let deleted = EntityStore::<F>::delete_many(&self.inner, ids).await?;
        if deleted > 0 {
            self.dirty.store(true, Ordering::Release);
        }
        Ok(deleted)
    }

    async fn flush(&self) -> StoreResult<()> {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if let Err(e) = self.persist().await {
            self.dirty.store(true, Ordering::Release);
            return Err(e);
        }
        tracing::trace!(path = ?self.path, "Store flushed");
        Ok(())
    }
}
