//! Command implementations for course-cli

pub mod courses;
pub mod status;
pub mod sync;

pub use courses::run_courses;
pub use status::run_status;
pub use sync::{SyncArgs, run_sync};

use std::path::{Path, PathBuf};

use course_core::{ConfigResolver, FileStore, SyncConfig};

use crate::error::Result;

/// Paths shared by every command, resolved against the working directory
#[derive(Debug, Clone)]
pub struct Context {
    pub working_dir: PathBuf,
    pub config: Option<PathBuf>,
    pub store: PathBuf,
    pub source: PathBuf,
}

impl Context {
    pub fn load_config(&self) -> Result<SyncConfig> {
        let explicit = self.config.as_deref().map(|p| self.resolve(p));
        let resolver = ConfigResolver::new(self.working_dir.clone());
        Ok(resolver.resolve(explicit.as_deref())?)
    }

    pub fn open_store(&self) -> Result<FileStore> {
        Ok(FileStore::open(self.store_path())?)
    }

    pub fn store_path(&self) -> PathBuf {
        self.resolve(&self.store)
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}
