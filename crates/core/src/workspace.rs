//! On-disk working directories.
//!
//! Raw downloads live under `<root>/<raw_dir>/<source_id>/` and produced
//! stickers under `<root>/<sticker_dir>/<source_id>/`. A directory pair is
//! owned by the one job admitted for that source id.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::job::SourceId;

/// Workspace directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Root of all working directories (default: ./work)
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Subdirectory for raw gallery downloads (default: img)
    #[serde(default = "default_raw_dir")]
    pub raw_dir: String,
    /// Subdirectory for produced stickers (default: sticker)
    #[serde(default = "default_sticker_dir")]
    pub sticker_dir: String,
}

fn default_root() -> PathBuf {
    PathBuf::from("./work")
}

fn default_raw_dir() -> String {
    "img".to_string()
}

fn default_sticker_dir() -> String {
    "sticker".to_string()
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            raw_dir: default_raw_dir(),
            sticker_dir: default_sticker_dir(),
        }
    }
}

impl WorkspaceConfig {
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }
}

/// Directories belonging to one job.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    pub source_id: SourceId,
    /// Raw downloads, `1.<ext>`, `2.<ext>`, ...
    pub raw_dir: PathBuf,
    /// Artifacts and per-item frame directories.
    pub sticker_dir: PathBuf,
}

impl JobWorkspace {
    /// Creates both directories.
    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.raw_dir).await?;
        tokio::fs::create_dir_all(&self.sticker_dir).await
    }

    /// Empties the raw download directory, keeping the directory itself.
    pub async fn clear_raw(&self) -> std::io::Result<()> {
        remove_dir_if_exists(&self.raw_dir).await?;
        tokio::fs::create_dir_all(&self.raw_dir).await
    }

    /// Path of raw file number `index` (1-based) with extension `ext`.
    pub fn raw_file(&self, index: usize, ext: &str) -> PathBuf {
        self.raw_dir.join(format!("{}.{}", index, ext))
    }

    /// Directory holding the extracted frames of output item `index`.
    pub fn frames_dir(&self, index: usize) -> PathBuf {
        self.sticker_dir
            .join(format!("{}_{}", self.source_id, index))
    }
}

/// Root of all job directories.
#[derive(Debug, Clone)]
pub struct Workspace {
    raw_root: PathBuf,
    sticker_root: PathBuf,
    delete_lock: Arc<Mutex<()>>,
}

impl Workspace {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            raw_root: config.root.join(&config.raw_dir),
            sticker_root: config.root.join(&config.sticker_dir),
            delete_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn raw_root(&self) -> &Path {
        &self.raw_root
    }

    pub fn sticker_root(&self) -> &Path {
        &self.sticker_root
    }

    /// Directory pair for `source_id`. Nothing is created on disk.
    pub fn job(&self, source_id: SourceId) -> JobWorkspace {
        JobWorkspace {
            source_id,
            raw_dir: self.raw_root.join(source_id.to_string()),
            sticker_dir: self.sticker_root.join(source_id.to_string()),
        }
    }

    /// Deletes every directory of `source_id`. Missing directories are fine.
    pub async fn delete(&self, source_id: SourceId) -> std::io::Result<()> {
        let _guard = self.delete_lock.lock().await;
        let job = self.job(source_id);
        remove_dir_if_exists(&job.raw_dir).await?;
        remove_dir_if_exists(&job.sticker_dir).await?;
        debug!(source_id, "Deleted job workspace");
        Ok(())
    }

    /// Wipes and recreates both roots.
    pub async fn reset(&self) -> std::io::Result<()> {
        let _guard = self.delete_lock.lock().await;
        for root in [&self.raw_root, &self.sticker_root] {
            remove_dir_if_exists(root).await?;
            tokio::fs::create_dir_all(root).await?;
        }
        info!(
            raw = %self.raw_root.display(),
            sticker = %self.sticker_root.display(),
            "Workspace reset"
        );
        Ok(())
    }
}

async fn remove_dir_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
