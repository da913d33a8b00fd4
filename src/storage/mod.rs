//! # Storage - catalog snapshot persistence
//!
//! A single JSON snapshot file holds the whole catalog. Writes go through an
//! exclusive `fs2` lock on the destination, a temp file in the same directory and
//! an atomic rename, so a crash mid-write leaves the previous snapshot intact.
//!
//! ```rust,no_run
//! use craftcost::storage::SnapshotStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SnapshotStore::new("data/catalog.json");
//!     if let Some(catalog) = store.load().await? {
//!         store.save(&catalog.save()?).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! - [`saver`] - periodic task that persists the catalog when it is dirty

pub mod saver;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

use crate::catalog::graph::validate;
use crate::catalog::seed_loader::{load_seed_from_json, populate, NameTable, SeedReport};
use crate::catalog::{Catalog, LifecycleState};

/// Metadata of the snapshot on disk, for status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the catalog, `None` when no snapshot exists yet.
    pub async fn load(&self) -> Result<Option<Catalog>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(anyhow!("Failed to read snapshot {}: {}", self.path.display(), e)),
        };
        // A lock file created by an interrupted first write is empty.
        if bytes.is_empty() {
            return Ok(None);
        }
        let catalog = Catalog::load(&bytes)
            .map_err(|e| anyhow!("Failed to parse snapshot {}: {}", self.path.display(), e))?;
        Ok(Some(catalog))
    }

    pub async fn save(&self, content: &[u8]) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| anyhow!("Failed to create snapshot directory {}: {}", dir.display(), e))?;
        }
        Self::write_file_locked(&self.path, content).await?;
        info!("snapshot written to {} ({} bytes)", self.path.display(), content.len());
        Ok(())
    }

    pub async fn info(&self) -> Option<SnapshotInfo> {
        let meta = tokio::fs::metadata(&self.path).await.ok()?;
        Some(SnapshotInfo {
            bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Write `content` to `path` with exclusive locking and an atomic rename.
    async fn write_file_locked(path: &Path, content: &[u8]) -> Result<()> {
        use std::fs::{self, File, OpenOptions};
        use std::io::Write;

        // fs2 locks are synchronous; hold one on the destination while replacing it.
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;
        lock_file.lock_exclusive()?;

        let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
        let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("catalog.json");
        let mut counter = 0u32;
        let tmp_path = loop {
            let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(mut tmp) => {
                    tmp.write_all(content)?;
                    tmp.flush()?;
                    let _ = tmp.sync_all();
                    break candidate;
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    counter = counter.saturating_add(1);
                }
                Err(e) => return Err(anyhow!("Failed to create temp file for atomic write: {}", e)),
            }
        };

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(anyhow!("Failed to replace {}: {}", path.display(), e));
        }

        if let Ok(dir_file) = File::open(dir) {
            let _ = dir_file.sync_all();
        }

        drop(lock_file);
        Ok(())
    }
}

/// Where the served catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Snapshot,
    Seed(SeedReport),
    Empty,
}

/// Restore the catalog from its snapshot, or build it from the seed file on first
/// start. Either way it is validated before being returned.
///
/// A seeded catalog comes back dirty so the first save writes the snapshot.
pub async fn open_catalog(store: &SnapshotStore, seed_path: impl AsRef<Path>) -> Result<(Catalog, CatalogSource)> {
    let seed_path = seed_path.as_ref();
    let (catalog, source) = match store.load().await? {
        Some(catalog) => (catalog, CatalogSource::Snapshot),
        None if seed_path.exists() => {
            let seed = load_seed_from_json(seed_path)
                .map_err(|e| anyhow!("Failed to load seed {}: {}", seed_path.display(), e))?;
            let mut catalog = Catalog::new();
            let report = populate(&mut catalog, &seed)?;
            catalog.apply_naming(&mut NameTable::from_seed(&seed))?;
            catalog.mark_dirty();
            (catalog, CatalogSource::Seed(report))
        }
        None => {
            warn!(
                "no snapshot at {} and no seed at {}; starting with an empty catalog",
                store.path().display(),
                seed_path.display()
            );
            let mut catalog = Catalog::new();
            catalog.advance_state(LifecycleState::Named)?;
            (catalog, CatalogSource::Empty)
        }
    };
    validate(&catalog).map_err(|e| anyhow!("Catalog rejected: {}", e))?;
    Ok((catalog, source))
}
