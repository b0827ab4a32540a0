//! Virtual filesystem cache
//!
//! Process-wide cache mapping (absolute path, pattern set) to the last
//! computed snapshot for that key. Reads for disjoint keys proceed in
//! parallel; concurrent reads for the same key collapse to a single
//! underlying traversal; invalidation evicts overlapping entries and wins
//! over any computation already in flight.

pub mod path;
pub mod probe;
mod walker;

use crate::config::TraversalConfig;
use crate::error::SnapshotError;
use crate::pattern::PatternSet;
use crate::snapshot::builder::MerkleDirectoryBuilder;
use crate::snapshot::{file_name_of, hasher, FileSystemSnapshot, RegularFileSnapshot};
use parking_lot::{Mutex, RwLock};
use self::probe::{FileStat, Stat};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Cache key: normalized absolute path plus the pattern set the read used.
/// Filtered and unfiltered reads of the same path can legitimately
/// disagree, so they cache under distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    patterns: Option<PatternSet>,
}

/// In-memory view of previously snapshotted filesystem locations.
///
/// Constructed once per build process and passed to every snapshotting
/// operation as an explicit collaborator. Snapshots are handed out as
/// `Arc`s: immutable and safe to share across threads without copying.
pub struct VirtualFileSystem {
    stat: Arc<dyn Stat>,
    traversal: TraversalConfig,
    entries: RwLock<HashMap<CacheKey, Arc<FileSystemSnapshot>>>,
    /// Per-key computation locks; same-key readers serialize here so at
    /// most one traversal runs per key at a time.
    compute_locks: RwLock<HashMap<CacheKey, Arc<Mutex<()>>>>,
    /// Bumped on every invalidation. A computation stores its result only
    /// if no invalidation happened since it started, so a slow traversal
    /// can never resurrect data older than the invalidation.
    generation: AtomicU64,
}

impl VirtualFileSystem {
    pub fn new(stat: Arc<dyn Stat>) -> Self {
        Self::with_config(stat, TraversalConfig::default())
    }

    pub fn with_config(stat: Arc<dyn Stat>, traversal: TraversalConfig) -> Self {
        Self {
            stat,
            traversal,
            entries: RwLock::new(HashMap::new()),
            compute_locks: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Read the snapshot for `path`, serving a cached result when one is
    /// valid and traversing the filesystem otherwise. `patterns` restricts
    /// which entries a directory walk sees; `None` means an unfiltered
    /// full traversal.
    #[instrument(skip(self, patterns), fields(path = %path.display()))]
    pub fn read(
        &self,
        path: &Path,
        patterns: Option<&PatternSet>,
    ) -> Result<Arc<FileSystemSnapshot>, SnapshotError> {
        let key = CacheKey {
            path: path::normalize_key_path(path)?,
            patterns: patterns.cloned(),
        };

        if let Some(hit) = self.entries.read().get(&key) {
            trace!("Cache hit");
            return Ok(hit.clone());
        }

        let lock = self.compute_lock(&key);
        let _guard = lock.lock();

        // Another reader may have finished this key while we waited.
        if let Some(hit) = self.entries.read().get(&key) {
            trace!("Cache hit after waiting on in-flight computation");
            return Ok(hit.clone());
        }

        let started_at = self.generation.load(Ordering::SeqCst);
        let snapshot = Arc::new(self.snapshot_root(&key.path, key.patterns.as_ref())?);

        let mut entries = self.entries.write();
        if self.generation.load(Ordering::SeqCst) == started_at {
            entries.insert(key, snapshot.clone());
        } else {
            // An invalidation arrived mid-computation. The caller may keep
            // this possibly-stale result, but the cache must not.
            debug!("Discarding snapshot computed across an invalidation");
        }
        Ok(snapshot)
    }

    /// Evict every cache entry overlapping `path`, in either direction:
    /// entries at or beneath the written path, and cached ancestor trees
    /// that embed it. Happens-before any subsequent `read` for an
    /// overlapping path.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn invalidate(&self, path: &Path) -> Result<(), SnapshotError> {
        let normalized = path::normalize_key_path(path)?;
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let before = entries.len();
        entries.retain(|key, _| !paths_overlap(&key.path, &normalized));
        debug!(evicted = before - entries.len(), "Invalidated cache entries");
        Ok(())
    }

    /// Drop every cached snapshot, e.g. at a build boundary.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write();
        self.generation.fetch_add(1, Ordering::SeqCst);
        let evicted = entries.len();
        entries.clear();
        debug!(evicted, "Invalidated entire cache");
    }

    /// Get or create the computation lock for a key (double-checked: read
    /// lock for the common lookup, write lock only on first use).
    fn compute_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        {
            let map = self.compute_locks.read();
            if let Some(lock) = map.get(key) {
                return lock.clone();
            }
        }
        let mut map = self.compute_locks.write();
        map.entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Probe the root once and build its snapshot. Exactly one probe call
    /// per traversal: directory walks take metadata from the walk itself.
    fn snapshot_root(
        &self,
        path: &Path,
        patterns: Option<&PatternSet>,
    ) -> Result<FileSystemSnapshot, SnapshotError> {
        let stat = self
            .stat
            .stat(path)
            .map_err(|e| SnapshotError::io(path, e))?;

        match stat {
            FileStat::Missing => Ok(FileSystemSnapshot::Missing),
            FileStat::RegularFile {
                size,
                last_modified,
            } => match hasher::hash_file(path) {
                Ok(content_hash) => {
                    trace!(hash = %crate::types::to_hex(&content_hash), "Hashed file root");
                    Ok(FileSystemSnapshot::RegularFile(RegularFileSnapshot {
                        absolute_path: path.to_path_buf(),
                        name: file_name_of(path),
                        content_hash,
                        size,
                        last_modified,
                    }))
                }
                // Deleted between stat and read: the root became absent.
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileSystemSnapshot::Missing),
                Err(e) => Err(SnapshotError::io(path, e)),
            },
            FileStat::Directory => {
                let filter = patterns.map(PatternSet::compile).transpose()?;
                let mut builder = MerkleDirectoryBuilder::new();
                walker::walk_directory(path, filter.as_ref(), &self.traversal, &mut builder)?;
                // The walk enters the root before anything else, so an
                // empty result means the root vanished mid-walk.
                Ok(builder.finish().unwrap_or(FileSystemSnapshot::Missing))
            }
        }
    }
}

/// Component-wise prefix overlap in either direction.
fn paths_overlap(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}
