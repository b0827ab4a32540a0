//! Filesystem metadata probe
//!
//! Thin capability over the operating system: given an absolute path,
//! reports existence, type, size, and last-modified time. A stable contract
//! with no logic beyond classification; everything above it is testable
//! against an in-memory implementation.

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Result of probing one absolute path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStat {
    Missing,
    RegularFile {
        size: u64,
        /// Milliseconds since the Unix epoch.
        last_modified: i64,
    },
    Directory,
}

/// Metadata probe capability.
///
/// `NotFound` is not an error: it reports as `FileStat::Missing`. Any other
/// I/O failure is fatal for the traversal that issued the probe.
pub trait Stat: Send + Sync {
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// Probe backed by the operating system.
///
/// Symlinks are not followed and report as `Missing`, matching the walker's
/// treatment of special files.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsStat;

impl Stat for OsStat {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FileStat::Missing),
            Err(e) => return Err(e),
        };
        if metadata.is_file() {
            Ok(FileStat::RegularFile {
                size: metadata.len(),
                last_modified: modified_millis(&metadata)?,
            })
        } else if metadata.is_dir() {
            Ok(FileStat::Directory)
        } else {
            Ok(FileStat::Missing)
        }
    }
}

/// Last-modified time as milliseconds since the Unix epoch. Times before
/// the epoch come back negative.
pub(crate) fn modified_millis(metadata: &std::fs::Metadata) -> io::Result<i64> {
    let modified = metadata.modified()?;
    Ok(match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    })
}
