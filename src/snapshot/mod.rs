//! Content-addressed filesystem snapshots
//!
//! Immutable value objects describing a file or directory tree's structure
//! and content at one point in time. Directory children are always ordered
//! by name and directory hashes are a pure function of children's names and
//! hashes, so structurally identical trees hash identically regardless of
//! traversal order, timestamps, or where they live on disk.

pub mod builder;
pub mod hasher;

use crate::types::Hash;
use std::path::{Path, PathBuf};

/// Metadata for a regular file, as reported by the probe or by a tree
/// generator that already computed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

/// Leaf snapshot of one regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularFileSnapshot {
    pub absolute_path: PathBuf,
    pub name: String,
    /// Pure function of the file's byte content.
    pub content_hash: Hash,
    pub size: u64,
    /// Milliseconds since the Unix epoch. Never part of any hash.
    pub last_modified: i64,
}

/// Snapshot of one directory and everything visible beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    pub absolute_path: PathBuf,
    pub name: String,
    /// Ordered by name ascending; required for reproducible hashes.
    pub children: Vec<FileSystemSnapshot>,
    /// Hash of the ordered (name, hash) pairs of the children.
    pub content_hash: Hash,
}

/// Result of snapshotting one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemSnapshot {
    /// The root does not exist. All `Missing` values compare equal.
    Missing,
    /// A filtered or generated tree produced no root at all. Distinct from
    /// `Missing`: "nothing here" must not look like "root was deleted".
    Empty,
    RegularFile(RegularFileSnapshot),
    Directory(DirectorySnapshot),
}

impl FileSystemSnapshot {
    /// Entry name within the parent directory. `None` for the sentinels.
    pub fn name(&self) -> Option<&str> {
        match self {
            FileSystemSnapshot::RegularFile(file) => Some(&file.name),
            FileSystemSnapshot::Directory(dir) => Some(&dir.name),
            _ => None,
        }
    }

    pub fn absolute_path(&self) -> Option<&Path> {
        match self {
            FileSystemSnapshot::RegularFile(file) => Some(&file.absolute_path),
            FileSystemSnapshot::Directory(dir) => Some(&dir.absolute_path),
            _ => None,
        }
    }

    /// Content hash of the root. `None` for the sentinels.
    pub fn content_hash(&self) -> Option<Hash> {
        match self {
            FileSystemSnapshot::RegularFile(file) => Some(file.content_hash),
            FileSystemSnapshot::Directory(dir) => Some(dir.content_hash),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FileSystemSnapshot::Missing)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FileSystemSnapshot::Empty)
    }
}

/// Last path component as an owned string, falling back to the whole path
/// for roots like `/`.
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
