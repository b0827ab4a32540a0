//! File collection snapshotting
//!
//! Top-level entry point: dispatches each element of a file collection to
//! the snapshotting strategy for its structural kind and returns one root
//! snapshot per element, in declaration order, never merged.

use crate::error::SnapshotError;
use crate::pattern::PatternSet;
use crate::snapshot::builder::MerkleDirectoryBuilder;
use crate::snapshot::{
    file_name_of, hasher, FileMetadata, FileSystemSnapshot, RegularFileSnapshot,
};
use crate::vfs::VirtualFileSystem;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

/// Visitor protocol for generically-produced trees: the generator replays
/// its directory and file callbacks in depth-first order, carrying the
/// metadata it already computed.
pub trait TreeVisitor {
    /// `segments` is the directory's path relative to the tree root; the
    /// root itself has no segments.
    fn visit_directory(&mut self, absolute_path: &Path, segments: &[String]);

    /// `segments` includes the file name itself.
    fn visit_file(
        &mut self,
        absolute_path: &Path,
        segments: &[String],
        metadata: FileMetadata,
    ) -> Result<(), SnapshotError>;
}

/// A tree whose membership is computed by an external generator rather
/// than a direct filesystem walk.
pub trait GeneratedTree: Send + Sync {
    fn visit(&self, visitor: &mut dyn TreeVisitor) -> Result<(), SnapshotError>;
}

/// One element of a file collection, dispatched by structural kind.
/// Exhaustive matching over this enum replaces any "unsupported operation"
/// fallback: an operation meaningless for a kind cannot be expressed.
pub enum FileCollectionElement {
    /// Loose files or directories, not tied to any root. Each path becomes
    /// one root; a nonexistent path snapshots to `Missing`.
    Entries(Vec<PathBuf>),
    /// A root directory with include/exclude rules. A missing or fully
    /// filtered-out root snapshots to `Empty`.
    FilteredTree { root: PathBuf, patterns: PatternSet },
    /// A tree whose entries come from an external generator. Not cached:
    /// there is no single stable path key.
    GeneratedTree(Box<dyn GeneratedTree>),
    /// A tree whose entire content is one physical file (e.g. an archive
    /// treated as a tree), snapshotted as that file.
    FileBackedTree(PathBuf),
}

impl fmt::Debug for FileCollectionElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entries(paths) => f.debug_tuple("Entries").field(paths).finish(),
            Self::FilteredTree { root, patterns } => f
                .debug_struct("FilteredTree")
                .field("root", root)
                .field("patterns", patterns)
                .finish(),
            Self::GeneratedTree(_) => f.write_str("GeneratedTree(..)"),
            Self::FileBackedTree(path) => f.debug_tuple("FileBackedTree").field(path).finish(),
        }
    }
}

/// An ordered collection of elements to snapshot.
#[derive(Debug, Default)]
pub struct FileCollection {
    pub elements: Vec<FileCollectionElement>,
}

impl FileCollection {
    pub fn new(elements: Vec<FileCollectionElement>) -> Self {
        Self { elements }
    }
}

/// Snapshots file collections through a shared virtual filesystem.
pub struct CollectionSnapshotter {
    vfs: Arc<VirtualFileSystem>,
}

impl CollectionSnapshotter {
    pub fn new(vfs: Arc<VirtualFileSystem>) -> Self {
        Self { vfs }
    }

    /// Snapshot every element of the collection: one root per element (one
    /// per path for loose entries), in declaration order. Absence of one
    /// root never affects the others; a fatal probe failure aborts with an
    /// error naming the offending path.
    #[instrument(skip_all, fields(elements = collection.elements.len()))]
    pub fn snapshot(
        &self,
        collection: &FileCollection,
    ) -> Result<Vec<Arc<FileSystemSnapshot>>, SnapshotError> {
        let mut roots = Vec::new();
        for element in &collection.elements {
            match element {
                FileCollectionElement::Entries(paths) => {
                    for path in paths {
                        roots.push(self.vfs.read(path, None)?);
                    }
                }
                FileCollectionElement::FilteredTree { root, patterns } => {
                    let snapshot = self.vfs.read(root, Some(patterns))?;
                    // A filtered-out or nonexistent root reads as "nothing
                    // here", not as "root was deleted".
                    roots.push(if snapshot.is_missing() {
                        Arc::new(FileSystemSnapshot::Empty)
                    } else {
                        snapshot
                    });
                }
                FileCollectionElement::GeneratedTree(tree) => {
                    roots.push(Arc::new(snapshot_generated_tree(tree.as_ref())?));
                }
                FileCollectionElement::FileBackedTree(file) => {
                    roots.push(self.vfs.read(file, None)?);
                }
            }
        }
        Ok(roots)
    }
}

/// Replay a generator's callbacks into a fresh builder. Size and timestamp
/// come from the generator; content hashes are still computed from the
/// named file's bytes. A file that vanished since the generator saw it is
/// omitted, like any entry deleted mid-walk.
fn snapshot_generated_tree(tree: &dyn GeneratedTree) -> Result<FileSystemSnapshot, SnapshotError> {
    struct BuilderVisitor {
        builder: MerkleDirectoryBuilder,
    }

    impl TreeVisitor for BuilderVisitor {
        fn visit_directory(&mut self, absolute_path: &Path, segments: &[String]) {
            self.builder
                .enter_directory(absolute_path.to_path_buf(), segments);
        }

        fn visit_file(
            &mut self,
            absolute_path: &Path,
            segments: &[String],
            metadata: FileMetadata,
        ) -> Result<(), SnapshotError> {
            let content_hash = match hasher::hash_file(absolute_path) {
                Ok(hash) => hash,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
                Err(e) => return Err(SnapshotError::io(absolute_path, e)),
            };
            let name = segments
                .last()
                .cloned()
                .unwrap_or_else(|| file_name_of(absolute_path));
            self.builder.visit_file(
                RegularFileSnapshot {
                    absolute_path: absolute_path.to_path_buf(),
                    name,
                    content_hash,
                    size: metadata.size,
                    last_modified: metadata.last_modified,
                },
                segments,
            );
            Ok(())
        }
    }

    let mut visitor = BuilderVisitor {
        builder: MerkleDirectoryBuilder::new(),
    };
    tree.visit(&mut visitor)?;
    Ok(visitor.builder.finish().unwrap_or(FileSystemSnapshot::Empty))
}
