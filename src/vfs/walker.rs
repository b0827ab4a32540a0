//! Filtered directory traversal feeding a Merkle directory builder

use crate::config::TraversalConfig;
use crate::error::SnapshotError;
use crate::pattern::PatternFilter;
use crate::snapshot::builder::MerkleDirectoryBuilder;
use crate::snapshot::{hasher, RegularFileSnapshot};
use crate::vfs::probe::modified_millis;
use std::io;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Walk one directory root depth-first, applying the filter to prune
/// directories and skip excluded files, and emit every surviving entry into
/// the builder. Sibling order from the OS is not trusted; the builder sorts.
///
/// An entry that vanishes between being listed and being read (`NotFound`)
/// is omitted from this walk. Any other probe or read failure aborts the
/// traversal: a partial directory hash would silently corrupt change
/// detection.
pub(crate) fn walk_directory(
    root: &Path,
    filter: Option<&PatternFilter>,
    config: &TraversalConfig,
    builder: &mut MerkleDirectoryBuilder,
) -> Result<(), SnapshotError> {
    let walk = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .max_depth(config.max_depth.unwrap_or(usize::MAX))
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            match filter {
                Some(f) => f.should_visit_directory(&relative_of(root, entry.path())),
                None => true,
            }
        });

    let mut file_count = 0usize;
    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) {
                    // Entry deleted between listing and stat: it is simply
                    // not part of this snapshot.
                    continue;
                }
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                return Err(SnapshotError::Io {
                    path,
                    source: err.into(),
                });
            }
        };

        let segments = segments_of(root, entry.path());

        if entry.file_type().is_dir() {
            builder.enter_directory(entry.path().to_path_buf(), &segments);
        } else if entry.file_type().is_file() {
            if let Some(f) = filter {
                if !f.should_include_file(&segments.join("/")) {
                    trace!(path = %entry.path().display(), "Excluded by pattern");
                    continue;
                }
            }
            if visit_file(&entry, &segments, builder)? {
                file_count += 1;
            }
        }
        // Symlinks and special files are skipped.
    }

    debug!(root = %root.display(), file_count, "Walked tree");
    Ok(())
}

/// Hash one file and feed it to the builder. Returns false when the file
/// vanished mid-walk and was omitted.
fn visit_file(
    entry: &walkdir::DirEntry,
    segments: &[String],
    builder: &mut MerkleDirectoryBuilder,
) -> Result<bool, SnapshotError> {
    let path = entry.path();
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
            return Ok(false)
        }
        Err(e) => {
            return Err(SnapshotError::Io {
                path: path.to_path_buf(),
                source: e.into(),
            })
        }
    };

    let content_hash = match hasher::hash_file(path) {
        Ok(hash) => hash,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(SnapshotError::io(path, e)),
    };

    let name = segments
        .last()
        .cloned()
        .unwrap_or_else(|| crate::snapshot::file_name_of(path));
    builder.visit_file(
        RegularFileSnapshot {
            absolute_path: path.to_path_buf(),
            name,
            content_hash,
            size: metadata.len(),
            last_modified: modified_millis(&metadata).map_err(|e| SnapshotError::io(path, e))?,
        },
        segments,
    );
    Ok(true)
}

/// Path segments of `path` relative to `root`; the root itself has none.
fn segments_of(root: &Path, path: &Path) -> Vec<String> {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

fn relative_of(root: &Path, path: &Path) -> String {
    segments_of(root, path).join("/")
}
