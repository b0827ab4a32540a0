//! Merkle directory builder
//!
//! Accumulates "enter directory" / "visit file" events from a single-root,
//! depth-first traversal into an immutable snapshot tree. Open directory
//! levels are an explicit stack of frames: a frame closes when an event
//! arrives at a shallower depth (or at end of input), and closing sorts the
//! frame's children by name before the directory hash is computed, so the
//! result never depends on the order siblings were visited.

use crate::snapshot::{
    file_name_of, hasher, DirectorySnapshot, FileSystemSnapshot, RegularFileSnapshot,
};
use crate::types::Hash;
use std::path::PathBuf;
use tracing::trace;

/// One open directory level during a traversal.
#[derive(Debug)]
struct Frame {
    absolute_path: PathBuf,
    name: String,
    children: Vec<FileSystemSnapshot>,
}

/// Stateful accumulator producing one snapshot tree per traversal.
///
/// Events must describe a single root in depth-first order; `segments` is
/// always the entry's path relative to that root. Sorting is always on:
/// filesystem-backed walks do not report siblings in a stable,
/// platform-independent order.
#[derive(Debug, Default)]
pub struct MerkleDirectoryBuilder {
    stack: Vec<Frame>,
    result: Option<FileSystemSnapshot>,
}

impl MerkleDirectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a directory frame. The root directory itself has no segments.
    pub fn enter_directory(&mut self, absolute_path: PathBuf, segments: &[String]) {
        self.close_to_depth(segments.len());
        let name = segments
            .last()
            .cloned()
            .unwrap_or_else(|| file_name_of(&absolute_path));
        trace!(path = %absolute_path.display(), depth = segments.len(), "Entering directory");
        self.stack.push(Frame {
            absolute_path,
            name,
            children: Vec::new(),
        });
    }

    /// Record a regular file. `segments` includes the file name itself, so
    /// the file's parent is the frame at depth `segments.len() - 1`. A file
    /// visited with a single segment and no open frame is a single-file
    /// root and becomes the result directly.
    pub fn visit_file(&mut self, file: RegularFileSnapshot, segments: &[String]) {
        debug_assert!(!segments.is_empty(), "a file event carries at least its own name");
        self.close_to_depth(segments.len());
        match self.stack.last_mut() {
            Some(frame) => frame.children.push(FileSystemSnapshot::RegularFile(file)),
            None => {
                debug_assert!(self.result.is_none(), "events describe a single root");
                self.result = Some(FileSystemSnapshot::RegularFile(file));
            }
        }
    }

    /// Close all remaining frames and yield the root snapshot. `None` when
    /// no event was ever received; the caller maps that to `Missing` or
    /// `Empty` per context.
    pub fn finish(mut self) -> Option<FileSystemSnapshot> {
        self.close_to_depth(0);
        self.result
    }

    /// Close frames until at most `depth` remain open. This is the
    /// "close on depth decrease" transition: traversal returning to a
    /// shallower level seals every directory below it.
    fn close_to_depth(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.close_top_frame();
        }
    }

    fn close_top_frame(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };

        frame.children.sort_by(|a, b| a.name().cmp(&b.name()));

        let pairs: Vec<(&str, Hash)> = frame
            .children
            .iter()
            .filter_map(|child| Some((child.name()?, child.content_hash()?)))
            .collect();
        let content_hash = hasher::hash_directory(&pairs);

        trace!(
            path = %frame.absolute_path.display(),
            children = frame.children.len(),
            hash = %crate::types::to_hex(&content_hash),
            "Closed directory frame"
        );

        let dir = FileSystemSnapshot::Directory(DirectorySnapshot {
            absolute_path: frame.absolute_path,
            name: frame.name,
            children: frame.children,
            content_hash,
        });

        match self.stack.last_mut() {
            Some(parent) => parent.children.push(dir),
            None => {
                debug_assert!(self.result.is_none(), "events describe a single root");
                self.result = Some(dir);
            }
        }
    }
}
