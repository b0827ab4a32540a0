//! fsmirror: Content-Addressed Filesystem Snapshotting
//!
//! The snapshot-construction and caching core of an incremental build
//! engine. Converts collections of files and directory trees into
//! deterministic, content-addressed snapshots used to detect whether build
//! inputs or outputs changed since a prior build, independent of traversal
//! order and safe under concurrent access from many build operations.

pub mod collection;
pub mod config;
pub mod error;
pub mod logging;
pub mod pattern;
pub mod snapshot;
pub mod types;
pub mod vfs;
