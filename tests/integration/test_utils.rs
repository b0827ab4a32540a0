//! Shared test utilities for integration tests

use fsmirror::vfs::probe::{FileStat, OsStat, Stat};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Probe decorator counting how many stat calls reach the filesystem.
/// Each traversal probes its root exactly once, so the counter equals the
/// number of underlying traversals performed.
#[derive(Debug, Default)]
pub struct CountingStat {
    inner: OsStat,
    calls: AtomicUsize,
}

impl CountingStat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Stat for CountingStat {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.stat(path)
    }
}
