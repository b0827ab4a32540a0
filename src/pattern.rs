//! Include/exclude pattern filtering for tree traversals
//!
//! Patterns are globs matched against an entry's `/`-separated path
//! relative to the tree root. Entries rejected by the filter are invisible
//! to the resulting snapshot and never influence an ancestor's hash.

use crate::error::SnapshotError;
use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Include/exclude glob patterns for one tree root.
///
/// An empty include list includes everything. A `PatternSet` is part of the
/// virtual filesystem cache key, so filtered and unfiltered reads of the
/// same root never collide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternSet {
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl PatternSet {
    pub fn new(
        includes: impl IntoIterator<Item = impl Into<String>>,
        excludes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: excludes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.includes.is_empty() && self.excludes.is_empty()
    }

    /// Compile into a filter usable during a walk. Fails on malformed globs.
    pub fn compile(&self) -> Result<PatternFilter, SnapshotError> {
        Ok(PatternFilter {
            includes: compile_patterns(&self.includes)?,
            excludes: compile_patterns(&self.excludes)?,
        })
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, SnapshotError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|e| SnapshotError::InvalidPattern {
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Compiled form of a `PatternSet`, evaluated against each entry discovered
/// during a walk. Evaluation has no side effects and is safe to call
/// concurrently for independent paths.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl PatternFilter {
    /// Whether a walk should descend into the directory at `relative`.
    /// Only excludes prune: a directory not matching any include can still
    /// contain files that do.
    pub fn should_visit_directory(&self, relative: &str) -> bool {
        !self.excludes.iter().any(|p| p.matches(relative))
    }

    /// Whether the file at `relative` belongs in the snapshot.
    pub fn should_include_file(&self, relative: &str) -> bool {
        let included =
            self.includes.is_empty() || self.includes.iter().any(|p| p.matches(relative));
        included && !self.excludes.iter().any(|p| p.matches(relative))
    }
}
