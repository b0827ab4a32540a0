//! Integration tests for pattern-filtered snapshotting

use fsmirror::collection::{CollectionSnapshotter, FileCollection, FileCollectionElement};
use fsmirror::pattern::PatternSet;
use fsmirror::snapshot::FileSystemSnapshot;
use fsmirror::vfs::probe::OsStat;
use fsmirror::vfs::VirtualFileSystem;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn vfs() -> Arc<VirtualFileSystem> {
    Arc::new(VirtualFileSystem::new(Arc::new(OsStat)))
}

fn names(snapshot: &FileSystemSnapshot) -> Vec<String> {
    let FileSystemSnapshot::Directory(dir) = snapshot else {
        panic!("expected directory");
    };
    dir.children
        .iter()
        .filter_map(|c| c.name().map(str::to_string))
        .collect()
}

#[test]
fn test_excluded_file_invisible_to_snapshot_and_hash() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("main.rs"), "fn main() {}").unwrap();
    fs::write(root.join("scratch.tmp"), "junk").unwrap();

    let vfs = vfs();
    let patterns = PatternSet::new(Vec::<String>::new(), ["*.tmp"]);
    let filtered = vfs.read(root, Some(&patterns)).unwrap();
    assert_eq!(names(&filtered), ["main.rs"]);

    // A sibling tree that never had the file hashes the same.
    let twin = TempDir::new().unwrap();
    fs::write(twin.path().join("main.rs"), "fn main() {}").unwrap();
    let unfiltered_twin = vfs.read(twin.path(), None).unwrap();
    assert_eq!(filtered.content_hash(), unfiltered_twin.content_hash());
}

#[test]
fn test_reincluding_restores_original_hash() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("a.txt"), "a").unwrap();
    fs::write(root.join("b.log"), "b").unwrap();

    let vfs = vfs();
    let original = vfs.read(root, None).unwrap().content_hash().unwrap();

    let excluded = PatternSet::new(Vec::<String>::new(), ["*.log"]);
    let without = vfs.read(root, Some(&excluded)).unwrap();
    assert_ne!(without.content_hash().unwrap(), original);

    // Dropping the exclusion brings the hash back exactly.
    let empty = PatternSet::default();
    let with = vfs.read(root, Some(&empty)).unwrap();
    assert_eq!(with.content_hash().unwrap(), original);
}

#[test]
fn test_include_patterns_restrict_tree() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir(root.join("src")).unwrap();
    fs::write(root.join("src").join("Foo.java"), "class Foo {}").unwrap();
    fs::write(root.join("src").join("notes.md"), "notes").unwrap();
    fs::write(root.join("README.md"), "readme").unwrap();

    let vfs = vfs();
    let patterns = PatternSet::new(["**/*.java"], Vec::<String>::new());
    let snapshot = vfs.read(root, Some(&patterns)).unwrap();

    assert_eq!(names(&snapshot), ["src"]);
    let FileSystemSnapshot::Directory(dir) = &*snapshot else {
        panic!("expected directory");
    };
    assert_eq!(names(&dir.children[0]), ["Foo.java"]);
}

#[test]
fn test_pruned_directory_contents_never_visited() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("keep.txt"), "keep").unwrap();
    fs::create_dir(root.join("target")).unwrap();
    fs::write(root.join("target").join("artifact.bin"), "big").unwrap();

    let vfs = vfs();
    let patterns = PatternSet::new(Vec::<String>::new(), ["target"]);
    let snapshot = vfs.read(root, Some(&patterns)).unwrap();
    assert_eq!(names(&snapshot), ["keep.txt"]);
}

#[test]
fn test_missing_loose_root_and_missing_filtered_root_differ() {
    let temp_dir = TempDir::new().unwrap();
    let absent = temp_dir.path().join("absent");

    let snapshotter = CollectionSnapshotter::new(vfs());
    let collection = FileCollection::new(vec![
        FileCollectionElement::Entries(vec![absent.clone()]),
        FileCollectionElement::FilteredTree {
            root: absent,
            patterns: PatternSet::default(),
        },
    ]);
    let roots = snapshotter.snapshot(&collection).unwrap();

    assert!(roots[0].is_missing());
    assert!(roots[1].is_empty());
    assert_ne!(roots[0], roots[1]);
}

#[test]
fn test_fully_excluded_root_still_a_directory_not_empty() {
    // The root directory exists; excluding everything beneath it yields an
    // empty directory snapshot, not the Empty sentinel. Only a root that
    // produced no walk at all normalizes to Empty.
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("a.tmp"), "x").unwrap();

    let snapshotter = CollectionSnapshotter::new(vfs());
    let collection = FileCollection::new(vec![FileCollectionElement::FilteredTree {
        root: root.to_path_buf(),
        patterns: PatternSet::new(Vec::<String>::new(), ["*.tmp"]),
    }]);
    let roots = snapshotter.snapshot(&collection).unwrap();

    let FileSystemSnapshot::Directory(dir) = &*roots[0] else {
        panic!("expected directory, got {:?}", roots[0]);
    };
    assert!(dir.children.is_empty());
}
