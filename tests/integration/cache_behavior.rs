//! Integration tests for virtual filesystem caching and invalidation

use crate::integration::test_utils::CountingStat;
use fsmirror::pattern::PatternSet;
use fsmirror::vfs::VirtualFileSystem;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

#[test]
fn test_second_read_served_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = VirtualFileSystem::new(stat.clone());

    let first = vfs.read(temp_dir.path(), None).unwrap();
    assert_eq!(stat.calls(), 1);

    let second = vfs.read(temp_dir.path(), None).unwrap();
    assert_eq!(stat.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_concurrent_same_key_reads_collapse_to_one_traversal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    for i in 0..32 {
        fs::write(root.join(format!("file{i}.txt")), format!("content {i}")).unwrap();
    }

    let stat = Arc::new(CountingStat::new());
    let vfs = Arc::new(VirtualFileSystem::new(stat.clone()));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let mut handles = Vec::new();
    for _ in 0..threads {
        let vfs = vfs.clone();
        let root = root.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            vfs.read(&root, None).unwrap()
        }));
    }

    let snapshots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // One underlying traversal; every caller observes the same result.
    assert_eq!(stat.calls(), 1);
    for snapshot in &snapshots[1..] {
        assert_eq!(snapshot.content_hash(), snapshots[0].content_hash());
    }
}

#[test]
fn test_disjoint_keys_do_not_share_a_traversal() {
    let temp_dir = TempDir::new().unwrap();
    let a = temp_dir.path().join("a");
    let b = temp_dir.path().join("b");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    fs::write(a.join("x.txt"), "x").unwrap();
    fs::write(b.join("y.txt"), "y").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = Arc::new(VirtualFileSystem::new(stat.clone()));

    let va = vfs.clone();
    let vb = vfs.clone();
    let ta = thread::spawn(move || va.read(&a, None).unwrap());
    let tb = thread::spawn(move || vb.read(&b, None).unwrap());
    let sa = ta.join().unwrap();
    let sb = tb.join().unwrap();

    assert_eq!(stat.calls(), 2);
    assert_ne!(sa.content_hash(), sb.content_hash());
}

#[test]
fn test_filtered_and_unfiltered_keys_traverse_separately() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "x").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = VirtualFileSystem::new(stat.clone());

    vfs.read(temp_dir.path(), None).unwrap();
    let patterns = PatternSet::new(Vec::<String>::new(), ["*.tmp"]);
    vfs.read(temp_dir.path(), Some(&patterns)).unwrap();
    assert_eq!(stat.calls(), 2);

    // Both keys now cached.
    vfs.read(temp_dir.path(), None).unwrap();
    vfs.read(temp_dir.path(), Some(&patterns)).unwrap();
    assert_eq!(stat.calls(), 2);
}

#[test]
fn test_invalidation_forces_retraversal_and_fresh_data() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.txt");
    fs::write(&file, "old").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = VirtualFileSystem::new(stat.clone());

    let before = vfs.read(temp_dir.path(), None).unwrap();
    fs::write(&file, "new").unwrap();

    vfs.invalidate(&file).unwrap();
    let after = vfs.read(temp_dir.path(), None).unwrap();
    assert_eq!(stat.calls(), 2);
    assert_ne!(before.content_hash(), after.content_hash());
}

#[test]
fn test_unrelated_invalidation_keeps_cache_entry() {
    let temp_dir = TempDir::new().unwrap();
    let watched = temp_dir.path().join("watched");
    let unrelated = temp_dir.path().join("unrelated");
    fs::create_dir(&watched).unwrap();
    fs::create_dir(&unrelated).unwrap();
    fs::write(watched.join("a.txt"), "x").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = VirtualFileSystem::new(stat.clone());

    vfs.read(&watched, None).unwrap();
    vfs.invalidate(&unrelated).unwrap();
    vfs.read(&watched, None).unwrap();

    // The eviction was scoped; no second traversal happened.
    assert_eq!(stat.calls(), 1);
}

#[test]
fn test_invalidate_all_evicts_everything() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "x").unwrap();

    let stat = Arc::new(CountingStat::new());
    let vfs = VirtualFileSystem::new(stat.clone());

    vfs.read(temp_dir.path(), None).unwrap();
    vfs.invalidate_all();
    vfs.read(temp_dir.path(), None).unwrap();
    assert_eq!(stat.calls(), 2);
}
