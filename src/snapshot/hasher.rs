//! Hash computation for snapshots using BLAKE3

use crate::types::Hash;
use blake3::Hasher;
use std::fs::File;
use std::io;
use std::path::Path;

/// Compute the content hash for file bytes.
pub fn hash_file_content(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Compute the content hash of a file on disk, streaming its bytes.
pub fn hash_file(path: &Path) -> io::Result<Hash> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    io::copy(&mut file, &mut hasher)?;
    Ok(*hasher.finalize().as_bytes())
}

/// Compute a directory hash from its children's (name, hash) pairs.
///
/// hash = blake3("directory" || child_count || (name_len || name || hash)*)
///
/// Children must already be sorted by name. Lengths are 8-byte big-endian
/// so the encoding is unambiguous. Paths and timestamps are never hashed:
/// two structurally identical trees hash identically wherever they live.
pub fn hash_directory(children: &[(&str, Hash)]) -> Hash {
    let mut hasher = Hasher::new();

    // Type discriminator: a directory must never collide with a file whose
    // bytes happen to encode the same child list.
    hasher.update(b"directory");

    hasher.update(&(children.len() as u64).to_be_bytes());

    for (name, hash) in children {
        hasher.update(&(name.len() as u64).to_be_bytes());
        hasher.update(name.as_bytes());
        hasher.update(hash);
    }

    *hasher.finalize().as_bytes()
}
