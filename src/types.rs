//! Core types for the filesystem snapshotting core.

/// Hash: 256-bit BLAKE3 content hash
pub type Hash = [u8; 32];

/// Render a hash as lowercase hex for logs and diagnostics.
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}
