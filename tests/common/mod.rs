//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use filevault::{BlobStore, FileBlob};

/// A store file inside a temporary directory.
///
/// The directory is removed when the returned guard is dropped.
pub fn temp_store_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("vault").join("vault.db");
    (dir, path)
}

/// Open a fresh store on disk.
pub async fn open_temp_store() -> (TempDir, PathBuf, BlobStore) {
    let (dir, path) = temp_store_path();
    let store = BlobStore::open(&path).await.expect("open store");
    (dir, path, store)
}

/// A small text blob.
pub fn text_blob(name: &str, body: &str) -> FileBlob {
    FileBlob::new(name, "text/plain", body.as_bytes().to_vec())
}

/// A JPEG-typed blob with arbitrary bytes.
pub fn photo_blob(name: &str) -> FileBlob {
    FileBlob::new(name, "image/jpeg", name.as_bytes().to_vec())
}
