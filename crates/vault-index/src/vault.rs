//! Vault trait abstraction over an indexed set of vault files.
//!
//! Implementations:
//! - `InMemoryVault` - For testing
//! - `NativeVault` - Scans a vault directory on disk
//!
//! Lookups never touch the disk: an implementation builds its index up front
//! and answers every query from memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Vault directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotDirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// A file in the vault.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultFile {
    /// Path relative to the vault root, `/`-separated: "attachments/cat.png"
    pub path: String,
    /// Final path segment: "cat.png"
    pub name: String,
}

impl VaultFile {
    pub fn new(path: &str) -> Self {
        let path = normalize_path(path);
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { path, name }
    }
}

/// Read-only, in-memory view of the files in a vault.
///
/// `list_all_files` order is the order the underlying listing produced. When
/// two folders hold a file with the same name, whichever comes first in that
/// order is the one name-based lookups find.
pub trait Vault: Send + Sync {
    /// Every file in the vault, in listing order.
    fn list_all_files(&self) -> &[VaultFile];

    /// Absolute filesystem path of a vault file.
    fn absolute_path(&self, file: &VaultFile) -> PathBuf;

    /// Find a file by its vault-relative path.
    fn lookup_by_path(&self, path: &str) -> Option<&VaultFile>;
}

/// Normalize a vault-relative path: forward slashes, no leading/trailing `/`.
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// Ordered file list with a path index, shared by the vault implementations.
#[derive(Debug, Default, Clone)]
pub(crate) struct FileIndex {
    files: Vec<VaultFile>,
    by_path: HashMap<String, usize>,
}

impl FileIndex {
    pub(crate) fn push(&mut self, file: VaultFile) {
        if self.by_path.contains_key(&file.path) {
            return;
        }
        self.by_path.insert(file.path.clone(), self.files.len());
        self.files.push(file);
    }

    pub(crate) fn files(&self) -> &[VaultFile] {
        &self.files
    }

    pub(crate) fn get(&self, path: &str) -> Option<&VaultFile> {
        let path = normalize_path(path);
        self.by_path.get(&path).map(|&i| &self.files[i])
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }
}

/// In-memory vault for testing
#[derive(Debug, Clone)]
pub struct InMemoryVault {
    root: PathBuf,
    index: FileIndex,
}

impl InMemoryVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            index: FileIndex::default(),
        }
    }

    /// Build a vault from relative paths, listed in the given order.
    pub fn with_files<'a>(root: impl Into<PathBuf>, paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut vault = Self::new(root);
        for path in paths {
            vault.add(path);
        }
        vault
    }

    /// Append a file to the listing. Re-adding an existing path is a no-op.
    pub fn add(&mut self, path: &str) {
        self.index.push(VaultFile::new(path));
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new("/vault")
    }
}

impl Vault for InMemoryVault {
    fn list_all_files(&self) -> &[VaultFile] {
        self.index.files()
    }

    fn absolute_path(&self, file: &VaultFile) -> PathBuf {
        self.root.join(&file.path)
    }

    fn lookup_by_path(&self, path: &str) -> Option<&VaultFile> {
        self.index.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_file_splits_name() {
        let file = VaultFile::new("attachments/sub/cat.png");
        assert_eq!(file.path, "attachments/sub/cat.png");
        assert_eq!(file.name, "cat.png");

        let file = VaultFile::new("/root.png");
        assert_eq!(file.path, "root.png");
        assert_eq!(file.name, "root.png");
    }

    #[test]
    fn in_memory_vault_keeps_listing_order() {
        let vault = InMemoryVault::with_files("/v", ["b/x.png", "a/x.png", "c.png"]);
        let paths: Vec<_> = vault.list_all_files().iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b/x.png", "a/x.png", "c.png"]);
    }

    #[test]
    fn in_memory_vault_ignores_duplicate_paths() {
        let vault = InMemoryVault::with_files("/v", ["a.png", "a.png", "/a.png"]);
        assert_eq!(vault.list_all_files().len(), 1);
    }

    #[test]
    fn lookup_normalizes_separators() {
        let vault = InMemoryVault::with_files("/v", ["media/clip.mp3"]);
        assert!(vault.lookup_by_path("media/clip.mp3").is_some());
        assert!(vault.lookup_by_path(r"media\clip.mp3").is_some());
        assert!(vault.lookup_by_path("/media/clip.mp3/").is_some());
        assert!(vault.lookup_by_path("clip.mp3").is_none());
    }

    #[test]
    fn absolute_path_joins_root() {
        let vault = InMemoryVault::with_files("/home/me/vault", ["attachments/cat.png"]);
        let file = vault.lookup_by_path("attachments/cat.png").unwrap();
        assert_eq!(
            vault.absolute_path(file),
            PathBuf::from("/home/me/vault/attachments/cat.png")
        );
    }
}
