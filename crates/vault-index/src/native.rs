//! Native vault implementation using tokio::fs.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::vault::{FileIndex, Result, Vault, VaultError, VaultFile};

/// Vault backed by a directory on disk.
///
/// The directory is scanned once by `open`; lookups are answered from the
/// resulting index. Entries are visited depth-first with siblings sorted by
/// name, so the listing order is stable across runs. Hidden entries
/// (`.obsidian`, `.trash`, `.git`, ...) are skipped.
pub struct NativeVault {
    root: PathBuf,
    index: FileIndex,
}

impl NativeVault {
    /// Scan the vault rooted at `root`.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root)
            .await
            .map_err(|_| VaultError::NotFound(root.clone()))?;
        if !metadata.is_dir() {
            return Err(VaultError::NotDirectory(root));
        }

        let mut index = FileIndex::default();
        Self::scan_dir(&root, "", &mut index).await?;
        tracing::debug!("Indexed {} files in {}", index.len(), root.display());

        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn scan_dir(root: &Path, rel: &str, index: &mut FileIndex) -> Result<()> {
        let dir = if rel.is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel)
        };

        let mut reader = fs::read_dir(&dir)
            .await
            .map_err(|e| VaultError::Io(e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| VaultError::Io(e.to_string()))?
        {
            entries.push(entry);
        }
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            let path = if rel.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", rel, name)
            };

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| VaultError::Io(e.to_string()))?;

            if file_type.is_dir() {
                Box::pin(Self::scan_dir(root, &path, index)).await?;
            } else if file_type.is_file() {
                index.push(VaultFile::new(&path));
            } else if file_type.is_symlink() {
                // Linked files are indexed, linked directories are not followed
                match fs::metadata(entry.path()).await {
                    Ok(meta) if meta.is_file() => index.push(VaultFile::new(&path)),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping broken link {}: {}", path, e),
                }
            }
        }

        Ok(())
    }
}

impl Vault for NativeVault {
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
