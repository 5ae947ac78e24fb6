//! Locating the vault file behind a media filename.

use crate::vault::{Vault, VaultFile};

/// Conventional attachment folders, checked in this order after the preferred folder.
pub const FALLBACK_MEDIA_FOLDERS: &[&str] =
    &["attachments", "assets", "media", "images", "Anexos", "Mídia"];

/// Find the vault file for `filename`.
///
/// Resolution order, first hit wins:
/// 1. any file in the vault whose name is exactly `filename` (first in
///    listing order when several folders contain one)
/// 2. `preferred_folder/filename`, when a preferred folder is set
/// 3. `folder/filename` for each of [`FALLBACK_MEDIA_FOLDERS`]
///
/// A miss is a normal outcome and returns None.
pub fn resolve<V: Vault + ?Sized>(
    filename: &str,
    vault: &V,
    preferred_folder: Option<&str>,
) -> Option<VaultFile> {
    if let Some(file) = vault.list_all_files().iter().find(|f| f.name == filename) {
        return Some(file.clone());
    }

    let preferred = preferred_folder
        .map(|folder| folder.trim().trim_matches('/'))
        .filter(|folder| !folder.is_empty());

    if let Some(folder) = preferred {
        if let Some(file) = lookup_in(vault, folder, filename) {
            return Some(file);
        }
    }

    FALLBACK_MEDIA_FOLDERS
        .iter()
        .find_map(|folder| lookup_in(vault, folder, filename))
}

fn lookup_in<V: Vault + ?Sized>(vault: &V, folder: &str, filename: &str) -> Option<VaultFile> {
    vault
        .lookup_by_path(&format!("{}/{}", folder, filename))
        .cloned()
}
