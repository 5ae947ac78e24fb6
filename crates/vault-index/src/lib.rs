//! vault-index: Read-only view of an Obsidian vault's files.
//!
//! This crate provides:
//! - The `Vault` trait: a flat, ordered file listing plus path lookups
//! - `NativeVault`, which scans a vault directory once with `tokio::fs`
//! - `InMemoryVault` for tests
//! - `resolve`, which finds the vault file backing a media filename

pub mod native;
pub mod resolve;
pub mod vault;

pub use native::NativeVault;
pub use resolve::{FALLBACK_MEDIA_FOLDERS, resolve};
pub use vault::{InMemoryVault, Vault, VaultError, VaultFile};
