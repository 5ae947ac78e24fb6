//! media-sync: Reconciles the media referenced by Anki notes with the files
//! Anki stores, using an Obsidian vault as the source of truth.
//!
//! This is a thin library layer over the binary's components, so integration
//! tests and other front ends can drive the same operations.

pub mod events;
pub mod reconcile;
pub mod report;
pub mod settings;

// Re-export key types for convenience
pub use events::{EventBus, Phase, Subscription, SyncEvent};
pub use reconcile::{
    MissingList, Reconciler, SyncError, SyncReport, missing_media, references_in,
};
pub use report::{SyncKind, render_missing_list, render_sync_report};
pub use settings::{Settings, SettingsError, expand_tilde};
