//! The reconciliation engine.
//!
//! Each operation takes a fresh snapshot of the notes (and, when diffing, of
//! the remote media list), derives the referenced filenames, and resolves and
//! uploads them one at a time. Hard failures while fetching abort the run;
//! resolution misses and failed uploads are tallied and the run continues.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anki_connect::{AnkiError, MediaService, Note};
use media_refs::{MediaSet, extract_media};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};
use vault_index::{Vault, resolve};

use crate::events::{EventBus, Phase, SyncEvent};
use crate::settings::Settings;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Anki(#[from] AnkiError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Outcome of an upload pass.
///
/// Every attempted filename is counted exactly once: either sent, or not
/// found (which includes uploads that failed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub sent_count: usize,
    pub not_found_count: usize,
    pub not_found_filenames: Vec<String>,
}

impl SyncReport {
    /// Number of filenames this pass processed.
    pub fn attempted(&self) -> usize {
        self.sent_count + self.not_found_count
    }

    fn record_sent(&mut self) {
        self.sent_count += 1;
    }

    fn record_not_found(&mut self, filename: &str) {
        self.not_found_count += 1;
        self.not_found_filenames.push(filename.to_string());
    }
}

/// Referenced filenames absent from the remote media store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingList {
    /// Missing filenames in discovery order.
    pub missing: Vec<String>,
    /// Distinct filenames referenced by the notes.
    pub referenced_count: usize,
}

impl MissingList {
    pub fn len(&self) -> usize {
        self.missing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Media filenames referenced anywhere in `notes`.
pub fn references_in(notes: &[Note]) -> MediaSet {
    extract_media(notes.iter().flat_map(Note::field_values))
}

/// References not present remotely: `refs − remote`, in discovery order.
pub fn missing_media(refs: &MediaSet, remote: &HashSet<String>) -> MediaSet {
    refs.difference(remote)
}

/// Runs reconciliation operations against one remote service and vault.
///
/// Operations on one reconciler must not run concurrently; each run reports
/// its phases and per-file progress on the optional event bus.
pub struct Reconciler<'a, S: ?Sized, V: ?Sized> {
    service: &'a S,
    vault: &'a V,
    settings: &'a Settings,
    events: Option<Arc<EventBus>>,
    phase: Mutex<Phase>,
}

impl<'a, S, V> Reconciler<'a, S, V>
where
    S: MediaService + ?Sized,
    V: Vault + ?Sized,
{
    pub fn new(service: &'a S, vault: &'a V, settings: &'a Settings) -> Self {
        Self {
            service,
            vault,
            settings,
            events: None,
            phase: Mutex::new(Phase::Idle),
        }
    }

    /// Publish progress on `events`.
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    /// Phase of the current (or last) run.
    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Upload every referenced file, whether or not it already exists remotely.
    pub async fn force_sync_all(&self) -> Result<SyncReport> {
        let result = self.run_force_sync().await;
        self.finish(result)
    }

    /// Upload only referenced files the remote store doesn't have.
    pub async fn sync_missing_only(&self) -> Result<SyncReport> {
        let result = self.run_sync_missing().await;
        self.finish(result)
    }

    /// List referenced files the remote store doesn't have, without uploading.
    ///
    /// The result can be handed to [`Reconciler::sync_listed`] to upload
    /// exactly those files.
    pub async fn list_missing_only(&self) -> Result<MissingList> {
        let result = self.run_list_missing().await;
        self.finish(result)
    }

    /// Upload the files of a previous `list_missing_only` run.
    pub async fn sync_listed(&self, listed: &MissingList) -> SyncReport {
        let missing: MediaSet = listed.missing.iter().cloned().collect();
        let report = self.send_all(&missing).await;
        self.enter(Phase::Done);
        report
    }

    async fn run_force_sync(&self) -> Result<SyncReport> {
        let refs = self.collect_references().await?;
        Ok(self.send_all(&refs).await)
    }

    async fn run_sync_missing(&self) -> Result<SyncReport> {
        let refs = self.collect_references().await?;
        let missing = self.diff_remote(&refs).await?;
        Ok(self.send_all(&missing).await)
    }

    async fn run_list_missing(&self) -> Result<MissingList> {
        let refs = self.collect_references().await?;
        let missing = self.diff_remote(&refs).await?;
        Ok(MissingList {
            missing: missing.into_vec(),
            referenced_count: refs.len(),
        })
    }

    async fn collect_references(&self) -> Result<MediaSet> {
        self.enter(Phase::FetchingNotes);
        let ids = self.service.list_all_note_ids().await?;
        let notes = self
            .service
            .fetch_notes(&ids, self.settings.batch_size)
            .await?;
        info!("Found {} notes", notes.len());
        self.emit(SyncEvent::NotesFetched { count: notes.len() });

        self.enter(Phase::ExtractingReferences);
        let refs = references_in(&notes);
        info!("Found {} media references", refs.len());
        self.emit(SyncEvent::ReferencesExtracted { count: refs.len() });

        Ok(refs)
    }

    async fn diff_remote(&self, refs: &MediaSet) -> Result<MediaSet> {
        self.enter(Phase::DiffingRemote);
        let remote = self.service.list_remote_media_filenames().await?;
        let missing = missing_media(refs, &remote);
        info!("Found {} missing files", missing.len());
        self.emit(SyncEvent::MissingComputed {
            count: missing.len(),
        });
        Ok(missing)
    }

    /// Resolve and upload each filename in order, one at a time.
    async fn send_all(&self, filenames: &MediaSet) -> SyncReport {
        self.enter(Phase::ResolvingAndSending);

        let total = filenames.len();
        let preferred = self.settings.preferred_folder();
        let mut report = SyncReport::default();

        for filename in filenames.iter() {
            let Some(file) = resolve(filename, self.vault, preferred) else {
                debug!("Not found in vault: {}", filename);
                report.record_not_found(filename);
                self.emit(SyncEvent::FileNotFound {
                    filename: filename.to_string(),
                });
                continue;
            };

            let path = self.vault.absolute_path(&file);
            if self.service.upload_media(filename, &path).await {
                report.record_sent();
                debug!("Sent {}/{}: {}", report.sent_count, total, filename);
                self.emit(SyncEvent::FileSent {
                    filename: filename.to_string(),
                    sent: report.sent_count,
                    total,
                });
            } else {
                report.record_not_found(filename);
                self.emit(SyncEvent::UploadFailed {
                    filename: filename.to_string(),
                });
            }
        }

        info!(
            "Sent {} files, {} not found",
            report.sent_count, report.not_found_count
        );
        report
    }

    fn finish<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.enter(Phase::Done),
            Err(e) => {
                error!("Reconciliation failed: {}", e);
                self.enter(Phase::Failed);
            }
        }
        result
    }

    fn enter(&self, phase: Phase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = phase;
        self.emit(SyncEvent::PhaseChanged { phase });
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}
