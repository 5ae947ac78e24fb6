//! Progress events for reconciliation runs.
//!
//! Provides `SyncEvent` for progress reporting and `EventBus` for
//! subscriptions. The reconciler emits one event per phase transition and
//! one per processed filename, so callers can surface counts as they change.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Phases of a single reconciliation run.
///
/// `Idle → FetchingNotes → ExtractingReferences → [DiffingRemote] →
/// ResolvingAndSending → Done`, or `Failed` from any phase on a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    FetchingNotes,
    ExtractingReferences,
    DiffingRemote,
    ResolvingAndSending,
    Done,
    Failed,
}

/// Events emitted while a reconciliation run progresses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SyncEvent {
    /// The run moved to a new phase.
    PhaseChanged { phase: Phase },
    /// All note bodies were fetched.
    NotesFetched { count: usize },
    /// Distinct media filenames found in the notes.
    ReferencesExtracted { count: usize },
    /// Referenced filenames missing from the remote media store.
    MissingComputed { count: usize },
    /// A file was uploaded.
    FileSent {
        filename: String,
        /// Files sent so far in this run.
        sent: usize,
        /// Files this run will attempt.
        total: usize,
    },
    /// No vault file backs this filename.
    FileNotFound { filename: String },
    /// The vault file was found but the upload failed.
    UploadFailed { filename: String },
}

/// Subscription handle that unsubscribes automatically when dropped.
///
/// Follows the disposer pattern: hold this value to keep receiving events,
/// drop it (or let it go out of scope) to unsubscribe.
pub struct Subscription {
    bus: Weak<EventBus>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

type Callback = Arc<dyn Fn(SyncEvent) + Send + Sync>;

/// Event bus for publishing sync events to subscribers.
///
/// Wrap in `Arc` to enable subscriptions.
pub struct EventBus {
    callbacks: RwLock<Vec<(usize, Callback)>>,
    next_id: AtomicUsize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events. Returns `Subscription` that unsubscribes on drop.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(SyncEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: usize) {
        // try_write: Drop may run during unwinding while emit holds a read lock
        if let Ok(mut guard) = self.callbacks.try_write() {
            guard.retain(|(i, _)| *i != id);
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: SyncEvent) {
        // Snapshot so a callback may subscribe without deadlocking
        let callbacks: Vec<_> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event.clone());
        }
    }
}
