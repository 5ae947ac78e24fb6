//! anki-connect: Client for the subset of the AnkiConnect API used to
//! reconcile note media.
//!
//! - `MediaService` - trait over the remote actions, with the batching and
//!   error-tolerance policy built in as provided methods
//! - `AnkiConnect` - the HTTP implementation
//! - `Note` - the note shape returned by `notesInfo`

pub mod client;
pub mod service;
pub mod types;

pub use client::{AnkiConnect, DEFAULT_TIMEOUT_SECS, DEFAULT_URL};
pub use service::MediaService;
pub use types::{Note, NoteField};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnkiError {
    #[error("Failed to connect to Anki at {url}. Is Anki running with AnkiConnect? ({reason})")]
    Connect { url: String, reason: String },

    #[error("AnkiConnect returned HTTP {status} for {action}")]
    Http { action: String, status: u16 },

    #[error("AnkiConnect error for {action}: {message}")]
    Remote { action: String, message: String },

    #[error("Malformed AnkiConnect response for {action}: {message}")]
    Malformed { action: String, message: String },

    #[error("Batch size must be at least 1")]
    InvalidBatchSize,

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, AnkiError>;
