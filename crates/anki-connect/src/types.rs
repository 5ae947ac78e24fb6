//! Wire types for AnkiConnect requests and responses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// AnkiConnect API version spoken by this client.
pub const API_VERSION: u32 = 6;

/// Request envelope: `{"action", "version", "params"}`.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    pub action: &'a str,
    pub version: u32,
    pub params: serde_json::Value,
}

impl<'a> Request<'a> {
    pub fn new(action: &'a str, params: serde_json::Value) -> Self {
        Self {
            action,
            version: API_VERSION,
            params,
        }
    }
}

/// Response envelope: `{"result", "error"}`. A non-null error means failure.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
}

/// One field of a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteField {
    pub value: String,
    #[serde(default)]
    pub order: u32,
}

/// A note as returned by `notesInfo`.
///
/// Every property defaults when absent: AnkiConnect answers `{}` for ids
/// that no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(default)]
    pub note_id: i64,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub fields: HashMap<String, NoteField>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Note {
    /// Field values in the note type's field order.
    pub fn field_values(&self) -> impl Iterator<Item = &str> {
        let mut fields: Vec<(&String, &NoteField)> = self.fields.iter().collect();
        fields.sort_by(|a, b| a.1.order.cmp(&b.1.order).then_with(|| a.0.cmp(b.0)));
        fields.into_iter().map(|(_, field)| field.value.as_str())
    }
}
