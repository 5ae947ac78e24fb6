//! Human-readable rendering of reconciliation results.

use std::fmt::Write;

use crate::reconcile::{MissingList, SyncReport};

/// Not-found filenames shown in a sync summary.
pub const NOT_FOUND_DISPLAY_LIMIT: usize = 100;

/// Missing filenames shown in a missing-media listing.
pub const MISSING_DISPLAY_LIMIT: usize = 200;

/// Which operation produced a report; picks the summary wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    All,
    Missing,
}

/// Render a sync report.
///
/// Fully successful runs get a one-line summary; runs with misses list the
/// first [`NOT_FOUND_DISPLAY_LIMIT`] filenames.
pub fn render_sync_report(report: &SyncReport, kind: SyncKind) -> String {
    if report.not_found_filenames.is_empty() {
        return match kind {
            SyncKind::Missing if report.attempted() == 0 => "No missing media found.".to_string(),
            SyncKind::Missing => format!(
                "Sync complete! Sent {} missing files to Anki.",
                report.sent_count
            ),
            SyncKind::All => format!("Sync complete! Sent {} files to Anki.", report.sent_count),
        };
    }

    let mut out = String::new();
    let _ = writeln!(out, "Sync results");
    let _ = writeln!(out, "Sent: {} files", report.sent_count);
    let _ = writeln!(out, "Not found in vault: {} files", report.not_found_count);
    let _ = writeln!(out);
    let _ = writeln!(out, "Files not found");
    write_capped(&mut out, &report.not_found_filenames, NOT_FOUND_DISPLAY_LIMIT);
    out
}

/// Render the result of a missing-media listing.
pub fn render_missing_list(list: &MissingList) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Missing media in Anki");
    let _ = writeln!(out, "Found {} missing files", list.len());
    if !list.is_empty() {
        let _ = writeln!(out);
        write_capped(&mut out, &list.missing, MISSING_DISPLAY_LIMIT);
    }
    out
}

fn write_capped(out: &mut String, names: &[String], limit: usize) {
    for name in names.iter().take(limit) {
        let _ = writeln!(out, "{}", name);
    }
    if names.len() > limit {
        let _ = writeln!(out, "... and {} more", names.len() - limit);
    }
}
