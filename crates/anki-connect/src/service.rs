//! MediaService trait: the remote actions the reconciler needs.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

use crate::types::Note;
use crate::{AnkiError, Result};

/// Remote note and media store.
///
/// Implementors provide the four raw actions. The provided methods layer the
/// calling policy on top: note fetches are split into sequential batches, and
/// uploads never fail the caller.
#[async_trait]
pub trait MediaService: Send + Sync {
    /// `findNotes`: ids of every note matching `query`.
    async fn find_note_ids(&self, query: &str) -> Result<Vec<i64>>;

    /// `notesInfo`: note bodies for `ids`, in the same order.
    async fn notes_info(&self, ids: &[i64]) -> Result<Vec<Note>>;

    /// `getMediaFilesNames`: remote media filenames matching `pattern`.
    async fn media_file_names(&self, pattern: &str) -> Result<Vec<String>>;

    /// `storeMediaFile`: upload the file at `path` as `filename`, replacing
    /// any remote file with that name.
    async fn store_media_file(&self, filename: &str, path: &Path) -> Result<()>;

    /// Ids of every note in the collection.
    async fn list_all_note_ids(&self) -> Result<Vec<i64>> {
        self.find_note_ids("*").await
    }

    /// Fetch note bodies at most `batch_size` ids per request.
    ///
    /// Batches go out one at a time, each awaited before the next, and the
    /// results are concatenated in request order.
    async fn fetch_notes(&self, ids: &[i64], batch_size: usize) -> Result<Vec<Note>> {
        if batch_size == 0 {
            return Err(AnkiError::InvalidBatchSize);
        }

        let mut notes = Vec::with_capacity(ids.len());
        for (i, batch) in ids.chunks(batch_size).enumerate() {
            tracing::debug!("Fetching note batch {} ({} ids)", i + 1, batch.len());
            notes.extend(self.notes_info(batch).await?);
        }
        Ok(notes)
    }

    /// Every media filename currently stored remotely.
    async fn list_remote_media_filenames(&self) -> Result<HashSet<String>> {
        Ok(self.media_file_names("*").await?.into_iter().collect())
    }

    /// Upload a file, reporting failure as `false` instead of an error.
    async fn upload_media(&self, filename: &str, path: &Path) -> bool {
        match self.store_media_file(filename, path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to send {}: {}", filename, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every notesInfo batch and fails stores for one filename.
    #[derive(Default)]
    struct Recording {
        batches: Mutex<Vec<Vec<i64>>>,
        fail_note_batch: Option<usize>,
    }

    #[async_trait]
    impl MediaService for Recording {
        async fn find_note_ids(&self, query: &str) -> Result<Vec<i64>> {
            assert_eq!(query, "*");
            Ok(vec![1, 2, 3])
        }

        async fn notes_info(&self, ids: &[i64]) -> Result<Vec<Note>> {
            let mut batches = self.batches.lock().unwrap();
            if Some(batches.len()) == self.fail_note_batch {
                return Err(AnkiError::Remote {
                    action: "notesInfo".into(),
                    message: "collection is not available".into(),
                });
            }
            batches.push(ids.to_vec());
            Ok(ids
                .iter()
                .map(|&id| Note {
                    note_id: id,
                    ..Default::default()
                })
                .collect())
        }

        async fn media_file_names(&self, pattern: &str) -> Result<Vec<String>> {
            assert_eq!(pattern, "*");
            Ok(vec!["a.png".into(), "b.png".into(), "a.png".into()])
        }

        async fn store_media_file(&self, filename: &str, _path: &Path) -> Result<()> {
            if filename == "bad.png" {
                Err(AnkiError::Remote {
                    action: "storeMediaFile".into(),
                    message: "permission denied".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_fetch_notes_batches_of_one() {
        let service = Recording::default();
        let ids = service.list_all_note_ids().await.unwrap();
        let notes = service.fetch_notes(&ids, 1).await.unwrap();

        assert_eq!(
            *service.batches.lock().unwrap(),
            vec![vec![1], vec![2], vec![3]]
        );
        let fetched: Vec<_> = notes.iter().map(|n| n.note_id).collect();
        assert_eq!(fetched, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fetch_notes_uneven_batches() {
        let service = Recording::default();
        let ids: Vec<i64> = (1..=5).collect();
        let notes = service.fetch_notes(&ids, 2).await.unwrap();

        assert_eq!(
            *service.batches.lock().unwrap(),
            vec![vec![1, 2], vec![3, 4], vec![5]]
        );
        assert_eq!(notes.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_notes_empty_ids_issues_no_requests() {
        let service = Recording::default();
        let notes = service.fetch_notes(&[], 50).await.unwrap();
        assert!(notes.is_empty());
        assert!(service.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_notes_rejects_zero_batch_size() {
        let service = Recording::default();
        let result = service.fetch_notes(&[1], 0).await;
        assert!(matches!(result, Err(AnkiError::InvalidBatchSize)));
    }

    #[tokio::test]
    async fn test_fetch_notes_stops_on_failed_batch() {
        let service = Recording {
            fail_note_batch: Some(1),
            ..Default::default()
        };
        let result = service.fetch_notes(&[1, 2, 3], 1).await;

        assert!(matches!(result, Err(AnkiError::Remote { .. })));
        assert_eq!(*service.batches.lock().unwrap(), vec![vec![1]]);
    }

    #[tokio::test]
    async fn test_remote_filenames_deduplicated() {
        let service = Recording::default();
        let names = service.list_remote_media_filenames().await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("a.png"));
    }

    #[tokio::test]
    async fn test_upload_media_swallows_errors() {
        let service = Recording::default();
        assert!(service.upload_media("good.png", Path::new("/v/good.png")).await);
        assert!(!service.upload_media("bad.png", Path::new("/v/bad.png")).await);
    }
}
