//! Multi-file upload pipeline.
//!
//! An upload runs in four steps:
//! 1. validate every candidate locally (size ceiling, archives exempt)
//! 2. append accepted files to one batch, advancing progress per file
//! 3. submit the batch to the service in a single call
//! 4. merge the returned listing and report per-file refusals
//!
//! Only one batch may be in flight per session.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use protocol::{UploadFailure, UploadPart};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cancel::CancelHandle;
use crate::classify;
use crate::error::{BrowserError, BrowserResult};
use crate::listing::DirectoryListingStore;
use crate::notify::ProgressSink;
use crate::service::FileService;

/// A local file offered for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
    pub data: Bytes,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            data,
        }
    }

    /// Read a candidate from the local filesystem, named after the file.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )
            })?;
        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, data))
    }
}

/// Why a candidate was refused before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    TooLarge { size: u64, limit: u64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::TooLarge { size, limit } => {
                write!(f, "file too large: {} bytes exceeds limit of {} bytes", size, limit)
            }
        }
    }
}

/// A candidate refused by local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRejection {
    pub name: String,
    pub reason: RejectionReason,
}

/// Split candidates into accepted files and rejections.
///
/// Archives are exempt from the size ceiling.
pub fn validate(
    candidates: Vec<UploadCandidate>,
    max_size: u64,
) -> (Vec<UploadCandidate>, Vec<ValidationRejection>) {
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut rejected = Vec::new();

    for candidate in candidates {
        if candidate.size > max_size && !classify::is_archive(&candidate.name) {
            rejected.push(ValidationRejection {
                reason: RejectionReason::TooLarge {
                    size: candidate.size,
                    limit: max_size,
                },
                name: candidate.name,
            });
        } else {
            accepted.push(candidate);
        }
    }

    (accepted, rejected)
}

/// Progress of the batch in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadBatch {
    pub id: Uuid,
    pub total: usize,
    pub current: usize,
}

/// Outcome of one upload call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Batch identifier, absent when nothing was sent.
    pub batch_id: Option<Uuid>,
    /// Files the service accepted.
    pub uploaded: Vec<String>,
    /// Files refused locally.
    pub rejected: Vec<ValidationRejection>,
    /// Files the service refused.
    pub failed: Vec<UploadFailure>,
    /// Whether the returned listing was merged into the browser.
    pub merged: bool,
}

impl UploadReport {
    /// Some files went through and some did not.
    pub fn is_partial(&self) -> bool {
        !self.uploaded.is_empty() && (!self.rejected.is_empty() || !self.failed.is_empty())
    }

    /// Every offered file was uploaded.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}

/// Owns the progress state for the duration of one batch.
struct BatchGuard<'a> {
    progress: &'a watch::Sender<Option<UploadBatch>>,
    sink: &'a dyn ProgressSink,
    id: Uuid,
    total: usize,
}

impl<'a> BatchGuard<'a> {
    fn acquire(
        progress: &'a watch::Sender<Option<UploadBatch>>,
        sink: &'a dyn ProgressSink,
        total: usize,
    ) -> BrowserResult<Self> {
        let id = Uuid::new_v4();
        let acquired = progress.send_if_modified(|batch| {
            if batch.is_some() {
                false
            } else {
                *batch = Some(UploadBatch {
                    id,
                    total,
                    current: 0,
                });
                true
            }
        });
        if !acquired {
            return Err(BrowserError::UploadInProgress);
        }

        sink.started(total);
        Ok(Self {
            progress,
            sink,
            id,
            total,
        })
    }

    fn advance(&self) {
        let mut current = 0;
        self.progress.send_modify(|batch| {
            if let Some(batch) = batch {
                batch.current = (batch.current + 1).min(batch.total);
                current = batch.current;
            }
        });
        self.sink.advanced(current, self.total);
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.progress.send_replace(None);
        self.sink.finished();
    }
}

/// Validates, submits and reconciles upload batches.
pub struct UploadPipeline<S: FileService> {
    service: Arc<S>,
    progress: watch::Sender<Option<UploadBatch>>,
    max_size: u64,
    cancel: CancelHandle,
}

impl<S: FileService> UploadPipeline<S> {
    pub fn new(service: Arc<S>, max_size: u64, cancel: CancelHandle) -> Self {
        let (progress, _) = watch::channel(None);
        Self {
            service,
            progress,
            max_size,
            cancel,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// The batch in flight, if any.
    pub fn current_batch(&self) -> Option<UploadBatch> {
        *self.progress.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UploadBatch>> {
        self.progress.subscribe()
    }

    /// Upload `candidates` into the directory `store` currently shows.
    ///
    /// Locally rejected files are reported and never sent. When nothing is
    /// left to send the service is not called and no batch is started, so the
    /// rejections come back even while another batch is in flight. A failed request is
    /// [`BrowserError::UploadFailed`]; files the service refuses individually
    /// land in [`UploadReport::failed`].
    pub async fn upload(
        &self,
        store: &DirectoryListingStore<S>,
        candidates: Vec<UploadCandidate>,
        sink: &dyn ProgressSink,
    ) -> BrowserResult<UploadReport> {
        let (accepted, rejected) = validate(candidates, self.max_size);
        for rejection in &rejected {
            warn!(name = %rejection.name, reason = %rejection.reason, "upload candidate rejected");
        }

        if accepted.is_empty() {
            debug!("no files left after validation, skipping upload");
            return Ok(UploadReport {
                rejected,
                ..UploadReport::default()
            });
        }

        let guard = BatchGuard::acquire(&self.progress, sink, accepted.len())?;
        let destination = store.current_path().await;

        let mut names = Vec::with_capacity(accepted.len());
        let mut parts = Vec::with_capacity(accepted.len());
        for candidate in accepted {
            names.push(candidate.name.clone());
            parts.push(UploadPart {
                name: candidate.name,
                data: candidate.data.into(),
            });
            guard.advance();
        }

        debug!(batch = %guard.id, path = %destination, files = parts.len(), "submitting upload batch");
        let response = match self.cancel.run(self.service.upload(&destination, parts)).await {
            Ok(response) => response,
            Err(BrowserError::Cancelled) => return Err(BrowserError::Cancelled),
            Err(err) => {
                warn!(batch = %guard.id, error = %err, "upload batch failed");
                return Err(BrowserError::UploadFailed(err.to_string()));
            }
        };

        let failed = response.failed.clone();
        let uploaded: Vec<String> = names
            .iter()
            .filter(|name| !response.is_failed(name))
            .cloned()
            .collect();
        let merged = store.merge_upload(&destination, response).await;

        info!(
            batch = %guard.id,
            uploaded = uploaded.len(),
            failed = failed.len(),
            rejected = rejected.len(),
            "upload batch finished"
        );

        Ok(UploadReport {
            batch_id: Some(guard.id),
            uploaded,
            rejected,
            failed,
            merged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BrowserConfig, DEFAULT_MAX_UPLOAD_SIZE};
    use crate::entry::UploadStatus;
    use crate::notify::NoProgress;
    use crate::service::{FailureMode, MemoryFileService};
    use std::sync::Mutex;
    use std::time::Duration;

    const MIB: u64 = 1024 * 1024;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn started(&self, total: usize) {
            self.events.lock().unwrap().push(format!("started {}", total));
        }
        fn advanced(&self, current: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("advanced {}/{}", current, total));
        }
        fn finished(&self) {
            self.events.lock().unwrap().push("finished".to_string());
        }
    }

    fn sized(name: &str, size: u64) -> UploadCandidate {
        UploadCandidate {
            name: name.to_string(),
            size,
            data: Bytes::from_static(b"x"),
        }
    }

    fn setup(
        service: MemoryFileService,
    ) -> (
        Arc<MemoryFileService>,
        DirectoryListingStore<MemoryFileService>,
        UploadPipeline<MemoryFileService>,
    ) {
        let service = Arc::new(service);
        let cancel = CancelHandle::new();
        let store =
            DirectoryListingStore::new(service.clone(), &BrowserConfig::default(), cancel.clone());
        let pipeline = UploadPipeline::new(service.clone(), DEFAULT_MAX_UPLOAD_SIZE, cancel);
        (service, store, pipeline)
    }

    #[test]
    fn test_validate_size_ceiling() {
        let (accepted, rejected) = validate(
            vec![
                sized("data.csv", 150 * MIB),
                sized("archive.zip", 150 * MIB),
                sized("small.txt", 10),
                sized("exact.bin", 100 * MIB),
            ],
            100 * MIB,
        );

        let names: Vec<_> = accepted.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["archive.zip", "small.txt", "exact.bin"]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name, "data.csv");
        assert_eq!(
            rejected[0].reason,
            RejectionReason::TooLarge {
                size: 150 * MIB,
                limit: 100 * MIB
            }
        );
    }

    #[test]
    fn test_archive_exemption_is_case_insensitive() {
        let (accepted, rejected) = validate(vec![sized("BACKUP.TAR.GZ", 500 * MIB)], 100 * MIB);
        assert_eq!(accepted.len(), 1);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_report_partial() {
        let mut report = UploadReport {
            uploaded: vec!["a.txt".to_string()],
            ..UploadReport::default()
        };
        assert!(report.is_complete());
        assert!(!report.is_partial());

        report.failed.push(UploadFailure {
            name: "b.exe".to_string(),
            error: "blocked".to_string(),
        });
        assert!(report.is_partial());
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_upload_merges_and_reports_progress() {
        let (service, store, pipeline) = setup(MemoryFileService::new());
        service.add_dir("/docs");
        store.fetch_files("/docs").await.unwrap();

        let sink = RecordingSink::default();
        let report = pipeline
            .upload(
                &store,
                vec![
                    UploadCandidate::new("a.txt", b"aaa".to_vec()),
                    UploadCandidate::new("b.md", b"bb".to_vec()),
                ],
                &sink,
            )
            .await
            .unwrap();

        assert!(report.merged);
        assert!(report.batch_id.is_some());
        assert_eq!(report.uploaded, vec!["a.txt", "b.md"]);
        assert_eq!(
            sink.events(),
            vec!["started 2", "advanced 1/2", "advanced 2/2", "finished"]
        );
        assert!(pipeline.current_batch().is_none());

        let entry = store.find("/docs/a.txt").await.unwrap();
        assert_eq!(entry.upload_status, Some(UploadStatus::Success));
        assert!(entry.scanned);
        assert!(service.contains("/docs/b.md"));
    }

    #[tokio::test]
    async fn test_partial_failure() {
        let (_, store, pipeline) = setup(MemoryFileService::new().with_blocked_extensions(["exe"]));
        store.fetch_files("/").await.unwrap();

        let report = pipeline
            .upload(
                &store,
                vec![
                    UploadCandidate::new("ok.txt", b"fine".to_vec()),
                    UploadCandidate::new("bad.exe", b"MZ".to_vec()),
                ],
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(report.is_partial());
        assert_eq!(report.uploaded, vec!["ok.txt"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "bad.exe");
        assert_eq!(
            store.find("/ok.txt").await.unwrap().upload_status,
            Some(UploadStatus::Success)
        );
        assert!(store.find("/bad.exe").await.is_none());
    }

    #[tokio::test]
    async fn test_refused_files_merged_as_failed() {
        let (_, store, pipeline) = setup(
            MemoryFileService::new()
                .with_blocked_extensions(["exe"])
                .with_refused_files_kept(),
        );
        store.fetch_files("/").await.unwrap();

        let report = pipeline
            .upload(
                &store,
                vec![
                    UploadCandidate::new("ok.txt", b"fine".to_vec()),
                    UploadCandidate::new("bad.exe", b"MZ".to_vec()),
                ],
                &NoProgress,
            )
            .await
            .unwrap();

        assert_eq!(report.uploaded, vec!["ok.txt"]);
        assert_eq!(
            store.find("/ok.txt").await.unwrap().upload_status,
            Some(UploadStatus::Success)
        );
        assert_eq!(
            store.find("/bad.exe").await.unwrap().upload_status,
            Some(UploadStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_all_rejected_while_batch_in_flight_keeps_rejections() {
        let (service, store, pipeline) =
            setup(MemoryFileService::new().with_latency(Duration::from_millis(100)));
        store.fetch_files("/").await.unwrap();

        let (first, second) = tokio::join!(
            pipeline.upload(&store, vec![UploadCandidate::new("a.txt", b"a".to_vec())], &NoProgress),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                pipeline
                    .upload(&store, vec![sized("huge.csv", 200 * MIB)], &NoProgress)
                    .await
            }
        );

        assert!(first.is_ok());
        let second = second.unwrap();
        assert_eq!(second.rejected.len(), 1);
        assert_eq!(second.rejected[0].name, "huge.csv");
        assert!(second.batch_id.is_none());
        assert_eq!(service.upload_calls(), 1);
    }

    #[tokio::test]
    async fn test_all_rejected_skips_service() {
        let (service, store, pipeline) = setup(MemoryFileService::new());
        store.fetch_files("/").await.unwrap();

        let sink = RecordingSink::default();
        let report = pipeline
            .upload(&store, vec![sized("huge.csv", 200 * MIB)], &sink)
            .await
            .unwrap();

        assert_eq!(service.upload_calls(), 0);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.batch_id.is_none());
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_total_failure_tears_down_progress() {
        let (service, store, pipeline) = setup(MemoryFileService::new());
        store.fetch_files("/").await.unwrap();
        service.fail_next(FailureMode::Rejected("quota exceeded".to_string()));

        let sink = RecordingSink::default();
        let err = pipeline
            .upload(&store, vec![UploadCandidate::new("a.txt", b"a".to_vec())], &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, BrowserError::UploadFailed(ref m) if m == "quota exceeded"));
        assert!(pipeline.current_batch().is_none());
        assert_eq!(sink.events().last().map(String::as_str), Some("finished"));
    }

    #[tokio::test]
    async fn test_second_upload_rejected_while_in_flight() {
        let (_, store, pipeline) =
            setup(MemoryFileService::new().with_latency(Duration::from_millis(100)));
        store.fetch_files("/").await.unwrap();

        let (first, second) = tokio::join!(
            pipeline.upload(&store, vec![UploadCandidate::new("one.txt", b"1".to_vec())], &NoProgress),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                pipeline
                    .upload(&store, vec![UploadCandidate::new("two.txt", b"2".to_vec())], &NoProgress)
                    .await
            }
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(BrowserError::UploadInProgress)));
        assert!(pipeline.current_batch().is_none());
    }

    #[tokio::test]
    async fn test_progress_observable_while_in_flight() {
        let (_, store, pipeline) =
            setup(MemoryFileService::new().with_latency(Duration::from_millis(50)));
        store.fetch_files("/").await.unwrap();
        let rx = pipeline.subscribe();

        let (result, seen) = tokio::join!(
            pipeline.upload(
                &store,
                vec![
                    UploadCandidate::new("a.txt", b"a".to_vec()),
                    UploadCandidate::new("b.txt", b"b".to_vec()),
                ],
                &NoProgress,
            ),
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                *rx.borrow()
            }
        );

        result.unwrap();
        let batch = seen.unwrap();
        assert_eq!(batch.total, 2);
        assert_eq!(batch.current, 2);
        assert!(rx.borrow().is_none());
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.txt");
        std::fs::write(&path, b"remember").unwrap();

        let candidate = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.name, "notes.txt");
        assert_eq!(candidate.size, 8);
        assert_eq!(&candidate.data[..], b"remember");
    }
}
