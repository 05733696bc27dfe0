//! Integration tests for the resumable `TransferEngine`.
//!
//! Every test serves an artifact from an in-memory `FakeSource` and checks
//! both the returned outcome and the bytes left on disk.

mod common;

use std::sync::Arc;
use std::time::Duration;

use civitdl_core::{RecordingSink, TransferError, TransferEvent};
use civitdl_download::{
    CancellationToken, TransferConfig, TransferEngine, TransferOutcome, TransferRequest,
};
use common::{CancelOnProgress, FakeArtifact, FakeSource, RangeMode, artifact_bytes};

const URL: &str = "https://files.test/download/1";
const LEN: usize = 100;

struct Harness {
    source: Arc<FakeSource>,
    engine: TransferEngine,
    dir: tempfile::TempDir,
}

impl Harness {
    fn new(artifact: FakeArtifact) -> Self {
        let source = Arc::new(FakeSource::new().with_artifact(URL, artifact));
        let config = TransferConfig::new().with_progress_interval(Duration::ZERO);
        let engine = TransferEngine::new(source.clone(), &config);
        Self {
            source,
            engine,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn request(&self, resume: bool) -> TransferRequest {
        TransferRequest {
            id: "1@1".to_string(),
            source_url: URL.to_string(),
            dest: self.dir.path().join("model.safetensors"),
            credential: None,
            resume,
        }
    }

    fn write_partial(&self, bytes: &[u8]) {
        std::fs::write(self.dir.path().join("model.safetensors"), bytes).unwrap();
    }

    fn on_disk(&self) -> Vec<u8> {
        std::fs::read(self.dir.path().join("model.safetensors")).unwrap()
    }

    async fn transfer(
        &self,
        request: &TransferRequest,
        sink: &RecordingSink,
    ) -> Result<TransferOutcome, TransferError> {
        self.engine
            .transfer(request, sink, &CancellationToken::new())
            .await
    }
}

#[tokio::test]
async fn test_fresh_transfer_writes_everything() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();

    assert_eq!(
        outcome,
        TransferOutcome {
            bytes_written: LEN as u64,
            final_size: LEN as u64,
            resumed_from: 0,
            restarted: false,
        }
    );
    assert_eq!(harness.on_disk(), data);
    assert_eq!(harness.source.requests()[0].range_start, None);

    let events = sink.events();
    assert!(matches!(
        events.first(),
        Some(TransferEvent::Started { resume_from: 0, .. })
    ));
    assert!(matches!(
        events.last(),
        Some(TransferEvent::Completed {
            bytes_written: 100,
            final_size: 100,
            ..
        })
    ));
    // The last progress event reports the full size
    let last_progress = events
        .iter()
        .rev()
        .find(|e| matches!(e, TransferEvent::Progress { .. }))
        .unwrap();
    assert_eq!(
        last_progress,
        &TransferEvent::Progress {
            id: "1@1".to_string(),
            bytes_transferred: 100,
            bytes_total: Some(100),
        }
    );
}

#[tokio::test]
async fn test_resume_appends_missing_bytes() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    harness.write_partial(&data[..40]);
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();

    assert_eq!(outcome.resumed_from, 40);
    assert_eq!(outcome.bytes_written, 60);
    assert_eq!(outcome.final_size, 100);
    assert!(!outcome.restarted);
    assert_eq!(harness.on_disk(), data);
    assert_eq!(harness.source.requests()[0].range_start, Some(40));
    assert!(matches!(
        sink.events().first(),
        Some(TransferEvent::Started { resume_from: 40, .. })
    ));
}

#[tokio::test]
async fn test_ignored_range_restarts_from_zero() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()).range_mode(RangeMode::Ignore));
    harness.write_partial(&data[..40]);
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();

    assert!(outcome.restarted);
    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(outcome.final_size, 100);
    // Never a full body appended to the partial
    assert_eq!(harness.on_disk(), data);
    assert!(
        sink.events()
            .iter()
            .any(|e| matches!(e, TransferEvent::Restarted { .. }))
    );
}

#[tokio::test]
async fn test_wrong_range_offset_rejected() {
    let data = artifact_bytes(LEN);
    let harness =
        Harness::new(FakeArtifact::new(data.clone()).range_mode(RangeMode::WrongOffset(10)));
    harness.write_partial(&data[..40]);
    let sink = RecordingSink::new();

    let err = harness
        .transfer(&harness.request(true), &sink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransferError::RangeNotHonored {
            requested: 40,
            received: 10,
        }
    );
    assert_eq!(harness.on_disk(), &data[..40]);
    assert!(matches!(
        sink.events().last(),
        Some(TransferEvent::Failed { .. })
    ));
}

#[tokio::test]
async fn test_complete_file_needs_no_bytes() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    harness.write_partial(&data);
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();

    assert_eq!(outcome.bytes_written, 0);
    assert_eq!(outcome.final_size, 100);
    assert_eq!(harness.on_disk(), data);
    assert_eq!(harness.source.requests().len(), 1);
}

#[tokio::test]
async fn test_oversized_partial_is_replaced() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    harness.write_partial(&artifact_bytes(150));
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();

    assert!(outcome.restarted);
    assert_eq!(outcome.final_size, 100);
    assert_eq!(harness.on_disk(), data);

    let ranges: Vec<_> = harness
        .source
        .requests()
        .into_iter()
        .map(|r| r.range_start)
        .collect();
    assert_eq!(ranges, vec![Some(150), None]);
}

#[tokio::test]
async fn test_interruption_keeps_partial() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()).interrupt_after(40, 1));
    let sink = RecordingSink::new();

    let err = harness
        .transfer(&harness.request(true), &sink)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::Interrupted {
            bytes_on_disk: 40,
            ..
        }
    ));
    assert_eq!(harness.on_disk(), &data[..40]);

    // A second attempt picks up where the first stopped
    let outcome = harness.transfer(&harness.request(true), &sink).await.unwrap();
    assert_eq!(outcome.resumed_from, 40);
    assert_eq!(outcome.bytes_written, 60);
    assert_eq!(harness.on_disk(), data);
}

#[tokio::test]
async fn test_cancellation_stops_at_chunk_boundary() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    let token = CancellationToken::new();
    let sink = CancelOnProgress::new(token.clone());

    let err = harness
        .engine
        .transfer(&harness.request(true), &sink, &token)
        .await
        .unwrap_err();

    // The first chunk (16 bytes) is written before cancellation is observed
    assert_eq!(err, TransferError::Cancelled { bytes_on_disk: 16 });
    assert_eq!(harness.on_disk(), &data[..16]);

    let events = sink.events.lock().unwrap();
    assert!(matches!(events.last(), Some(TransferEvent::Failed { .. })));
}

#[tokio::test]
async fn test_size_mismatch_detected() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data).advertise_len(120));
    let sink = RecordingSink::new();

    let err = harness
        .transfer(&harness.request(true), &sink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TransferError::SizeMismatch {
            expected: 120,
            actual: 100,
        }
    );
}

#[tokio::test]
async fn test_error_status() {
    let harness = Harness::new(FakeArtifact::new(Vec::new()).status(403));
    let sink = RecordingSink::new();

    let err = harness
        .transfer(&harness.request(true), &sink)
        .await
        .unwrap_err();

    assert_eq!(err, TransferError::HttpStatus { status: 403 });
    assert!(matches!(
        sink.events().last(),
        Some(TransferEvent::Failed { .. })
    ));
}

#[tokio::test]
async fn test_bodiless_success_status_keeps_partial() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()).status(204));
    harness.write_partial(&data[..40]);
    let sink = RecordingSink::new();

    let err = harness
        .transfer(&harness.request(true), &sink)
        .await
        .unwrap_err();

    assert_eq!(err, TransferError::HttpStatus { status: 204 });
    assert_eq!(harness.on_disk(), &data[..40]);
    assert!(
        !sink
            .events()
            .iter()
            .any(|e| matches!(e, TransferEvent::Restarted { .. }))
    );
}

#[tokio::test]
async fn test_stalled_body_is_interrupted() {
    let data = artifact_bytes(LEN);
    let source = Arc::new(
        FakeSource::new().with_artifact(URL, FakeArtifact::new(data.clone()).stall_after(32)),
    );
    let config = TransferConfig::new()
        .with_progress_interval(Duration::ZERO)
        .with_stall_timeout(Duration::from_millis(50));
    let engine = TransferEngine::new(source, &config);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("model.safetensors");
    let request = TransferRequest {
        id: "1@1".to_string(),
        source_url: URL.to_string(),
        dest: dest.clone(),
        credential: None,
        resume: true,
    };

    let err = engine
        .transfer(&request, &RecordingSink::new(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TransferError::Interrupted {
            bytes_on_disk: 32,
            ..
        }
    ));
    assert!(err.is_retryable());
    assert_eq!(std::fs::read(&dest).unwrap(), &data[..32]);
}

#[tokio::test]
async fn test_resume_disabled_truncates() {
    let data = artifact_bytes(LEN);
    let harness = Harness::new(FakeArtifact::new(data.clone()));
    harness.write_partial(&artifact_bytes(40));
    let sink = RecordingSink::new();

    let outcome = harness.transfer(&harness.request(false), &sink).await.unwrap();

    assert_eq!(outcome.resumed_from, 0);
    assert_eq!(outcome.bytes_written, 100);
    assert!(!outcome.restarted);
    assert_eq!(harness.on_disk(), data);
    assert_eq!(harness.source.requests()[0].range_start, None);
}

#[tokio::test]
async fn test_credential_forwarded() {
    let harness = Harness::new(FakeArtifact::new(artifact_bytes(LEN)));
    let sink = RecordingSink::new();
    let mut request = harness.request(true);
    request.credential = Some("secret".to_string());

    harness.transfer(&request, &sink).await.unwrap();

    assert_eq!(
        harness.source.requests()[0].credential.as_deref(),
        Some("secret")
    );
}
