//! Resumable transfer engine.
//!
//! Streams one artifact to its destination. A partial file left behind by an
//! earlier attempt is continued with a `Range` request when the server
//! honors it, and started over when it does not. The partial file is never
//! deleted on failure so a later attempt can pick it up.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use civitdl_core::{TransferError, TransferEvent, TransferEventSink};

use crate::config::TransferConfig;
use crate::progress::ProgressThrottle;
use crate::source::{HttpSource, SourceResponse};

const STATUS_OK: u16 = 200;
const STATUS_PARTIAL_CONTENT: u16 = 206;
const STATUS_RANGE_NOT_SATISFIABLE: u16 = 416;

/// One artifact to transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Identifier attached to every event of this transfer.
    pub id: String,
    /// Artifact URL.
    pub source_url: String,
    /// Destination file. Its parent directory must exist.
    pub dest: PathBuf,
    /// Bearer credential, if any.
    pub credential: Option<String>,
    /// Continue an existing partial file at `dest`.
    pub resume: bool,
}

/// What a finished transfer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    /// Bytes written by this transfer.
    pub bytes_written: u64,
    /// Size of the file on disk, verified against the expected size.
    pub final_size: u64,
    /// Offset the transfer continued from (0 when it started fresh).
    pub resumed_from: u64,
    /// Whether an existing partial file had to be discarded.
    pub restarted: bool,
}

/// Lifecycle of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Nothing requested yet.
    Pending,
    /// Body is being streamed.
    InProgress,
    /// File complete and verified.
    Completed,
    /// Stopped early.
    Failed,
}

/// Byte accounting for a transfer in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferState {
    /// Expected final size, when the server announced it.
    pub bytes_expected: Option<u64>,
    /// Bytes of the file on disk, including a resumed prefix.
    pub bytes_transferred: u64,
    /// Current status.
    pub status: TransferStatus,
}

impl TransferState {
    /// State before the first chunk, starting at `offset`.
    pub const fn new(offset: u64, bytes_expected: Option<u64>) -> Self {
        Self {
            bytes_expected,
            bytes_transferred: offset,
            status: TransferStatus::Pending,
        }
    }

    /// Account for a written chunk.
    pub const fn advance(&mut self, len: u64) {
        self.bytes_transferred += len;
        self.status = TransferStatus::InProgress;
    }

    fn progress_event(&self, id: &str) -> TransferEvent {
        TransferEvent::Progress {
            id: id.to_string(),
            bytes_transferred: self.bytes_transferred,
            bytes_total: self.bytes_expected,
        }
    }
}

/// Streams artifacts from an [`HttpSource`] to disk.
#[derive(Clone)]
pub struct TransferEngine {
    source: Arc<dyn HttpSource>,
    progress_interval: Duration,
    stall_timeout: Duration,
}

impl TransferEngine {
    /// Create an engine over the given source.
    pub fn new(source: Arc<dyn HttpSource>, config: &TransferConfig) -> Self {
        Self {
            source,
            progress_interval: config.progress_interval,
            stall_timeout: config.stall_timeout,
        }
    }

    /// Transfer one artifact.
    ///
    /// Emits `Started`, throttled `Progress`, optionally `Restarted`, and
    /// exactly one of `Completed` or `Failed`. Cancellation is observed
    /// between chunks; the chunk in hand is written first.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        sink: &dyn TransferEventSink,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        let result = match partial_len(request).await {
            Ok(resume_from) => {
                sink.emit(TransferEvent::Started {
                    id: request.id.clone(),
                    file_name: file_name_of(&request.dest),
                    resume_from,
                });
                self.run(request, resume_from, sink, cancel).await
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => sink.emit(TransferEvent::Completed {
                id: request.id.clone(),
                bytes_written: outcome.bytes_written,
                final_size: outcome.final_size,
            }),
            Err(e) => sink.emit(TransferEvent::Failed {
                id: request.id.clone(),
                error: e.to_string(),
            }),
        }
        result
    }

    async fn run(
        &self,
        request: &TransferRequest,
        resume_from: u64,
        sink: &dyn TransferEventSink,
        cancel: &CancellationToken,
    ) -> Result<TransferOutcome, TransferError> {
        let url = request.source_url.as_str();
        let credential = request.credential.as_deref();
        let mut offset = resume_from;
        let mut restarted = false;

        if offset > 0 {
            tracing::debug!(id = %request.id, offset, "Requesting range");
        }
        let mut response = self
            .source
            .get(url, credential, (offset > 0).then_some(offset))
            .await?;

        if response.status == STATUS_RANGE_NOT_SATISFIABLE && offset > 0 {
            let total = response.content_range().and_then(|r| r.total);
            if total == Some(offset) {
                tracing::info!(id = %request.id, size = offset, "File already complete");
                sink.emit(TransferEvent::Progress {
                    id: request.id.clone(),
                    bytes_transferred: offset,
                    bytes_total: Some(offset),
                });
                return Ok(TransferOutcome {
                    bytes_written: 0,
                    final_size: offset,
                    resumed_from: offset,
                    restarted: false,
                });
            }

            announce_restart(
                request,
                sink,
                format!("server rejected range from byte {offset} (remote size {total:?})"),
            );
            offset = 0;
            restarted = true;
            response = self.source.get(url, credential, None).await?;
        }

        let (file, bytes_expected) = match response.status {
            STATUS_PARTIAL_CONTENT if offset > 0 => {
                let range = response.content_range();
                let received = range.and_then(|r| r.start());
                if received != Some(offset) {
                    return Err(TransferError::RangeNotHonored {
                        requested: offset,
                        received: received.unwrap_or(0),
                    });
                }
                let expected = range
                    .and_then(|r| r.total)
                    .or_else(|| response.content_length.map(|len| offset + len));
                (open_append(&request.dest).await?, expected)
            }
            // Other 2xx codes carry no artifact body
            STATUS_OK | STATUS_PARTIAL_CONTENT => {
                if offset > 0 {
                    announce_restart(
                        request,
                        sink,
                        format!("server ignored range from byte {offset}"),
                    );
                    offset = 0;
                    restarted = true;
                }
                let expected = response
                    .content_range()
                    .and_then(|r| r.total)
                    .or(response.content_length);
                (create_truncate(&request.dest).await?, expected)
            }
            status => return Err(TransferError::HttpStatus { status }),
        };

        let mut state = TransferState::new(offset, bytes_expected);
        let streamed = self
            .stream_body(request, response, file, &mut state, sink, cancel)
            .await;
        if let Err(e) = streamed {
            state.status = TransferStatus::Failed;
            tracing::debug!(id = %request.id, ?state, "Transfer stopped");
            return Err(e);
        }

        sink.emit(state.progress_event(&request.id));

        let final_size = tokio::fs::metadata(&request.dest)
            .await
            .map_err(|e| TransferError::from_io_error(&e))?
            .len();
        if let Some(expected) = bytes_expected {
            if final_size != expected {
                return Err(TransferError::SizeMismatch {
                    expected,
                    actual: final_size,
                });
            }
        }

        state.status = TransferStatus::Completed;
        tracing::debug!(id = %request.id, ?state, "Transfer finished");
        Ok(TransferOutcome {
            bytes_written: state.bytes_transferred - offset,
            final_size,
            resumed_from: offset,
            restarted,
        })
    }

    async fn stream_body(
        &self,
        request: &TransferRequest,
        response: SourceResponse,
        mut file: File,
        state: &mut TransferState,
        sink: &dyn TransferEventSink,
        cancel: &CancellationToken,
    ) -> Result<(), TransferError> {
        let mut body = response.body;
        let mut throttle = ProgressThrottle::new(self.progress_interval);

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    flush(&mut file).await?;
                    tracing::info!(id = %request.id, bytes_on_disk = state.bytes_transferred, "Transfer cancelled");
                    return Err(TransferError::Cancelled {
                        bytes_on_disk: state.bytes_transferred,
                    });
                }
                next = tokio::time::timeout(self.stall_timeout, body.next()) => next,
            };
            let Ok(next) = next else {
                flush(&mut file).await?;
                tracing::warn!(
                    id = %request.id,
                    bytes_on_disk = state.bytes_transferred,
                    timeout = ?self.stall_timeout,
                    "Transfer stalled"
                );
                return Err(TransferError::Interrupted {
                    bytes_on_disk: state.bytes_transferred,
                    message: format!("no data received for {:?}", self.stall_timeout),
                });
            };

            match next {
                Some(Ok(chunk)) => {
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| TransferError::from_io_error(&e))?;
                    state.advance(chunk.len() as u64);
                    if throttle.should_emit() {
                        sink.emit(state.progress_event(&request.id));
                    }
                }
                Some(Err(e)) => {
                    flush(&mut file).await?;
                    tracing::warn!(
                        id = %request.id,
                        bytes_on_disk = state.bytes_transferred,
                        error = %e,
                        "Transfer interrupted"
                    );
                    return Err(TransferError::Interrupted {
                        bytes_on_disk: state.bytes_transferred,
                        message: e.to_string(),
                    });
                }
                None => break,
            }
        }

        flush(&mut file).await
    }
}

fn announce_restart(request: &TransferRequest, sink: &dyn TransferEventSink, reason: String) {
    tracing::warn!(id = %request.id, %reason, "Discarding partial file");
    sink.emit(TransferEvent::Restarted {
        id: request.id.clone(),
        reason,
    });
}

/// Length of the partial file to resume from, or 0.
async fn partial_len(request: &TransferRequest) -> Result<u64, TransferError> {
    if !request.resume {
        return Ok(0);
    }
    match tokio::fs::metadata(&request.dest).await {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(TransferError::Io {
            message: format!("{} exists and is not a file", request.dest.display()),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
        Err(e) => Err(TransferError::from_io_error(&e)),
    }
}

async fn open_append(path: &Path) -> Result<File, TransferError> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .await
        .map_err(|e| TransferError::from_io_error(&e))
}

async fn create_truncate(path: &Path) -> Result<File, TransferError> {
    File::create(path)
        .await
        .map_err(|e| TransferError::from_io_error(&e))
}

async fn flush(file: &mut File) -> Result<(), TransferError> {
    file.flush()
        .await
        .map_err(|e| TransferError::from_io_error(&e))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
