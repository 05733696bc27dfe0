//! In-memory catalog and artifact server shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use civitdl_core::{
    CatalogEntry, CatalogPort, Category, FetchError, FileRef, TransferError, TransferEvent,
    TransferEventSink, VersionRecord,
};
use civitdl_download::{CancellationToken, HttpSource, SourceResponse};

pub const ARTIFACT_HOST: &str = "https://files.test";

/// Deterministic artifact bytes.
pub fn artifact_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// ============================================================================
// Artifact source
// ============================================================================

/// How the fake server treats `Range` requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// 206 from the requested offset, 416 past the end.
    Honor,
    /// Always 200 with the full body.
    Ignore,
    /// 206 starting at a different offset.
    WrongOffset(u64),
}

/// One artifact served by [`FakeSource`].
#[derive(Debug, Clone)]
pub struct FakeArtifact {
    pub data: Vec<u8>,
    pub range_mode: RangeMode,
    pub chunk_size: usize,
    /// Break the body after this many bytes, for the first `interruptions`
    /// requests.
    pub interrupt_after: Option<usize>,
    pub interruptions: u32,
    /// Advertise a different `Content-Length` than the body has.
    pub advertised_len: Option<u64>,
    /// Answer every request with this status and an empty body.
    pub status: Option<u16>,
    /// Stop sending (without closing) after this many bytes.
    pub stall_after: Option<usize>,
}

impl FakeArtifact {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            range_mode: RangeMode::Honor,
            chunk_size: 16,
            interrupt_after: None,
            interruptions: 0,
            advertised_len: None,
            status: None,
            stall_after: None,
        }
    }

    pub fn range_mode(mut self, mode: RangeMode) -> Self {
        self.range_mode = mode;
        self
    }

    pub fn interrupt_after(mut self, bytes: usize, times: u32) -> Self {
        self.interrupt_after = Some(bytes);
        self.interruptions = times;
        self
    }

    pub fn advertise_len(mut self, len: u64) -> Self {
        self.advertised_len = Some(len);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn stall_after(mut self, bytes: usize) -> Self {
        self.stall_after = Some(bytes);
        self
    }
}

/// A request seen by [`FakeSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub url: String,
    pub credential: Option<String>,
    pub range_start: Option<u64>,
}

/// Serves artifacts from memory, keyed by full URL.
#[derive(Default)]
pub struct FakeSource {
    artifacts: Mutex<HashMap<String, FakeArtifact>>,
    requests: Mutex<Vec<SeenRequest>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(self, url: &str, artifact: FakeArtifact) -> Self {
        self.artifacts
            .lock()
            .unwrap()
            .insert(url.to_string(), artifact);
        self
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, url: &str) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url == url)
            .collect()
    }

    fn respond(artifact: &mut FakeArtifact, range_start: Option<u64>) -> SourceResponse {
        if let Some(status) = artifact.status {
            return response(status, None, None, Vec::new());
        }

        let total = artifact.data.len() as u64;
        let (status, start, content_range) = match (range_start, artifact.range_mode) {
            (None, _) | (Some(_), RangeMode::Ignore) => (200, 0, None),
            (Some(start), RangeMode::Honor) if start >= total => {
                return response(416, None, Some(format!("bytes */{total}")), Vec::new());
            }
            (Some(start), RangeMode::Honor) => (
                206,
                start,
                Some(format!("bytes {start}-{}/{total}", total - 1)),
            ),
            (Some(_), RangeMode::WrongOffset(offset)) => (
                206,
                offset,
                Some(format!("bytes {offset}-{}/{total}", total - 1)),
            ),
        };

        let body = artifact.data[start as usize..].to_vec();
        let content_length = artifact.advertised_len.unwrap_or(body.len() as u64);

        let mut chunks: Vec<io::Result<Bytes>> = Vec::new();
        let cut = match artifact.interrupt_after {
            Some(limit) if artifact.interruptions > 0 => {
                artifact.interruptions -= 1;
                Some(limit.min(body.len()))
            }
            _ => None,
        };
        let end = cut
            .or(artifact.stall_after)
            .map_or(body.len(), |limit| limit.min(body.len()));
        let served = &body[..end];
        for chunk in served.chunks(artifact.chunk_size) {
            chunks.push(Ok(Bytes::copy_from_slice(chunk)));
        }
        if cut.is_some() {
            chunks.push(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        let body = if artifact.stall_after.is_some() {
            stream::iter(chunks).chain(stream::pending()).boxed()
        } else {
            stream::iter(chunks).boxed()
        };

        SourceResponse {
            status,
            content_length: Some(content_length),
            content_range,
            body,
        }
    }
}

fn response(
    status: u16,
    content_length: Option<u64>,
    content_range: Option<String>,
    body: Vec<u8>,
) -> SourceResponse {
    SourceResponse {
        status,
        content_length,
        content_range,
        body: stream::iter(vec![Ok(Bytes::from(body))]).boxed(),
    }
}

#[async_trait]
impl HttpSource for FakeSource {
    async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        range_start: Option<u64>,
    ) -> Result<SourceResponse, TransferError> {
        self.requests.lock().unwrap().push(SeenRequest {
            url: url.to_string(),
            credential: credential.map(str::to_string),
            range_start,
        });

        let mut artifacts = self.artifacts.lock().unwrap();
        match artifacts.get_mut(url) {
            Some(artifact) => Ok(Self::respond(artifact, range_start)),
            None => Ok(response(404, Some(0), None, Vec::new())),
        }
    }
}

// ============================================================================
// Loopback HTTP server
// ============================================================================

/// Answer one HTTP request on a loopback port with `head` followed by `body`.
///
/// The handle resolves to the request head, lower-cased.
pub async fn serve_once(head: String, body: Vec<u8>) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(&body).await.unwrap();
        let _ = stream.shutdown().await;
        String::from_utf8_lossy(&request).to_lowercase()
    });
    (addr, handle)
}

// ============================================================================
// Catalog
// ============================================================================

/// Catalog answering from a fixed table.
#[derive(Default)]
pub struct StaticCatalog {
    entries: Mutex<HashMap<String, Result<CatalogEntry, FetchError>>>,
    transient_failures: AtomicU32,
    calls: AtomicU32,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, entry: CatalogEntry) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(entry.id.to_string(), Ok(entry));
        self
    }

    pub fn with_error(self, catalog_id: &str, error: FetchError) -> Self {
        self.entries
            .lock()
            .unwrap()
            .insert(catalog_id.to_string(), Err(error));
        self
    }

    /// Fail the next `count` fetches with a network error.
    pub fn with_transient_failures(self, count: u32) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogPort for StaticCatalog {
    async fn fetch(
        &self,
        catalog_id: &str,
        _credential: Option<&str>,
    ) -> Result<CatalogEntry, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(FetchError::network("connection reset"));
        }

        self.entries
            .lock()
            .unwrap()
            .get(catalog_id)
            .cloned()
            .unwrap_or_else(|| {
                Err(FetchError::ModelNotFound {
                    catalog_id: catalog_id.to_string(),
                })
            })
    }
}

/// A single-version entry whose artifact lives at `artifact_url(version_id)`.
pub fn entry(
    catalog_id: u64,
    category: &str,
    version_id: u64,
    base_model: &str,
    file_name: &str,
) -> CatalogEntry {
    CatalogEntry {
        id: catalog_id,
        name: format!("Model {catalog_id}"),
        category: Category::classify(category),
        versions: vec![VersionRecord {
            id: version_id,
            name: format!("v{version_id}"),
            base_model: base_model.to_string(),
            download_url: artifact_url(version_id),
            files: vec![FileRef::new(file_name)],
        }],
    }
}

pub fn artifact_url(version_id: u64) -> String {
    format!("{ARTIFACT_HOST}/download/{version_id}")
}

// ============================================================================
// Sinks
// ============================================================================

/// Cancels a token as soon as the first `Progress` event arrives.
pub struct CancelOnProgress {
    pub token: CancellationToken,
    pub events: Arc<Mutex<Vec<TransferEvent>>>,
}

impl CancelOnProgress {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            events: Arc::default(),
        }
    }
}

impl TransferEventSink for CancelOnProgress {
    fn emit(&self, event: TransferEvent) {
        if matches!(event, TransferEvent::Progress { .. }) {
            self.token.cancel();
        }
        self.events.lock().unwrap().push(event);
    }
}
