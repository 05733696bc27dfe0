//! HTTP side of the transfer engine.
//!
//! The engine only needs a status, two headers and a body stream. Keeping
//! that behind [`HttpSource`] lets the engine's resume logic be exercised
//! against an in-memory source.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use civitdl_core::TransferError;

use crate::config::TransferConfig;

/// Body of an artifact response, chunk by chunk.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Response to an artifact request, before the body is consumed.
pub struct SourceResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Length` of this response body.
    pub content_length: Option<u64>,
    /// Raw `Content-Range` header.
    pub content_range: Option<String>,
    /// The body.
    pub body: ByteStream,
}

impl SourceResponse {
    /// Parsed `Content-Range`, if present and well formed.
    pub fn content_range(&self) -> Option<ContentRange> {
        self.content_range.as_deref().and_then(ContentRange::parse)
    }
}

impl std::fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_range", &self.content_range)
            .finish_non_exhaustive()
    }
}

/// Something that can answer `GET` requests for artifacts.
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// Request `url`, optionally from byte `range_start` onwards.
    ///
    /// Only failures to obtain a response are errors; any status code is
    /// returned as a response.
    async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        range_start: Option<u64>,
    ) -> Result<SourceResponse, TransferError>;
}

// ============================================================================
// Content-Range
// ============================================================================

/// A parsed `Content-Range: bytes ...` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRange {
    /// First and last byte of the body, inclusive. `None` for `bytes */total`.
    pub range: Option<(u64, u64)>,
    /// Full size of the resource, when the server knows it.
    pub total: Option<u64>,
}

impl ContentRange {
    /// Parse `bytes <start>-<end>/<total|*>` or `bytes */<total>`.
    pub fn parse(header: &str) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes")?.trim_start();
        let (range, total) = spec.split_once('/')?;

        let total = match total.trim() {
            "*" => None,
            digits => Some(digits.parse().ok()?),
        };

        let range = match range.trim() {
            "*" => None,
            span => {
                let (start, end) = span.split_once('-')?;
                let start: u64 = start.trim().parse().ok()?;
                let end: u64 = end.trim().parse().ok()?;
                if end < start {
                    return None;
                }
                Some((start, end))
            }
        };

        if range.is_none() && total.is_none() {
            return None;
        }
        Some(Self { range, total })
    }

    /// First byte of the body.
    pub fn start(&self) -> Option<u64> {
        self.range.map(|(start, _)| start)
    }
}

// ============================================================================
// Reqwest source
// ============================================================================

/// Production source backed by `reqwest`.
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    /// Build the HTTP client.
    pub fn new(config: &TransferConfig) -> Result<Self, TransferError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| TransferError::network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSource for ReqwestSource {
    async fn get(
        &self,
        url: &str,
        credential: Option<&str>,
        range_start: Option<u64>,
    ) -> Result<SourceResponse, TransferError> {
        let mut request = self.client.get(url);
        if let Some(token) = credential {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(start) = range_start {
            request = request.header(reqwest::header::RANGE, format!("bytes={start}-"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransferError::network(e.to_string()))?;

        let content_range = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(SourceResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            content_range,
            body: response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)).boxed(),
        })
    }
}
