//! Batch orchestration.
//!
//! Runs every batch line through parse → fetch → select → resolve →
//! transfer. A failing item never stops the batch: it is recorded with the
//! stage it failed in and the next item proceeds.
//!
//! # Concurrency
//!
//! Items run on a bounded, ordered pool (`buffered(workers)`), so results
//! come back in input order whatever the worker count. Items resolving to
//! the same destination are serialized by [`PathLocks`].
//!
//! # Cancellation
//!
//! Items that have not started when the token fires finish as
//! `PipelineError::Cancelled`. Transfers in flight stop at the next chunk
//! boundary and keep their partial file.

mod locks;
mod retry;

use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use civitdl_core::{
    BatchLine, BatchSummary, CatalogPort, DownloadedArtifact, PerItemResult, PipelineError,
    PlacementResolver, Stage, TransferError, TransferEventSink, select_version,
};

use crate::config::OrchestratorConfig;
use crate::engine::{TransferEngine, TransferRequest};

pub use locks::PathLocks;
pub use retry::{RetryPolicy, Retryable};

/// Drives batches through the download pipeline.
pub struct Orchestrator {
    catalog: Arc<dyn CatalogPort>,
    engine: TransferEngine,
    sink: Arc<dyn TransferEventSink>,
    resolver: PlacementResolver,
    retry: RetryPolicy,
    config: OrchestratorConfig,
}

/// Per-run inputs shared by every item.
struct RunContext<'a> {
    base_dir: &'a Path,
    credential: Option<&'a str>,
    cancel: &'a CancellationToken,
    locks: &'a PathLocks,
}

impl Orchestrator {
    /// Compose an orchestrator from its collaborators.
    pub fn new(
        catalog: Arc<dyn CatalogPort>,
        engine: TransferEngine,
        sink: Arc<dyn TransferEventSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            catalog,
            engine,
            sink,
            resolver: PlacementResolver::new(config.placement),
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay,
            },
            config,
        }
    }

    /// The active configuration.
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Process a batch. Returns exactly one result per input line, in input
    /// order.
    pub async fn run(
        &self,
        lines: &[String],
        base_dir: &Path,
        credential: Option<&str>,
        cancel: &CancellationToken,
    ) -> Vec<PerItemResult> {
        let locks = PathLocks::new();
        let ctx = RunContext {
            base_dir,
            credential,
            cancel,
            locks: &locks,
        };
        let workers = self.config.workers.max(1);

        tracing::info!(
            items = lines.len(),
            workers,
            base_dir = %base_dir.display(),
            authenticated = credential.is_some(),
            "Starting batch"
        );

        let results: Vec<PerItemResult> = stream::iter(lines)
            .map(|line| self.run_item(line, &ctx))
            .buffered(workers)
            .collect()
            .await;

        let summary = BatchSummary::from_results(&results);
        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            cancelled = summary.cancelled,
            destinations = locks.path_count(),
            "Batch finished"
        );
        results
    }

    async fn run_item(&self, line: &str, ctx: &RunContext<'_>) -> PerItemResult {
        let raw = line.trim();
        if ctx.cancel.is_cancelled() {
            tracing::debug!(line = raw, "Skipping item, batch cancelled");
            return PerItemResult::failure(raw, PipelineError::Cancelled);
        }

        let parsed = match BatchLine::parse(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(line = raw, stage = %Stage::Parse, error = %e, "Item failed");
                return PerItemResult::failure(raw, e);
            }
        };

        let identifier = parsed.identifier.to_string();
        let span = tracing::info_span!("item", %identifier);
        let result = self
            .process(&parsed, &identifier, ctx)
            .instrument(span)
            .await;

        match result {
            Ok(artifact) => {
                tracing::info!(
                    %identifier,
                    path = %artifact.path.display(),
                    bytes_written = artifact.bytes_written,
                    final_size = artifact.final_size,
                    "Item complete"
                );
                PerItemResult::success(identifier, artifact)
            }
            Err(e) => {
                tracing::error!(%identifier, stage = %e.stage(), error = %e, "Item failed");
                PerItemResult::failure(identifier, e)
            }
        }
    }

    async fn process(
        &self,
        line: &BatchLine,
        identifier: &str,
        ctx: &RunContext<'_>,
    ) -> Result<DownloadedArtifact, PipelineError> {
        let id = &line.identifier;
        let catalog = self.catalog.as_ref();
        let catalog_id = id.catalog_id();
        let credential = ctx.credential;

        let entry = self
            .retry
            .run(Stage::Fetch, ctx.cancel, |_, _| {
                catalog.fetch(catalog_id, credential)
            })
            .await?;
        tracing::debug!(
            name = %entry.name,
            category = %entry.category,
            versions = entry.versions.len(),
            "Fetched catalog entry"
        );

        let selected = select_version(&entry, id.version_id())?;
        let base_model = line
            .base_model_override
            .as_deref()
            .unwrap_or(&selected.version.base_model);
        tracing::debug!(
            version = %selected.version.name,
            base_model,
            file = %selected.file.name,
            size_kb = ?selected.file.size_kb,
            "Selected version"
        );

        let destination = self.resolver.resolve(
            ctx.base_dir,
            &entry.category,
            base_model,
            &selected.file.name,
        )?;
        let path = destination.path();

        let _guard = ctx.locks.lock(&path).await;
        if ctx.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let base_request = TransferRequest {
            id: identifier.to_string(),
            source_url: selected.version.download_url.clone(),
            dest: path.clone(),
            credential: credential.map(str::to_string),
            resume: self.config.resume,
        };
        tracing::debug!(url = %base_request.source_url, dest = %path.display(), "Transferring");

        let engine = &self.engine;
        let sink = self.sink.as_ref();
        let cancel = ctx.cancel;

        // Once an attempt has written a partial file, later attempts continue it
        let mut force_resume = false;
        let outcome = self
            .retry
            .run(
                Stage::Transfer,
                ctx.cancel,
                |_, last: Option<&TransferError>| {
                    force_resume |= matches!(last, Some(TransferError::Interrupted { .. }));
                    let request = TransferRequest {
                        resume: base_request.resume || force_resume,
                        ..base_request.clone()
                    };
                    async move { engine.transfer(&request, sink, cancel).await }
                },
            )
            .await?;

        Ok(DownloadedArtifact {
            catalog_id: entry.id,
            version_id: selected.version.id,
            model_name: entry.name.clone(),
            path,
            bytes_written: outcome.bytes_written,
            final_size: outcome.final_size,
            resumed_from: outcome.resumed_from,
        })
    }
}
