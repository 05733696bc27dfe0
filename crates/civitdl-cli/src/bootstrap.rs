//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Catalog client (via civitdl-catalog)
//! - HTTP byte source and transfer engine (via civitdl-download)
//! - Batch orchestrator (via civitdl-download)

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use civitdl_catalog::{CatalogClientConfig, DefaultCatalogClient};
use civitdl_core::{PlacementConfig, TransferEventSink, read_batch_lines};
use civitdl_download::{
    Orchestrator, OrchestratorConfig, ReqwestSource, TransferConfig, TransferEngine,
};

use crate::error::CliError;
use crate::parser::Cli;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
/// Logs go to stderr so they never interleave with the report on stdout.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A subscriber may already be installed (tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// The batch input: positional identifiers, or the lines of the batch file.
pub fn collect_inputs(cli: &Cli) -> Result<Vec<String>, CliError> {
    if !cli.identifiers.is_empty() {
        return Ok(cli.identifiers.clone());
    }
    read_batch_lines(&cli.file).map_err(|e| {
        CliError::Io(format!(
            "cannot read batch file {}: {e}",
            cli.file.display()
        ))
    })
}

/// Orchestrator settings derived from the command line.
pub fn orchestrator_config(cli: &Cli) -> OrchestratorConfig {
    OrchestratorConfig::new()
        .with_workers(usize::from(cli.jobs))
        .with_max_retries(cli.retries)
        .with_resume(!cli.no_resume)
        .with_placement(PlacementConfig {
            nest_by_base_model: !cli.flat,
        })
}

/// Compose the orchestrator with production adapters.
pub fn bootstrap(cli: &Cli, sink: Arc<dyn TransferEventSink>) -> Result<Orchestrator, CliError> {
    let catalog_config = CatalogClientConfig::new().with_base_url(cli.api_base.clone());
    let catalog = DefaultCatalogClient::new(&catalog_config)?;

    let transfer_config = TransferConfig::new();
    let source = ReqwestSource::new(&transfer_config)?;
    let engine = TransferEngine::new(Arc::new(source), &transfer_config);

    tracing::debug!(api_base = %cli.api_base, "Composed download pipeline");

    Ok(Orchestrator::new(
        Arc::new(catalog),
        engine,
        sink,
        orchestrator_config(cli),
    ))
}
