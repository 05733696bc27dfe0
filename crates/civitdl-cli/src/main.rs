//! CLI entry point - the composition root.
//!
//! Parses arguments, wires the pipeline via bootstrap, runs the batch and maps
//! the outcome to a process exit code.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use civitdl_cli::{
    Cli, CliError, ProgressSink, bootstrap, collect_inputs, init_tracing, print_report,
};
use civitdl_download::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Load environment variables before clap reads CIVITAI_API_KEY
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let lines = collect_inputs(&cli)?;
    if lines.is_empty() {
        return Err(CliError::Arguments(format!(
            "no identifiers given and {} has no entries",
            cli.file.display()
        ))
        .into());
    }

    let sink = Arc::new(ProgressSink::new());
    let orchestrator = bootstrap(&cli, sink.clone())?;

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling remaining downloads");
                cancel.cancel();
            }
        }
    });

    let results = orchestrator
        .run(&lines, &cli.models_dir, cli.credential(), &cancel)
        .await;
    ctrl_c.abort();
    sink.finish();

    let summary = print_report(&results);
    match CliError::from_summary(&summary) {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
