//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Default batch file, read when no identifiers are given.
pub const DEFAULT_BATCH_FILE: &str = "download.txt";

/// Default download root.
pub const DEFAULT_MODELS_DIR: &str = "./models";

/// Download models from a Civitai-compatible catalog.
///
/// Identifiers are `<modelId>@<versionId>`. Without positional identifiers
/// the batch file is read, one entry per line; blank lines and `#` comments
/// are skipped.
#[derive(Debug, Parser)]
#[command(name = "civitdl")]
#[command(version, about)]
pub struct Cli {
    /// Identifiers to download (`<modelId>@<versionId>`)
    #[arg(value_name = "IDENTIFIER")]
    pub identifiers: Vec<String>,

    /// Batch file read when no identifiers are given
    #[arg(short = 'f', long = "file", default_value = DEFAULT_BATCH_FILE)]
    pub file: PathBuf,

    /// Download root; files land in <dir>/<category>/<base model>/
    #[arg(short = 'o', long = "models-dir", default_value = DEFAULT_MODELS_DIR)]
    pub models_dir: PathBuf,

    /// API token sent as a bearer credential
    #[arg(long = "token", env = "CIVITAI_API_KEY", hide_env_values = true)]
    pub token: Option<String>,

    /// Catalog API root
    #[arg(long = "api-base", default_value = civitdl_catalog::DEFAULT_BASE_URL)]
    pub api_base: String,

    /// Number of items downloaded concurrently
    #[arg(short = 'j', long = "jobs", default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=64))]
    pub jobs: u16,

    /// Retries for transient network failures
    #[arg(long = "retries", default_value_t = 3)]
    pub retries: u32,

    /// Always start downloads from scratch instead of resuming partial files
    #[arg(long = "no-resume")]
    pub no_resume: bool,

    /// Do not nest files by base model
    #[arg(long = "flat")]
    pub flat: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Cli {
    /// The credential, if a non-empty one was supplied.
    pub fn credential(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}
