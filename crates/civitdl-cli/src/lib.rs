#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use anyhow as _;
use dotenvy as _;
use tokio as _;

pub mod bootstrap;
pub mod error;
pub mod parser;
pub mod progress;
pub mod report;

// Re-export primary types for convenient access
pub use bootstrap::{bootstrap, collect_inputs, init_tracing, orchestrator_config};
pub use error::CliError;
pub use parser::Cli;
pub use progress::ProgressSink;
pub use report::print_report;
