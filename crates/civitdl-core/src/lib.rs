#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod batch;
pub mod catalog;
pub mod errors;
pub mod events;
pub mod identifier;
pub mod outcome;
pub mod placement;
pub mod ports;
pub mod selection;

// Re-export commonly used types for convenience
pub use batch::{BatchLine, collect_batch_lines, read_batch_lines};
pub use catalog::{CatalogEntry, Category, FileRef, VersionRecord};
pub use errors::{
    FetchError, ParseError, PipelineError, PlacementError, SelectionError, Stage, TransferError,
};
pub use events::TransferEvent;
pub use identifier::CompoundIdentifier;
pub use outcome::{BatchSummary, DownloadedArtifact, ItemOutcome, PerItemResult};
pub use placement::{DestinationPath, PlacementConfig, PlacementResolver, ensure_dir_chain};
pub use ports::{CatalogPort, NoopTransferSink, RecordingSink, TransferEventSink};
pub use selection::{SelectedVersion, select_version};

// Silence unused dev-dependency warnings for crates only used by some tests
#[cfg(test)]
use tokio as _;
