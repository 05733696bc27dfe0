//! Port definitions (trait abstractions) for external systems.
//!
//! Ports are implemented by the adapter crates (`civitdl-catalog` for the
//! catalog, the CLI for progress rendering) and injected at the composition
//! root.

pub mod catalog;
pub mod event_sink;

pub use catalog::CatalogPort;
pub use event_sink::{NoopTransferSink, RecordingSink, TransferEventSink};
