#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

mod config;
mod engine;
mod orchestrator;
mod progress;
mod source;

// ============================================================================
// Public API
// ============================================================================

// Configuration
pub use config::{OrchestratorConfig, TransferConfig};

// Transfer engine
pub use engine::{TransferEngine, TransferOutcome, TransferRequest, TransferState, TransferStatus};
pub use source::{ByteStream, ContentRange, HttpSource, ReqwestSource, SourceResponse};

// Progress throttle for adapters that render events
pub use progress::{DEFAULT_PROGRESS_INTERVAL, ProgressThrottle};

// Batch orchestration
pub use orchestrator::{Orchestrator, PathLocks, RetryPolicy, Retryable};

// Re-export core types for convenience
pub use civitdl_core::{PerItemResult, TransferError, TransferEvent, TransferEventSink};

// Cancellation token used by `TransferEngine::transfer` and `Orchestrator::run`
pub use tokio_util::sync::CancellationToken;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tempfile as _;
