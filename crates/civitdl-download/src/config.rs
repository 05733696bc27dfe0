//! Configuration for the transfer engine and the orchestrator.

use std::time::Duration;

use civitdl_core::PlacementConfig;

use crate::progress::DEFAULT_PROGRESS_INTERVAL;

// ============================================================================
// Transfer
// ============================================================================

/// Configuration for artifact transfers.
///
/// # Example
///
/// ```
/// use civitdl_download::TransferConfig;
/// use std::time::Duration;
///
/// let config = TransferConfig::new()
///     .with_connect_timeout(Duration::from_secs(5))
///     .with_progress_interval(Duration::from_millis(250));
/// ```
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// User agent string for artifact requests.
    pub user_agent: String,
    /// Timeout for establishing a connection. The body itself has no
    /// overall timeout since artifacts can take hours.
    pub connect_timeout: Duration,
    /// Longest wait for the next body chunk before the transfer counts as
    /// interrupted. The partial file stays resumable.
    pub stall_timeout: Duration,
    /// Minimum spacing between progress events.
    pub progress_interval: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("civitdl/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Duration::from_secs(30),
            stall_timeout: Duration::from_secs(60),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl TransferConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the stall timeout.
    #[must_use]
    pub const fn with_stall_timeout(mut self, timeout: Duration) -> Self {
        self.stall_timeout = timeout;
        self
    }

    /// Set the progress event spacing.
    #[must_use]
    pub const fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Items processed concurrently. 1 processes the batch strictly in order.
    pub workers: usize,
    /// Retries after the first attempt, for retryable fetch and transfer
    /// errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_base_delay: Duration,
    /// Resume from existing partial files.
    pub resume: bool,
    /// Destination layout.
    pub placement: PlacementConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            resume: true,
            placement: PlacementConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count. Zero is treated as one.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 { 1 } else { workers };
        self
    }

    /// Set the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff delay.
    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Enable or disable resuming partial files.
    #[must_use]
    pub const fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Set the destination layout.
    #[must_use]
    pub const fn with_placement(mut self, placement: PlacementConfig) -> Self {
        self.placement = placement;
        self
    }
}
