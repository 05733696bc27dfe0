//! Transfer event sink port.
//!
//! This port abstracts progress reporting, allowing the transfer engine to
//! emit events without knowing whether they end up in a terminal progress
//! bar, a log, or a test collector.

use std::sync::{Arc, Mutex, PoisonError};

use crate::events::TransferEvent;

/// Port for receiving transfer events.
pub trait TransferEventSink: Send + Sync {
    /// Deliver an event. Must not block.
    fn emit(&self, event: TransferEvent);
}

/// A sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransferSink;

impl NoopTransferSink {
    /// Create a new no-op sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl TransferEventSink for NoopTransferSink {
    fn emit(&self, _event: TransferEvent) {}
}

/// A sink that records every event, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TransferEvent>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far.
    pub fn events(&self) -> Vec<TransferEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events recorded for one item.
    pub fn events_for(&self, id: &str) -> Vec<TransferEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.id() == id)
            .collect()
    }
}

impl TransferEventSink for RecordingSink {
    fn emit(&self, event: TransferEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
