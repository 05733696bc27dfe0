//! Transfer events - discriminated union for all progress reporting.

use serde::{Deserialize, Serialize};

/// Events emitted while an item is transferred.
///
/// Every event carries the `id` of the item it belongs to so that concurrent
/// transfers can be told apart by an observer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// A transfer is starting.
    Started {
        /// Item identifier.
        id: String,
        /// Artifact file name.
        file_name: String,
        /// Offset the transfer resumes from (0 for a fresh download).
        resume_from: u64,
    },

    /// Bytes have been written.
    Progress {
        /// Item identifier.
        id: String,
        /// Bytes of the file on disk so far (including any resumed prefix).
        bytes_transferred: u64,
        /// Expected final size, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        bytes_total: Option<u64>,
    },

    /// The partial file was discarded and the transfer started over.
    Restarted {
        /// Item identifier.
        id: String,
        /// Why the restart happened.
        reason: String,
    },

    /// The file is complete and verified.
    Completed {
        /// Item identifier.
        id: String,
        /// Bytes written during this transfer.
        bytes_written: u64,
        /// Final file size.
        final_size: u64,
    },

    /// The transfer failed.
    Failed {
        /// Item identifier.
        id: String,
        /// Error description.
        error: String,
    },
}

impl TransferEvent {
    /// The identifier of the item this event belongs to.
    pub fn id(&self) -> &str {
        match self {
            Self::Started { id, .. }
            | Self::Progress { id, .. }
            | Self::Restarted { id, .. }
            | Self::Completed { id, .. }
            | Self::Failed { id, .. } => id,
        }
    }

    /// Whether this is the last event for its item.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id() {
        let event = TransferEvent::Progress {
            id: "1@2".to_string(),
            bytes_transferred: 10,
            bytes_total: None,
        };
        assert_eq!(event.id(), "1@2");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = TransferEvent::Completed {
            id: "1@2".to_string(),
            bytes_written: 5,
            final_size: 10,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"completed\""));
        assert!(event.is_terminal());
    }
}
