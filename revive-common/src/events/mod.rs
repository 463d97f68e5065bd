//! Event types for the lead revival event system
//!
//! Provides shared event definitions and the EventBus used to push import
//! progress to connected UIs.

mod import_types;

pub use import_types::{ImportProgress, ParseSummary};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Application events
///
/// Broadcast via [`EventBus`] and serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RevivalEvent {
    /// An uploaded file was parsed into candidate records
    ///
    /// Triggers:
    /// - SSE: Show preview table with valid/invalid counts
    LeadsParsed {
        session_id: Uuid,
        /// Uploaded file name
        file_name: String,
        summary: ParseSummary,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User confirmed the preview and batches are about to be submitted
    ImportSessionStarted {
        session_id: Uuid,
        /// Valid records slated for import
        total: usize,
        /// Records per bulk insert
        batch_size: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Emitted after every batch, success or failure
    ///
    /// Triggers:
    /// - SSE: Update progress bar
    ImportProgressUpdate {
        session_id: Uuid,
        progress: ImportProgress,
        /// Progress percentage (0.0-100.0)
        percentage: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A whole batch was rejected by the storage backend
    ///
    /// Remaining batches still run; the records count toward `failed`.
    ImportBatchFailed {
        session_id: Uuid,
        /// 0-based batch position in submission order
        batch_index: usize,
        batch_size: usize,
        error_message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Import finished with at least one lead stored
    ///
    /// Triggers:
    /// - SSE: Show success message, then navigate to `redirect_to`
    ImportSessionCompleted {
        session_id: Uuid,
        progress: ImportProgress,
        redirect_to: String,
        redirect_after_ms: u64,
        duration_seconds: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Every batch failed; the preview is kept so the user can retry
    ImportSessionFailed {
        session_id: Uuid,
        error_message: String,
        progress: ImportProgress,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session returned to idle (cancel or reset)
    ImportSessionReset {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl RevivalEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            RevivalEvent::LeadsParsed { .. } => "LeadsParsed",
            RevivalEvent::ImportSessionStarted { .. } => "ImportSessionStarted",
            RevivalEvent::ImportProgressUpdate { .. } => "ImportProgressUpdate",
            RevivalEvent::ImportBatchFailed { .. } => "ImportBatchFailed",
            RevivalEvent::ImportSessionCompleted { .. } => "ImportSessionCompleted",
            RevivalEvent::ImportSessionFailed { .. } => "ImportSessionFailed",
            RevivalEvent::ImportSessionReset { .. } => "ImportSessionReset",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            RevivalEvent::LeadsParsed { session_id, .. }
            | RevivalEvent::ImportSessionStarted { session_id, .. }
            | RevivalEvent::ImportProgressUpdate { session_id, .. }
            | RevivalEvent::ImportBatchFailed { session_id, .. }
            | RevivalEvent::ImportSessionCompleted { session_id, .. }
            | RevivalEvent::ImportSessionFailed { session_id, .. }
            | RevivalEvent::ImportSessionReset { session_id, .. } => *session_id,
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use revive_common::events::{EventBus, RevivalEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(RevivalEvent::ImportSessionReset {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RevivalEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RevivalEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RevivalEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
