//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the ingestion loop,
//! the issue workflow service and the machine status sync task.

use chrono::{DateTime, Utc};
use machwatch_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// Something that happened to a machine's issues.
///
/// Constructed via [`MonitorEvent::new`] and enriched with
/// [`with_issue`](MonitorEvent::with_issue),
/// [`with_report`](MonitorEvent::with_report) and
/// [`with_payload`](MonitorEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorEvent {
    /// Dot-separated event name, see `machwatch_core::event_names`.
    pub event_type: String,

    pub machine_id: DbId,

    pub issue_id: Option<DbId>,

    /// The report that caused the event, when there is one.
    pub report_id: Option<DbId>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl MonitorEvent {
    pub fn new(event_type: impl Into<String>, machine_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            machine_id,
            issue_id: None,
            report_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_issue(mut self, issue_id: DbId) -> Self {
        self.issue_id = Some(issue_id);
        self
    }

    pub fn with_report(mut self, report_id: DbId) -> Self {
        self.report_id = Some(report_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use machwatch_events::bus::{EventBus, MonitorEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MonitorEvent::new("issue.created", 1).with_issue(10));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest messages are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped silently if there are none.
    pub fn publish(&self, event: MonitorEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
