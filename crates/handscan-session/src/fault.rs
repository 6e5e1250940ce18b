//! Internal fault reporting.
//!
//! Faults raised on the event path (trigger-driven inventory commands, tag
//! fetches, event-class enabling) have no caller to reject. They are logged
//! and published here, on a channel separate from consumer notifications, so
//! operators can observe them without affecting the trigger-driven state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use handscan_core::DeviceId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, warn};

/// Operation that failed on the event path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultOperation {
    StartInventory,
    StopInventory,
    EnableEvents,
    FetchReadTags,
    Disconnect,
    EventStream,
}

impl fmt::Display for FaultOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StartInventory => "start_inventory",
            Self::StopInventory => "stop_inventory",
            Self::EnableEvents => "enable_events",
            Self::FetchReadTags => "fetch_read_tags",
            Self::Disconnect => "disconnect",
            Self::EventStream => "event_stream",
        };
        write!(f, "{}", name)
    }
}

/// A swallowed fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFault {
    pub operation: FaultOperation,
    pub device: Option<DeviceId>,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl SessionFault {
    pub fn new(
        operation: FaultOperation,
        device: Option<DeviceId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            device,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// Logs faults and publishes them to fault subscribers.
#[derive(Debug)]
pub struct FaultReporter {
    sender: broadcast::Sender<SessionFault>,
    reported: AtomicU64,
}

impl FaultReporter {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            reported: AtomicU64::new(0),
        }
    }

    /// Record a fault. Never fails, even with no subscriber.
    pub fn report(&self, fault: SessionFault) {
        let device = fault.device.as_ref().map(DeviceId::as_str).unwrap_or("-");
        match fault.operation {
            FaultOperation::EventStream => {
                error!(operation = %fault.operation, device, "{}", fault.message)
            }
            _ => warn!(operation = %fault.operation, device, "{}", fault.message),
        }

        self.reported.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.send(fault);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionFault> {
        self.sender.subscribe()
    }

    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}
