//! Outward notifications.
//!
//! The notifier is a one-way, bounded broadcast channel towards the consuming
//! application. Delivery is at most once with no acknowledgement or replay:
//!
//! - a notification sent while nobody is subscribed is dropped;
//! - a subscriber that falls more than `capacity` notifications behind loses
//!   the oldest ones and sees `RecvError::Lagged` on its next receive.

use std::sync::atomic::{AtomicU64, Ordering};

use handscan_core::constants::{EVENT_APPEARED, EVENT_DISAPPEARED, EVENT_RFID_READ};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Notification delivered to the consuming application.
///
/// Serializes as `{"event": "<name>", "payload": ...}`:
///
/// ```
/// use handscan_session::Notification;
///
/// let read = Notification::RfidRead(vec!["E2001".into(), "E2002".into()]);
/// assert_eq!(
///     read.to_json().unwrap(),
///     r#"{"event":"onRfidRead","payload":["E2001","E2002"]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum Notification {
    /// A reader became visible; payload is its name.
    #[serde(rename = "onAppeared")]
    Appeared(String),

    /// A reader went out of range; payload is its name.
    #[serde(rename = "onDisappeared")]
    Disappeared(String),

    /// Tag identifiers of one read batch, in read order.
    #[serde(rename = "onRfidRead")]
    RfidRead(Vec<String>),
}

impl Notification {
    /// Event name as seen by the consumer.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Appeared(_) => EVENT_APPEARED,
            Self::Disappeared(_) => EVENT_DISAPPEARED,
            Self::RfidRead(_) => EVENT_RFID_READ,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Fire-and-forget sender of [`Notification`]s.
#[derive(Debug)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    emitted: AtomicU64,
    dropped: AtomicU64,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            emitted: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Send a notification to every current subscriber.
    ///
    /// Returns `false` if nobody was listening and the notification was
    /// dropped.
    pub fn emit(&self, notification: Notification) -> bool {
        let event = notification.event_name();
        match self.sender.send(notification) {
            Ok(receivers) => {
                self.emitted.fetch_add(1, Ordering::Relaxed);
                trace!(event, receivers, "Notification emitted");
                true
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(event, "No listener, notification dropped");
                false
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Notifications delivered to at least one subscriber.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    /// Notifications dropped for lack of a subscriber.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
