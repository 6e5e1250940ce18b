//! Types exchanged with reader drivers.
//!
//! This module defines the events a driver delivers on its callback path,
//! the event classes a session can enable, and the RF and tag records read
//! back from a reader.

use chrono::{DateTime, Utc};
use handscan_core::DeviceDescriptor;
use serde::{Deserialize, Serialize};

/// Handheld trigger transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// Trigger pulled.
    Pressed,

    /// Trigger let go.
    Released,
}

/// Event delivered by a driver on its callback path.
///
/// Events are driver-scoped: they are not tagged with the reader they came
/// from. A session routes trigger and tag-read events to its active reader.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DriverEvent {
    /// A reader became visible on the transport.
    Appeared(DeviceDescriptor),

    /// A reader is no longer visible on the transport.
    Disappeared(DeviceDescriptor),

    /// Handheld trigger status changed.
    Trigger(TriggerEvent),

    /// Tags are buffered on the reader and can be fetched.
    TagsAvailable,
}

impl DriverEvent {
    /// Event class this event belongs to.
    pub fn class(&self) -> EventClass {
        match self {
            Self::Appeared(_) | Self::Disappeared(_) => EventClass::Presence,
            Self::Trigger(_) => EventClass::Trigger,
            Self::TagsAvailable => EventClass::TagRead,
        }
    }
}

/// One class of driver events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventClass {
    Presence,
    Trigger,
    TagRead,
}

/// Set of event classes a driver should deliver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EventClasses {
    pub presence: bool,
    pub trigger: bool,
    pub tag_read: bool,
}

impl EventClasses {
    /// No event classes.
    pub const fn none() -> Self {
        Self {
            presence: false,
            trigger: false,
            tag_read: false,
        }
    }

    /// Presence, trigger and tag-read events.
    pub const fn all() -> Self {
        Self {
            presence: true,
            trigger: true,
            tag_read: true,
        }
    }

    /// Check whether `class` is enabled.
    pub fn contains(&self, class: EventClass) -> bool {
        match class {
            EventClass::Presence => self.presence,
            EventClass::Trigger => self.trigger,
            EventClass::TagRead => self.tag_read,
        }
    }

    /// Union of two sets.
    pub fn union(self, other: Self) -> Self {
        Self {
            presence: self.presence || other.presence,
            trigger: self.trigger || other.trigger,
            tag_read: self.tag_read || other.tag_read,
        }
    }
}

/// RF configuration of one antenna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntennaRfConfig {
    /// Index into the reader's transmit power table.
    pub transmit_power_index: u16,

    /// Index into the reader's receive sensitivity table.
    pub receive_sensitivity_index: u16,

    /// Tari (reference interval) in nanoseconds.
    pub tari: u32,
}

impl Default for AntennaRfConfig {
    fn default() -> Self {
        Self {
            transmit_power_index: handscan_core::constants::MAX_POWER,
            receive_sensitivity_index: 0,
            tari: 0,
        }
    }
}

/// A tag reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagData {
    /// Tag identifier (EPC, hex encoded).
    pub tag_id: String,

    /// Peak RSSI in dBm, if reported.
    pub rssi: Option<i16>,

    /// When the reader saw the tag.
    pub seen_at: DateTime<Utc>,
}

impl TagData {
    /// Create tag data seen now.
    pub fn new(tag_id: impl Into<String>) -> Self {
        Self {
            tag_id: tag_id.into(),
            rssi: None,
            seen_at: Utc::now(),
        }
    }
}
