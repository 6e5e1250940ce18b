//! Core constants for handheld reader sessions.
//!
//! Values here mirror the behaviour of the handheld RFID sled firmware and the
//! host bridge event names that consumers subscribe to. The tunable ones are
//! defaults only and can be overridden per session.
//!
//! # Usage
//!
//! ```
//! use handscan_core::constants::*;
//!
//! assert_eq!(EVENT_RFID_READ, "onRfidRead");
//! assert!(DEFAULT_TAG_PAGE_SIZE >= 1);
//! assert_eq!(MAX_POWER, 270);
//! ```

// ============================================================================
// Reader Limits
// ============================================================================

/// Highest transmit power index supported by the handheld sled.
///
/// Power indices map to a driver-side table (roughly 0.1 dBm steps), so 270
/// corresponds to the 27.0 dBm ceiling of the reader.
pub const MAX_POWER: u16 = 270;

/// Antenna whose RF configuration is rewritten by power changes.
///
/// Handheld sleds expose exactly one antenna and the driver numbers it from 1.
pub const DEFAULT_ANTENNA_INDEX: u16 = 1;

// ============================================================================
// Event Dispatch
// ============================================================================

/// Number of tags fetched from the driver per read notification.
///
/// One tag per notification is enough for interactive, trigger-driven use.
pub const DEFAULT_TAG_PAGE_SIZE: usize = 1;

/// Capacity of the outward notification channel.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 100;

/// Capacity of the internal fault-reporting channel.
pub const DEFAULT_FAULT_CAPACITY: usize = 32;

/// Maximum number of inventory transitions kept for diagnostics.
pub const MAX_TRANSITION_HISTORY: usize = 64;

// ============================================================================
// Notification Names
// ============================================================================

/// Emitted when a reader becomes visible on the transport.
pub const EVENT_APPEARED: &str = "onAppeared";

/// Emitted when a reader is no longer visible on the transport.
pub const EVENT_DISAPPEARED: &str = "onDisappeared";

/// Emitted with the tag identifiers of one read batch.
pub const EVENT_RFID_READ: &str = "onRfidRead";
