//! Reader driver abstraction layer for handheld RFID sessions.
//!
//! This crate defines the contract a reader session relies on to talk to
//! handheld RFID/barcode sleds, without binding the session to a vendor SDK.
//! A driver discovers readers, opens and closes connections, applies trigger
//! and antenna settings, starts and stops inventory, and delivers asynchronous
//! events (reader presence, trigger presses, tag reads) on a broadcast stream.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All driver calls are native `async fn` in traits
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Shared**: Drivers take `&self` and are `Send + Sync`, since a session
//!   calls them from both the consumer path and its event dispatch task.
//! - **Error-aware**: All operations return [`Result<T>`][error::Result] with the
//!   fault class reported by the driver ([`DriverError`]).
//!
//! # Reading tags
//!
//! ```no_run
//! use handscan_hardware::traits::ReaderDriver;
//! use handscan_hardware::types::DriverEvent;
//! use handscan_hardware::error::Result;
//! use handscan_core::DeviceId;
//!
//! async fn first_tag<D: ReaderDriver>(driver: &D, reader: &DeviceId) -> Result<Option<String>> {
//!     let mut events = driver.events();
//!     driver.start_inventory(reader).await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if event == DriverEvent::TagsAvailable {
//!             let tags = driver.fetch_read_tags(reader, 1).await?;
//!             driver.stop_inventory(reader).await?;
//!             return Ok(tags.into_iter().next().map(|t| t.tag_id));
//!         }
//!     }
//!     Ok(None)
//! }
//! ```
//!
//! # Mock Implementation
//!
//! The [`mock`] module provides [`MockReader`](mock::MockReader), an in-memory
//! transport whose handle simulates readers, triggers and tags for tests.

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyReaderDriver;
pub use error::{DriverError, Result};
pub use traits::ReaderDriver;
pub use types::{AntennaRfConfig, DriverEvent, EventClass, EventClasses, TagData, TriggerEvent};
