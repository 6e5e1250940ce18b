//! Handheld reader session engine.
//!
//! Ties asynchronous reader events to reader commands and outward
//! notifications for a single active handheld RFID/barcode reader:
//!
//! ```text
//! consumer calls ─► Session ─► ConnectionManager / ReaderConfigurator ─► driver
//! driver events  ─► dispatcher ─► InventoryController (start/stop) ─► driver
//!                              └► Notifier ─► onAppeared / onDisappeared / onRfidRead
//! ```
//!
//! Faults on the event path have no caller to reject; they are published on a
//! separate [`SessionFault`] channel.
//!
//! # Examples
//!
//! ```
//! use handscan_hardware::mock::MockReader;
//! use handscan_session::{Notification, Session};
//!
//! # #[tokio::main]
//! # async fn main() -> handscan_core::Result<()> {
//! let (driver, handle) = MockReader::new();
//! handle.add_device("RFD1", "AA:BB");
//!
//! let session = Session::builder(driver).build()?;
//! let mut notifications = session.notifications();
//!
//! session.discover().await?;
//! session.connect("RFD1").await?;
//!
//! handle.read_tags(&["E2001"]).unwrap();
//! assert_eq!(
//!     notifications.recv().await.unwrap(),
//!     Notification::RfidRead(vec!["E2001".to_string()])
//! );
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod configurator;
pub mod connection;
mod dispatcher;
pub mod fault;
pub mod inventory;
pub mod notifier;
pub mod registry;
pub mod session;

pub use config::SessionConfig;
pub use configurator::{ConfigAck, ReaderConfigurator};
pub use connection::{ConnectionManager, OpenOutcome};
pub use fault::{FaultOperation, FaultReporter, SessionFault};
pub use inventory::{InventoryCommand, InventoryController, InventoryState, StateTransition};
pub use notifier::{Notification, Notifier};
pub use registry::{DeviceRegistry, RegisteredDevice};
pub use session::{Session, SessionBuilder, SessionStats};
