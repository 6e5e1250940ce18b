//! Reader driver trait definition.
//!
//! This module defines the contract between a reader session and the vendor
//! driver that talks to handheld RFID sleds. The session never touches the
//! transport directly: discovery, connection, configuration, inventory control
//! and event delivery all go through [`ReaderDriver`].
//!
//! All methods use native `async fn` (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use handscan_core::{DeviceDescriptor, DeviceId, ScanMode};
use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::{AntennaRfConfig, DriverEvent, EventClasses, TagData};

/// Handheld reader driver abstraction.
///
/// A driver owns the transport (Bluetooth for handheld sleds) and every reader
/// reachable through it. Methods take `&self`: drivers are shared between the
/// consumer call path and the event dispatch task, and are expected to use
/// interior synchronization.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters, or the
/// [`AnyReaderDriver`](crate::devices::AnyReaderDriver) enum wrapper where a
/// concrete type is required (e.g. when spawning tasks).
///
/// # Examples
///
/// ```no_run
/// use handscan_hardware::traits::ReaderDriver;
/// use handscan_hardware::error::Result;
///
/// async fn names<D: ReaderDriver>(driver: &D) -> Result<Vec<String>> {
///     let devices = driver.discover().await?;
///     Ok(devices.into_iter().map(|d| d.name).collect())
/// }
/// ```
pub trait ReaderDriver: Send + Sync {
    /// Scan the transport for available readers.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::InvalidUsage` if the transport is not ready.
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Open a connection to a reader.
    async fn connect(&self, device: &DeviceId) -> Result<()>;

    /// Close the connection to a reader.
    async fn disconnect(&self, device: &DeviceId) -> Result<()>;

    /// Whether the reader currently has an open connection.
    async fn is_connected(&self, device: &DeviceId) -> Result<bool>;

    /// Select what the handheld trigger drives.
    ///
    /// With `persist` set the reader keeps the mode across power cycles.
    async fn set_trigger_mode(&self, device: &DeviceId, mode: ScanMode, persist: bool)
    -> Result<()>;

    /// Read the RF configuration of one antenna.
    async fn antenna_config(&self, device: &DeviceId, antenna: u16) -> Result<AntennaRfConfig>;

    /// Write the RF configuration of one antenna.
    async fn set_antenna_config(
        &self,
        device: &DeviceId,
        antenna: u16,
        config: AntennaRfConfig,
    ) -> Result<()>;

    /// Start tag inventory.
    async fn start_inventory(&self, device: &DeviceId) -> Result<()>;

    /// Stop tag inventory.
    async fn stop_inventory(&self, device: &DeviceId) -> Result<()>;

    /// Enable delivery of the given event classes.
    ///
    /// Enabling is additive and idempotent: enabling an already enabled class
    /// is not an error and does not duplicate events.
    async fn enable_events(&self, device: &DeviceId, classes: EventClasses) -> Result<()>;

    /// Fetch up to `page_size` buffered tags.
    async fn fetch_read_tags(&self, device: &DeviceId, page_size: usize) -> Result<Vec<TagData>>;

    /// Subscribe to the driver's event stream.
    ///
    /// Every receiver observes every event emitted after it subscribed.
    fn events(&self) -> broadcast::Receiver<DriverEvent>;
}
