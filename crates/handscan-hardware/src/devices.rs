//! Enum wrapper for reader driver dispatch.
//!
//! Native `async fn` in traits (RPITIT) is not object-safe, so a session
//! cannot hold a `Box<dyn ReaderDriver>`. [`AnyReaderDriver`] provides
//! concrete type dispatch instead, which also lets the session spawn its
//! dispatch task on a type whose futures are known to be `Send`.
//!
//! # Examples
//!
//! ```
//! use handscan_hardware::devices::AnyReaderDriver;
//! use handscan_hardware::mock::MockReader;
//!
//! let (driver, _handle) = MockReader::new();
//! let any_driver = AnyReaderDriver::Mock(driver);
//! ```

use crate::mock::MockReader;
use crate::traits::ReaderDriver;
use crate::types::{AntennaRfConfig, DriverEvent, EventClasses, TagData};
use crate::Result;
use handscan_core::{DeviceDescriptor, DeviceId, ScanMode};
use tokio::sync::broadcast;

/// Enum wrapper for reader driver dispatch.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum AnyReaderDriver {
    /// Mock transport for development and testing.
    Mock(MockReader),
}

impl From<MockReader> for AnyReaderDriver {
    fn from(driver: MockReader) -> Self {
        Self::Mock(driver)
    }
}

impl ReaderDriver for AnyReaderDriver {
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        match self {
            Self::Mock(driver) => driver.discover().await,
        }
    }

    async fn connect(&self, device: &DeviceId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.connect(device).await,
        }
    }

    async fn disconnect(&self, device: &DeviceId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.disconnect(device).await,
        }
    }

    async fn is_connected(&self, device: &DeviceId) -> Result<bool> {
        match self {
            Self::Mock(driver) => driver.is_connected(device).await,
        }
    }

    async fn set_trigger_mode(
        &self,
        device: &DeviceId,
        mode: ScanMode,
        persist: bool,
    ) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_trigger_mode(device, mode, persist).await,
        }
    }

    async fn antenna_config(&self, device: &DeviceId, antenna: u16) -> Result<AntennaRfConfig> {
        match self {
            Self::Mock(driver) => driver.antenna_config(device, antenna).await,
        }
    }

    async fn set_antenna_config(
        &self,
        device: &DeviceId,
        antenna: u16,
        config: AntennaRfConfig,
    ) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.set_antenna_config(device, antenna, config).await,
        }
    }

    async fn start_inventory(&self, device: &DeviceId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.start_inventory(device).await,
        }
    }

    async fn stop_inventory(&self, device: &DeviceId) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.stop_inventory(device).await,
        }
    }

    async fn enable_events(&self, device: &DeviceId, classes: EventClasses) -> Result<()> {
        match self {
            Self::Mock(driver) => driver.enable_events(device, classes).await,
        }
    }

    async fn fetch_read_tags(&self, device: &DeviceId, page_size: usize) -> Result<Vec<TagData>> {
        match self {
            Self::Mock(driver) => driver.fetch_read_tags(device, page_size).await,
        }
    }

    fn events(&self) -> broadcast::Receiver<DriverEvent> {
        match self {
            Self::Mock(driver) => driver.events(),
        }
    }
}
