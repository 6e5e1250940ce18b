//! Reader configurator.
//!
//! Applies scan mode and transmit power to the active reader. With no active
//! reader both setters acknowledge without touching the driver; callers can
//! tell the two outcomes apart through [`ConfigAck`].

use handscan_core::{DeviceId, Error, ReaderConfig, Result, ScanMode, TransmitPower};
use handscan_hardware::ReaderDriver;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Acknowledgement of a configuration call.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAck<T> {
    /// The setting was written to the active reader.
    Applied(T),

    /// No reader is active; nothing was written.
    NoActiveDevice(T),
}

impl<T> ConfigAck<T> {
    /// The acknowledged value.
    pub fn value(&self) -> &T {
        match self {
            Self::Applied(value) | Self::NoActiveDevice(value) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Applied(value) | Self::NoActiveDevice(value) => value,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Writes trigger mode and antenna power, remembering what was applied.
#[derive(Debug)]
pub struct ReaderConfigurator {
    applied: Mutex<ReaderConfig>,
    antenna_index: u16,
    max_power: u16,
    persist_scan_mode: bool,
}

impl ReaderConfigurator {
    pub fn new(antenna_index: u16, max_power: u16, persist_scan_mode: bool) -> Self {
        Self {
            applied: Mutex::new(ReaderConfig::default()),
            antenna_index,
            max_power,
            persist_scan_mode,
        }
    }

    /// Configuration applied to the active reader so far.
    pub async fn current(&self) -> ReaderConfig {
        *self.applied.lock().await
    }

    /// Forget applied configuration (the reader went away).
    pub async fn reset(&self) {
        *self.applied.lock().await = ReaderConfig::default();
    }

    /// Select what the trigger drives on the active reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the driver rejects the call.
    pub async fn set_scan_mode<D: ReaderDriver>(
        &self,
        driver: &D,
        active: Option<&DeviceId>,
        mode: ScanMode,
    ) -> Result<ConfigAck<ScanMode>> {
        let Some(device) = active else {
            debug!(%mode, "No active reader, scan mode not applied");
            return Ok(ConfigAck::NoActiveDevice(mode));
        };

        let mut applied = self.applied.lock().await;
        driver
            .set_trigger_mode(device, mode, self.persist_scan_mode)
            .await
            .map_err(|e| Error::Config(format!("set scan mode {mode}: {e}")))?;

        applied.scan_mode = Some(mode);
        info!(%device, %mode, "Scan mode applied");
        Ok(ConfigAck::Applied(mode))
    }

    /// Set the transmit power index of the configured antenna.
    ///
    /// Reads the antenna's RF configuration, replaces the power index and
    /// writes it back, leaving the other RF settings untouched.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a value above the configured ceiling or if
    /// the driver rejects either call. Nothing is checked without an active
    /// reader.
    pub async fn set_power<D: ReaderDriver>(
        &self,
        driver: &D,
        active: Option<&DeviceId>,
        value: u16,
    ) -> Result<ConfigAck<u16>> {
        let Some(device) = active else {
            debug!(power = value, "No active reader, power not applied");
            return Ok(ConfigAck::NoActiveDevice(value));
        };

        let power = TransmitPower::with_max(value, self.max_power)
            .map_err(|e| Error::Config(e.to_string()))?;

        let mut applied = self.applied.lock().await;
        let mut rf = driver
            .antenna_config(device, self.antenna_index)
            .await
            .map_err(|e| Error::Config(format!("read antenna {}: {e}", self.antenna_index)))?;

        rf.transmit_power_index = power.as_u16();
        driver
            .set_antenna_config(device, self.antenna_index, rf)
            .await
            .map_err(|e| Error::Config(format!("write antenna {}: {e}", self.antenna_index)))?;

        applied.transmit_power = Some(power);
        info!(%device, power = value, antenna = self.antenna_index, "Transmit power applied");
        Ok(ConfigAck::Applied(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handscan_core::constants::MAX_POWER;
    use handscan_hardware::DriverError;
    use handscan_hardware::mock::{MockCommand, MockOperation, MockReader, MockReaderHandle};

    async fn connected() -> (MockReader, MockReaderHandle, DeviceId) {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");
        driver.connect(&id).await.unwrap();
        (driver, handle, id)
    }

    fn configurator() -> ReaderConfigurator {
        ReaderConfigurator::new(1, MAX_POWER, true)
    }

    #[tokio::test]
    async fn test_set_scan_mode_applies_persistent_mode() {
        let (driver, handle, id) = connected().await;
        let configurator = configurator();

        let ack = configurator
            .set_scan_mode(&driver, Some(&id), ScanMode::Rfid)
            .await
            .unwrap();

        assert_eq!(ack, ConfigAck::Applied(ScanMode::Rfid));
        assert_eq!(handle.trigger_mode("RFD1"), Some((ScanMode::Rfid, true)));
        assert_eq!(configurator.current().await.scan_mode, Some(ScanMode::Rfid));
    }

    #[tokio::test]
    async fn test_set_scan_mode_without_active_reader() {
        let (driver, handle) = MockReader::new();
        let configurator = configurator();

        let ack = configurator
            .set_scan_mode(&driver, None, ScanMode::Barcode)
            .await
            .unwrap();

        assert_eq!(ack, ConfigAck::NoActiveDevice(ScanMode::Barcode));
        assert!(!ack.is_applied());
        assert!(handle.commands().is_empty());
    }

    #[tokio::test]
    async fn test_set_scan_mode_fault() {
        let (driver, handle, id) = connected().await;
        handle.fail_next(
            MockOperation::SetTriggerMode,
            DriverError::operation_failure("reader busy"),
        );

        let result = configurator()
            .set_scan_mode(&driver, Some(&id), ScanMode::Rfid)
            .await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_set_power_rewrites_antenna() {
        let (driver, handle, id) = connected().await;
        let configurator = configurator();

        let ack = configurator.set_power(&driver, Some(&id), 150).await.unwrap();

        assert_eq!(ack.into_value(), 150);
        let written = handle
            .commands()
            .into_iter()
            .find_map(|c| match c {
                MockCommand::SetAntennaConfig { antenna, config, .. } => Some((antenna, config)),
                _ => None,
            })
            .unwrap();
        assert_eq!(written.0, 1);
        assert_eq!(written.1.transmit_power_index, 150);
        assert_eq!(
            configurator.current().await.transmit_power,
            Some(TransmitPower::new(150).unwrap())
        );
    }

    #[tokio::test]
    async fn test_set_power_without_active_reader_acks() {
        let (driver, _handle) = MockReader::new();

        let ack = configurator().set_power(&driver, None, 100).await.unwrap();
        assert_eq!(ack, ConfigAck::NoActiveDevice(100));
        assert_eq!(*ack.value(), 100);
    }

    #[tokio::test]
    async fn test_set_power_out_of_range_is_config_error() {
        let (driver, handle, id) = connected().await;
        handle.clear_commands();

        let result = configurator()
            .set_power(&driver, Some(&id), MAX_POWER + 1)
            .await;
        assert!(matches!(result, Err(Error::Config(ref msg)) if msg.contains("out of range")));
        assert!(handle.commands().is_empty());
    }

    #[tokio::test]
    async fn test_set_power_out_of_range_without_active_reader_acks() {
        let (driver, _handle) = MockReader::new();

        let ack = configurator()
            .set_power(&driver, None, MAX_POWER + 30)
            .await
            .unwrap();
        assert_eq!(ack, ConfigAck::NoActiveDevice(MAX_POWER + 30));
    }

    #[tokio::test]
    async fn test_set_power_read_fault_skips_write() {
        let (driver, handle, id) = connected().await;
        handle.fail_next(
            MockOperation::GetAntennaConfig,
            DriverError::invalid_usage("antenna unavailable"),
        );

        let result = configurator().set_power(&driver, Some(&id), 100).await;
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(
            !handle
                .commands()
                .iter()
                .any(|c| matches!(c, MockCommand::SetAntennaConfig { .. }))
        );
    }

    #[tokio::test]
    async fn test_reset_clears_applied() {
        let (driver, _handle, id) = connected().await;
        let configurator = configurator();
        configurator
            .set_scan_mode(&driver, Some(&id), ScanMode::Rfid)
            .await
            .unwrap();

        configurator.reset().await;
        assert_eq!(configurator.current().await, ReaderConfig::default());
    }
}
