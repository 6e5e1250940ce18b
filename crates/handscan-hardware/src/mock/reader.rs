//! Mock reader driver implementation for testing and development.
//!
//! This module provides a simulated handheld reader transport that can be
//! controlled programmatically for testing without requiring physical
//! hardware. The [`MockReaderHandle`] plays the part of the physical world:
//! readers appear and disappear, triggers are pulled, tags enter the field and
//! driver calls fail on demand.

use crate::{
    DriverError, Result,
    traits::ReaderDriver,
    types::{AntennaRfConfig, DriverEvent, EventClasses, TagData, TriggerEvent},
};
use handscan_core::{DeviceDescriptor, DeviceId, ScanMode};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::trace;

/// Capacity of the mock driver's event stream.
const EVENT_CAPACITY: usize = 64;

/// Driver operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Discover,
    Connect,
    Disconnect,
    SetTriggerMode,
    GetAntennaConfig,
    SetAntennaConfig,
    StartInventory,
    StopInventory,
    EnableEvents,
    FetchReadTags,
}

/// A driver call recorded by the mock, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCommand {
    Discover,
    Connect(DeviceId),
    Disconnect(DeviceId),
    SetTriggerMode {
        device: DeviceId,
        mode: ScanMode,
        persist: bool,
    },
    SetAntennaConfig {
        device: DeviceId,
        antenna: u16,
        config: AntennaRfConfig,
    },
    StartInventory(DeviceId),
    StopInventory(DeviceId),
    EnableEvents(DeviceId, EventClasses),
    FetchReadTags(DeviceId, usize),
}

#[derive(Debug)]
struct MockDevice {
    descriptor: DeviceDescriptor,
    visible: bool,
    connected: bool,
    trigger_mode: Option<(ScanMode, bool)>,
    antenna: AntennaRfConfig,
    inventory_running: bool,
    buffered_tags: VecDeque<TagData>,
}

impl MockDevice {
    fn new(descriptor: DeviceDescriptor) -> Self {
        Self {
            descriptor,
            visible: true,
            connected: false,
            trigger_mode: None,
            antenna: AntennaRfConfig::default(),
            inventory_running: false,
            buffered_tags: VecDeque::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<MockDevice>,
    enabled: EventClasses,
    faults: HashMap<MockOperation, VecDeque<DriverError>>,
    journal: Vec<MockCommand>,
}

impl MockState {
    fn take_fault(&mut self, operation: MockOperation) -> Result<()> {
        match self.faults.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn device_mut(&mut self, id: &DeviceId) -> Result<&mut MockDevice> {
        self.devices
            .iter_mut()
            .find(|d| d.descriptor.address == id.as_str())
            .ok_or_else(|| DriverError::unknown_device(id.as_str()))
    }

    fn connected_device_mut(&mut self, id: &DeviceId) -> Result<&mut MockDevice> {
        let device = self.device_mut(id)?;
        if !device.connected {
            return Err(DriverError::disconnected(id.as_str()));
        }
        Ok(device)
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockState>,
    events: broadcast::Sender<DriverEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver an event if its class is enabled. Returns whether it was sent.
    fn emit(&self, event: DriverEvent) -> bool {
        let enabled = self.lock().enabled;
        if !enabled.contains(event.class()) {
            trace!(?event, "Event class not enabled, dropping");
            return false;
        }
        self.events.send(event).is_ok()
    }
}

/// Mock reader driver for testing and development.
///
/// Cloning the driver shares the same simulated transport.
///
/// # Examples
///
/// ```
/// use handscan_hardware::mock::MockReader;
/// use handscan_hardware::traits::ReaderDriver;
///
/// #[tokio::main]
/// async fn main() -> handscan_hardware::Result<()> {
///     let (driver, handle) = MockReader::new();
///     handle.add_device("RFD1", "AA:BB");
///
///     let devices = driver.discover().await?;
///     assert_eq!(devices[0].name, "RFD1");
///
///     driver.connect(&devices[0].id()).await?;
///     assert!(handle.is_connected("RFD1"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MockReader {
    shared: Arc<Shared>,
}

impl MockReader {
    /// Create a new mock driver with an empty transport.
    ///
    /// Returns a tuple of (MockReader, MockReaderHandle) where the handle
    /// drives the simulated hardware.
    pub fn new() -> (Self, MockReaderHandle) {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let shared = Arc::new(Shared {
            state: Mutex::new(MockState::default()),
            events,
        });

        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockReaderHandle { shared },
        )
    }

    fn record(&self, state: &mut MockState, command: MockCommand) {
        trace!(?command, "Mock driver call");
        state.journal.push(command);
    }
}

impl Default for MockReader {
    fn default() -> Self {
        Self::new().0
    }
}

impl ReaderDriver for MockReader {
    async fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::Discover);
        state.take_fault(MockOperation::Discover)?;

        Ok(state
            .devices
            .iter()
            .filter(|d| d.visible)
            .map(|d| d.descriptor.clone())
            .collect())
    }

    async fn connect(&self, device: &DeviceId) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::Connect(device.clone()));
        state.take_fault(MockOperation::Connect)?;

        let entry = state.device_mut(device)?;
        if !entry.visible {
            return Err(DriverError::operation_failure(format!(
                "Reader {} is out of range",
                device
            )));
        }
        entry.connected = true;
        Ok(())
    }

    async fn disconnect(&self, device: &DeviceId) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::Disconnect(device.clone()));
        state.take_fault(MockOperation::Disconnect)?;

        let entry = state.device_mut(device)?;
        entry.connected = false;
        entry.inventory_running = false;
        Ok(())
    }

    async fn is_connected(&self, device: &DeviceId) -> Result<bool> {
        let mut state = self.shared.lock();
        Ok(state.device_mut(device)?.connected)
    }

    async fn set_trigger_mode(
        &self,
        device: &DeviceId,
        mode: ScanMode,
        persist: bool,
    ) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(
            &mut state,
            MockCommand::SetTriggerMode {
                device: device.clone(),
                mode,
                persist,
            },
        );
        state.take_fault(MockOperation::SetTriggerMode)?;

        state.connected_device_mut(device)?.trigger_mode = Some((mode, persist));
        Ok(())
    }

    async fn antenna_config(&self, device: &DeviceId, antenna: u16) -> Result<AntennaRfConfig> {
        let mut state = self.shared.lock();
        state.take_fault(MockOperation::GetAntennaConfig)?;

        if antenna != 1 {
            return Err(DriverError::invalid_usage(format!(
                "Antenna {} does not exist",
                antenna
            )));
        }
        Ok(state.connected_device_mut(device)?.antenna)
    }

    async fn set_antenna_config(
        &self,
        device: &DeviceId,
        antenna: u16,
        config: AntennaRfConfig,
    ) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(
            &mut state,
            MockCommand::SetAntennaConfig {
                device: device.clone(),
                antenna,
                config,
            },
        );
        state.take_fault(MockOperation::SetAntennaConfig)?;

        if antenna != 1 {
            return Err(DriverError::invalid_usage(format!(
                "Antenna {} does not exist",
                antenna
            )));
        }
        state.connected_device_mut(device)?.antenna = config;
        Ok(())
    }

    async fn start_inventory(&self, device: &DeviceId) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::StartInventory(device.clone()));
        state.take_fault(MockOperation::StartInventory)?;

        state.connected_device_mut(device)?.inventory_running = true;
        Ok(())
    }

    async fn stop_inventory(&self, device: &DeviceId) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::StopInventory(device.clone()));
        state.take_fault(MockOperation::StopInventory)?;

        state.connected_device_mut(device)?.inventory_running = false;
        Ok(())
    }

    async fn enable_events(&self, device: &DeviceId, classes: EventClasses) -> Result<()> {
        let mut state = self.shared.lock();
        self.record(&mut state, MockCommand::EnableEvents(device.clone(), classes));
        state.take_fault(MockOperation::EnableEvents)?;

        state.connected_device_mut(device)?;
        state.enabled = state.enabled.union(classes);
        Ok(())
    }

    async fn fetch_read_tags(&self, device: &DeviceId, page_size: usize) -> Result<Vec<TagData>> {
        let mut state = self.shared.lock();
        self.record(
            &mut state,
            MockCommand::FetchReadTags(device.clone(), page_size),
        );
        state.take_fault(MockOperation::FetchReadTags)?;

        let buffer = &mut state.connected_device_mut(device)?.buffered_tags;
        let count = page_size.min(buffer.len());
        Ok(buffer.drain(..count).collect())
    }

    fn events(&self) -> broadcast::Receiver<DriverEvent> {
        self.shared.events.subscribe()
    }
}

/// Handle for controlling a mock reader transport.
///
/// The handle simulates the physical side of the driver and exposes the call
/// journal for assertions.
///
/// # Examples
///
/// ```
/// use handscan_hardware::mock::{MockOperation, MockReader};
/// use handscan_hardware::DriverError;
///
/// let (_driver, handle) = MockReader::new();
/// handle.add_device("RFD1", "AA:BB");
/// handle.fail_next(MockOperation::Discover, DriverError::invalid_usage("transport not ready"));
/// assert_eq!(handle.device_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    shared: Arc<Shared>,
}

impl MockReaderHandle {
    /// Make a reader visible on the transport.
    ///
    /// A reader that was previously removed becomes visible again. Emits
    /// [`DriverEvent::Appeared`] if presence events are enabled.
    pub fn add_device(&self, name: &str, address: &str) -> bool {
        let descriptor = DeviceDescriptor::new(name, address);
        {
            let mut state = self.shared.lock();
            match state
                .devices
                .iter_mut()
                .find(|d| d.descriptor.address == address)
            {
                Some(existing) => {
                    existing.descriptor = descriptor.clone();
                    existing.visible = true;
                }
                None => state.devices.push(MockDevice::new(descriptor.clone())),
            }
        }
        self.shared.emit(DriverEvent::Appeared(descriptor))
    }

    /// Take a reader out of range.
    ///
    /// The reader's connection drops. Emits [`DriverEvent::Disappeared`] if
    /// presence events are enabled. Returns `false` if the name is unknown.
    pub fn remove_device(&self, name: &str) -> bool {
        let descriptor = {
            let mut state = self.shared.lock();
            let Some(device) = state
                .devices
                .iter_mut()
                .find(|d| d.descriptor.name == name && d.visible)
            else {
                return false;
            };
            device.visible = false;
            device.connected = false;
            device.inventory_running = false;
            device.descriptor.clone()
        };
        self.shared.emit(DriverEvent::Disappeared(descriptor));
        true
    }

    /// Stop advertising a reader while keeping its link up.
    ///
    /// The reader is left out of later scans but stays connected, and no
    /// presence event is emitted. Returns `false` if the name is unknown.
    pub fn hide_device(&self, name: &str) -> bool {
        let mut state = self.shared.lock();
        match state
            .devices
            .iter_mut()
            .find(|d| d.descriptor.name == name && d.visible)
        {
            Some(device) => {
                device.visible = false;
                true
            }
            None => false,
        }
    }

    /// Pull the handheld trigger.
    pub fn press_trigger(&self) -> bool {
        self.shared.emit(DriverEvent::Trigger(TriggerEvent::Pressed))
    }

    /// Let go of the handheld trigger.
    pub fn release_trigger(&self) -> bool {
        self.shared.emit(DriverEvent::Trigger(TriggerEvent::Released))
    }

    /// Bring tags into the field of the connected reader.
    ///
    /// Tags are buffered in order and one [`DriverEvent::TagsAvailable`]
    /// notification is emitted for the batch.
    ///
    /// # Errors
    ///
    /// Returns an error if no reader is connected.
    pub fn read_tags(&self, tag_ids: &[&str]) -> Result<bool> {
        {
            let mut state = self.shared.lock();
            let device = state
                .devices
                .iter_mut()
                .find(|d| d.connected)
                .ok_or_else(|| DriverError::disconnected("no connected reader"))?;
            device
                .buffered_tags
                .extend(tag_ids.iter().map(|id| TagData::new(*id)));
        }
        Ok(self.shared.emit(DriverEvent::TagsAvailable))
    }

    /// Make the next call of `operation` fail with `error`.
    ///
    /// Faults queue up: calling this twice fails the next two calls.
    pub fn fail_next(&self, operation: MockOperation, error: DriverError) {
        self.shared
            .lock()
            .faults
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// All driver calls recorded so far.
    pub fn commands(&self) -> Vec<MockCommand> {
        self.shared.lock().journal.clone()
    }

    /// Forget recorded driver calls.
    pub fn clear_commands(&self) {
        self.shared.lock().journal.clear();
    }

    /// Number of start-inventory calls.
    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, MockCommand::StartInventory(_)))
    }

    /// Number of stop-inventory calls.
    pub fn stop_count(&self) -> usize {
        self.count(|c| matches!(c, MockCommand::StopInventory(_)))
    }

    fn count(&self, predicate: impl Fn(&MockCommand) -> bool) -> usize {
        self.shared
            .lock()
            .journal
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    /// Event classes enabled so far.
    pub fn enabled_events(&self) -> EventClasses {
        self.shared.lock().enabled
    }

    /// Whether the named reader is connected.
    pub fn is_connected(&self, name: &str) -> bool {
        self.with_device(name, |d| d.connected).unwrap_or(false)
    }

    /// Whether the named reader is running an inventory.
    pub fn is_inventory_running(&self, name: &str) -> bool {
        self.with_device(name, |d| d.inventory_running)
            .unwrap_or(false)
    }

    /// Trigger mode last written to the named reader.
    pub fn trigger_mode(&self, name: &str) -> Option<(ScanMode, bool)> {
        self.with_device(name, |d| d.trigger_mode).flatten()
    }

    /// Antenna configuration of the named reader.
    pub fn antenna_config(&self, name: &str) -> Option<AntennaRfConfig> {
        self.with_device(name, |d| d.antenna)
    }

    /// Number of readers ever added.
    pub fn device_count(&self) -> usize {
        self.shared.lock().devices.len()
    }

    /// Number of readers with an open connection.
    pub fn connected_count(&self) -> usize {
        self.shared
            .lock()
            .devices
            .iter()
            .filter(|d| d.connected)
            .count()
    }

    fn with_device<T>(&self, name: &str, f: impl FnOnce(&MockDevice) -> T) -> Option<T> {
        self.shared
            .lock()
            .devices
            .iter()
            .find(|d| d.descriptor.name == name)
            .map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_discover_lists_visible_devices() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        handle.add_device("RFD2", "CC:DD");
        handle.remove_device("RFD2");

        let devices = driver.discover().await.unwrap();
        assert_eq!(devices, vec![DeviceDescriptor::new("RFD1", "AA:BB")]);
    }

    #[tokio::test]
    async fn test_hidden_reader_keeps_link() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        driver.connect(&DeviceId::new("AA:BB")).await.unwrap();

        assert!(handle.hide_device("RFD1"));

        assert!(driver.discover().await.unwrap().is_empty());
        assert!(handle.is_connected("RFD1"));
        assert!(!handle.hide_device("RFD1"));
    }

    #[tokio::test]
    async fn test_injected_fault_is_one_shot() {
        let (driver, handle) = MockReader::new();
        handle.fail_next(
            MockOperation::Discover,
            DriverError::invalid_usage("transport not ready"),
        );

        assert!(matches!(
            driver.discover().await,
            Err(DriverError::InvalidUsage { .. })
        ));
        assert!(driver.discover().await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");

        driver.connect(&id).await.unwrap();
        assert!(driver.is_connected(&id).await.unwrap());
        assert_eq!(handle.connected_count(), 1);

        driver.disconnect(&id).await.unwrap();
        assert!(!handle.is_connected("RFD1"));
    }

    #[tokio::test]
    async fn test_connect_unknown_device() {
        let (driver, _handle) = MockReader::new();
        let result = driver.connect(&DeviceId::new("FF:FF")).await;
        assert!(matches!(result, Err(DriverError::UnknownDevice { .. })));
    }

    #[tokio::test]
    async fn test_commands_require_connection() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");

        let result = driver.start_inventory(&id).await;
        assert!(matches!(result, Err(DriverError::Disconnected { .. })));
    }

    #[tokio::test]
    async fn test_events_gated_by_enabled_classes() {
        let (driver, handle) = MockReader::new();
        let mut events = driver.events();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");

        // Nothing enabled yet
        assert!(!handle.press_trigger());

        driver.connect(&id).await.unwrap();
        driver
            .enable_events(&id, EventClasses::all())
            .await
            .unwrap();

        assert!(handle.press_trigger());
        assert_eq!(
            events.recv().await.unwrap(),
            DriverEvent::Trigger(TriggerEvent::Pressed)
        );
    }

    #[tokio::test]
    async fn test_fetch_read_tags_pages_in_order() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");
        driver.connect(&id).await.unwrap();

        handle.read_tags(&["E2001", "E2002", "E2003"]).unwrap();

        let first = driver.fetch_read_tags(&id, 2).await.unwrap();
        let ids: Vec<_> = first.iter().map(|t| t.tag_id.as_str()).collect();
        assert_eq!(ids, vec!["E2001", "E2002"]);

        let rest = driver.fetch_read_tags(&id, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].tag_id, "E2003");
    }

    #[tokio::test]
    async fn test_read_tags_without_connection() {
        let (_driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        assert!(handle.read_tags(&["E2001"]).is_err());
    }

    #[tokio::test]
    async fn test_remove_device_drops_connection() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        driver.connect(&DeviceId::new("AA:BB")).await.unwrap();

        assert!(handle.remove_device("RFD1"));
        assert!(!handle.is_connected("RFD1"));
        assert!(!handle.remove_device("RFD1"));
    }

    #[tokio::test]
    async fn test_trigger_mode_and_antenna_recorded() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let id = DeviceId::new("AA:BB");
        driver.connect(&id).await.unwrap();

        driver
            .set_trigger_mode(&id, ScanMode::Barcode, true)
            .await
            .unwrap();
        assert_eq!(handle.trigger_mode("RFD1"), Some((ScanMode::Barcode, true)));

        let mut config = driver.antenna_config(&id, 1).await.unwrap();
        config.transmit_power_index = 120;
        driver.set_antenna_config(&id, 1, config).await.unwrap();
        assert_eq!(
            handle.antenna_config("RFD1").unwrap().transmit_power_index,
            120
        );
    }
}
