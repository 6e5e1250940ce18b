//! Reader session.
//!
//! [`Session`] is the consumer-facing surface: discovery, connection,
//! configuration and the notification streams. It owns the event dispatcher
//! task, which is aborted when the session is shut down or dropped.

use std::sync::Arc;

use handscan_core::{DeviceDescriptor, Error, ReaderConfig, Result, ScanMode};
use handscan_hardware::{AnyReaderDriver, DriverEvent, ReaderDriver};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::configurator::{ConfigAck, ReaderConfigurator};
use crate::connection::{ConnectionManager, OpenOutcome};
use crate::dispatcher;
use crate::fault::{FaultOperation, FaultReporter, SessionFault};
use crate::inventory::{InventoryController, InventoryState, StateTransition};
use crate::notifier::{Notification, Notifier};
use crate::registry::{DeviceRegistry, RegisteredDevice};

/// State shared between the session handle and its dispatcher task.
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) driver: AnyReaderDriver,
    pub(crate) config: SessionConfig,
    pub(crate) registry: RwLock<Arc<DeviceRegistry>>,
    pub(crate) connection: ConnectionManager,
    pub(crate) configurator: ReaderConfigurator,
    pub(crate) inventory: Mutex<InventoryController>,
    pub(crate) notifier: Notifier,
    pub(crate) faults: FaultReporter,
}

/// Counters and state snapshot for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub known_devices: usize,
    pub active_device: Option<String>,
    pub inventory_state: InventoryState,
    pub inventory_starts: u64,
    pub inventory_stops: u64,
    pub notifications_emitted: u64,
    pub notifications_dropped: u64,
    pub faults_reported: u64,
}

/// A session with at most one active handheld reader.
///
/// # Examples
///
/// ```
/// use handscan_core::ScanMode;
/// use handscan_hardware::mock::MockReader;
/// use handscan_session::Session;
///
/// # #[tokio::main]
/// # async fn main() -> handscan_core::Result<()> {
/// let (driver, handle) = MockReader::new();
/// handle.add_device("RFD1", "AA:BB");
///
/// let session = Session::builder(driver).build()?;
/// let devices = session.discover().await?;
/// assert_eq!(devices[0].name, "RFD1");
///
/// session.connect("RFD1").await?;
/// let ack = session.set_scan_mode(ScanMode::Rfid).await?;
/// assert!(ack.is_applied());
///
/// session.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
    dispatcher: Option<JoinHandle<()>>,
}

impl Session {
    /// Start building a session around `driver`.
    pub fn builder(driver: impl Into<AnyReaderDriver>) -> SessionBuilder {
        SessionBuilder::new(driver.into())
    }

    /// Scan for readers and replace the registry with the result.
    ///
    /// If the active reader is missing from the new scan it is disconnected
    /// (best effort) and inventory is forced back to idle. Otherwise the active
    /// connection is kept.
    ///
    /// # Errors
    ///
    /// Returns `Error::Discovery` if the driver scan fails; the registry is
    /// left unchanged.
    pub async fn discover(&self) -> Result<Vec<DeviceDescriptor>> {
        let inner = &self.inner;
        let descriptors = inner
            .driver
            .discover()
            .await
            .map_err(|e| Error::Discovery(e.to_string()))?;

        let registry = Arc::new(DeviceRegistry::new(descriptors));
        *inner.registry.write().await = Arc::clone(&registry);
        info!(count = registry.len(), "Discovery complete");

        self.drop_orphaned_connection(&registry).await;
        Ok(registry.descriptors())
    }

    /// Look up a reader by name in the current registry.
    pub async fn resolve(&self, name: &str) -> Option<RegisteredDevice> {
        self.inner.registry.read().await.resolve(name).cloned()
    }

    /// Connect to the named reader and make it the active one.
    ///
    /// Connecting the already active reader does not reopen it but enables its
    /// event classes again. Returns the reader name.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotFound` if the name is not in the registry
    /// - `Error::Connection` if another reader is active or the driver fails
    pub async fn connect(&self, name: &str) -> Result<String> {
        let device = self.resolve_or_not_found(name).await?;

        let outcome = self
            .inner
            .connection
            .open(&self.inner.driver, &device)
            .await?;
        if outcome == OpenOutcome::AlreadyConnected {
            debug!(device = name, "Reinitializing connected reader");
        }

        dispatcher::enable_events(&self.inner, &device).await;
        Ok(device.name().to_string())
    }

    /// Disconnect the named reader.
    ///
    /// A running inventory is stopped first (best effort); once the reader
    /// confirms the stop the controller is idle, even if the disconnect then
    /// fails. Disconnecting a reader that is not connected is a no-op.
    ///
    /// # Errors
    ///
    /// - `Error::DeviceNotFound` if the name is not in the registry
    /// - `Error::Connection` if the driver fails to disconnect
    pub async fn disconnect(&self, name: &str) -> Result<()> {
        let device = self.resolve_or_not_found(name).await?;
        let inner = &self.inner;

        let mut inventory = inner.inventory.lock().await;
        let is_active = inner
            .connection
            .active()
            .await
            .is_some_and(|active| active.id == device.id);

        if is_active && inventory.is_scanning() {
            debug!(device = name, "Stopping inventory before disconnect");
            match inner.driver.stop_inventory(&device.id).await {
                Ok(()) => {
                    inventory.reset();
                }
                Err(e) => inner.faults.report(SessionFault::new(
                    FaultOperation::StopInventory,
                    Some(device.id.clone()),
                    e.to_string(),
                )),
            }
        }

        if inner.connection.close(&inner.driver, &device).await? {
            inventory.reset();
            inner.configurator.reset().await;
        }
        Ok(())
    }

    /// Select RFID or barcode scanning on the active reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the driver rejects the mode.
    pub async fn set_scan_mode(&self, mode: ScanMode) -> Result<ConfigAck<ScanMode>> {
        let active = self.inner.connection.active().await;
        self.inner
            .configurator
            .set_scan_mode(&self.inner.driver, active.as_ref().map(|d| &d.id), mode)
            .await
    }

    /// Set the transmit power index of the active reader.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` above the configured ceiling or if the driver
    /// rejects the change. Without an active reader the value is acknowledged
    /// as is.
    pub async fn set_power(&self, value: u16) -> Result<ConfigAck<u16>> {
        let active = self.inner.connection.active().await;
        self.inner
            .configurator
            .set_power(&self.inner.driver, active.as_ref().map(|d| &d.id), value)
            .await
    }

    /// Process a driver event on the caller's task.
    ///
    /// Sessions built with [`SessionBuilder::manual_dispatch`] rely on this
    /// instead of the background dispatcher.
    pub async fn handle_event(&self, event: DriverEvent) {
        dispatcher::dispatch(&self.inner, event).await;
    }

    /// Subscribe to outward notifications.
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    /// Subscribe to faults swallowed on the event path.
    pub fn faults(&self) -> broadcast::Receiver<SessionFault> {
        self.inner.faults.subscribe()
    }

    pub async fn inventory_state(&self) -> InventoryState {
        self.inner.inventory.lock().await.current_state()
    }

    /// The last `count` inventory transitions, oldest first.
    pub async fn inventory_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.inner.inventory.lock().await.last_transitions(count)
    }

    pub async fn active_device(&self) -> Option<DeviceDescriptor> {
        self.inner
            .connection
            .active()
            .await
            .map(|device| device.descriptor)
    }

    /// Configuration applied to the active reader during this connection.
    pub async fn reader_config(&self) -> ReaderConfig {
        self.inner.configurator.current().await
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub async fn stats(&self) -> SessionStats {
        let inner = &self.inner;
        let (inventory_state, inventory_starts, inventory_stops) = {
            let inventory = inner.inventory.lock().await;
            (
                inventory.current_state(),
                inventory.starts(),
                inventory.stops(),
            )
        };

        SessionStats {
            known_devices: inner.registry.read().await.len(),
            active_device: inner
                .connection
                .active()
                .await
                .map(|device| device.name().to_string()),
            inventory_state,
            inventory_starts,
            inventory_stops,
            notifications_emitted: inner.notifier.emitted(),
            notifications_dropped: inner.notifier.dropped(),
            faults_reported: inner.faults.reported(),
        }
    }

    /// Stop the dispatcher task and wait for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.dispatcher.take() {
            task.abort();
            if let Err(e) = task.await
                && !e.is_cancelled()
            {
                warn!(error = %e, "Event dispatcher ended abnormally");
            }
        }
        debug!("Session shut down");
    }

    async fn resolve_or_not_found(&self, name: &str) -> Result<RegisteredDevice> {
        self.resolve(name)
            .await
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    async fn drop_orphaned_connection(&self, registry: &DeviceRegistry) {
        let inner = &self.inner;
        let mut inventory = inner.inventory.lock().await;

        let Some(active) = inner.connection.active().await else {
            return;
        };
        if registry.contains(&active.id) {
            return;
        }

        warn!(device = active.name(), "Active reader missing from scan, dropping connection");
        match inner.connection.release_if(&inner.driver, &active.id).await {
            Ok(_) => {
                inventory.reset();
                inner.configurator.reset().await;
            }
            Err(e) => inner.faults.report(SessionFault::new(
                FaultOperation::Disconnect,
                Some(active.id.clone()),
                e.to_string(),
            )),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.dispatcher.take() {
            task.abort();
        }
    }
}

/// Builder for [`Session`].
///
/// ```
/// use handscan_hardware::mock::MockReader;
/// use handscan_session::Session;
///
/// # #[tokio::main]
/// # async fn main() -> handscan_core::Result<()> {
/// let (driver, _handle) = MockReader::new();
/// let session = Session::builder(driver)
///     .with_tag_page_size(4)
///     .with_notification_capacity(16)
///     .build()?;
/// assert_eq!(session.config().tag_page_size, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionBuilder {
    driver: AnyReaderDriver,
    config: SessionConfig,
    spawn_dispatcher: bool,
}

impl SessionBuilder {
    fn new(driver: AnyReaderDriver) -> Self {
        Self {
            driver,
            config: SessionConfig::default(),
            spawn_dispatcher: true,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tag_page_size(mut self, page_size: usize) -> Self {
        self.config.tag_page_size = page_size;
        self
    }

    pub fn with_notification_capacity(mut self, capacity: usize) -> Self {
        self.config.notification_capacity = capacity;
        self
    }

    pub fn with_max_power(mut self, max_power: u16) -> Self {
        self.config.max_power = max_power;
        self
    }

    /// Do not spawn the background dispatcher; events are fed through
    /// [`Session::handle_event`] instead.
    pub fn manual_dispatch(mut self) -> Self {
        self.spawn_dispatcher = false;
        self
    }

    /// Validate the configuration and start the session.
    ///
    /// Must be called within a Tokio runtime unless
    /// [`manual_dispatch`](Self::manual_dispatch) is set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the configuration is invalid.
    pub fn build(self) -> Result<Session> {
        let config = self.config;
        config.validate()?;

        let inner = Arc::new(SessionInner {
            configurator: ReaderConfigurator::new(
                config.antenna_index,
                config.max_power,
                config.persist_scan_mode,
            ),
            notifier: Notifier::new(config.notification_capacity),
            faults: FaultReporter::new(config.fault_capacity),
            registry: RwLock::new(Arc::new(DeviceRegistry::default())),
            connection: ConnectionManager::new(),
            inventory: Mutex::new(InventoryController::new()),
            driver: self.driver,
            config,
        });

        let dispatcher = self.spawn_dispatcher.then(|| {
            let events = inner.driver.events();
            tokio::spawn(dispatcher::run(Arc::clone(&inner), events))
        });

        debug!(
            tag_page_size = inner.config.tag_page_size,
            dispatcher = dispatcher.is_some(),
            "Session started"
        );
        Ok(Session { inner, dispatcher })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use handscan_hardware::mock::{MockCommand, MockOperation, MockReader, MockReaderHandle};
    use handscan_hardware::{DriverError, TriggerEvent};
    use tokio::sync::broadcast::error::TryRecvError;

    fn rfd1() -> DeviceDescriptor {
        DeviceDescriptor::new("RFD1", "AA:BB")
    }

    async fn connected_session(page_size: usize) -> (Session, MockReaderHandle) {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");

        let session = Session::builder(driver)
            .with_tag_page_size(page_size)
            .manual_dispatch()
            .build()
            .unwrap();
        session.discover().await.unwrap();
        session.connect("RFD1").await.unwrap();
        (session, handle)
    }

    #[tokio::test]
    async fn test_connect_unknown_name() {
        let (driver, _handle) = MockReader::new();
        let session = Session::builder(driver).manual_dispatch().build().unwrap();

        let result = session.connect("RFD9").await;
        assert!(matches!(result, Err(Error::DeviceNotFound(name)) if name == "RFD9"));
        assert!(matches!(
            session.disconnect("RFD9").await,
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_enables_all_event_classes() {
        let (session, handle) = connected_session(1).await;

        assert_eq!(session.active_device().await, Some(rfd1()));
        assert_eq!(handle.enabled_events(), handscan_hardware::EventClasses::all());
    }

    #[tokio::test]
    async fn test_reconnect_reenables_events_without_reopening() {
        let (session, handle) = connected_session(1).await;
        handle.clear_commands();

        assert_eq!(session.connect("RFD1").await.unwrap(), "RFD1");

        let commands = handle.commands();
        assert!(!commands.iter().any(|c| matches!(c, MockCommand::Connect(_))));
        assert!(commands.iter().any(|c| matches!(c, MockCommand::EnableEvents(..))));
    }

    #[tokio::test]
    async fn test_enable_events_fault_does_not_fail_connect() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let session = Session::builder(driver).manual_dispatch().build().unwrap();
        let mut faults = session.faults();
        session.discover().await.unwrap();
        handle.fail_next(
            MockOperation::EnableEvents,
            DriverError::invalid_usage("transport not ready"),
        );

        session.connect("RFD1").await.unwrap();

        assert_eq!(faults.try_recv().unwrap().operation, FaultOperation::EnableEvents);
        assert!(session.active_device().await.is_some());
    }

    #[tokio::test]
    async fn test_discover_fault_keeps_registry() {
        let (driver, handle) = MockReader::new();
        handle.add_device("RFD1", "AA:BB");
        let session = Session::builder(driver).manual_dispatch().build().unwrap();
        session.discover().await.unwrap();

        handle.fail_next(
            MockOperation::Discover,
            DriverError::invalid_usage("transport not ready"),
        );
        assert!(matches!(session.discover().await, Err(Error::Discovery(_))));
        assert!(session.resolve("RFD1").await.is_some());
    }

    #[tokio::test]
    async fn test_trigger_cycle_issues_one_start_and_stop() {
        let (session, handle) = connected_session(1).await;

        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;
        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;
        assert_eq!(session.inventory_state().await, InventoryState::Scanning);

        session.handle_event(DriverEvent::Trigger(TriggerEvent::Released)).await;
        session.handle_event(DriverEvent::Trigger(TriggerEvent::Released)).await;
        assert_eq!(session.inventory_state().await, InventoryState::Idle);

        assert_eq!(handle.start_count(), 1);
        assert_eq!(handle.stop_count(), 1);
    }

    #[tokio::test]
    async fn test_trigger_without_active_reader_is_ignored() {
        let (driver, handle) = MockReader::new();
        let session = Session::builder(driver).manual_dispatch().build().unwrap();

        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;

        assert_eq!(session.inventory_state().await, InventoryState::Idle);
        assert_eq!(handle.start_count(), 0);
    }

    #[tokio::test]
    async fn test_start_fault_still_transitions() {
        let (session, handle) = connected_session(1).await;
        let mut faults = session.faults();
        handle.fail_next(
            MockOperation::StartInventory,
            DriverError::operation_failure("radio busy"),
        );

        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;

        assert_eq!(session.inventory_state().await, InventoryState::Scanning);
        let fault = faults.try_recv().unwrap();
        assert_eq!(fault.operation, FaultOperation::StartInventory);
        assert_eq!(fault.device, Some(rfd1().id()));
    }

    #[tokio::test]
    async fn test_tags_forwarded_in_order() {
        let (session, handle) = connected_session(4).await;
        let mut notifications = session.notifications();

        handle.read_tags(&["E2001", "E2002"]).unwrap();
        session.handle_event(DriverEvent::TagsAvailable).await;

        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::RfidRead(vec!["E2001".into(), "E2002".into()])
        );
    }

    #[tokio::test]
    async fn test_empty_tag_batch_not_emitted() {
        let (session, _handle) = connected_session(1).await;
        let mut notifications = session.notifications();

        session.handle_event(DriverEvent::TagsAvailable).await;

        assert_eq!(notifications.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_disconnect_while_scanning_stops_first() {
        let (session, handle) = connected_session(1).await;
        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;
        handle.clear_commands();

        session.disconnect("RFD1").await.unwrap();

        let commands = handle.commands();
        assert!(matches!(commands[0], MockCommand::StopInventory(_)));
        assert!(matches!(commands[1], MockCommand::Disconnect(_)));
        assert_eq!(session.inventory_state().await, InventoryState::Idle);
        assert!(session.active_device().await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_already_disconnected_is_noop() {
        let (session, handle) = connected_session(1).await;
        session.disconnect("RFD1").await.unwrap();
        handle.clear_commands();

        session.disconnect("RFD1").await.unwrap();
        assert!(handle.commands().is_empty());
    }

    #[tokio::test]
    async fn test_active_reader_disappearing_resets_session() {
        let (session, handle) = connected_session(1).await;
        let mut notifications = session.notifications();
        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;
        handle.remove_device("RFD1");

        session.handle_event(DriverEvent::Disappeared(rfd1())).await;

        assert_eq!(
            notifications.try_recv().unwrap(),
            Notification::Disappeared("RFD1".into())
        );
        assert!(session.active_device().await.is_none());
        assert_eq!(session.inventory_state().await, InventoryState::Idle);
    }

    #[tokio::test]
    async fn test_disappeared_reader_with_live_link_is_disconnected() {
        let (session, handle) = connected_session(1).await;

        session.handle_event(DriverEvent::Disappeared(rfd1())).await;

        assert!(!handle.is_connected("RFD1"));
        assert!(session.active_device().await.is_none());
    }

    #[tokio::test]
    async fn test_discover_drops_orphaned_connection() {
        let (session, handle) = connected_session(1).await;
        session.set_scan_mode(ScanMode::Rfid).await.unwrap();
        handle.remove_device("RFD1");

        let devices = session.discover().await.unwrap();

        assert!(devices.is_empty());
        assert!(session.active_device().await.is_none());
        assert_eq!(session.reader_config().await, ReaderConfig::default());
    }

    #[tokio::test]
    async fn test_discover_keeps_present_connection() {
        let (session, handle) = connected_session(1).await;
        handle.add_device("RFD2", "CC:DD");

        let devices = session.discover().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(session.active_device().await, Some(rfd1()));
        assert!(handle.is_connected("RFD1"));
    }

    #[tokio::test]
    async fn test_stats_snapshot() {
        let (session, _handle) = connected_session(1).await;
        let _notifications = session.notifications();
        session.handle_event(DriverEvent::Trigger(TriggerEvent::Pressed)).await;
        session.handle_event(DriverEvent::Appeared(rfd1())).await;

        let stats = session.stats().await;
        assert_eq!(stats.known_devices, 1);
        assert_eq!(stats.active_device.as_deref(), Some("RFD1"));
        assert_eq!(stats.inventory_state, InventoryState::Scanning);
        assert_eq!(stats.inventory_starts, 1);
        assert_eq!(stats.notifications_emitted, 1);
        assert_eq!(stats.faults_reported, 0);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let (driver, _handle) = MockReader::new();
        let result = Session::builder(driver)
            .with_tag_page_size(0)
            .manual_dispatch()
            .build();
        assert!(matches!(result, Err(Error::Settings(_))));
    }
}
