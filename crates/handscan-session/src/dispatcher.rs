//! Event dispatcher.
//!
//! Routes driver events, which arrive on the driver's callback path
//! concurrently with consumer calls:
//!
//! - presence events go to the notifier (and a lost active reader is cleared)
//! - trigger events drive the inventory controller, which issues start/stop
//! - tag-read events are fetched a page at a time and forwarded as `onRfidRead`
//!
//! Lock order is inventory first, then the active connection. Trigger commands
//! are issued while the inventory lock is held, so they reach the driver in
//! event order.

use std::sync::Arc;

use handscan_core::DeviceDescriptor;
use handscan_hardware::{DriverEvent, EventClasses, ReaderDriver, TriggerEvent};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, trace, warn};

use crate::fault::{FaultOperation, SessionFault};
use crate::inventory::InventoryCommand;
use crate::notifier::Notification;
use crate::registry::RegisteredDevice;
use crate::session::SessionInner;

/// Consume driver events until the stream closes.
pub(crate) async fn run(inner: Arc<SessionInner>, mut events: broadcast::Receiver<DriverEvent>) {
    debug!("Event dispatcher started");

    loop {
        match events.recv().await {
            Ok(event) => dispatch(&inner, event).await,
            Err(RecvError::Lagged(skipped)) => {
                inner.faults.report(SessionFault::new(
                    FaultOperation::EventStream,
                    None,
                    format!("Dispatcher fell behind, {skipped} driver events lost"),
                ));
            }
            Err(RecvError::Closed) => {
                debug!("Driver event stream closed");
                break;
            }
        }
    }
}

/// Route one driver event.
pub(crate) async fn dispatch(inner: &SessionInner, event: DriverEvent) {
    match event {
        DriverEvent::Appeared(descriptor) => {
            info!(device = %descriptor.name, address = %descriptor.address, "Reader appeared");
            inner.notifier.emit(Notification::Appeared(descriptor.name));
        }
        DriverEvent::Disappeared(descriptor) => {
            info!(device = %descriptor.name, "Reader disappeared");
            reader_lost(inner, &descriptor).await;
            inner.notifier.emit(Notification::Disappeared(descriptor.name));
        }
        DriverEvent::Trigger(trigger) => {
            debug!(?trigger, "Status notification");
            on_trigger(inner, trigger).await;
        }
        DriverEvent::TagsAvailable => on_tags_available(inner).await,
        other => trace!(event = ?other, "Ignoring driver event"),
    }
}

/// Enable presence, trigger and tag-read events for a freshly opened reader.
///
/// A failure is reported as a fault; the connection stays usable.
pub(crate) async fn enable_events(inner: &SessionInner, device: &RegisteredDevice) {
    match inner
        .driver
        .enable_events(&device.id, EventClasses::all())
        .await
    {
        Ok(()) => debug!(device = device.name(), "Reader events enabled"),
        Err(e) => inner.faults.report(SessionFault::new(
            FaultOperation::EnableEvents,
            Some(device.id.clone()),
            format!("Configure reader: {e}"),
        )),
    }
}

async fn on_trigger(inner: &SessionInner, trigger: TriggerEvent) {
    let mut inventory = inner.inventory.lock().await;

    let Some(active) = inner.connection.active().await else {
        debug!(?trigger, "No active reader, trigger ignored");
        return;
    };

    let Some(command) = inventory.on_trigger(trigger) else {
        trace!(?trigger, state = %inventory.current_state(), "Trigger does not change state");
        return;
    };

    info!(device = active.name(), state = %inventory.current_state(), ?command, "Inventory");
    let (operation, result) = match command {
        InventoryCommand::Start => (
            FaultOperation::StartInventory,
            inner.driver.start_inventory(&active.id).await,
        ),
        InventoryCommand::Stop => (
            FaultOperation::StopInventory,
            inner.driver.stop_inventory(&active.id).await,
        ),
    };

    if let Err(e) = result {
        inner.faults.report(SessionFault::new(
            operation,
            Some(active.id.clone()),
            e.to_string(),
        ));
    }
}

async fn on_tags_available(inner: &SessionInner) {
    let Some(active) = inner.connection.active().await else {
        debug!("No active reader, tag read dropped");
        return;
    };

    let tags = match inner
        .driver
        .fetch_read_tags(&active.id, inner.config.tag_page_size)
        .await
    {
        Ok(tags) => tags,
        Err(e) => {
            inner.faults.report(SessionFault::new(
                FaultOperation::FetchReadTags,
                Some(active.id.clone()),
                e.to_string(),
            ));
            return;
        }
    };

    if tags.is_empty() {
        trace!(device = active.name(), "Empty tag batch");
        return;
    }

    let ids: Vec<String> = tags.into_iter().map(|tag| tag.tag_id).collect();
    debug!(device = active.name(), count = ids.len(), "Tags read");
    inner.notifier.emit(Notification::RfidRead(ids));
}

/// Drop the active connection if `descriptor` is the active reader.
async fn reader_lost(inner: &SessionInner, descriptor: &DeviceDescriptor) {
    let mut inventory = inner.inventory.lock().await;
    let id = descriptor.id();

    match inner.connection.release_if(&inner.driver, &id).await {
        Ok(Some(_)) => {
            warn!(device = %descriptor.name, state = %inventory.current_state(), "Active reader lost");
            inventory.reset();
            inner.configurator.reset().await;
        }
        Ok(None) => {}
        Err(e) => inner.faults.report(SessionFault::new(
            FaultOperation::Disconnect,
            Some(id),
            e.to_string(),
        )),
    }
}
