//! Connection manager.
//!
//! Owns the explicit active-connection slot. At most one reader is active at a
//! time: it is set by a successful open and cleared by a close (or when the
//! reader is lost), and every configuration and inventory call targets it.

use handscan_core::{DeviceId, Error, Result};
use handscan_hardware::ReaderDriver;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::registry::RegisteredDevice;

/// Result of opening a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The driver opened a new connection.
    Opened,

    /// The reader was already connected; nothing was opened.
    AlreadyConnected,
}

/// Tracks and changes the active reader connection.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    active: RwLock<Option<RegisteredDevice>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active reader, if any.
    pub async fn active(&self) -> Option<RegisteredDevice> {
        self.active.read().await.clone()
    }

    /// Open a connection to `device` and make it the active reader.
    ///
    /// Opening the already active reader, or a reader the driver reports as
    /// connected, does not call `connect` again.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if a different reader is active or the
    /// driver fails; the active slot is left unchanged in both cases.
    pub async fn open<D: ReaderDriver>(
        &self,
        driver: &D,
        device: &RegisteredDevice,
    ) -> Result<OpenOutcome> {
        let mut active = self.active.write().await;

        if let Some(current) = active.as_ref()
            && current.id != device.id
        {
            return Err(Error::connection(
                device.name(),
                format!("reader {} is already active", current.name()),
            ));
        }

        let connected = driver
            .is_connected(&device.id)
            .await
            .map_err(|e| Error::connection(device.name(), e.to_string()))?;

        let outcome = if connected {
            debug!(device = device.name(), "Reader already connected");
            OpenOutcome::AlreadyConnected
        } else {
            driver
                .connect(&device.id)
                .await
                .map_err(|e| Error::connection(device.name(), e.to_string()))?;
            info!(device = device.name(), address = %device.id, "Reader connected");
            OpenOutcome::Opened
        };

        *active = Some(device.clone());
        Ok(outcome)
    }

    /// Close the connection to `device`.
    ///
    /// Closing a reader that is not connected is a no-op. Returns `true` if
    /// `device` was the active reader, which is then cleared.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the driver fails; the active slot is left
    /// unchanged.
    pub async fn close<D: ReaderDriver>(
        &self,
        driver: &D,
        device: &RegisteredDevice,
    ) -> Result<bool> {
        let mut active = self.active.write().await;

        let connected = driver
            .is_connected(&device.id)
            .await
            .map_err(|e| Error::connection(device.name(), e.to_string()))?;

        if connected {
            driver
                .disconnect(&device.id)
                .await
                .map_err(|e| Error::connection(device.name(), e.to_string()))?;
            info!(device = device.name(), "Reader disconnected");
        } else {
            debug!(device = device.name(), "Reader already disconnected");
        }

        let was_active = active.as_ref().is_some_and(|a| a.id == device.id);
        if was_active {
            *active = None;
        }
        Ok(was_active)
    }

    /// Release the active reader if it is `id` and its link is down.
    ///
    /// Used when the reader is gone (out of range or missing from a new scan).
    /// A link the driver still reports as up is disconnected first. Returns
    /// the reader that was released.
    ///
    /// # Errors
    ///
    /// Returns `Error::Connection` if the driver cannot confirm the link is
    /// down; the reader stays active so no other reader can be opened beside
    /// it.
    pub async fn release_if<D: ReaderDriver>(
        &self,
        driver: &D,
        id: &DeviceId,
    ) -> Result<Option<RegisteredDevice>> {
        let mut active = self.active.write().await;
        let Some(current) = active.as_ref().filter(|a| &a.id == id) else {
            return Ok(None);
        };

        let connected = driver
            .is_connected(id)
            .await
            .map_err(|e| Error::connection(current.name(), e.to_string()))?;
        if connected {
            driver
                .disconnect(id)
                .await
                .map_err(|e| Error::connection(current.name(), e.to_string()))?;
            info!(device = current.name(), "Lost reader disconnected");
        }
        Ok(active.take())
    }
}
