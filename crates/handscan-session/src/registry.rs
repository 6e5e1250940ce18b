//! Device registry.
//!
//! A registry is an immutable snapshot of the last discovery scan. The session
//! swaps the whole snapshot on every successful `discover`, so readers always
//! resolve names against one consistent scan, never a half-updated one.

use handscan_core::{DeviceDescriptor, DeviceId};

/// A discovered reader together with the handle used for driver calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDevice {
    pub descriptor: DeviceDescriptor,
    pub id: DeviceId,
}

impl RegisteredDevice {
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        let id = descriptor.id();
        Self { descriptor, id }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Snapshot of the readers found by one discovery scan, in scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistry {
    devices: Vec<RegisteredDevice>,
}

impl DeviceRegistry {
    /// Build a registry from a scan result, keeping scan order.
    pub fn new(descriptors: impl IntoIterator<Item = DeviceDescriptor>) -> Self {
        Self {
            devices: descriptors.into_iter().map(RegisteredDevice::new).collect(),
        }
    }

    /// Exact, case-sensitive lookup by name. The first match in scan order wins.
    pub fn resolve(&self, name: &str) -> Option<&RegisteredDevice> {
        self.devices.iter().find(|d| d.descriptor.name == name)
    }

    /// Whether the scan contains the reader with this handle.
    pub fn contains(&self, id: &DeviceId) -> bool {
        self.devices.iter().any(|d| &d.id == id)
    }

    /// Descriptors in scan order.
    pub fn descriptors(&self) -> Vec<DeviceDescriptor> {
        self.devices.iter().map(|d| d.descriptor.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
