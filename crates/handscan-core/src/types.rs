use crate::{Result, constants::MAX_POWER, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a physical reader.
///
/// Readers are keyed by their transport address (Bluetooth MAC for handheld
/// sleds); the human-readable name is only used for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device ID from a transport address.
    pub fn new(address: impl Into<String>) -> Self {
        DeviceId(address.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reader found by a discovery scan.
///
/// Descriptors are immutable and replaced wholesale on the next scan. The
/// serialized form (`{"name": .., "address": ..}`) is what consumers render.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Human-readable name, unique among currently visible readers.
    pub name: String,

    /// Transport address.
    pub address: String,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Identifier used for all driver calls against this reader.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        DeviceId::new(self.address.clone())
    }
}

/// What the handheld trigger drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanMode {
    /// Trigger starts/stops RFID inventory.
    Rfid,

    /// Trigger fires the barcode imager.
    Barcode,
}

impl ScanMode {
    /// Wire name used by the host bridge.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Rfid => "RFID",
            ScanMode::Barcode => "BARCODE",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScanMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "RFID" => Ok(ScanMode::Rfid),
            "BARCODE" => Ok(ScanMode::Barcode),
            other => Err(Error::InvalidScanMode(other.to_string())),
        }
    }
}

/// Transmit power index, validated against a reader ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransmitPower(u16);

impl TransmitPower {
    /// Create a power index within `0..=MAX_POWER`.
    ///
    /// # Errors
    /// Returns `Error::PowerOutOfRange` if `value` exceeds [`MAX_POWER`].
    pub fn new(value: u16) -> Result<Self> {
        Self::with_max(value, MAX_POWER)
    }

    /// Create a power index within `0..=max`.
    ///
    /// # Errors
    /// Returns `Error::PowerOutOfRange` if `value` exceeds `max`.
    pub fn with_max(value: u16, max: u16) -> Result<Self> {
        if value > max {
            return Err(Error::PowerOutOfRange { value, max });
        }
        Ok(TransmitPower(value))
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for TransmitPower {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last configuration applied to the active reader.
///
/// Not persisted; fields stay `None` until the corresponding setter succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub scan_mode: Option<ScanMode>,
    pub transmit_power: Option<TransmitPower>,
}
