//! Best-effort hardware metadata lookup.
//!
//! At construction a node asks the device-enumeration source for the serial
//! number and model of the radio behind its network address. A miss leaves
//! the metadata absent: degraded but valid, never an error.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One entry from the device-enumeration source.
///
/// Enumeration backends differ in what they expose: newer devices report a
/// `product` string, older ones only a `type`. Both are optional; the model
/// lookup prefers `product` and falls back to `device_type`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Network address of the device.
    pub addr: String,

    /// Hardware serial number, if the backend exposes one.
    #[serde(default)]
    pub serial: Option<String>,

    /// Product string (e.g. "B200"), if the backend exposes one.
    #[serde(default)]
    pub product: Option<String>,

    /// Device type string, reported by backends that lack `product`.
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
}

/// The device-enumeration source a node queries once at construction.
pub trait DeviceDirectory: Send + Sync {
    /// Enumerate the currently visible devices.
    fn devices(&self) -> Vec<DeviceRecord>;
}

impl DeviceDirectory for Vec<DeviceRecord> {
    fn devices(&self) -> Vec<DeviceRecord> {
        self.clone()
    }
}

/// Hardware metadata resolved for one node. Either field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HardwareInfo {
    /// Hardware serial number.
    pub serial: Option<String>,
    /// Product or device-type string.
    pub model: Option<String>,
}

impl HardwareInfo {
    /// Whether the enumeration lookup produced anything at all.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.serial.is_some() || self.model.is_some()
    }
}

/// Look up serial and model for the device at `identifier`.
///
/// Matches on the record address; the model prefers `product` and falls
/// back to `device_type`. No match yields the empty [`HardwareInfo`].
pub fn resolve_hardware(identifier: &str, directory: &dyn DeviceDirectory) -> HardwareInfo {
    for record in directory.devices() {
        if record.addr == identifier {
            return HardwareInfo {
                serial: record.serial,
                model: record.product.or(record.device_type),
            };
        }
    }
    debug!(identifier, "device enumeration has no entry for this address");
    HardwareInfo::default()
}
