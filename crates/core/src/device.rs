//! Device identity and support classification.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// USB vendor/product pair read from the connected device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}:{:04X}", self.vendor_id, self.product_id)
    }
}

/// Identity plus the string descriptors the transport layer fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial: Option<String>,
}

impl DeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
            ..Self::default()
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.vendor_id, self.product_id)
    }
}

/// Result of matching an identity against a device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportVerdict {
    /// Vendor is not in the table.
    NotSupported,
    /// Vendor is known but the product is not listed exactly.
    PossiblySupported,
    /// Exact vendor/product match.
    Supported,
}

/// Per-model behavior selected when a device matches its table entry exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceQuirk {
    /// Battery voltage may be reported 1.5x too high; probe and rescale.
    BatteryScale,
}

/// Product side of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductMatch {
    Exact(u16),
    /// Any product of the vendor; never better than `PossiblySupported`.
    Any,
}

/// One row of a device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEntry {
    pub vendor_id: u16,
    pub product: ProductMatch,
    pub quirks: &'static [DeviceQuirk],
}

impl DeviceEntry {
    pub const fn exact(vendor_id: u16, product_id: u16, quirks: &'static [DeviceQuirk]) -> Self {
        Self {
            vendor_id,
            product: ProductMatch::Exact(product_id),
            quirks,
        }
    }

    pub const fn any_product(vendor_id: u16) -> Self {
        Self {
            vendor_id,
            product: ProductMatch::Any,
            quirks: &[],
        }
    }
}

/// Classify an identity against a device table.
///
/// An exact row wins over everything else; a known vendor alone yields
/// `PossiblySupported`.
pub fn classify(table: &[DeviceEntry], identity: DeviceIdentity) -> SupportVerdict {
    if find_exact(table, identity).is_some() {
        return SupportVerdict::Supported;
    }
    if table.iter().any(|e| e.vendor_id == identity.vendor_id) {
        return SupportVerdict::PossiblySupported;
    }
    SupportVerdict::NotSupported
}

/// The exact table row for an identity, if any.
pub fn find_exact(table: &[DeviceEntry], identity: DeviceIdentity) -> Option<&DeviceEntry> {
    table.iter().find(|e| {
        e.vendor_id == identity.vendor_id && e.product == ProductMatch::Exact(identity.product_id)
    })
}

/// Quirks for an identity. Only exact matches carry any.
pub fn quirks_for(table: &[DeviceEntry], identity: DeviceIdentity) -> &'static [DeviceQuirk] {
    match find_exact(table, identity) {
        Some(entry) => {
            debug!(
                vid = format_args!("0x{:04X}", identity.vendor_id),
                pid = format_args!("0x{:04X}", identity.product_id),
                quirks = ?entry.quirks,
                "Device quirks selected"
            );
            entry.quirks
        }
        None => &[],
    }
}

/// Tell the user a near-match device was seen but not claimed.
pub fn report_possibly_supported(vendor_label: &str, identity: DeviceIdentity) {
    info!(
        vendor = vendor_label,
        vid = format_args!("0x{:04X}", identity.vendor_id),
        pid = format_args!("0x{:04X}", identity.product_id),
        "This {} device ({}) is not listed as supported. It may work with the \
         'productid' option set; please report the result so it can be added to the table",
        vendor_label,
        identity
    );
}
