//! Contract between a vendor subdriver and the hosting framework.

use crate::config::{DriverOptions, OptionSource};
use crate::convert::BatteryScale;
use crate::descriptor::ReportDescriptor;
use crate::device::{self, DeviceEntry, DeviceIdentity, DeviceInfo, DeviceQuirk, SupportVerdict};
use crate::engine::MappingEngine;
use crate::mapping::MappingTable;
use crate::usage::UsageChain;
use tracing::debug;

/// Option that accepts a device classified as possibly supported.
pub const PRODUCT_ID_OVERRIDE: &str = "productid";

/// A vendor subdriver: identification, tables, and descriptor fix-ups.
pub trait Subdriver {
    /// Version label, e.g. `"Zspace HID 0.1"`.
    fn version(&self) -> &'static str;

    /// Fallback manufacturer name.
    fn vendor_label(&self) -> &'static str;

    fn device_table(&self) -> &'static [DeviceEntry];

    fn usage_chain(&self) -> UsageChain;

    fn mapping_table(&self) -> MappingTable;

    /// Repair a known-defective descriptor. Returns `true` when the defect
    /// signature matched.
    fn correct_descriptor(&self, identity: DeviceIdentity, descriptor: &mut ReportDescriptor)
        -> bool;

    fn classify(&self, identity: DeviceIdentity) -> SupportVerdict {
        device::classify(self.device_table(), identity)
    }

    /// Decide whether to take ownership of a device.
    ///
    /// Near matches are accepted only when the user set `productid`.
    fn claim(&self, identity: DeviceIdentity, options: &dyn OptionSource) -> bool {
        match self.classify(identity) {
            SupportVerdict::Supported => true,
            SupportVerdict::PossiblySupported => {
                if options.has_option(PRODUCT_ID_OVERRIDE) {
                    debug!(device = %identity, "Accepting possibly supported device by override");
                    return true;
                }
                device::report_possibly_supported(self.vendor_label(), identity);
                false
            }
            SupportVerdict::NotSupported => false,
        }
    }

    fn format_model<'a>(&self, info: &'a DeviceInfo) -> Option<&'a str> {
        info.product.as_deref()
    }

    fn format_mfr<'a>(&self, info: &'a DeviceInfo) -> &'a str {
        info.manufacturer.as_deref().unwrap_or(self.vendor_label())
    }

    fn format_serial<'a>(&self, info: &'a DeviceInfo) -> Option<&'a str> {
        info.serial.as_deref()
    }

    /// Start a session for a claimed device.
    fn new_session(&self, identity: DeviceIdentity, options: DriverOptions) -> MappingEngine {
        let quirks = device::quirks_for(self.device_table(), identity);
        let battery = BatteryScale::new(quirks.contains(&DeviceQuirk::BatteryScale));
        MappingEngine::new(self.usage_chain(), self.mapping_table(), options, battery)
    }
}
