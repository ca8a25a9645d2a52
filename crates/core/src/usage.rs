//! HID usage tables and symbolic path resolution.
//!
//! A usage code is a 32-bit value: usage page in the upper 16 bits, usage ID
//! in the lower 16. Tables are chained vendor-first so that a vendor reusing a
//! generic code for a different meaning shadows the generic name.

use crate::error::{Error, Result};

/// One symbolic name for a usage code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageTableEntry {
    pub name: &'static str,
    pub code: u32,
}

/// A static usage table.
pub type UsageTable = &'static [UsageTableEntry];

const fn u(name: &'static str, code: u32) -> UsageTableEntry {
    UsageTableEntry { name, code }
}

/// Ordered chain of usage tables. Earlier tables win on collisions.
#[derive(Debug, Clone, Copy)]
pub struct UsageChain {
    tables: &'static [UsageTable],
}

impl UsageChain {
    pub const fn new(tables: &'static [UsageTable]) -> Self {
        Self { tables }
    }

    /// Name for a usage code, first table first.
    pub fn resolve(&self, code: u32) -> Option<&'static str> {
        self.tables
            .iter()
            .flat_map(|t| t.iter())
            .find(|e| e.code == code)
            .map(|e| e.name)
    }

    /// Usage code for a name, first table first.
    pub fn resolve_reverse(&self, name: &str) -> Option<u32> {
        self.tables
            .iter()
            .flat_map(|t| t.iter())
            .find(|e| e.name == name)
            .map(|e| e.code)
    }

    /// Resolve a dotted path such as `UPS.PowerSummary.Voltage`.
    ///
    /// Nodes in no table may be given numerically (`0x00840030`); anything else
    /// is an error.
    pub fn resolve_path(&self, path: &str) -> Result<Vec<u32>> {
        path.split('.')
            .map(|node| {
                self.resolve_reverse(node)
                    .or_else(|| parse_numeric_node(node))
                    .ok_or_else(|| Error::UnresolvedPath {
                        path: path.to_string(),
                        node: node.to_string(),
                    })
            })
            .collect()
    }

    /// Render a numeric path back to dotted form. Unknown codes print as hex.
    pub fn format_path(&self, codes: &[u32]) -> String {
        codes
            .iter()
            .map(|&c| match self.resolve(c) {
                Some(name) => name.to_string(),
                None => format!("0x{c:08x}"),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn parse_numeric_node(node: &str) -> Option<u32> {
    let hex = node
        .strip_prefix("0x")
        .or_else(|| node.strip_prefix("0X"))?;
    u32::from_str_radix(hex, 16).ok()
}

/// Power Device page (0x84) usage IDs used outside table lookups.
pub mod power {
    pub const VOLTAGE: u32 = 0x0084_0030;
    pub const HIGH_VOLTAGE_TRANSFER: u32 = 0x0084_0054;
}

/// Generic HID usages for power devices (pages 0x84 and 0x85).
pub const HID_USAGE_TABLE: &[UsageTableEntry] = &[
    // Power Device page
    u("Undefined", 0x0084_0000),
    u("iName", 0x0084_0001),
    u("PresentStatus", 0x0084_0002),
    u("ChangedStatus", 0x0084_0003),
    u("UPS", 0x0084_0004),
    u("PowerSupply", 0x0084_0005),
    u("BatterySystem", 0x0084_0010),
    u("BatterySystemID", 0x0084_0011),
    u("Battery", 0x0084_0012),
    u("BatteryID", 0x0084_0013),
    u("Charger", 0x0084_0014),
    u("ChargerID", 0x0084_0015),
    u("PowerConverter", 0x0084_0016),
    u("PowerConverterID", 0x0084_0017),
    u("OutletSystem", 0x0084_0018),
    u("OutletSystemID", 0x0084_0019),
    u("Input", 0x0084_001a),
    u("InputID", 0x0084_001b),
    u("Output", 0x0084_001c),
    u("OutputID", 0x0084_001d),
    u("Flow", 0x0084_001e),
    u("FlowID", 0x0084_001f),
    u("Outlet", 0x0084_0020),
    u("OutletID", 0x0084_0021),
    u("Gang", 0x0084_0022),
    u("GangID", 0x0084_0023),
    u("PowerSummary", 0x0084_0024),
    u("PowerSummaryID", 0x0084_0025),
    u("Voltage", 0x0084_0030),
    u("Current", 0x0084_0031),
    u("Frequency", 0x0084_0032),
    u("ApparentPower", 0x0084_0033),
    u("ActivePower", 0x0084_0034),
    u("PercentLoad", 0x0084_0035),
    u("Temperature", 0x0084_0036),
    u("Humidity", 0x0084_0037),
    u("BadCount", 0x0084_0038),
    u("ConfigVoltage", 0x0084_0040),
    u("ConfigCurrent", 0x0084_0041),
    u("ConfigFrequency", 0x0084_0042),
    u("ConfigApparentPower", 0x0084_0043),
    u("ConfigActivePower", 0x0084_0044),
    u("ConfigPercentLoad", 0x0084_0045),
    u("ConfigTemperature", 0x0084_0046),
    u("ConfigHumidity", 0x0084_0047),
    u("SwitchOnControl", 0x0084_0050),
    u("SwitchOffControl", 0x0084_0051),
    u("ToggleControl", 0x0084_0052),
    u("LowVoltageTransfer", 0x0084_0053),
    u("HighVoltageTransfer", 0x0084_0054),
    u("DelayBeforeReboot", 0x0084_0055),
    u("DelayBeforeStartup", 0x0084_0056),
    u("DelayBeforeShutdown", 0x0084_0057),
    u("Test", 0x0084_0058),
    u("ModuleReset", 0x0084_0059),
    u("AudibleAlarmControl", 0x0084_005a),
    u("Present", 0x0084_0060),
    u("Good", 0x0084_0061),
    u("InternalFailure", 0x0084_0062),
    u("VoltageOutOfRange", 0x0084_0063),
    u("FrequencyOutOfRange", 0x0084_0064),
    u("Overload", 0x0084_0065),
    u("OverCharged", 0x0084_0066),
    u("OverTemperature", 0x0084_0067),
    u("ShutdownRequested", 0x0084_0068),
    u("ShutdownImminent", 0x0084_0069),
    u("SwitchOnOff", 0x0084_006b),
    u("Switchable", 0x0084_006c),
    u("Used", 0x0084_006d),
    u("Boost", 0x0084_006e),
    u("Buck", 0x0084_006f),
    u("Initialized", 0x0084_0070),
    u("Tested", 0x0084_0071),
    u("AwaitingPower", 0x0084_0072),
    u("CommunicationLost", 0x0084_0073),
    u("iManufacturer", 0x0084_00fd),
    u("iProduct", 0x0084_00fe),
    u("iSerialNumber", 0x0084_00ff),
    // Battery System page
    u("Undefined", 0x0085_0000),
    u("SMBBatteryMode", 0x0085_0001),
    u("SMBBatteryStatus", 0x0085_0002),
    u("SMBAlarmWarning", 0x0085_0003),
    u("SMBChargerMode", 0x0085_0004),
    u("SMBChargerStatus", 0x0085_0005),
    u("SMBChargerSpecInfo", 0x0085_0006),
    u("SMBSelectorState", 0x0085_0007),
    u("SMBSelectorPresets", 0x0085_0008),
    u("SMBSelectorInfo", 0x0085_0009),
    u("RemainingCapacityLimit", 0x0085_0029),
    u("RemainingTimeLimit", 0x0085_002a),
    u("AtRate", 0x0085_002b),
    u("CapacityMode", 0x0085_002c),
    u("BroadcastToCharger", 0x0085_002d),
    u("PrimaryBattery", 0x0085_002e),
    u("ChargeController", 0x0085_002f),
    u("TerminateCharge", 0x0085_0040),
    u("TerminateDischarge", 0x0085_0041),
    u("BelowRemainingCapacityLimit", 0x0085_0042),
    u("RemainingTimeLimitExpired", 0x0085_0043),
    u("Charging", 0x0085_0044),
    u("Discharging", 0x0085_0045),
    u("FullyCharged", 0x0085_0046),
    u("FullyDischarged", 0x0085_0047),
    u("ConditioningFlag", 0x0085_0048),
    u("AtRateOK", 0x0085_0049),
    u("SMBErrorCode", 0x0085_004a),
    u("NeedReplacement", 0x0085_004b),
    u("AtRateTimeToFull", 0x0085_0060),
    u("AtRateTimeToEmpty", 0x0085_0061),
    u("AverageCurrent", 0x0085_0062),
    u("MaxError", 0x0085_0063),
    u("RelativeStateOfCharge", 0x0085_0064),
    u("AbsoluteStateOfCharge", 0x0085_0065),
    u("RemainingCapacity", 0x0085_0066),
    u("FullChargeCapacity", 0x0085_0067),
    u("RunTimeToEmpty", 0x0085_0068),
    u("AverageTimeToEmpty", 0x0085_0069),
    u("AverageTimeToFull", 0x0085_006a),
    u("CycleCount", 0x0085_006b),
    u("BattPackModelLevel", 0x0085_0080),
    u("InternalChargeController", 0x0085_0081),
    u("PrimaryBatterySupport", 0x0085_0082),
    u("DesignCapacity", 0x0085_0083),
    u("SpecificationInfo", 0x0085_0084),
    u("ManufacturerDate", 0x0085_0085),
    u("SerialNumber", 0x0085_0086),
    u("iManufacturerName", 0x0085_0087),
    u("iDeviceName", 0x0085_0088),
    u("iDeviceChemistry", 0x0085_0089),
    u("ManufacturerData", 0x0085_008a),
    u("Rechargeable", 0x0085_008b),
    u("WarningCapacityLimit", 0x0085_008c),
    u("CapacityGranularity1", 0x0085_008d),
    u("CapacityGranularity2", 0x0085_008e),
    u("iOEMInformation", 0x0085_008f),
    u("InhibitCharge", 0x0085_00c0),
    u("EnablePolling", 0x0085_00c1),
    u("ResetToZero", 0x0085_00c2),
    u("ACPresent", 0x0085_00d0),
    u("BatteryPresent", 0x0085_00d1),
    u("PowerFail", 0x0085_00d2),
    u("AlarmInhibited", 0x0085_00d3),
    u("ThermistorUnderRange", 0x0085_00d4),
    u("ThermistorHot", 0x0085_00d5),
    u("ThermistorCold", 0x0085_00d6),
    u("ThermistorOverRange", 0x0085_00d7),
    u("VoltageOutOfRange", 0x0085_00d8),
    u("CurrentOutOfRange", 0x0085_00d9),
    u("CurrentNotRegulated", 0x0085_00da),
    u("VoltageNotRegulated", 0x0085_00db),
    u("MasterMode", 0x0085_00dc),
    u("ChargerSelectorSupport", 0x0085_00f0),
    u("ChargerSpec", 0x0085_00f1),
    u("Level2", 0x0085_00f2),
    u("Level3", 0x0085_00f3),
];

#[cfg(test)]
mod tests {
    use super::*;

    const VENDOR: &[UsageTableEntry] = &[
        u("VendorVoltage", 0x0084_0030),
        u("VendorSpecial", 0xff86_0001),
    ];
    static CHAIN: &[UsageTable] = &[VENDOR, HID_USAGE_TABLE];
    static GENERIC_ONLY: &[UsageTable] = &[HID_USAGE_TABLE];

    #[test]
    fn vendor_table_shadows_generic() {
        let chain = UsageChain::new(CHAIN);
        assert_eq!(chain.resolve(0x0084_0030), Some("VendorVoltage"));
        assert_eq!(chain.resolve(0xff86_0001), Some("VendorSpecial"));
        // Generic name still resolves in reverse; only the forward direction is shadowed.
        assert_eq!(chain.resolve_reverse("Voltage"), Some(0x0084_0030));
    }

    #[test]
    fn generic_fallback() {
        let chain = UsageChain::new(CHAIN);
        assert_eq!(chain.resolve(0x0085_0066), Some("RemainingCapacity"));
        assert_eq!(chain.resolve_reverse("PowerSummary"), Some(0x0084_0024));
    }

    #[test]
    fn unknown_is_none() {
        let chain = UsageChain::new(GENERIC_ONLY);
        assert_eq!(chain.resolve(0xdead_beef), None);
        assert_eq!(chain.resolve_reverse("NoSuchUsage"), None);
    }

    #[test]
    fn resolves_dotted_path() {
        let chain = UsageChain::new(GENERIC_ONLY);
        let path = chain.resolve_path("UPS.PowerSummary.Voltage").unwrap();
        assert_eq!(path, vec![0x0084_0004, 0x0084_0024, 0x0084_0030]);
    }

    #[test]
    fn numeric_nodes_pass_through() {
        let chain = UsageChain::new(GENERIC_ONLY);
        let path = chain.resolve_path("UPS.0xff860001").unwrap();
        assert_eq!(path, vec![0x0084_0004, 0xff86_0001]);
        assert_eq!(chain.format_path(&path), "UPS.0xff860001");
    }

    #[test]
    fn unresolvable_node_is_reported() {
        let chain = UsageChain::new(GENERIC_ONLY);
        match chain.resolve_path("UPS.Bogus.Voltage") {
            Err(Error::UnresolvedPath { node, .. }) => assert_eq!(node, "Bogus"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn power_constants_match_table() {
        let chain = UsageChain::new(GENERIC_ONLY);
        assert_eq!(chain.resolve(power::VOLTAGE), Some("Voltage"));
        assert_eq!(
            chain.resolve(power::HIGH_VOLTAGE_TRANSFER),
            Some("HighVoltageTransfer")
        );
    }
}
