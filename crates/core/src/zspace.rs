//! ZSP subdriver.
//!
//! Some ZSP models report the battery voltage 1.5x too high; the U2600 entry
//! carries the quirk that enables the scale check. The 0x0501 model ships a
//! descriptor whose output voltage range is a copy of the high voltage
//! transfer range.

use crate::convert::{
    Conversion, NumberFormat, Transform, BEEPER_INFO, BOOST_INFO, CHARGING_INFO,
    DISCHARGING_INFO, FULLYCHARGED_INFO, LOWBATT_INFO, ONLINE_INFO, OVERLOAD_INFO,
    TEST_READ_INFO, TIMELIMITEXPIRED_INFO,
};
use crate::descriptor::{ReportDescriptor, VoltageRangeFix};
use crate::device::{DeviceEntry, DeviceIdentity, DeviceQuirk};
use crate::mapping::{DefaultValue, MappingEntry, MappingTable, PollFlags};
use crate::subdriver::Subdriver;
use crate::usage::{UsageChain, UsageTable, UsageTableEntry, HID_USAGE_TABLE};
use crate::{pids, ZSP_VID};

pub const ZSP_HID_VERSION: &str = "Zspace HID 0.1";

/// Corrected voltage logical limits. The maximum includes the vendor's
/// safety margin.
pub const ZSP_VOLTAGE_LOGMIN: i64 = 0;
pub const ZSP_VOLTAGE_LOGMAX: i64 = 511;

static ZSP_DEVICE_TABLE: &[DeviceEntry] = &[DeviceEntry::exact(
    ZSP_VID,
    pids::U2600,
    &[DeviceQuirk::BatteryScale],
)];

/// Vendor usages. None are known yet; the table still shadows the generic one.
const ZSP_USAGE_TABLE: &[UsageTableEntry] = &[];

static ZSP_USAGE_CHAIN: &[UsageTable] = &[ZSP_USAGE_TABLE, HID_USAGE_TABLE];

const ZSP_DESCRIPTOR_FIX: VoltageRangeFix = VoltageRangeFix {
    target: DeviceIdentity::new(ZSP_VID, pids::BROKEN_DESCRIPTOR),
    transfer_report: 16,
    output_report: 18,
    input_report: 15,
    logical_min: ZSP_VOLTAGE_LOGMIN,
    logical_max: ZSP_VOLTAGE_LOGMAX,
};

const STATUS: &str = "ups.status";

use MappingEntry as M;

static ZSP_HID2NUT: &[MappingEntry] = &[
    // Battery page
    M::converted(
        "battery.type",
        "UPS.PowerSummary.iDeviceChemistry",
        Conversion::Transform(Transform::StringIndex),
    ),
    M::converted(
        "battery.mfr.date",
        "UPS.PowerSummary.iOEMInformation",
        Conversion::Transform(Transform::StringIndex),
    ),
    M::read(
        "battery.charge.warning",
        "UPS.PowerSummary.WarningCapacityLimit",
        NumberFormat::INTEGER,
    ),
    M::write(
        "battery.charge.low",
        "UPS.PowerSummary.RemainingCapacityLimit",
        10,
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::SEMI_STATIC),
    M::converted(
        "battery.charge",
        "UPS.PowerSummary.RemainingCapacity",
        Conversion::Transform(Transform::BatteryCharge),
    ),
    M::read(
        "battery.runtime",
        "UPS.PowerSummary.RunTimeToEmpty",
        NumberFormat::INTEGER,
    ),
    M::write(
        "battery.runtime.low",
        "UPS.PowerSummary.RemainingTimeLimit",
        10,
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::SEMI_STATIC),
    M::read(
        "battery.voltage.nominal",
        "UPS.PowerSummary.ConfigVoltage",
        NumberFormat::INTEGER,
    ),
    M::converted(
        "battery.voltage",
        "UPS.PowerSummary.Voltage",
        Conversion::Transform(Transform::BatteryVoltage),
    ),
    // UPS page
    M::read("ups.load", "UPS.Output.PercentLoad", NumberFormat::INTEGER),
    M::converted(
        "ups.beeper.status",
        "UPS.PowerSummary.AudibleAlarmControl",
        Conversion::Lookup(BEEPER_INFO),
    ),
    M::converted(
        "ups.test.result",
        "UPS.Output.Test",
        Conversion::Lookup(TEST_READ_INFO),
    ),
    M::read(
        "ups.realpower.nominal",
        "UPS.Output.ConfigActivePower",
        NumberFormat::INTEGER,
    ),
    M::write_default(
        "ups.delay.start",
        "UPS.Output.DelayBeforeStartup",
        10,
        DefaultValue::OnDelay,
    ),
    M::write_default(
        "ups.delay.shutdown",
        "UPS.Output.DelayBeforeShutdown",
        10,
        DefaultValue::OffDelay,
    ),
    M::read(
        "ups.timer.start",
        "UPS.Output.DelayBeforeStartup",
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::read(
        "ups.timer.shutdown",
        "UPS.Output.DelayBeforeShutdown",
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::read(
        "ups.timer.reboot",
        "UPS.Output.DelayBeforeReboot",
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::QUICK_POLL),
    // Status bits, one row per flag
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.ACPresent",
        Conversion::Lookup(ONLINE_INFO),
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.Charging",
        Conversion::Lookup(CHARGING_INFO),
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.Discharging",
        Conversion::Lookup(DISCHARGING_INFO),
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.BelowRemainingCapacityLimit",
        Conversion::Lookup(LOWBATT_INFO),
    )
    .with_flags(PollFlags::QUICK_POLL),
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.FullyCharged",
        Conversion::Lookup(FULLYCHARGED_INFO),
    ),
    M::converted(
        STATUS,
        "UPS.PowerSummary.PresentStatus.RemainingTimeLimitExpired",
        Conversion::Lookup(TIMELIMITEXPIRED_INFO),
    ),
    M::converted(STATUS, "UPS.Output.Boost", Conversion::Lookup(BOOST_INFO)),
    M::converted(
        STATUS,
        "UPS.Output.Overload",
        Conversion::Lookup(OVERLOAD_INFO),
    ),
    // Input page
    M::read(
        "input.frequency",
        "UPS.Input.Frequency",
        NumberFormat::ONE_DECIMAL,
    ),
    M::read(
        "input.voltage.nominal",
        "UPS.Input.ConfigVoltage",
        NumberFormat::INTEGER,
    ),
    M::read("input.voltage", "UPS.Input.Voltage", NumberFormat::ONE_DECIMAL),
    M::write(
        "input.transfer.low",
        "UPS.Input.LowVoltageTransfer",
        10,
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::SEMI_STATIC),
    M::write(
        "input.transfer.high",
        "UPS.Input.HighVoltageTransfer",
        10,
        NumberFormat::INTEGER,
    )
    .with_flags(PollFlags::SEMI_STATIC),
    // Output page
    M::read(
        "output.frequency",
        "UPS.Output.Frequency",
        NumberFormat::ONE_DECIMAL,
    ),
    M::read("output.voltage", "UPS.Output.Voltage", NumberFormat::ONE_DECIMAL),
    M::read(
        "output.voltage.nominal",
        "UPS.Output.ConfigVoltage",
        NumberFormat::INTEGER,
    ),
    // Instant commands
    M::command(
        "test.battery.start.quick",
        "UPS.Output.Test",
        DefaultValue::Literal("1"),
    ),
    M::command(
        "test.battery.start.deep",
        "UPS.Output.Test",
        DefaultValue::Literal("2"),
    ),
    M::command(
        "test.battery.stop",
        "UPS.Output.Test",
        DefaultValue::Literal("3"),
    ),
    M::command(
        "load.off.delay",
        "UPS.Output.DelayBeforeShutdown",
        DefaultValue::OffDelay,
    ),
    M::command(
        "load.on.delay",
        "UPS.Output.DelayBeforeStartup",
        DefaultValue::OnDelay,
    ),
    M::command(
        "shutdown.stop",
        "UPS.Output.DelayBeforeShutdown",
        DefaultValue::Literal("-1"),
    ),
    M::command(
        "shutdown.reboot",
        "UPS.Output.DelayBeforeReboot",
        DefaultValue::Literal("10"),
    ),
    M::command(
        "beeper.on",
        "UPS.PowerSummary.AudibleAlarmControl",
        DefaultValue::Literal("2"),
    ),
    M::command(
        "beeper.off",
        "UPS.PowerSummary.AudibleAlarmControl",
        DefaultValue::Literal("3"),
    ),
    M::command(
        "beeper.enable",
        "UPS.PowerSummary.AudibleAlarmControl",
        DefaultValue::Literal("2"),
    ),
    M::command(
        "beeper.disable",
        "UPS.PowerSummary.AudibleAlarmControl",
        DefaultValue::Literal("1"),
    ),
    M::command(
        "beeper.mute",
        "UPS.PowerSummary.AudibleAlarmControl",
        DefaultValue::Literal("3"),
    ),
];

/// The ZSP subdriver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZspaceSubdriver;

impl Subdriver for ZspaceSubdriver {
    fn version(&self) -> &'static str {
        ZSP_HID_VERSION
    }

    fn vendor_label(&self) -> &'static str {
        "ZSP"
    }

    fn device_table(&self) -> &'static [DeviceEntry] {
        ZSP_DEVICE_TABLE
    }

    fn usage_chain(&self) -> UsageChain {
        UsageChain::new(ZSP_USAGE_CHAIN)
    }

    fn mapping_table(&self) -> MappingTable {
        MappingTable::new(ZSP_HID2NUT)
    }

    fn correct_descriptor(
        &self,
        identity: DeviceIdentity,
        descriptor: &mut ReportDescriptor,
    ) -> bool {
        ZSP_DESCRIPTOR_FIX.apply(identity, descriptor)
    }
}
