//! Parsed report descriptor snapshot and descriptor fix-ups.
//!
//! The transport layer parses the device's report descriptor and hands over a
//! flat list of fields together with the raw integers last read from each
//! report. Interpretation against the declared logical range happens here, so
//! a fix-up applied before the first poll changes what the engine reads.

use crate::device::DeviceIdentity;
use crate::usage::power;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One data item of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportField {
    pub report_id: u8,
    /// Usage codes from the outermost collection down to the item itself.
    pub path: Vec<u32>,
    pub logical_min: i64,
    pub logical_max: i64,
    /// Power of ten applied to the logical value (HID unit exponent).
    pub unit_exponent: i8,
    /// Integer extracted from the report.
    pub raw: i64,
}

impl ReportField {
    pub fn new(report_id: u8, path: Vec<u32>, logical_min: i64, logical_max: i64) -> Self {
        Self {
            report_id,
            path,
            logical_min,
            logical_max,
            unit_exponent: 0,
            raw: 0,
        }
    }

    pub fn with_raw(mut self, raw: i64) -> Self {
        self.raw = raw;
        self
    }

    pub fn with_unit_exponent(mut self, exponent: i8) -> Self {
        self.unit_exponent = exponent;
        self
    }

    /// Usage code of the item itself.
    pub fn usage(&self) -> Option<u32> {
        self.path.last().copied()
    }

    pub fn logical_range(&self) -> (i64, i64) {
        (self.logical_min, self.logical_max)
    }

    /// The raw value, or `None` when it lies outside the logical range.
    pub fn logical_value(&self) -> Option<i64> {
        (self.logical_min..=self.logical_max)
            .contains(&self.raw)
            .then_some(self.raw)
    }

    /// Logical value scaled by the unit exponent.
    pub fn physical_value(&self) -> Option<f64> {
        self.logical_value()
            .map(|v| v as f64 * 10f64.powi(i32::from(self.unit_exponent)))
    }
}

/// All fields of a device, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDescriptor {
    pub fields: Vec<ReportField>,
}

impl ReportDescriptor {
    pub fn new(fields: Vec<ReportField>) -> Self {
        Self { fields }
    }

    /// First field in `report_id` whose item usage is `usage`.
    pub fn find_field(&self, report_id: u8, usage: u32) -> Option<&ReportField> {
        self.fields
            .iter()
            .find(|f| f.report_id == report_id && f.usage() == Some(usage))
    }

    pub fn find_field_mut(&mut self, report_id: u8, usage: u32) -> Option<&mut ReportField> {
        self.fields
            .iter_mut()
            .find(|f| f.report_id == report_id && f.usage() == Some(usage))
    }

    /// First field with exactly this path, optionally restricted to one report.
    pub fn find_by_path(&self, path: &[u32], report_id: Option<u8>) -> Option<&ReportField> {
        self.fields
            .iter()
            .find(|f| f.path == path && report_id.map_or(true, |id| f.report_id == id))
    }
}

/// Repair for descriptors that copy the high-voltage-transfer logical range
/// onto the output voltage item.
///
/// When the output voltage range equals the transfer range bit for bit, the
/// output (and input, if present) voltage ranges are replaced with fixed
/// limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoltageRangeFix {
    pub target: DeviceIdentity,
    pub transfer_report: u8,
    pub output_report: u8,
    pub input_report: u8,
    pub logical_min: i64,
    pub logical_max: i64,
}

impl VoltageRangeFix {
    /// Apply the fix. Returns `true` when the defect signature was found.
    pub fn apply(&self, identity: DeviceIdentity, descriptor: &mut ReportDescriptor) -> bool {
        if identity != self.target {
            return false;
        }

        debug!(
            vid = format_args!("0x{:04X}", identity.vendor_id),
            pid = format_args!("0x{:04X}", identity.product_id),
            "Attempting report descriptor fix"
        );

        let Some(hvt) = descriptor.find_field(self.transfer_report, power::HIGH_VOLTAGE_TRANSFER)
        else {
            return false;
        };
        let hvt_range = hvt.logical_range();
        debug!(
            logical_min = hvt_range.0,
            logical_max = hvt_range.1,
            "High voltage transfer range"
        );

        let Some(output) = descriptor.find_field_mut(self.output_report, power::VOLTAGE) else {
            return false;
        };
        debug!(
            logical_min = output.logical_min,
            logical_max = output.logical_max,
            "Output voltage range"
        );
        if output.logical_range() != hvt_range {
            return false;
        }

        output.logical_min = self.logical_min;
        output.logical_max = self.logical_max;
        debug!(
            logical_min = self.logical_min,
            logical_max = self.logical_max,
            "Fixed output voltage range"
        );

        if let Some(input) = descriptor.find_field_mut(self.input_report, power::VOLTAGE) {
            debug!(
                logical_min = input.logical_min,
                logical_max = input.logical_max,
                "Input voltage range"
            );
            input.logical_min = self.logical_min;
            input.logical_max = self.logical_max;
            debug!(
                logical_min = self.logical_min,
                logical_max = self.logical_max,
                "Fixed input voltage range"
            );
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usage::power::{HIGH_VOLTAGE_TRANSFER, VOLTAGE};

    const UPS: u32 = 0x0084_0004;
    const INPUT: u32 = 0x0084_001a;
    const OUTPUT: u32 = 0x0084_001c;

    const FIX: VoltageRangeFix = VoltageRangeFix {
        target: DeviceIdentity::new(0x36AA, 0x0501),
        transfer_report: 16,
        output_report: 18,
        input_report: 15,
        logical_min: 0,
        logical_max: 511,
    };

    fn broken(hvt: (i64, i64), output: (i64, i64)) -> ReportDescriptor {
        ReportDescriptor::new(vec![
            ReportField::new(15, vec![UPS, INPUT, VOLTAGE], 0, 255),
            ReportField::new(16, vec![UPS, INPUT, HIGH_VOLTAGE_TRANSFER], hvt.0, hvt.1),
            ReportField::new(18, vec![UPS, OUTPUT, VOLTAGE], output.0, output.1),
        ])
    }

    #[test]
    fn raw_outside_logical_range_is_uninterpretable() {
        let field = ReportField::new(18, vec![UPS, OUTPUT, VOLTAGE], 0, 127).with_raw(230);
        assert_eq!(field.logical_value(), None);
        assert_eq!(field.physical_value(), None);

        let field = ReportField::new(18, vec![UPS, OUTPUT, VOLTAGE], 0, 511).with_raw(230);
        assert_eq!(field.logical_value(), Some(230));
        assert_eq!(field.physical_value(), Some(230.0));
    }

    #[test]
    fn unit_exponent_scales_physical_value() {
        let field = ReportField::new(15, vec![UPS, INPUT, VOLTAGE], 0, 5000)
            .with_raw(2296)
            .with_unit_exponent(-1);
        let v = field.physical_value().unwrap();
        assert!((v - 229.6).abs() < 1e-9);
        assert!(ReportField::new(1, vec![VOLTAGE], -1, 10).with_raw(-1).logical_value().is_some());
    }

    #[test]
    fn finds_field_by_report_and_usage() {
        let desc = broken((170, 300), (170, 300));
        let f = desc.find_field(18, VOLTAGE).unwrap();
        assert_eq!(f.path, vec![UPS, OUTPUT, VOLTAGE]);
        assert!(desc.find_field(17, VOLTAGE).is_none());
    }

    #[test]
    fn finds_field_by_path_with_optional_report() {
        let desc = broken((170, 300), (170, 300));
        assert!(desc.find_by_path(&[UPS, OUTPUT, VOLTAGE], None).is_some());
        assert!(desc.find_by_path(&[UPS, OUTPUT, VOLTAGE], Some(18)).is_some());
        assert!(desc.find_by_path(&[UPS, OUTPUT, VOLTAGE], Some(15)).is_none());
    }

    #[test]
    fn fixes_matching_ranges() {
        let mut desc = broken((170, 300), (170, 300));
        assert!(FIX.apply(FIX.target, &mut desc));
        assert_eq!(desc.find_field(18, VOLTAGE).unwrap().logical_range(), (0, 511));
        assert_eq!(desc.find_field(15, VOLTAGE).unwrap().logical_range(), (0, 511));
        // Transfer limit itself is left alone.
        assert_eq!(
            desc.find_field(16, HIGH_VOLTAGE_TRANSFER).unwrap().logical_range(),
            (170, 300)
        );
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut desc = broken((170, 300), (170, 300));
        assert!(FIX.apply(FIX.target, &mut desc));
        let once = desc.clone();
        assert!(!FIX.apply(FIX.target, &mut desc));
        assert_eq!(desc, once);
    }

    #[test]
    fn distinct_ranges_are_untouched() {
        let mut desc = broken((170, 300), (0, 400));
        let before = desc.clone();
        assert!(!FIX.apply(FIX.target, &mut desc));
        assert_eq!(desc, before);
    }

    #[test]
    fn other_devices_pass_through() {
        let mut desc = broken((170, 300), (170, 300));
        let before = desc.clone();
        assert!(!FIX.apply(DeviceIdentity::new(0x36AA, 0x0101), &mut desc));
        assert!(!FIX.apply(DeviceIdentity::new(0x0764, 0x0501), &mut desc));
        assert_eq!(desc, before);
    }

    #[test]
    fn missing_fields_are_a_silent_no_op() {
        let mut desc = ReportDescriptor::new(vec![ReportField::new(
            18,
            vec![UPS, OUTPUT, VOLTAGE],
            170,
            300,
        )]);
        let before = desc.clone();
        assert!(!FIX.apply(FIX.target, &mut desc));
        assert_eq!(desc, before);

        let mut empty = ReportDescriptor::default();
        assert!(!FIX.apply(FIX.target, &mut empty));
    }

    #[test]
    fn input_field_is_optional() {
        let mut desc = ReportDescriptor::new(vec![
            ReportField::new(16, vec![UPS, INPUT, HIGH_VOLTAGE_TRANSFER], 170, 300),
            ReportField::new(18, vec![UPS, OUTPUT, VOLTAGE], 170, 300),
        ]);
        assert!(FIX.apply(FIX.target, &mut desc));
        assert_eq!(desc.find_field(18, VOLTAGE).unwrap().logical_range(), (0, 511));
    }
}
