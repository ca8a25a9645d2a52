//! Property tests for device classification, descriptor repair, and the
//! battery conversions.

use proptest::prelude::*;
use std::collections::HashMap;
use zspace_hid_core::config::DriverOptions;
use zspace_hid_core::convert::{battery_charge, BatteryScale, NOMINAL_BATTERY_VOLTAGE};
use zspace_hid_core::descriptor::{ReportDescriptor, ReportField};
use zspace_hid_core::device::{DeviceIdentity, SupportVerdict};
use zspace_hid_core::subdriver::Subdriver;
use zspace_hid_core::usage::power::{HIGH_VOLTAGE_TRANSFER, VOLTAGE};
use zspace_hid_core::zspace::ZspaceSubdriver;
use zspace_hid_core::{pids, ZSP_VID};

const UPS: u32 = 0x0084_0004;
const INPUT: u32 = 0x0084_001a;
const OUTPUT: u32 = 0x0084_001c;

fn nominal(value: f64) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    vars.insert(NOMINAL_BATTERY_VOLTAGE.to_string(), format!("{value}"));
    vars
}

fn descriptor(hvt: (i64, i64), output: (i64, i64), input: Option<(i64, i64)>) -> ReportDescriptor {
    let mut fields = vec![
        ReportField::new(16, vec![UPS, INPUT, HIGH_VOLTAGE_TRANSFER], hvt.0, hvt.1),
        ReportField::new(18, vec![UPS, OUTPUT, VOLTAGE], output.0, output.1),
    ];
    if let Some((min, max)) = input {
        fields.push(ReportField::new(15, vec![UPS, INPUT, VOLTAGE], min, max));
    }
    ReportDescriptor::new(fields)
}

fn range() -> impl Strategy<Value = (i64, i64)> {
    (-1024i64..1024, -1024i64..1024)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(500))]

    #[test]
    fn prop_other_vendors_not_supported(vid in any::<u16>(), pid in any::<u16>()) {
        prop_assume!(vid != ZSP_VID);
        let zsp = ZspaceSubdriver;
        let id = DeviceIdentity::new(vid, pid);
        prop_assert_eq!(zsp.classify(id), SupportVerdict::NotSupported);
        let opts = DriverOptions { productid: Some(format!("{pid:04x}")), ..DriverOptions::default() };
        prop_assert!(!zsp.claim(id, &opts));
    }

    #[test]
    fn prop_unlisted_zsp_products_need_override(pid in any::<u16>()) {
        prop_assume!(pid != pids::U2600);
        let zsp = ZspaceSubdriver;
        let id = DeviceIdentity::new(ZSP_VID, pid);
        prop_assert_eq!(zsp.classify(id), SupportVerdict::PossiblySupported);
        prop_assert!(!zsp.claim(id, &DriverOptions::default()));
        let opts = DriverOptions { productid: Some(format!("{pid:04x}")), ..DriverOptions::default() };
        prop_assert!(zsp.claim(id, &opts));
    }

    #[test]
    fn prop_correction_idempotent(hvt in range(), output in range(), input in proptest::option::of(range())) {
        let zsp = ZspaceSubdriver;
        let id = DeviceIdentity::new(ZSP_VID, pids::BROKEN_DESCRIPTOR);
        let mut once = descriptor(hvt, output, input);
        zsp.correct_descriptor(id, &mut once);
        let mut twice = once.clone();
        zsp.correct_descriptor(id, &mut twice);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_correction_only_for_target(
        vid in any::<u16>(),
        pid in any::<u16>(),
        hvt in range(),
        input in proptest::option::of(range()),
    ) {
        prop_assume!(vid != ZSP_VID || pid != pids::BROKEN_DESCRIPTOR);
        let zsp = ZspaceSubdriver;
        // Matching ranges: the defect signature is present.
        let mut desc = descriptor(hvt, hvt, input);
        let before = desc.clone();
        prop_assert!(!zsp.correct_descriptor(DeviceIdentity::new(vid, pid), &mut desc));
        prop_assert_eq!(desc, before);
    }

    #[test]
    fn prop_charge_clamped(raw in 100.0f64..1.0e6) {
        prop_assert_eq!(battery_charge(raw), "100");
    }

    #[test]
    fn prop_charge_below_100_unchanged(raw in 0u32..100) {
        prop_assert_eq!(battery_charge(raw as f64), raw.to_string());
    }

    #[test]
    fn prop_scale_latches_once(
        first_nominal in 1.0f64..100.0,
        first_raw in 0.0f64..200.0,
        later_nominal in 0.0f64..100.0,
        later_raw in 0.0f64..200.0,
    ) {
        let mut scale = BatteryScale::new(true);
        scale.convert(first_raw, &nominal(first_nominal));
        prop_assert!(scale.is_determined());
        let latched = scale.factor();
        let expected = if first_raw / first_nominal > 1.4 { 2.0 / 3.0 } else { 1.0 };
        prop_assert!((latched - expected).abs() < 1e-12);

        scale.convert(later_raw, &nominal(later_nominal));
        prop_assert_eq!(scale.factor(), latched);
    }
}
