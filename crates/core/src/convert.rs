//! Value conversion rules applied to raw field values.
//!
//! Every conversion returns a freshly owned `String`. The battery voltage
//! transform is the only one with state, and that state lives in a
//! [`BatteryScale`] owned by the device session.

use crate::error::Result;
use crate::transport::{HidTransport, VariableStore};
use serde::Serialize;
use tracing::{debug, info, trace};

/// Ratio of measured to nominal battery voltage above which readings are
/// assumed to be 1.5x too high.
pub const BATTERY_VOLTAGE_SANITY_CHECK: f64 = 1.4;

/// Variable holding the nominal battery voltage.
pub const NOMINAL_BATTERY_VOLTAGE: &str = "battery.voltage.nominal";

/// printf-style `%.Nf` numeric format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberFormat {
    pub decimals: u8,
}

impl NumberFormat {
    /// `%.0f`
    pub const INTEGER: Self = Self { decimals: 0 };
    /// `%.1f`
    pub const ONE_DECIMAL: Self = Self { decimals: 1 };

    pub fn format(self, value: f64) -> String {
        format!("{:.*}", self.decimals as usize, value)
    }
}

impl std::fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "%.{}f", self.decimals)
    }
}

/// Raw value to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LookupEntry {
    pub raw: i64,
    pub label: &'static str,
}

/// Ordered enumeration lookup; first match wins.
pub type Lookup = &'static [LookupEntry];

pub(crate) const fn l(raw: i64, label: &'static str) -> LookupEntry {
    LookupEntry { raw, label }
}

/// Numeric or string transforms that compute their own text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transform {
    /// Clamp to 100 and print without decimals.
    BatteryCharge,
    /// Apply the session's battery scale factor and print one decimal.
    BatteryVoltage,
    /// Treat the value as an index into the device's string table.
    StringIndex,
}

/// Conversion attached to a read mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Conversion {
    None,
    Lookup(Lookup),
    Transform(Transform),
}

/// What a conversion may touch besides the raw value.
pub struct ConversionContext<'a> {
    pub battery: &'a mut BatteryScale,
    pub variables: &'a dyn VariableStore,
    pub transport: &'a dyn HidTransport,
}

impl Conversion {
    /// Convert a raw value.
    ///
    /// Returns `None` for `Conversion::None`; the caller formats those itself.
    pub fn apply(&self, raw: f64, ctx: &mut ConversionContext<'_>) -> Result<Option<String>> {
        let text = match self {
            Self::None => return Ok(None),
            Self::Lookup(table) => lookup(table, raw),
            Self::Transform(Transform::BatteryCharge) => battery_charge(raw),
            Self::Transform(Transform::BatteryVoltage) => {
                ctx.battery.convert(raw, ctx.variables)
            }
            Self::Transform(Transform::StringIndex) => match u8::try_from(raw as i64) {
                Ok(index) => ctx.transport.string_descriptor(index)?.unwrap_or_default(),
                Err(_) => {
                    debug!(index = raw, "String index out of range");
                    String::new()
                }
            },
        };
        Ok(Some(text))
    }
}

/// First label whose raw value equals the (truncated) input, else the number.
pub fn lookup(table: &[LookupEntry], raw: f64) -> String {
    let key = raw as i64;
    match table.iter().find(|e| e.raw == key) {
        Some(entry) => entry.label.to_string(),
        None => plain_number(raw),
    }
}

/// Battery charge clamped to 100%.
pub fn battery_charge(raw: f64) -> String {
    NumberFormat::INTEGER.format(raw.min(100.0))
}

fn plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Session-scoped battery voltage scale.
///
/// Starts unchecked with factor 1. The first reading taken while a non-zero
/// nominal voltage is published latches the factor for the rest of the
/// session.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryScale {
    factor: f64,
    pending: bool,
    determined: bool,
}

impl Default for BatteryScale {
    fn default() -> Self {
        Self::new(false)
    }
}

impl BatteryScale {
    /// `needs_check` is set for models known to sometimes misreport.
    pub fn new(needs_check: bool) -> Self {
        Self {
            factor: 1.0,
            pending: needs_check,
            determined: false,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Whether the check is still outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending && !self.determined
    }

    pub fn is_determined(&self) -> bool {
        self.determined
    }

    /// Scale and format a raw battery voltage reading.
    pub fn convert(&mut self, raw: f64, variables: &dyn VariableStore) -> String {
        if self.is_pending() {
            self.determine(raw, variables);
        }
        trace!(battery_scale = self.factor, "Battery voltage scale");
        NumberFormat::ONE_DECIMAL.format(self.factor * raw)
    }

    fn determine(&mut self, raw: f64, variables: &dyn VariableStore) {
        let Some(nominal_str) = variables.get_variable(NOMINAL_BATTERY_VOLTAGE) else {
            debug!("'{NOMINAL_BATTERY_VOLTAGE}' not available yet; skipping scale determination");
            return;
        };

        let nominal = nominal_str.trim().parse::<f64>().unwrap_or(0.0);
        if nominal == 0.0 || !nominal.is_finite() {
            debug!(nominal = %nominal_str, "Nominal battery voltage unusable; deferring");
            return;
        }

        if raw / nominal > BATTERY_VOLTAGE_SANITY_CHECK {
            info!(
                voltage = raw,
                nominal = nominal,
                "Battery readings will be scaled by 2/3"
            );
            self.factor = 2.0 / 3.0;
        } else {
            self.factor = 1.0;
        }
        self.determined = true;
    }
}

/// Beeper state.
pub const BEEPER_INFO: Lookup = &[l(1, "disabled"), l(2, "enabled"), l(3, "muted")];

/// Battery self-test result.
pub const TEST_READ_INFO: Lookup = &[
    l(1, "Done and passed"),
    l(2, "Done and warning"),
    l(3, "Done and error"),
    l(4, "Aborted"),
    l(5, "In progress"),
    l(6, "No test initiated"),
    l(7, "Test scheduled"),
];

/// Status bit lookups. A `!` prefix clears the flag.
pub const ONLINE_INFO: Lookup = &[l(1, "online"), l(0, "!online")];
pub const CHARGING_INFO: Lookup = &[l(1, "chrg"), l(0, "!chrg")];
pub const DISCHARGING_INFO: Lookup = &[l(1, "dischrg"), l(0, "!dischrg")];
pub const LOWBATT_INFO: Lookup = &[l(1, "lowbatt"), l(0, "!lowbatt")];
pub const FULLYCHARGED_INFO: Lookup = &[l(1, "fullycharged"), l(0, "!fullycharged")];
pub const TIMELIMITEXPIRED_INFO: Lookup = &[l(1, "timelimitexp"), l(0, "!timelimitexp")];
pub const BOOST_INFO: Lookup = &[l(1, "boost"), l(0, "!boost")];
pub const OVERLOAD_INFO: Lookup = &[l(1, "overload"), l(0, "!overload")];
