//! Mapping engine: turns descriptor fields into variables and dispatches
//! instant commands.
//!
//! One engine serves one device session. It owns the session's battery scale
//! state, so two devices polled in the same process never share it. Calls on a
//! single engine must be serialized by the caller (`&mut self` enforces this).

use crate::config::DriverOptions;
use crate::convert::{BatteryScale, ConversionContext};
use crate::descriptor::{ReportDescriptor, ReportField};
use crate::error::{Error, Result};
use crate::mapping::{MappingEntry, MappingKind, MappingTable, PollFlags};
use crate::transport::{HidTransport, VariableStore};
use crate::usage::UsageChain;
use serde::Serialize;
use tracing::{debug, trace, warn};

/// A canonical variable and its formatted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub name: &'static str,
    pub value: String,
}

/// Why an entry produced nothing this cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Field missing on a device expected to lack it.
    Absent,
    /// Field missing.
    NotFound,
    /// Path has a node in no usage table.
    Unresolved,
    /// Raw value outside the field's logical range.
    OutOfRange,
    /// Conversion could not run (string table read failed).
    Conversion(String),
}

/// Result of processing one mapping entry.
#[derive(Debug)]
pub enum Outcome {
    Value(Reading),
    Command {
        name: &'static str,
        result: Result<()>,
    },
    Skip {
        name: &'static str,
        reason: SkipReason,
    },
}

impl Outcome {
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Value(r) => Some(r),
            _ => None,
        }
    }
}

/// Per-call access to the framework.
#[derive(Clone, Copy)]
pub struct DeviceIo<'a> {
    pub transport: &'a dyn HidTransport,
    pub variables: &'a dyn VariableStore,
}

/// Interpreter over a mapping table for one device session.
pub struct MappingEngine {
    usages: UsageChain,
    table: MappingTable,
    options: DriverOptions,
    battery: BatteryScale,
}

impl MappingEngine {
    pub fn new(
        usages: UsageChain,
        table: MappingTable,
        options: DriverOptions,
        battery: BatteryScale,
    ) -> Self {
        Self {
            usages,
            table,
            options,
            battery,
        }
    }

    pub fn battery_scale(&self) -> &BatteryScale {
        &self.battery
    }

    /// Process one entry: read a variable, or fire a command.
    pub fn refresh(
        &mut self,
        descriptor: &ReportDescriptor,
        entry: &'static MappingEntry,
        io: DeviceIo<'_>,
    ) -> Outcome {
        let field = match self.locate(descriptor, entry) {
            Ok(field) => field,
            Err(reason) => {
                return match entry.kind {
                    MappingKind::Command { .. } => Outcome::Command {
                        name: entry.name,
                        result: Err(self.locate_error(entry, &reason)),
                    },
                    _ => Outcome::Skip {
                        name: entry.name,
                        reason,
                    },
                };
            }
        };

        match entry.kind {
            MappingKind::Command { value } => {
                let literal = value.resolve(&self.options);
                let result = write_literal(entry.name, literal, field, io.transport);
                if let Err(e) = &result {
                    warn!(command = entry.name, error = %e, "Instant command failed");
                }
                Outcome::Command {
                    name: entry.name,
                    result,
                }
            }
            MappingKind::Read { format, conversion } => {
                let Some(physical) = field.physical_value() else {
                    return out_of_range(entry, field);
                };
                let mut ctx = ConversionContext {
                    battery: &mut self.battery,
                    variables: io.variables,
                    transport: io.transport,
                };
                match conversion.apply(physical, &mut ctx) {
                    Ok(Some(value)) => Outcome::Value(Reading {
                        name: entry.name,
                        value,
                    }),
                    Ok(None) => Outcome::Value(Reading {
                        name: entry.name,
                        value: match format {
                            Some(f) => f.format(physical),
                            None => physical.to_string(),
                        },
                    }),
                    Err(e) => {
                        warn!(variable = entry.name, error = %e, "Conversion failed");
                        Outcome::Skip {
                            name: entry.name,
                            reason: SkipReason::Conversion(e.to_string()),
                        }
                    }
                }
            }
            MappingKind::Write { format, .. } => match field.physical_value() {
                Some(physical) => Outcome::Value(Reading {
                    name: entry.name,
                    value: format.format(physical),
                }),
                None => out_of_range(entry, field),
            },
        }
    }

    /// Read every variable entry accepted by `filter`, in table order.
    ///
    /// Commands are never fired from here.
    pub fn refresh_all(
        &mut self,
        descriptor: &ReportDescriptor,
        io: DeviceIo<'_>,
        filter: impl Fn(PollFlags) -> bool,
    ) -> Vec<Outcome> {
        let table = self.table;
        table
            .variables()
            .filter(|e| filter(e.flags))
            .map(|e| self.refresh(descriptor, e, io))
            .collect()
    }

    /// Fire a named instant command.
    pub fn instant_command(
        &mut self,
        name: &str,
        descriptor: &ReportDescriptor,
        io: DeviceIo<'_>,
    ) -> Result<()> {
        let entry = self
            .table
            .find_command(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?;
        debug!(command = name, "Dispatching instant command");
        match self.refresh(descriptor, entry, io) {
            Outcome::Command { result, .. } => result,
            _ => Err(Error::UnknownName(name.to_string())),
        }
    }

    /// Write a user-supplied value to a writable variable.
    pub fn set_variable(
        &mut self,
        name: &str,
        value: &str,
        descriptor: &ReportDescriptor,
        io: DeviceIo<'_>,
    ) -> Result<()> {
        let entry = self
            .table
            .find_variable(name)
            .ok_or_else(|| Error::UnknownName(name.to_string()))?;
        let MappingKind::Write { max_len, .. } = entry.kind else {
            return Err(Error::ReadOnly(name.to_string()));
        };
        if value.len() > max_len {
            return Err(Error::TooLong {
                name: name.to_string(),
                len: value.len(),
                max: max_len,
            });
        }
        let field = self
            .locate(descriptor, entry)
            .map_err(|reason| self.locate_error(entry, &reason))?;
        write_literal(entry.name, value, field, io.transport)
    }

    /// Default values of ABSENT entries, for publishing once at setup.
    pub fn absent_defaults(&self) -> Vec<Reading> {
        self.table
            .variables()
            .filter(|e| e.flags.contains(PollFlags::ABSENT))
            .filter_map(|e| match e.kind {
                MappingKind::Write {
                    default: Some(d), ..
                } => Some(Reading {
                    name: e.name,
                    value: d.resolve(&self.options).to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    fn locate<'d>(
        &self,
        descriptor: &'d ReportDescriptor,
        entry: &MappingEntry,
    ) -> std::result::Result<&'d ReportField, SkipReason> {
        let (path, report_id) = entry.hid_path();
        let codes = match self.usages.resolve_path(path) {
            Ok(codes) => codes,
            Err(e) => {
                warn!(variable = entry.name, error = %e, "Cannot resolve HID path");
                return Err(SkipReason::Unresolved);
            }
        };

        match descriptor.find_by_path(&codes, report_id) {
            Some(field) => {
                trace!(
                    variable = entry.name,
                    report_id = field.report_id,
                    raw = field.raw,
                    "Field extracted"
                );
                Ok(field)
            }
            None if entry.flags.contains(PollFlags::ABSENT) => Err(SkipReason::Absent),
            None => {
                warn!(variable = entry.name, path = entry.path, "HID field not found");
                Err(SkipReason::NotFound)
            }
        }
    }

    fn locate_error(&self, entry: &MappingEntry, reason: &SkipReason) -> Error {
        match reason {
            SkipReason::Unresolved => {
                let (path, _) = entry.hid_path();
                match self.usages.resolve_path(path) {
                    Err(e) => e,
                    Ok(_) => Error::FieldNotFound(entry.path.to_string()),
                }
            }
            _ => Error::FieldNotFound(entry.path.to_string()),
        }
    }
}

fn out_of_range(entry: &MappingEntry, field: &ReportField) -> Outcome {
    warn!(
        variable = entry.name,
        raw = field.raw,
        logical_min = field.logical_min,
        logical_max = field.logical_max,
        "Raw value outside logical range"
    );
    Outcome::Skip {
        name: entry.name,
        reason: SkipReason::OutOfRange,
    }
}

fn write_literal(
    name: &str,
    literal: &str,
    field: &ReportField,
    transport: &dyn HidTransport,
) -> Result<()> {
    let value = literal
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidValue {
            name: name.to_string(),
            value: literal.to_string(),
        })?;
    debug!(
        variable = name,
        report_id = field.report_id,
        value,
        "Writing field"
    );
    transport.write_field(field, value)
}
