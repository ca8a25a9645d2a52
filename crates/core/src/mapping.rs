//! Declarative HID-to-variable mapping table.
//!
//! Each entry ties a canonical variable (or instant command) to a symbolic HID
//! path. Table order is poll and display order.

use crate::config::DriverOptions;
use crate::convert::{Conversion, NumberFormat};
use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// Hints for the poll scheduler. They do not change how an entry is read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct PollFlags: u8 {
        /// Changes rarely; may be polled at reduced frequency.
        const SEMI_STATIC = 0b0000_0001;
        /// Poll on every quick update.
        const QUICK_POLL = 0b0000_0010;
        /// Device may lack the field; a miss is expected.
        const ABSENT = 0b0000_0100;
    }
}

/// Literal written by a command or offered as a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefaultValue {
    Literal(&'static str),
    /// User `ondelay` option, or the built-in default.
    OnDelay,
    /// User `offdelay` option, or the built-in default.
    OffDelay,
}

impl DefaultValue {
    pub fn resolve<'a>(&self, options: &'a DriverOptions) -> &'a str {
        match *self {
            Self::Literal(s) => s,
            Self::OnDelay => options.ondelay(),
            Self::OffDelay => options.offdelay(),
        }
    }
}

/// What an entry does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MappingKind {
    /// Read-only variable. A conversion, when present, owns the formatting.
    Read {
        format: Option<NumberFormat>,
        conversion: Conversion,
    },
    /// Variable the user may set, stored as a string of at most `max_len`.
    Write {
        max_len: usize,
        format: NumberFormat,
        default: Option<DefaultValue>,
    },
    /// Instant command writing a fixed value.
    Command { value: DefaultValue },
}

/// One row of a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingEntry {
    pub name: &'static str,
    /// Dotted usage path, optionally suffixed with `#<report id>`.
    pub path: &'static str,
    pub kind: MappingKind,
    pub flags: PollFlags,
}

impl MappingEntry {
    /// Read-only numeric variable.
    pub const fn read(name: &'static str, path: &'static str, format: NumberFormat) -> Self {
        Self {
            name,
            path,
            kind: MappingKind::Read {
                format: Some(format),
                conversion: Conversion::None,
            },
            flags: PollFlags::empty(),
        }
    }

    /// Read-only variable rendered by a conversion.
    pub const fn converted(name: &'static str, path: &'static str, conversion: Conversion) -> Self {
        Self {
            name,
            path,
            kind: MappingKind::Read {
                format: None,
                conversion,
            },
            flags: PollFlags::empty(),
        }
    }

    /// Writable string variable.
    pub const fn write(
        name: &'static str,
        path: &'static str,
        max_len: usize,
        format: NumberFormat,
    ) -> Self {
        Self {
            name,
            path,
            kind: MappingKind::Write {
                max_len,
                format,
                default: None,
            },
            flags: PollFlags::empty(),
        }
    }

    /// Writable variable with a default for devices lacking the field.
    pub const fn write_default(
        name: &'static str,
        path: &'static str,
        max_len: usize,
        default: DefaultValue,
    ) -> Self {
        Self {
            name,
            path,
            kind: MappingKind::Write {
                max_len,
                format: NumberFormat::INTEGER,
                default: Some(default),
            },
            flags: PollFlags::ABSENT,
        }
    }

    /// Instant command.
    pub const fn command(name: &'static str, path: &'static str, value: DefaultValue) -> Self {
        Self {
            name,
            path,
            kind: MappingKind::Command { value },
            flags: PollFlags::empty(),
        }
    }

    pub const fn with_flags(mut self, flags: PollFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, MappingKind::Command { .. })
    }

    pub fn is_writable(&self) -> bool {
        matches!(self.kind, MappingKind::Write { .. })
    }

    /// Split `path` into the dotted usage path and the optional report ID.
    pub fn hid_path(&self) -> (&'static str, Option<u8>) {
        split_report_qualifier(self.path)
    }
}

fn split_report_qualifier(path: &'static str) -> (&'static str, Option<u8>) {
    match path.rsplit_once('#') {
        Some((base, id)) => match id.parse::<u8>() {
            Ok(id) => (base, Some(id)),
            Err(_) => (path, None),
        },
        None => (path, None),
    }
}

/// A static mapping table.
#[derive(Debug, Clone, Copy)]
pub struct MappingTable {
    entries: &'static [MappingEntry],
}

impl MappingTable {
    pub const fn new(entries: &'static [MappingEntry]) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &'static [MappingEntry] {
        self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static MappingEntry> {
        self.entries.iter()
    }

    /// Entries read on each poll cycle (everything but commands).
    pub fn variables(&self) -> impl Iterator<Item = &'static MappingEntry> {
        self.entries.iter().filter(|e| !e.is_command())
    }

    pub fn commands(&self) -> impl Iterator<Item = &'static MappingEntry> {
        self.entries.iter().filter(|e| e.is_command())
    }

    /// First variable entry with this name.
    pub fn find_variable(&self, name: &str) -> Option<&'static MappingEntry> {
        self.variables().find(|e| e.name == name)
    }

    pub fn find_command(&self, name: &str) -> Option<&'static MappingEntry> {
        self.commands().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{Transform, ONLINE_INFO};

    static TABLE: &[MappingEntry] = &[
        MappingEntry::read("input.voltage", "UPS.Input.Voltage", NumberFormat::ONE_DECIMAL),
        MappingEntry::converted(
            "battery.charge",
            "UPS.PowerSummary.RemainingCapacity",
            Conversion::Transform(Transform::BatteryCharge),
        ),
        MappingEntry::converted(
            "ups.status",
            "UPS.PowerSummary.PresentStatus.ACPresent",
            Conversion::Lookup(ONLINE_INFO),
        )
        .with_flags(PollFlags::QUICK_POLL),
        MappingEntry::write_default(
            "ups.delay.start",
            "UPS.Output.DelayBeforeStartup",
            10,
            DefaultValue::OnDelay,
        ),
        MappingEntry::command("beeper.on", "UPS.PowerSummary.AudibleAlarmControl", DefaultValue::Literal("2")),
        MappingEntry::command("beeper.off", "UPS.PowerSummary.AudibleAlarmControl#7", DefaultValue::Literal("3")),
    ];

    #[test]
    fn splits_report_qualifier() {
        let table = MappingTable::new(TABLE);
        let off = table.find_command("beeper.off").unwrap();
        assert_eq!(
            off.hid_path(),
            ("UPS.PowerSummary.AudibleAlarmControl", Some(7))
        );
        let on = table.find_command("beeper.on").unwrap();
        assert_eq!(on.hid_path(), ("UPS.PowerSummary.AudibleAlarmControl", None));
    }

    #[test]
    fn bad_qualifier_is_part_of_path() {
        assert_eq!(split_report_qualifier("UPS.Test#x"), ("UPS.Test#x", None));
        assert_eq!(split_report_qualifier("UPS.Test#300"), ("UPS.Test#300", None));
    }

    #[test]
    fn variables_and_commands_are_disjoint() {
        let table = MappingTable::new(TABLE);
        assert_eq!(table.variables().count(), 4);
        assert_eq!(table.commands().count(), 2);
        assert!(table.find_variable("beeper.on").is_none());
        assert!(table.find_command("input.voltage").is_none());
    }

    #[test]
    fn flags_accumulate() {
        let table = MappingTable::new(TABLE);
        let delay = table.find_variable("ups.delay.start").unwrap();
        assert!(delay.flags.contains(PollFlags::ABSENT));
        assert!(delay.is_writable());
        let status = table.find_variable("ups.status").unwrap();
        assert_eq!(status.flags, PollFlags::QUICK_POLL);
    }

    #[test]
    fn default_values_honor_options() {
        let mut opts = DriverOptions::default();
        assert_eq!(DefaultValue::OnDelay.resolve(&opts), "30");
        opts.ondelay = Some("90".into());
        assert_eq!(DefaultValue::OnDelay.resolve(&opts), "90");
        assert_eq!(DefaultValue::OffDelay.resolve(&opts), "20");
        assert_eq!(DefaultValue::Literal("-1").resolve(&opts), "-1");
    }
}
