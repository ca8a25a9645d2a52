//! zspace-hid-core: device matching, descriptor fix-up, and HID-to-variable
//! mapping for ZSP uninterruptible power supplies.
//!
//! This crate is the subdriver half of a HID UPS driver. USB I/O, polling and
//! publishing belong to the hosting framework, which reaches this crate
//! through the [`subdriver::Subdriver`] trait and hands in parsed
//! [`descriptor::ReportDescriptor`] snapshots.

pub mod config;
pub mod convert;
pub mod descriptor;
pub mod device;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod subdriver;
pub mod transport;
pub mod usage;
pub mod zspace;

/// ZSP USB Vendor ID.
pub const ZSP_VID: u16 = 0x36AA;

/// Known ZSP product IDs.
pub mod pids {
    /// U2600.
    pub const U2600: u16 = 0x0101;
    /// Model with the copied voltage range in its report descriptor.
    pub const BROKEN_DESCRIPTOR: u16 = 0x0501;
}
