//! Seams to the hosting framework.
//!
//! The framework owns USB I/O and the published variable store. The engine
//! reaches them only through these traits, so tests can substitute mocks.

use crate::descriptor::ReportField;
use crate::error::Result;
use std::collections::HashMap;

/// Abstraction over writes to the device and its string table.
pub trait HidTransport {
    /// Write a physical value to a field (SET_REPORT on the field's report).
    fn write_field(&self, field: &ReportField, value: f64) -> Result<()>;

    /// Fetch a string from the device's string table by index.
    fn string_descriptor(&self, index: u8) -> Result<Option<String>>;
}

/// Read-only view of variables the framework has already published.
pub trait VariableStore {
    fn get_variable(&self, name: &str) -> Option<String>;
}

impl VariableStore for HashMap<String, String> {
    fn get_variable(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
