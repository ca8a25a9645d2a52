//! Driver options supplied by the user.
//!
//! The hosting framework owns option parsing; this module only defines the
//! lookup seam and a serde-backed option set for callers that have none.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default delay (seconds) before powering the load back on.
pub const DEFAULT_ONDELAY: &str = "30";
/// Default delay (seconds) before cutting power to the load.
pub const DEFAULT_OFFDELAY: &str = "20";

/// Read-only access to user-supplied driver options.
pub trait OptionSource {
    /// Look up an option by name.
    fn get_option(&self, name: &str) -> Option<&str>;

    /// Whether an option is present at all, regardless of value.
    fn has_option(&self, name: &str) -> bool {
        self.get_option(name).is_some()
    }
}

impl OptionSource for HashMap<String, String> {
    fn get_option(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Typed option set for a single device session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    /// Vendor ID filter given by the user, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendorid: Option<String>,
    /// Product ID override; its presence accepts near-match devices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub productid: Option<String>,
    /// Override for the power-on delay literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ondelay: Option<String>,
    /// Override for the power-off delay literal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offdelay: Option<String>,
    /// Any other option, passed through untouched.
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

impl DriverOptions {
    /// Parse options from a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Effective power-on delay literal.
    pub fn ondelay(&self) -> &str {
        self.ondelay.as_deref().unwrap_or(DEFAULT_ONDELAY)
    }

    /// Effective power-off delay literal.
    pub fn offdelay(&self) -> &str {
        self.offdelay.as_deref().unwrap_or(DEFAULT_OFFDELAY)
    }
}

impl OptionSource for DriverOptions {
    fn get_option(&self, name: &str) -> Option<&str> {
        match name {
            "vendorid" => self.vendorid.as_deref(),
            "productid" => self.productid.as_deref(),
            "ondelay" => self.ondelay.as_deref(),
            "offdelay" => self.offdelay.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }
}
