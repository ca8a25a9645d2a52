//! Error types for zspace-hid-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID transport failure reported by the framework layer.
    #[error("HID error: {0}")]
    Hid(String),

    /// No field in the descriptor matches the given path.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// A node of a symbolic HID path is in no usage table and is not numeric.
    #[error("unresolvable HID path node '{node}' in '{path}'")]
    UnresolvedPath { path: String, node: String },

    /// A value could not be parsed as a number for writing.
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: String, value: String },

    /// No mapping entry with this name exists.
    #[error("unknown variable or command: {0}")]
    UnknownName(String),

    /// Attempt to write a variable that is not flagged writable.
    #[error("variable is read-only: {0}")]
    ReadOnly(String),

    /// Value longer than the variable's declared maximum length.
    #[error("value too long for {name}: {len} > {max}")]
    TooLong {
        name: String,
        len: usize,
        max: usize,
    },

    /// Driver option parsing failure.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
