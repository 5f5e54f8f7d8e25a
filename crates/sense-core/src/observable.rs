//! Observability trait for inspecting component state.
//!
//! Every component exposes its internal state for debugging and for the
//! machine-control server. Queries never affect simulation state.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean value (line levels, flags).
    Bool(bool),
    /// 8-bit unsigned integer (bytes, registers).
    U8(u8),
    /// 16-bit unsigned integer (assembled readings).
    U16(u16),
    /// 64-bit unsigned integer (tick counters).
    U64(u64),
    /// String value (state names).
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected.
///
/// Queries never affect simulation state.
pub trait Observable {
    /// Query a specific property by path.
    ///
    /// Paths are hierarchical, separated by dots:
    /// - `busy` - controller busy flag
    /// - `bus.scl` - resolved clock line level
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// List all available query paths.
    ///
    /// Returns paths that can be passed to `query()`.
    fn query_paths(&self) -> &'static [&'static str];
}
