// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Characteristic values and constraints.

use std::fmt;

use crate::error::ValueError;

/// A characteristic value.
///
/// # Examples
///
/// ```
/// use bond_bridge::host::Value;
///
/// assert_eq!(Value::from(true).as_bool().unwrap(), true);
/// assert_eq!(Value::from(66).as_int().unwrap(), 66);
/// assert!(Value::from(66).as_bool().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Boolean, e.g. `On`.
    Bool(bool),
    /// Integer, e.g. `RotationSpeed`.
    Int(i64),
    /// Text, e.g. `Manufacturer`.
    Text(String),
}

impl Value {
    /// Returns the boolean value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::WrongKind` for non-boolean values.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(ValueError::WrongKind { expected: "boolean" }),
        }
    }

    /// Returns the integer value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::WrongKind` for non-integer values.
    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Self::Int(i) => Ok(*i),
            _ => Err(ValueError::WrongKind { expected: "integer" }),
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Numeric constraints of a characteristic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Props {
    /// Minimum value.
    pub min_value: Option<i64>,
    /// Maximum value.
    pub max_value: Option<i64>,
    /// Step between valid values.
    pub min_step: Option<i64>,
}

impl Props {
    /// Creates empty constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum value.
    #[must_use]
    pub fn with_min_value(mut self, value: i64) -> Self {
        self.min_value = Some(value);
        self
    }

    /// Sets the maximum value.
    #[must_use]
    pub fn with_max_value(mut self, value: i64) -> Self {
        self.max_value = Some(value);
        self
    }

    /// Sets the step between valid values.
    #[must_use]
    pub fn with_min_step(mut self, value: i64) -> Self {
        self.min_step = Some(value);
        self
    }

    /// Overlays the constraints set in `other`.
    #[must_use]
    pub fn merged(self, other: Self) -> Self {
        Self {
            min_value: other.min_value.or(self.min_value),
            max_value: other.max_value.or(self.max_value),
            min_step: other.min_step.or(self.min_step),
        }
    }
}
