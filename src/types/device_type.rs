// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device type codes reported by a Bond.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of appliance a Bond device controls.
///
/// Bonds report two-letter type codes (`CF`, `GX`, ...). Codes without an
/// accessory implementation deserialize to [`DeviceType::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    /// Ceiling fan, optionally with lights.
    #[serde(rename = "CF")]
    CeilingFan,
    /// Generic switchable device.
    #[serde(rename = "GX")]
    Generic,
    /// Fireplace.
    #[serde(rename = "FP")]
    Fireplace,
    /// Motorized shades or awning.
    #[serde(rename = "MS")]
    Shades,
    /// Standalone light.
    #[serde(rename = "LT")]
    Light,
    /// Any other type code.
    #[serde(other)]
    Unsupported,
}

impl DeviceType {
    /// Returns the Bond type code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CeilingFan => "CF",
            Self::Generic => "GX",
            Self::Fireplace => "FP",
            Self::Shades => "MS",
            Self::Light => "LT",
            Self::Unsupported => "??",
        }
    }

    /// Returns whether an accessory exists for this type.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CeilingFan => "ceiling fan",
            Self::Generic => "generic device",
            Self::Fireplace => "fireplace",
            Self::Shades => "shades",
            Self::Light => "light",
            Self::Unsupported => "unsupported device",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_codes() {
        let parsed: Vec<DeviceType> =
            serde_json::from_str(r#"["CF", "GX", "FP", "MS", "LT", "BD"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                DeviceType::CeilingFan,
                DeviceType::Generic,
                DeviceType::Fireplace,
                DeviceType::Shades,
                DeviceType::Light,
                DeviceType::Unsupported,
            ]
        );
    }

    #[test]
    fn supported_types() {
        assert!(DeviceType::Shades.is_supported());
        assert!(!DeviceType::Unsupported.is_supported());
    }
}
