// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::accessory::AccessoryOptions;
use crate::error::{DeviceError, ParseError, Result};
use crate::protocol::HttpConfig;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Connection settings of one Bond.
///
/// # Examples
///
/// ```
/// use bond_bridge::platform::BondConfig;
///
/// let bond = BondConfig::new("192.168.1.50", "f0e1d2c3")
///     .with_hidden_device("3c4d5e6f")
///     .with_ms_between_actions(250);
/// assert!(bond.is_hidden("3c4d5e6f"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondConfig {
    /// Bond address.
    pub ip_address: String,
    /// Local API token.
    pub token: String,
    /// Devices not to expose.
    #[serde(default)]
    pub hide_device_ids: Vec<String>,
    /// Minimum gap between actions sent to this Bond.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ms_between_actions: Option<u64>,
}

impl BondConfig {
    /// Creates a configuration for the Bond at `ip_address`.
    #[must_use]
    pub fn new(ip_address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            token: token.into(),
            hide_device_ids: Vec::new(),
            ms_between_actions: None,
        }
    }

    /// Hides a device.
    #[must_use]
    pub fn with_hidden_device(mut self, device_id: impl Into<String>) -> Self {
        self.hide_device_ids.push(device_id.into());
        self
    }

    /// Sets the minimum gap between actions.
    #[must_use]
    pub fn with_ms_between_actions(mut self, ms: u64) -> Self {
        self.ms_between_actions = Some(ms);
        self
    }

    /// Returns whether `device_id` is hidden.
    #[must_use]
    pub fn is_hidden(&self, device_id: &str) -> bool {
        self.hide_device_ids.iter().any(|id| id == device_id)
    }

    /// Returns the action spacing, if configured and non-zero.
    #[must_use]
    pub fn action_spacing(&self) -> Option<Duration> {
        self.ms_between_actions
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Returns the HTTP settings for this Bond.
    #[must_use]
    pub fn http_config(&self, timeout: Duration) -> HttpConfig {
        HttpConfig::new(&self.ip_address, &self.token).with_timeout(timeout)
    }
}

/// Platform configuration.
///
/// # Examples
///
/// ```
/// use bond_bridge::platform::PlatformConfig;
///
/// let config = PlatformConfig::from_json(r#"{
///     "bonds": [{ "ip_address": "192.168.1.50", "token": "f0e1d2c3" }],
///     "include_dimmer": true
/// }"#).unwrap();
///
/// assert!(config.include_dimmer);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
// Each flag is an independent configuration switch.
#[allow(clippy::struct_excessive_bools)]
pub struct PlatformConfig {
    /// Bonds to connect to.
    #[serde(default)]
    pub bonds: Vec<BondConfig>,
    /// Add dimmer switches to ceiling fan lights.
    #[serde(default)]
    pub include_dimmer: bool,
    /// Use the speed ordinal as rotation speed step.
    #[serde(default)]
    pub fan_speed_values: bool,
    /// Add toggle-state buttons.
    #[serde(default)]
    pub include_toggle_state: bool,
    /// Flip the shade position inversion.
    #[serde(default)]
    pub invert_shade_position: bool,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            bonds: Vec::new(),
            include_dimmer: false,
            fan_speed_values: false,
            include_toggle_state: false,
            invert_shade_position: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl PlatformConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if `json` is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json).map_err(ParseError::Json)?)
    }

    /// Checks that there is at least one Bond and every Bond has an address
    /// and a token.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::InvalidConfiguration` describing the first
    /// problem found.
    pub fn validate(&self) -> Result<()> {
        if self.bonds.is_empty() {
            return Err(DeviceError::InvalidConfiguration("no bonds configured".to_string()).into());
        }
        for (index, bond) in self.bonds.iter().enumerate() {
            if bond.ip_address.trim().is_empty() {
                return Err(DeviceError::InvalidConfiguration(format!(
                    "bond {index} is missing ip_address"
                ))
                .into());
            }
            if bond.token.trim().is_empty() {
                return Err(DeviceError::InvalidConfiguration(format!(
                    "bond {index} ({}) is missing token",
                    bond.ip_address
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Adds a Bond.
    #[must_use]
    pub fn with_bond(mut self, bond: BondConfig) -> Self {
        self.bonds.push(bond);
        self
    }

    /// Enables or disables dimmer switches.
    #[must_use]
    pub fn with_include_dimmer(mut self, enabled: bool) -> Self {
        self.include_dimmer = enabled;
        self
    }

    /// Enables or disables speed-ordinal steps.
    #[must_use]
    pub fn with_fan_speed_values(mut self, enabled: bool) -> Self {
        self.fan_speed_values = enabled;
        self
    }

    /// Enables or disables toggle-state buttons.
    #[must_use]
    pub fn with_include_toggle_state(mut self, enabled: bool) -> Self {
        self.include_toggle_state = enabled;
        self
    }

    /// Enables or disables shade position inversion flipping.
    #[must_use]
    pub fn with_invert_shade_position(mut self, enabled: bool) -> Self {
        self.invert_shade_position = enabled;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the options passed to every composer.
    #[must_use]
    pub fn accessory_options(&self) -> AccessoryOptions {
        AccessoryOptions {
            include_dimmer: self.include_dimmer,
            include_toggle_state: self.include_toggle_state,
            fan_speed_values: self.fan_speed_values,
            invert_shade_position: self.invert_shade_position,
            ..AccessoryOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn defaults_from_minimal_json() {
        let config = PlatformConfig::from_json(
            r#"{"bonds":[{"ip_address":"10.0.0.2","token":"abc","hide_device_ids":["7"]}]}"#,
        )
        .unwrap();

        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(!config.include_toggle_state);
        assert!(config.bonds[0].is_hidden("7"));
        assert_eq!(config.bonds[0].action_spacing(), None);
    }

    #[test]
    fn validate_rejects_missing_fields() {
        assert!(matches!(
            PlatformConfig::new().validate(),
            Err(Error::Device(DeviceError::InvalidConfiguration(_)))
        ));

        let no_token = PlatformConfig::new().with_bond(BondConfig::new("10.0.0.2", " "));
        assert!(no_token.validate().is_err());

        let ok = PlatformConfig::new().with_bond(BondConfig::new("10.0.0.2", "abc"));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn options_follow_flags() {
        let options = PlatformConfig::new()
            .with_include_dimmer(true)
            .with_invert_shade_position(true)
            .accessory_options();
        assert!(options.include_dimmer);
        assert!(options.invert_shade_position);
        assert!(!options.fan_speed_values);
    }

    #[test]
    fn zero_spacing_is_disabled() {
        let bond = BondConfig::new("10.0.0.2", "abc").with_ms_between_actions(0);
        assert_eq!(bond.action_spacing(), None);
        let bond = bond.with_ms_between_actions(300);
        assert_eq!(bond.action_spacing(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PlatformConfig::from_json("{"),
            Err(Error::Parse(ParseError::Json(_)))
        ));
    }
}
