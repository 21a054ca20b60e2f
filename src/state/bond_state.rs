// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state as reported by a Bond.

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

use super::ToggleProperty;

/// Authoritative device state owned by the Bond.
///
/// The state is sparse: a field that is `None` does not apply to the device
/// (or was not part of a push update). Boolean-like fields hold `0` or `1`;
/// `speed`, `brightness`, `flame` and `position` are magnitudes.
///
/// The same type is used for full state fetches, push packet bodies and
/// `PATCH` bodies, so absent fields are never serialized.
///
/// # Examples
///
/// ```
/// use bond_bridge::state::BondState;
///
/// let state: BondState = serde_json::from_str(r#"{"power":1,"speed":2}"#).unwrap();
/// assert_eq!(state.is_power_on(), Some(true));
/// assert_eq!(state.speed, Some(2));
/// assert!(state.light.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondState {
    /// Power, `0` or `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power: Option<u8>,
    /// Current fan speed value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    /// Main light, `0` or `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<u8>,
    /// Up light, `0` or `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_light: Option<u8>,
    /// Down light, `0` or `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_light: Option<u8>,
    /// Fan direction, `1` forward and `-1` reverse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<i8>,
    /// Shade open, `0` or `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<u8>,
    /// Light brightness, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Fireplace flame height, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flame: Option<u8>,
    /// Shade position in Bond's convention, 0-100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u8>,
}

impl BondState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns whether power is on, if reported.
    #[must_use]
    pub fn is_power_on(&self) -> Option<bool> {
        self.power.map(|v| v == 1)
    }

    /// Returns whether the main light is on, if reported.
    #[must_use]
    pub fn is_light_on(&self) -> Option<bool> {
        self.light.map(|v| v == 1)
    }

    /// Returns whether the shade is open, if reported.
    #[must_use]
    pub fn is_open(&self) -> Option<bool> {
        self.open.map(|v| v == 1)
    }

    /// Returns the value of a togglable property, if reported.
    #[must_use]
    pub fn get(&self, property: ToggleProperty) -> Option<u8> {
        match property {
            ToggleProperty::Open => self.open,
            ToggleProperty::Power => self.power,
            ToggleProperty::Light => self.light,
            ToggleProperty::UpLight => self.up_light,
            ToggleProperty::DownLight => self.down_light,
        }
    }

    fn slot(&mut self, property: ToggleProperty) -> &mut Option<u8> {
        match property {
            ToggleProperty::Open => &mut self.open,
            ToggleProperty::Power => &mut self.power,
            ToggleProperty::Light => &mut self.light,
            ToggleProperty::UpLight => &mut self.up_light,
            ToggleProperty::DownLight => &mut self.down_light,
        }
    }

    /// Returns a patch that flips `property` between `0` and `1`.
    ///
    /// The patch contains only the flipped field, ready to be sent with
    /// `PATCH /v2/devices/{id}/state`.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::MissingStateField` if the state does not report
    /// `property`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bond_bridge::state::{BondState, ToggleProperty};
    ///
    /// let state: BondState = serde_json::from_str(r#"{"light":1,"power":0}"#).unwrap();
    /// let patch = state.toggled(ToggleProperty::Light).unwrap();
    /// assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"light":0}"#);
    /// ```
    pub fn toggled(&self, property: ToggleProperty) -> Result<Self> {
        let current = self
            .get(property)
            .ok_or_else(|| DeviceError::MissingStateField(property.to_string()))?;

        let mut patch = Self::new();
        *patch.slot(property) = Some(u8::from(current == 0));
        Ok(patch)
    }

    /// Applies the fields set in `update`, returning whether anything changed.
    pub fn merge(&mut self, update: &Self) -> bool {
        let before = self.clone();

        macro_rules! take_if_some {
            ($($field:ident),*) => {
                $(
                    if update.$field.is_some() {
                        self.$field = update.$field;
                    }
                )*
            };
        }

        take_if_some!(
            power, speed, light, up_light, down_light, direction, open, brightness, flame,
            position
        );

        *self != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn ignores_unknown_fields() {
        let state: BondState =
            serde_json::from_str(r#"{"power":0,"timer":0,"breeze":[0,50,50],"_":"ab"}"#).unwrap();
        assert_eq!(state.power, Some(0));
        assert_eq!(state.is_power_on(), Some(false));
    }

    #[test]
    fn empty_state_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&BondState::new()).unwrap(), "{}");
        assert!(BondState::new().is_empty());
    }

    #[test]
    fn toggle_flips_one_to_zero_and_back() {
        let on = BondState {
            open: Some(1),
            ..BondState::default()
        };
        assert_eq!(on.toggled(ToggleProperty::Open).unwrap().open, Some(0));

        let off = BondState {
            power: Some(0),
            ..BondState::default()
        };
        let patch = off.toggled(ToggleProperty::Power).unwrap();
        assert_eq!(patch.power, Some(1));
        assert!(patch.open.is_none());
    }

    #[test]
    fn toggle_missing_field_fails() {
        let state = BondState {
            power: Some(1),
            ..BondState::default()
        };
        let err = state.toggled(ToggleProperty::Light).unwrap_err();
        assert!(matches!(
            err,
            Error::Device(DeviceError::MissingStateField(ref f)) if f == "light"
        ));
    }

    #[test]
    fn merge_reports_changes() {
        let mut state = BondState {
            power: Some(0),
            speed: Some(1),
            ..BondState::default()
        };
        let update = BondState {
            power: Some(1),
            ..BondState::default()
        };
        assert!(state.merge(&update));
        assert_eq!(state.power, Some(1));
        assert_eq!(state.speed, Some(1));
        assert!(!state.merge(&update));
    }
}
