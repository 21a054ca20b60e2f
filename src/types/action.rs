// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote action kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named remote operation a Bond device may support.
///
/// Devices declare the actions they accept; each action is invoked with
/// `PUT /v2/devices/{id}/actions/{action}`, where `{action}` is
/// [`Action::as_str`].
///
/// Unrecognised action names deserialize to [`Action::Unknown`] so that new
/// firmware actions do not break device parsing.
///
/// # Examples
///
/// ```
/// use bond_bridge::types::Action;
///
/// assert_eq!(Action::SetSpeed.as_str(), "SetSpeed");
/// assert!(Action::SetSpeed.takes_argument());
/// assert!(!Action::Stop.takes_argument());
///
/// let parsed: Action = serde_json::from_str("\"ToggleLight\"").unwrap();
/// assert_eq!(parsed, Action::ToggleLight);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Action {
    /// Toggle the main light.
    ToggleLight,
    /// Toggle the up light of a dual-light fan.
    ToggleUpLight,
    /// Toggle the down light of a dual-light fan.
    ToggleDownLight,
    /// Turn the light off.
    TurnLightOff,
    /// Turn the device on.
    TurnOn,
    /// Turn the device off.
    TurnOff,
    /// Start the cycling dimmer.
    StartDimmer,
    /// Start the up light dimmer.
    StartUpLightDimmer,
    /// Start the down light dimmer.
    StartDownLightDimmer,
    /// Start raising brightness.
    StartIncreasingBrightness,
    /// Start lowering brightness.
    StartDecreasingBrightness,
    /// Stop any motion or dimming in progress.
    Stop,
    /// Set the fan speed (argument: speed value).
    SetSpeed,
    /// Step the fan speed up.
    IncreaseSpeed,
    /// Step the fan speed down.
    DecreaseSpeed,
    /// Reverse the fan direction.
    ToggleDirection,
    /// Toggle power.
    TogglePower,
    /// Toggle a shade between open and closed.
    ToggleOpen,
    /// Open a shade.
    Open,
    /// Close a shade.
    Close,
    /// Move a shade to its preset position.
    Preset,
    /// Set a shade position (argument: 0-100).
    SetPosition,
    /// Set light brightness (argument: 1-100).
    SetBrightness,
    /// Set fireplace flame height (argument: 1-100).
    SetFlame,
    /// Any action this library does not model.
    #[serde(other)]
    Unknown,
}

impl Action {
    /// Returns the resource suffix used in the action URL.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToggleLight => "ToggleLight",
            Self::ToggleUpLight => "ToggleUpLight",
            Self::ToggleDownLight => "ToggleDownLight",
            Self::TurnLightOff => "TurnLightOff",
            Self::TurnOn => "TurnOn",
            Self::TurnOff => "TurnOff",
            Self::StartDimmer => "StartDimmer",
            Self::StartUpLightDimmer => "StartUpLightDimmer",
            Self::StartDownLightDimmer => "StartDownLightDimmer",
            Self::StartIncreasingBrightness => "StartIncreasingBrightness",
            Self::StartDecreasingBrightness => "StartDecreasingBrightness",
            Self::Stop => "Stop",
            Self::SetSpeed => "SetSpeed",
            Self::IncreaseSpeed => "IncreaseSpeed",
            Self::DecreaseSpeed => "DecreaseSpeed",
            Self::ToggleDirection => "ToggleDirection",
            Self::TogglePower => "TogglePower",
            Self::ToggleOpen => "ToggleOpen",
            Self::Open => "Open",
            Self::Close => "Close",
            Self::Preset => "Preset",
            Self::SetPosition => "SetPosition",
            Self::SetBrightness => "SetBrightness",
            Self::SetFlame => "SetFlame",
            Self::Unknown => "Unknown",
        }
    }

    /// Returns whether the action expects an `argument` body.
    #[must_use]
    pub const fn takes_argument(&self) -> bool {
        matches!(
            self,
            Self::SetSpeed | Self::SetPosition | Self::SetBrightness | Self::SetFlame
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_actions_deserialize() {
        let actions: Vec<Action> =
            serde_json::from_str(r#"["SetSpeed", "BreakfastMode", "Stop"]"#).unwrap();
        assert_eq!(actions, vec![Action::SetSpeed, Action::Unknown, Action::Stop]);
    }

    #[test]
    fn display_matches_resource_suffix() {
        assert_eq!(
            Action::StartIncreasingBrightness.to_string(),
            "StartIncreasingBrightness"
        );
    }

    #[test]
    fn serialized_name_matches_suffix() {
        for action in [Action::ToggleOpen, Action::SetFlame, Action::TurnLightOff] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_str()));
        }
    }
}
