// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Capability inference over device snapshots.
//!
//! Bond devices do not describe their control surfaces directly; they list
//! the [`Action`]s they accept. The predicates in this module infer which
//! controls a device has from that list, its properties and its subtype.
//!
//! Every predicate is total and monotonic in the action set: declaring an
//! extra action can only turn a predicate from `false` to `true`. Absent
//! fields count as "capability absent".
//!
//! [`Archetype`] evaluates the predicates once per device and keeps only the
//! results relevant to the device's type, so accessory composers never
//! re-evaluate them or compare subtype strings.

use crate::device::Device;
use crate::types::{Action, DeviceType, PositionMapping, SpeedSteps};

/// Upper bound on speeds derived from `max_speed`.
const MAX_FAN_SPEEDS: u32 = 100;

/// Subtype reported by awnings.
const AWNING_SUBTYPE: &str = "AWNING";

impl Device {
    /// Ceiling fan main light: `ToggleLight`.
    #[must_use]
    pub fn has_light(&self) -> bool {
        self.has_action(Action::ToggleLight)
    }

    /// Separate up and down lights: `ToggleUpLight` and `ToggleDownLight`.
    #[must_use]
    pub fn has_up_down_light(&self) -> bool {
        self.has_all(&[Action::ToggleUpLight, Action::ToggleDownLight])
    }

    /// Cycling dimmer: `StartDimmer`.
    #[must_use]
    pub fn has_dimmer(&self) -> bool {
        self.has_action(Action::StartDimmer)
    }

    /// Directional dimmers: `StartIncreasingBrightness` and
    /// `StartDecreasingBrightness`.
    #[must_use]
    pub fn has_separate_dimmers(&self) -> bool {
        self.has_all(&[
            Action::StartIncreasingBrightness,
            Action::StartDecreasingBrightness,
        ])
    }

    /// Absolute brightness: `SetBrightness` and `TurnLightOff`.
    #[must_use]
    pub fn has_absolute_brightness(&self) -> bool {
        self.has_all(&[Action::SetBrightness, Action::TurnLightOff])
    }

    /// Any form of brightness control.
    #[must_use]
    pub fn has_brightness_control(&self) -> bool {
        self.has_absolute_brightness() || self.has_dimmer() || self.has_separate_dimmers()
    }

    /// Absolute fan speed: `SetSpeed` with a known `max_speed`.
    #[must_use]
    pub fn can_set_speed(&self) -> bool {
        self.has_action(Action::SetSpeed) && self.properties.max_speed.is_some()
    }

    /// Incremental fan speed: `IncreaseSpeed` and `DecreaseSpeed`.
    #[must_use]
    pub fn can_increase_decrease_speed(&self) -> bool {
        self.has_all(&[Action::IncreaseSpeed, Action::DecreaseSpeed])
    }

    /// Fan rotation speed control: `SetSpeed`.
    #[must_use]
    pub fn has_fan(&self) -> bool {
        self.has_action(Action::SetSpeed)
    }

    /// Explicit power: `TurnOn` and `TurnOff`.
    #[must_use]
    pub fn has_off_on(&self) -> bool {
        self.has_all(&[Action::TurnOn, Action::TurnOff])
    }

    /// Fan direction: `ToggleDirection`.
    #[must_use]
    pub fn has_reverse_switch(&self) -> bool {
        self.has_action(Action::ToggleDirection)
    }

    /// Power toggle for generic devices and fireplaces: `TogglePower`.
    #[must_use]
    pub fn has_toggle_power(&self) -> bool {
        self.has_action(Action::TogglePower)
    }

    /// Fireplace flame height: `SetFlame`.
    #[must_use]
    pub fn has_flame(&self) -> bool {
        self.has_action(Action::SetFlame)
    }

    /// Shade open/close toggle: `ToggleOpen`.
    #[must_use]
    pub fn has_toggle_open(&self) -> bool {
        self.has_action(Action::ToggleOpen)
    }

    /// Explicit shade open and close: `Open` and `Close`.
    #[must_use]
    pub fn has_open_close(&self) -> bool {
        self.has_all(&[Action::Open, Action::Close])
    }

    /// Shade preset position: `Preset`.
    #[must_use]
    pub fn has_preset(&self) -> bool {
        self.has_action(Action::Preset)
    }

    /// Absolute shade position: `SetPosition`.
    #[must_use]
    pub fn has_position(&self) -> bool {
        self.has_action(Action::SetPosition)
    }

    /// Whether the shade subtype is `AWNING`.
    #[must_use]
    pub fn is_awning(&self) -> bool {
        self.subtype.as_deref() == Some(AWNING_SUBTYPE)
    }
}

/// Returns the discrete speed values a fan accepts, ascending and distinct.
///
/// - With `commands` present: the arguments of its `SetSpeed` commands.
/// - Otherwise with `max_speed = N`: `[1, 2, ..., N]`, at most 100 values.
/// - Otherwise: empty (no speed control).
///
/// # Examples
///
/// ```
/// use bond_bridge::capabilities::fan_speeds;
/// use bond_bridge::device::Device;
/// use bond_bridge::types::DeviceType;
///
/// let fan = Device::new("1", "Fan", DeviceType::CeilingFan).with_max_speed(3);
/// assert_eq!(fan_speeds(&fan), vec![1, 2, 3]);
/// ```
#[must_use]
pub fn fan_speeds(device: &Device) -> Vec<u32> {
    if let Some(commands) = &device.commands {
        let mut values: Vec<u32> = commands
            .iter()
            .filter(|cmd| cmd.action == Action::SetSpeed)
            .filter_map(|cmd| cmd.argument)
            .filter_map(|arg| u32::try_from(arg).ok())
            .collect();
        values.sort_unstable();
        values.dedup();
        return values;
    }

    match device.properties.max_speed {
        Some(max) => (1..=max.min(MAX_FAN_SPEEDS)).collect(),
        None => Vec::new(),
    }
}

/// How a light's brightness can be driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessControl {
    /// No brightness control.
    None,
    /// `SetBrightness` / `TurnLightOff`.
    Absolute,
    /// Timed `StartIncreasingBrightness` / `StartDecreasingBrightness`.
    Timed,
}

/// Light capabilities of a light or a ceiling fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
// Each flag is an independent device feature.
#[allow(clippy::struct_excessive_bools)]
pub struct LightCapabilities {
    /// Main light toggle.
    pub toggle: bool,
    /// Separate up and down lights.
    pub up_down: bool,
    /// Cycling dimmer.
    pub dimmer: bool,
    /// Directional dimmers.
    pub separate_dimmers: bool,
    /// Brightness characteristic mode.
    pub brightness: BrightnessControl,
}

impl LightCapabilities {
    /// Derives light capabilities from the device's actions.
    #[must_use]
    pub fn from_device(device: &Device) -> Self {
        let brightness = if device.has_absolute_brightness() {
            BrightnessControl::Absolute
        } else if device.has_separate_dimmers() {
            BrightnessControl::Timed
        } else {
            BrightnessControl::None
        };

        Self {
            toggle: device.has_light(),
            up_down: device.has_up_down_light(),
            dimmer: device.has_dimmer(),
            separate_dimmers: device.has_separate_dimmers(),
            brightness,
        }
    }

    /// Returns whether any light is present.
    #[must_use]
    pub const fn has_any_light(&self) -> bool {
        self.toggle || self.up_down
    }
}

/// How fan speed can be driven.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeedControl {
    /// No speed control.
    None,
    /// Absolute speed via `SetSpeed`.
    Absolute(SpeedSteps),
    /// Increase/decrease buttons.
    Incremental,
}

/// Ceiling fan capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanCapabilities {
    /// `TurnOn` / `TurnOff`.
    pub power: bool,
    /// Speed control mode.
    pub speed: SpeedControl,
    /// `ToggleDirection`.
    pub direction: bool,
    /// Lights built into the fan.
    pub light: LightCapabilities,
}

/// Shade capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadeCapabilities {
    /// `ToggleOpen`.
    pub toggle_open: bool,
    /// `Open` / `Close`.
    pub open_close: bool,
    /// Absolute positioning with its inversion rule.
    pub position: Option<PositionMapping>,
    /// `Preset`.
    pub preset: bool,
}

/// Fireplace capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireplaceCapabilities {
    /// `TogglePower`.
    pub toggle_power: bool,
    /// `TurnOn` / `TurnOff`.
    pub off_on: bool,
    /// `SetFlame`.
    pub flame: bool,
}

/// Generic device capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericCapabilities {
    /// `TogglePower`.
    pub toggle_power: bool,
    /// `TurnOn` / `TurnOff`.
    pub off_on: bool,
}

/// Options that change how capabilities are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DerivationOptions {
    /// Use raw ordinal fan steps instead of percentages.
    pub fan_speed_values: bool,
    /// Flip the shade inversion rule.
    pub invert_shade_position: bool,
}

/// A device's archetype with the capabilities relevant to it.
///
/// # Examples
///
/// ```
/// use bond_bridge::capabilities::{Archetype, DerivationOptions, SpeedControl};
/// use bond_bridge::device::Device;
/// use bond_bridge::types::{Action, DeviceType};
///
/// let fan = Device::new("1", "Fan", DeviceType::CeilingFan)
///     .with_actions([Action::SetSpeed, Action::TurnOn, Action::TurnOff])
///     .with_max_speed(3);
///
/// let Some(Archetype::CeilingFan(caps)) = Archetype::from_device(&fan, DerivationOptions::default())
/// else {
///     panic!("expected a ceiling fan");
/// };
/// assert!(caps.power);
/// assert!(matches!(caps.speed, SpeedControl::Absolute(ref s) if s.max_value() == 99));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archetype {
    /// Ceiling fan.
    CeilingFan(FanCapabilities),
    /// Standalone light.
    Light(LightCapabilities),
    /// Shades or awning.
    Shades(ShadeCapabilities),
    /// Fireplace.
    Fireplace(FireplaceCapabilities),
    /// Generic switchable device.
    Generic(GenericCapabilities),
}

impl Archetype {
    /// Classifies a device. Returns `None` for unsupported device types.
    #[must_use]
    pub fn from_device(device: &Device, options: DerivationOptions) -> Option<Self> {
        let archetype = match device.device_type {
            DeviceType::CeilingFan => {
                let speed = match SpeedSteps::new(fan_speeds(device), options.fan_speed_values) {
                    Some(steps) if device.has_fan() => SpeedControl::Absolute(steps),
                    _ if device.can_increase_decrease_speed() => SpeedControl::Incremental,
                    _ => SpeedControl::None,
                };
                Self::CeilingFan(FanCapabilities {
                    power: device.has_off_on(),
                    speed,
                    direction: device.has_reverse_switch(),
                    light: LightCapabilities::from_device(device),
                })
            }
            DeviceType::Light => Self::Light(LightCapabilities::from_device(device)),
            DeviceType::Shades => {
                let invert = !device.is_awning() ^ options.invert_shade_position;
                Self::Shades(ShadeCapabilities {
                    toggle_open: device.has_toggle_open(),
                    open_close: device.has_open_close(),
                    position: device
                        .has_position()
                        .then_some(PositionMapping::new(invert)),
                    preset: device.has_preset(),
                })
            }
            DeviceType::Fireplace => Self::Fireplace(FireplaceCapabilities {
                toggle_power: device.has_toggle_power(),
                off_on: device.has_off_on(),
                flame: device.has_flame(),
            }),
            DeviceType::Generic => Self::Generic(GenericCapabilities {
                toggle_power: device.has_toggle_power(),
                off_on: device.has_off_on(),
            }),
            DeviceType::Unsupported => return None,
        };
        Some(archetype)
    }
}
