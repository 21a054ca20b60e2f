// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed stepping between Bond speed values and HomeKit rotation speed.
//!
//! A fan exposes an ascending list of discrete speed values (see
//! [`fan_speeds`](crate::capabilities::fan_speeds)). HomeKit shows rotation
//! speed as a percentage, so each discrete value is assigned an equally
//! spaced step. "Off" is not part of the list; step 0 is reserved for it and
//! is handled by the power control.

/// Mapping between discrete fan speed values and HomeKit steps.
///
/// # Examples
///
/// ```
/// use bond_bridge::types::SpeedSteps;
///
/// let steps = SpeedSteps::new(vec![1, 2, 3], false).unwrap();
/// assert_eq!(steps.min_step(), 33);
/// assert_eq!(steps.max_value(), 99);
/// assert_eq!(steps.speed_for(66), Some(2));
/// assert_eq!(steps.step_for(Some(1), Some(3)), 99);
///
/// // A fan that is off always reports step 0
/// assert_eq!(steps.step_for(Some(0), Some(3)), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedSteps {
    values: Vec<u32>,
    min_step: u32,
    max_value: u32,
}

impl SpeedSteps {
    /// Creates the step mapping for the given speed values.
    ///
    /// With `raw` set, steps are the 1-based ordinal of each value
    /// (`min_step = 1`, `max_value = len`). Otherwise steps are spread over
    /// 0-100 with `min_step = floor(100 / len)`.
    ///
    /// Returns `None` when `values` is empty (no speed control).
    #[must_use]
    pub fn new(values: Vec<u32>, raw: bool) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let len = u32::try_from(values.len()).unwrap_or(u32::MAX);
        let (min_step, max_value) = if raw {
            (1, len)
        } else {
            let min_step = (100 / len).max(1);
            (min_step, min_step.saturating_mul(len))
        };

        Some(Self {
            values,
            min_step,
            max_value,
        })
    }

    /// Returns the discrete speed values, ascending.
    #[must_use]
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Returns the HomeKit step size.
    #[must_use]
    pub const fn min_step(&self) -> u32 {
        self.min_step
    }

    /// Returns the HomeKit maximum rotation speed.
    #[must_use]
    pub const fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Returns the HomeKit step for a reported state.
    ///
    /// Anything other than `power == 1` reports 0, even when a speed is
    /// cached. A speed that is not in the list also reports 0.
    #[must_use]
    pub fn step_for(&self, power: Option<u8>, speed: Option<u32>) -> u32 {
        if power != Some(1) {
            return 0;
        }
        let Some(speed) = speed else {
            return 0;
        };

        self.values
            .iter()
            .position(|v| *v == speed)
            .and_then(|index| u32::try_from(index + 1).ok())
            .map_or(0, |ordinal| ordinal * self.min_step)
    }

    /// Returns the Bond speed value for a HomeKit step.
    ///
    /// Step 0 means "off" and yields `None`. Steps between two multiples of
    /// `min_step` round to the nearest one, and out-of-range steps clamp to
    /// the first or last value.
    #[must_use]
    pub fn speed_for(&self, step: u32) -> Option<u32> {
        if step == 0 {
            return None;
        }

        let ordinal = step.saturating_add(self.min_step / 2) / self.min_step;
        let index = usize::try_from(ordinal)
            .unwrap_or(usize::MAX)
            .clamp(1, self.values.len())
            - 1;
        self.values.get(index).copied()
    }
}
