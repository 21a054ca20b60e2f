// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Window covering position mapping.

use crate::error::ValueError;

/// Maximum position value on both sides of the mapping.
const MAX_POSITION: u8 = 100;

/// Converts between Bond shade positions and HomeKit positions.
///
/// HomeKit uses 0 = closed and 100 = open. Bond awnings use the same
/// convention; all other shade subtypes report 0 = open and 100 = closed,
/// so their positions are inverted.
///
/// # Examples
///
/// ```
/// use bond_bridge::types::PositionMapping;
///
/// let shade = PositionMapping::new(true);
/// assert_eq!(shade.to_homekit(0), 100);
/// assert_eq!(shade.to_remote(25), 75);
///
/// let awning = PositionMapping::new(false);
/// assert_eq!(awning.to_homekit(40), 40);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionMapping {
    invert: bool,
}

impl PositionMapping {
    /// Creates a mapping, inverting positions when `invert` is set.
    #[must_use]
    pub const fn new(invert: bool) -> Self {
        Self { invert }
    }

    /// Returns whether positions are inverted.
    #[must_use]
    pub const fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Maps a Bond position to a HomeKit position. Values above 100 clamp.
    #[must_use]
    pub fn to_homekit(&self, remote: u8) -> u8 {
        self.apply(remote.min(MAX_POSITION))
    }

    /// Maps a HomeKit position to a Bond position. Values above 100 clamp.
    #[must_use]
    pub fn to_remote(&self, homekit: u8) -> u8 {
        self.apply(homekit.min(MAX_POSITION))
    }

    /// Maps a HomeKit position given as a characteristic integer.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `homekit` is outside 0-100.
    pub fn try_to_remote(&self, homekit: i64) -> Result<u8, ValueError> {
        u8::try_from(homekit)
            .ok()
            .filter(|v| *v <= MAX_POSITION)
            .map(|v| self.to_remote(v))
            .ok_or(ValueError::OutOfRange {
                min: 0,
                max: i64::from(MAX_POSITION),
                actual: homekit,
            })
    }

    const fn apply(&self, value: u8) -> u8 {
        if self.invert {
            MAX_POSITION - value
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_mapping_round_trips() {
        let mapping = PositionMapping::new(true);
        for p in 0..=100 {
            assert_eq!(mapping.to_homekit(mapping.to_remote(p)), p);
            assert_eq!(mapping.to_remote(p), 100 - p);
        }
    }

    #[test]
    fn identity_mapping() {
        let mapping = PositionMapping::new(false);
        for p in 0..=100 {
            assert_eq!(mapping.to_remote(p), p);
            assert_eq!(mapping.to_homekit(p), p);
        }
    }

    #[test]
    fn rejects_out_of_range_input() {
        let mapping = PositionMapping::new(true);
        assert_eq!(mapping.try_to_remote(30), Ok(70));
        assert!(mapping.try_to_remote(101).is_err());
        assert!(mapping.try_to_remote(-1).is_err());
    }
}
