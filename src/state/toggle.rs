// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State properties that can be flipped with a read-modify-write.

use std::fmt;
use std::str::FromStr;

use crate::error::{DeviceError, Error};

/// A boolean-like state key accepted by
/// [`BondApi::toggle_state`](crate::protocol::BondApi::toggle_state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleProperty {
    /// `open`
    Open,
    /// `power`
    Power,
    /// `light`
    Light,
    /// `up_light`
    UpLight,
    /// `down_light`
    DownLight,
}

impl ToggleProperty {
    /// Returns the state key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Power => "power",
            Self::Light => "light",
            Self::UpLight => "up_light",
            Self::DownLight => "down_light",
        }
    }
}

impl fmt::Display for ToggleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToggleProperty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "power" => Ok(Self::Power),
            "light" => Ok(Self::Light),
            "up_light" => Ok(Self::UpLight),
            "down_light" => Ok(Self::DownLight),
            other => Err(DeviceError::InvalidToggleProperty(other.to_string()).into()),
        }
    }
}
