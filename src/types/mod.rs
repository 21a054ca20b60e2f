// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the library.
//!
//! # Types
//!
//! - [`Action`] - Remote operation kinds and their URL suffixes
//! - [`DeviceType`] - Bond device type codes
//! - [`SpeedSteps`] - Fan speed values mapped to HomeKit rotation steps
//! - [`PositionMapping`] - Shade position inversion
//! - [`Version`] - Bond identity and firmware block

mod action;
mod device_type;
mod position;
mod speed;
mod version;

pub use action::Action;
pub use device_type::DeviceType;
pub use position::PositionMapping;
pub use speed::SpeedSteps;
pub use version::Version;
