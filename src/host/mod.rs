// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host capability interface.
//!
//! The accessory runtime that embeds this library sees devices through three
//! containers:
//!
//! - [`Characteristic`] - one value with constraints and read/write handlers
//! - [`Service`] - characteristics grouped by kind and optional subtype
//! - [`PlatformAccessory`] - services plus a persisted [`AccessoryContext`]
//!
//! The host drives reads and writes through
//! [`Characteristic::handle_get`] and [`Characteristic::handle_set`]; the
//! library pushes authoritative values with [`Characteristic::update_value`].

mod accessory;
mod characteristic;
mod service;
mod value;

pub use accessory::{AccessoryContext, CachedAccessory, PlatformAccessory};
pub use characteristic::{
    Characteristic, CharacteristicKind, GetFuture, GetHandler, SetFuture, SetHandler,
};
pub use service::{Service, ServiceKind};
pub use value::{Props, Value};
