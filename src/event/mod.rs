// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Platform events.
//!
//! The platform reports accessory registration changes and pushed device
//! state on an [`EventBus`] backed by tokio's broadcast channel, so the
//! embedding host can persist its accessory cache and observers can follow
//! state without polling.
//!
//! # Examples
//!
//! ```
//! use bond_bridge::device::Device;
//! use bond_bridge::event::{EventBus, PlatformEvent};
//! use bond_bridge::host::PlatformAccessory;
//! use bond_bridge::types::DeviceType;
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! let fan = PlatformAccessory::new(Device::new("42", "Fan", DeviceType::CeilingFan));
//! bus.accessory_registered(&fan);
//! assert!(matches!(rx.try_recv(), Ok(PlatformEvent::AccessoryRegistered { .. })));
//! ```

mod event_bus;
mod platform_event;

pub use event_bus::EventBus;
pub use platform_event::PlatformEvent;
