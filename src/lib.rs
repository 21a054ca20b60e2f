// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bond Bridge - expose Bond devices as HomeKit-style accessories.
//!
//! A Bond is a local hub that drives RF and IR controlled ceiling fans,
//! lights, shades and fireplaces. This library talks to Bonds over their
//! local HTTP API, derives what each device can do from the actions it
//! declares, and binds those capabilities to the characteristics of host
//! accessories. State changes made with physical remotes arrive over the
//! Bond's UDP push channel and are reflected on the accessories.
//!
//! # Supported Devices
//!
//! - **Ceiling fans**: power, speed, direction, light(s), dimmers
//! - **Lights**: power, absolute or timed brightness
//! - **Shades and awnings**: position, open/close, preset
//! - **Fireplaces**: power, flame height
//! - **Generic devices**: power
//!
//! # Quick Start
//!
//! ## Whole platform
//!
//! ```no_run
//! use bond_bridge::platform::{BondConfig, Platform, PlatformConfig};
//!
//! #[tokio::main]
//! async fn main() -> bond_bridge::Result<()> {
//!     let config = PlatformConfig::new()
//!         .with_bond(BondConfig::new("192.168.1.50", "f0e1d2c3"))
//!         .with_include_toggle_state(true);
//!
//!     let platform = Platform::http(config);
//!     platform.start().await?;
//!     platform.listen().await;
//!
//!     for accessory in platform.accessories() {
//!         println!("{}", accessory.display_name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Single device
//!
//! ```no_run
//! use bond_bridge::protocol::{BondApi, HttpConfig};
//! use bond_bridge::types::Action;
//!
//! #[tokio::main]
//! async fn main() -> bond_bridge::Result<()> {
//!     let api = BondApi::http(HttpConfig::new("192.168.1.50", "f0e1d2c3"))?;
//!
//!     for id in api.get_device_ids().await? {
//!         let device = api.get_device(&id).await?;
//!         if device.has_action(Action::TurnOn) {
//!             api.action(&device, Action::TurnOn, None).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod accessory;
pub mod capabilities;
pub mod device;
pub mod error;
pub mod event;
pub mod host;
pub mod observer;
pub mod platform;
pub mod protocol;
pub mod push;
pub mod state;
pub mod types;

pub use capabilities::{
    Archetype, BrightnessControl, DerivationOptions, FanCapabilities, FireplaceCapabilities,
    GenericCapabilities, LightCapabilities, ShadeCapabilities, SpeedControl, fan_speeds,
};
pub use device::{Command, Device, Properties};
pub use error::{DeviceError, Error, ParseError, ProtocolError, Result, ValueError};
pub use event::{EventBus, PlatformEvent};
pub use platform::{BondConfig, Platform, PlatformConfig};
pub use protocol::{BondApi, HttpConfig, HttpTransport, Transport};
pub use push::{PushListener, PushPacket};
pub use state::{BondState, ToggleProperty};
pub use types::{Action, DeviceType, PositionMapping, SpeedSteps, Version};
