// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Accessory composers.
//!
//! Each device archetype has a composer that adds the services the device
//! supports to a [`PlatformAccessory`] and binds them to remote actions:
//!
//! | Archetype | Composer | Services |
//! |---|---|---|
//! | Ceiling fan | [`CeilingFanAccessory`] | fan, light(s), dimmer switches, buttons |
//! | Light | [`LightAccessory`] | light, toggle button |
//! | Shades | [`ShadesAccessory`] | window covering, preset and toggle buttons |
//! | Fireplace | [`FireplaceAccessory`] | flame (light or switch), toggle button |
//! | Generic | [`GenericAccessory`] | switch, toggle button |
//!
//! Remote state reaches every composer through
//! [`BondAccessory::update_state`], both for the initial read
//! ([`refresh`]) and for pushed updates.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use bond_bridge::accessory::{self, AccessoryOptions};
//! use bond_bridge::host::PlatformAccessory;
//! use bond_bridge::protocol::{BondApi, HttpConfig};
//!
//! # async fn example() -> bond_bridge::Result<()> {
//! let api = Arc::new(BondApi::http(HttpConfig::new("192.168.1.50", "token"))?);
//! let device = api.get_device("3c4d5e6f").await?;
//!
//! let bound = accessory::create(
//!     Arc::clone(&api),
//!     PlatformAccessory::new(device),
//!     &AccessoryOptions::default(),
//! )
//! .await?;
//! accessory::refresh(&api, bound.as_ref()).await?;
//! # Ok(())
//! # }
//! ```

mod ceiling_fan;
mod dimmer;
mod fireplace;
mod generic;
mod light;
mod lightbulb;
mod services;
mod shades;

use std::sync::Arc;
use std::time::Duration;

pub use ceiling_fan::CeilingFanAccessory;
pub use dimmer::{DEFAULT_DIMMER_STEP, TimedDimmer};
pub use fireplace::FireplaceAccessory;
pub use generic::GenericAccessory;
pub use light::LightAccessory;
pub use lightbulb::LightControl;
pub use services::{
    BUTTON_RESET_DELAY, ButtonService, DOWN_LIGHT, FanService, FlameService, LightbulbService,
    SwitchService, UP_LIGHT, WindowCoveringService,
};
pub use shades::ShadesAccessory;

use crate::capabilities::{Archetype, DerivationOptions};
use crate::device::Device;
use crate::error::{DeviceError, Result};
use crate::host::{CharacteristicKind, PlatformAccessory, ServiceKind, SetFuture};
use crate::observer::remote;
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};
use crate::types::{Action, Version};

/// Name of the toggle-state button of single-light and non-light devices.
pub const TOGGLE_STATE: &str = "Toggle State";

/// A device bound to a host accessory.
pub trait BondAccessory: Send + Sync {
    /// Returns the host accessory.
    fn accessory(&self) -> &Arc<PlatformAccessory>;

    /// Returns the device snapshot the accessory was built from.
    fn device(&self) -> &Device;

    /// Applies remote state to the displayed values.
    ///
    /// `state` may be partial; fields it lacks keep their last value.
    fn update_state(&self, state: &BondState);
}

/// Options shared by all composers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
// Each flag is an independent configuration switch.
#[allow(clippy::struct_excessive_bools)]
pub struct AccessoryOptions {
    /// Add dimmer switches to ceiling fan lights.
    pub include_dimmer: bool,
    /// Add toggle-state buttons.
    pub include_toggle_state: bool,
    /// Use the speed ordinal as rotation speed step.
    pub fan_speed_values: bool,
    /// Flip the shade position inversion.
    pub invert_shade_position: bool,
    /// Time per percent for timed dimming.
    pub dimmer_step: Duration,
}

impl Default for AccessoryOptions {
    fn default() -> Self {
        Self {
            include_dimmer: false,
            include_toggle_state: false,
            fan_speed_values: false,
            invert_shade_position: false,
            dimmer_step: DEFAULT_DIMMER_STEP,
        }
    }
}

impl AccessoryOptions {
    /// Returns the capability derivation options.
    #[must_use]
    pub fn derivation(&self) -> DerivationOptions {
        DerivationOptions {
            fan_speed_values: self.fan_speed_values,
            invert_shade_position: self.invert_shade_position,
        }
    }
}

/// Composes the accessory matching the device stored in `accessory`.
///
/// # Errors
///
/// Returns `DeviceError::UnsupportedDeviceType` if the device type has no
/// composer.
pub async fn create<T: Transport>(
    api: Arc<BondApi<T>>,
    accessory: Arc<PlatformAccessory>,
    options: &AccessoryOptions,
) -> Result<Arc<dyn BondAccessory>> {
    let device = accessory.device();
    let Some(archetype) = Archetype::from_device(&device, options.derivation()) else {
        return Err(DeviceError::UnsupportedDeviceType(device.device_type.to_string()).into());
    };

    tracing::info!(device = %accessory.display_name(), id = %device.id, "Composing accessory");
    let device = Arc::new(device);
    let bound: Arc<dyn BondAccessory> = match archetype {
        Archetype::CeilingFan(caps) => {
            Arc::new(CeilingFanAccessory::new(api, accessory, device, caps, options).await)
        }
        Archetype::Light(caps) => {
            Arc::new(LightAccessory::new(api, accessory, device, caps, options).await)
        }
        Archetype::Shades(caps) => {
            Arc::new(ShadesAccessory::new(api, accessory, device, caps, options).await)
        }
        Archetype::Fireplace(caps) => {
            Arc::new(FireplaceAccessory::new(api, accessory, device, caps, options).await)
        }
        Archetype::Generic(caps) => {
            Arc::new(GenericAccessory::new(api, accessory, device, caps, options).await)
        }
    };
    Ok(bound)
}

/// Fills the accessory information service from the Bond and device.
pub fn set_information(accessory: &PlatformAccessory, version: &Version, device: &Device) {
    let Some(info) = accessory.service(ServiceKind::AccessoryInformation) else {
        return;
    };
    info.set_characteristic(CharacteristicKind::Manufacturer, version.manufacturer());
    info.set_characteristic(CharacteristicKind::FirmwareRevision, version.fw_ver.clone());
    info.set_characteristic(CharacteristicKind::SerialNumber, device.unique_id());
    if let Some(model) = &version.model {
        info.set_characteristic(CharacteristicKind::Model, model.clone());
    }
    if let Some(mcu_ver) = &version.mcu_ver {
        info.set_characteristic(CharacteristicKind::HardwareRevision, mcu_ver.clone());
    }
}

/// Reads the device state once and applies it.
///
/// # Errors
///
/// Returns error if the state read fails; displayed values are unchanged.
pub async fn refresh<T: Transport>(api: &BondApi<T>, accessory: &dyn BondAccessory) -> Result<()> {
    let state = api.get_state(&accessory.device().id).await?;
    accessory.update_state(&state);
    Ok(())
}

/// Removes the named optional services that are no longer wanted.
pub(crate) fn prune(accessory: &PlatformAccessory, names: &[&str]) {
    for name in names {
        if accessory.remove_service_by_name(name) {
            tracing::info!(device = %accessory.display_name(), service = %name, "Removed service");
        }
    }
}

/// Returns a `set` result that invokes `action`.
pub(crate) fn invoke<T: Transport>(
    api: &Arc<BondApi<T>>,
    device: &Arc<Device>,
    action: Action,
    argument: Option<i64>,
) -> Option<SetFuture> {
    let (api, device) = (Arc::clone(api), Arc::clone(device));
    remote(async move { api.action(&device, action, argument).await })
}

/// Returns a future that toggles `property` in the Bond's belief state.
pub(crate) fn toggle<T: Transport>(
    api: &Arc<BondApi<T>>,
    device: &Arc<Device>,
    property: ToggleProperty,
) -> impl Fn() -> SetFuture + Send + Sync + 'static {
    let (api, device) = (Arc::clone(api), Arc::clone(device));
    move || -> SetFuture {
        let (api, device) = (Arc::clone(&api), Arc::clone(&device));
        Box::pin(async move { api.toggle_state(&device, property.as_str()).await })
    }
}

/// Returns a future that invokes `action` each time it is called.
pub(crate) fn press<T: Transport>(
    api: &Arc<BondApi<T>>,
    device: &Arc<Device>,
    action: Action,
) -> impl Fn() -> SetFuture + Send + Sync + 'static {
    let (api, device) = (Arc::clone(api), Arc::clone(device));
    move || -> SetFuture {
        let (api, device) = (Arc::clone(&api), Arc::clone(&device));
        Box::pin(async move { api.action(&device, action, None).await })
    }
}

/// Shared power binding of fireplaces and generic devices: explicit
/// `TurnOn`/`TurnOff` when available, otherwise `TogglePower`.
pub(crate) fn power_action(value: bool, off_on: bool) -> Action {
    match (off_on, value) {
        (true, true) => Action::TurnOn,
        (true, false) => Action::TurnOff,
        (false, _) => Action::TogglePower,
    }
}
