// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fireplace composer.

use std::sync::Arc;

use crate::accessory::services::{ButtonService, FlameService};
use crate::accessory::{
    AccessoryOptions, BondAccessory, TOGGLE_STATE, invoke, power_action, prune, toggle,
};
use crate::capabilities::FireplaceCapabilities;
use crate::device::Device;
use crate::host::PlatformAccessory;
use crate::observer::{Observer, rejected};
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};
use crate::types::Action;

/// A fireplace, shown as a dimmable light when the flame height can be
/// set and as a switch otherwise.
pub struct FireplaceAccessory {
    accessory: Arc<PlatformAccessory>,
    device: Arc<Device>,
    flame: FlameService,
}

impl FireplaceAccessory {
    /// Adds and binds the fireplace's services.
    pub async fn new<T: Transport>(
        api: Arc<BondApi<T>>,
        accessory: Arc<PlatformAccessory>,
        device: Arc<Device>,
        caps: FireplaceCapabilities,
        options: &AccessoryOptions,
    ) -> Self {
        let name = accessory.display_name().to_string();
        let observer = Observer::new(name.clone());
        let flame = FlameService::new(&accessory, caps.flame);

        if caps.toggle_power || caps.off_on {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            let off_on = caps.off_on;
            observer.set(&flame.on, move |value| match value.as_bool() {
                Ok(on) => invoke(&api, &device, power_action(on, off_on), None),
                Err(e) => rejected(e),
            });
        } else {
            tracing::error!(device = %name, "Fireplace is missing TogglePower");
        }

        if let Some(height) = &flame.brightness {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(height, move |value| match value.as_int() {
                // Height 0 turns the light off, handled by the power binding
                Ok(0) => None,
                Ok(level) => invoke(&api, &device, Action::SetFlame, Some(level)),
                Err(e) => rejected(e),
            });
        }

        if options.include_toggle_state {
            ButtonService::new(&accessory, TOGGLE_STATE, Some("ToggleState"))
                .bind(&observer, toggle(&api, &device, ToggleProperty::Power))
                .await;
        } else {
            prune(&accessory, &[TOGGLE_STATE]);
        }

        Self {
            accessory,
            device,
            flame,
        }
    }

    /// Returns the flame service.
    #[must_use]
    pub fn flame(&self) -> &FlameService {
        &self.flame
    }
}

impl BondAccessory for FireplaceAccessory {
    fn accessory(&self) -> &Arc<PlatformAccessory> {
        &self.accessory
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn update_state(&self, state: &BondState) {
        self.flame.update_state(state);
    }
}
