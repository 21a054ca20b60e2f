// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generic device composer.

use std::sync::Arc;

use crate::accessory::services::{ButtonService, SwitchService};
use crate::accessory::{
    AccessoryOptions, BondAccessory, TOGGLE_STATE, invoke, power_action, prune, toggle,
};
use crate::capabilities::GenericCapabilities;
use crate::device::Device;
use crate::host::PlatformAccessory;
use crate::observer::{Observer, rejected};
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};

/// A device with nothing but power, shown as a switch.
pub struct GenericAccessory {
    accessory: Arc<PlatformAccessory>,
    device: Arc<Device>,
    switch: SwitchService,
}

impl GenericAccessory {
    /// Adds and binds the device's services.
    pub async fn new<T: Transport>(
        api: Arc<BondApi<T>>,
        accessory: Arc<PlatformAccessory>,
        device: Arc<Device>,
        caps: GenericCapabilities,
        options: &AccessoryOptions,
    ) -> Self {
        let name = accessory.display_name().to_string();
        let observer = Observer::new(name.clone());
        let switch = SwitchService::new(&accessory, &name, None);

        if caps.toggle_power || caps.off_on {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            let off_on = caps.off_on;
            observer.set(&switch.on, move |value| match value.as_bool() {
                Ok(on) => invoke(&api, &device, power_action(on, off_on), None),
                Err(e) => rejected(e),
            });
        } else {
            tracing::error!(device = %name, "Generic device is missing TogglePower");
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
            switch,
        }
    }

    /// Returns the power switch.
    #[must_use]
    pub fn switch(&self) -> &SwitchService {
        &self.switch
    }
}

impl BondAccessory for GenericAccessory {
    fn accessory(&self) -> &Arc<PlatformAccessory> {
        &self.accessory
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn update_state(&self, state: &BondState) {
        if let Some(power) = state.power {
            self.switch.on.update_value(power == 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::Value as Json;

    use super::*;
    use crate::error::Result;
    use crate::host::Value;
    use crate::protocol::ApiRequest;
    use crate::types::DeviceType;

    #[derive(Default)]
    struct Recorder {
        paths: Mutex<Vec<String>>,
    }

    impl Transport for Recorder {
        async fn execute(&self, request: ApiRequest) -> Result<Json> {
            self.paths.lock().push(request.path);
            Ok(Json::Null)
        }
    }

    #[tokio::test]
    async fn switch_uses_explicit_power_actions() {
        let device = Device::new("8", "Heater", DeviceType::Generic);
        let api = Arc::new(BondApi::new(Recorder::default()));
        let options = AccessoryOptions {
            include_toggle_state: true,
            ..AccessoryOptions::default()
        };
        let generic = GenericAccessory::new(
            Arc::clone(&api),
            PlatformAccessory::new(device.clone()),
            Arc::new(device),
            GenericCapabilities {
                toggle_power: true,
                off_on: true,
            },
            &options,
        )
        .await;
        assert!(generic.accessory().service_by_name(TOGGLE_STATE).is_some());

        generic.switch().on.handle_set(true).await.unwrap();
        generic.switch().on.handle_set(false).await.unwrap();
        assert_eq!(
            api.transport().paths.lock().clone(),
            vec!["/v2/devices/8/actions/TurnOn", "/v2/devices/8/actions/TurnOff"]
        );

        generic.update_state(&BondState {
            power: Some(1),
            ..BondState::default()
        });
        assert_eq!(generic.switch().on.value(), Value::Bool(true));
    }
}
