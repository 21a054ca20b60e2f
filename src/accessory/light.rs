// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Standalone light composer.

use std::sync::Arc;

use crate::accessory::lightbulb::LightControl;
use crate::accessory::services::{ButtonService, LightbulbService};
use crate::accessory::{AccessoryOptions, BondAccessory, TOGGLE_STATE, prune, toggle};
use crate::capabilities::{BrightnessControl, LightCapabilities};
use crate::device::Device;
use crate::host::PlatformAccessory;
use crate::observer::Observer;
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};

/// A light, dimmable when the device supports brightness.
///
/// Lights with only `StartIncreasingBrightness`/`StartDecreasingBrightness`
/// get a brightness characteristic driven by a
/// [`TimedDimmer`](crate::accessory::TimedDimmer).
pub struct LightAccessory<T: Transport> {
    accessory: Arc<PlatformAccessory>,
    device: Arc<Device>,
    light: LightControl<T>,
}

impl<T: Transport> LightAccessory<T> {
    /// Adds and binds the light's services.
    pub async fn new(
        api: Arc<BondApi<T>>,
        accessory: Arc<PlatformAccessory>,
        device: Arc<Device>,
        caps: LightCapabilities,
        options: &AccessoryOptions,
    ) -> Self {
        let name = accessory.display_name().to_string();
        let observer = Observer::new(name.clone());

        let dimmable = caps.brightness != BrightnessControl::None;
        let service = LightbulbService::new(&accessory, &format!("{name} Light"), None, dimmable);
        let light = LightControl::bind(
            service,
            &observer,
            &api,
            &device,
            caps.brightness,
            options.dimmer_step,
        );

        if options.include_toggle_state {
            ButtonService::new(&accessory, TOGGLE_STATE, Some("ToggleState"))
                .bind(&observer, toggle(&api, &device, ToggleProperty::Light))
                .await;
        } else {
            prune(&accessory, &[TOGGLE_STATE]);
        }

        Self {
            accessory,
            device,
            light,
        }
    }

    /// Returns the bound light.
    #[must_use]
    pub fn light(&self) -> &LightControl<T> {
        &self.light
    }
}

impl<T: Transport> BondAccessory for LightAccessory<T> {
    fn accessory(&self) -> &Arc<PlatformAccessory> {
        &self.accessory
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn update_state(&self, state: &BondState) {
        self.light.update_state(state);
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::Value as Json;

    use super::*;
    use crate::error::Result;
    use crate::host::{ServiceKind, Value};
    use crate::protocol::ApiRequest;
    use crate::types::{Action, DeviceType};

    #[derive(Default)]
    struct Recorder {
        requests: Mutex<Vec<(String, Option<Json>)>>,
    }

    impl Transport for Recorder {
        async fn execute(&self, request: ApiRequest) -> Result<Json> {
            self.requests.lock().push((request.path, request.body));
            Ok(Json::Null)
        }
    }

    async fn light(
        actions: &[Action],
        options: AccessoryOptions,
    ) -> (LightAccessory<Recorder>, Arc<BondApi<Recorder>>) {
        let device =
            Device::new("9", "Lamp", DeviceType::Light).with_actions(actions.iter().copied());
        let accessory = PlatformAccessory::new(device.clone());
        let caps = LightCapabilities::from_device(&device);
        let api = Arc::new(BondApi::new(Recorder::default()));
        let light =
            LightAccessory::new(Arc::clone(&api), accessory, Arc::new(device), caps, &options)
                .await;
        (light, api)
    }

    #[tokio::test]
    async fn non_numeric_brightness_is_rejected_without_request() {
        let (light, api) = light(
            &[Action::ToggleLight, Action::SetBrightness, Action::TurnLightOff],
            AccessoryOptions::default(),
        )
        .await;
        let brightness = light.light().service().brightness.clone().unwrap();
        brightness.update_value(60);

        assert!(brightness.handle_set(true).await.is_ok());

        assert_eq!(brightness.value(), Value::Int(60));
        assert!(api.transport().requests.lock().is_empty());
    }

    #[tokio::test]
    async fn absolute_brightness_zero_turns_light_off() {
        let (light, api) = light(
            &[Action::ToggleLight, Action::SetBrightness, Action::TurnLightOff],
            AccessoryOptions::default(),
        )
        .await;
        assert!(light.light().dimmer().is_none());
        let brightness = light.light().service().brightness.clone().unwrap();
        brightness.update_value(60);

        brightness.handle_set(0).await.unwrap();
        brightness.handle_set(35).await.unwrap();

        let requests = api.transport().requests.lock().clone();
        assert_eq!(
            requests,
            vec![
                ("/v2/devices/9/actions/TurnLightOff".to_string(), Some(serde_json::json!({}))),
                (
                    "/v2/devices/9/actions/SetBrightness".to_string(),
                    Some(serde_json::json!({"argument": 35}))
                ),
            ]
        );
        assert_eq!(brightness.value(), Value::Int(35));
    }

    #[tokio::test]
    async fn directional_dimmer_gets_timed_brightness() {
        let (light, _) = light(
            &[
                Action::ToggleLight,
                Action::StartIncreasingBrightness,
                Action::StartDecreasingBrightness,
                Action::Stop,
            ],
            AccessoryOptions::default(),
        )
        .await;

        assert!(light.light().service().brightness.is_some());
        assert!(light.light().dimmer().is_some());
    }

    #[tokio::test]
    async fn toggle_button_follows_option() {
        let options = AccessoryOptions {
            include_toggle_state: true,
            ..AccessoryOptions::default()
        };
        let (with_button, _) = light(&[Action::ToggleLight], options).await;
        assert!(with_button.accessory().service_by_name(TOGGLE_STATE).is_some());

        let (without, _) = light(&[Action::ToggleLight], AccessoryOptions::default()).await;
        assert!(without.accessory().service_by_name(TOGGLE_STATE).is_none());
        assert!(without.accessory().service(ServiceKind::Lightbulb).is_some());
    }

    #[tokio::test]
    async fn renders_light_and_brightness() {
        let (light, _) = light(
            &[Action::ToggleLight, Action::SetBrightness],
            AccessoryOptions::default(),
        )
        .await;
        light.update_state(&BondState {
            light: Some(1),
            brightness: Some(70),
            ..BondState::default()
        });

        let service = light.light().service();
        assert_eq!(service.on.value(), Value::Bool(true));
        assert_eq!(service.brightness.as_ref().unwrap().value(), Value::Int(70));
    }
}
