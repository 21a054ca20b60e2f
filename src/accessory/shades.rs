// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shades and awning composer.

use std::sync::Arc;

use crate::accessory::services::{ButtonService, WindowCoveringService};
use crate::accessory::{
    AccessoryOptions, BondAccessory, TOGGLE_STATE, invoke, press, prune, toggle,
};
use crate::capabilities::ShadeCapabilities;
use crate::device::Device;
use crate::host::{PlatformAccessory, Props};
use crate::observer::{Observer, rejected};
use crate::protocol::{BondApi, Transport};
use crate::state::{BondState, ToggleProperty};
use crate::types::{Action, PositionMapping};

const PRESET: &str = "Preset";

/// A window covering.
///
/// The target position is driven, in order of preference, by
/// `SetPosition`, `Open`/`Close` or `ToggleOpen`. Without `SetPosition`
/// the covering only moves between fully closed and fully open.
pub struct ShadesAccessory {
    accessory: Arc<PlatformAccessory>,
    device: Arc<Device>,
    covering: WindowCoveringService,
    position: Option<PositionMapping>,
}

impl ShadesAccessory {
    /// Adds and binds the covering's services.
    pub async fn new<T: Transport>(
        api: Arc<BondApi<T>>,
        accessory: Arc<PlatformAccessory>,
        device: Arc<Device>,
        caps: ShadeCapabilities,
        options: &AccessoryOptions,
    ) -> Self {
        let name = accessory.display_name().to_string();
        let observer = Observer::new(name.clone());
        let covering = WindowCoveringService::new(&accessory);

        let target = &covering.target_position;
        if let Some(mapping) = caps.position {
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(target, move |value| {
                match value.as_int().and_then(|v| mapping.try_to_remote(v)) {
                    Ok(position) => {
                        invoke(&api, &device, Action::SetPosition, Some(i64::from(position)))
                    }
                    Err(e) => rejected(e),
                }
            });
        } else if caps.open_close {
            target.set_props(Props::new().with_min_step(100));
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(target, move |value| match value.as_int() {
                Ok(v) if v > 0 => invoke(&api, &device, Action::Open, None),
                Ok(_) => invoke(&api, &device, Action::Close, None),
                Err(e) => rejected(e),
            });
        } else if caps.toggle_open {
            target.set_props(Props::new().with_min_step(100));
            let (api, device) = (Arc::clone(&api), Arc::clone(&device));
            observer.set(target, move |_| invoke(&api, &device, Action::ToggleOpen, None));
        } else {
            tracing::error!(
                device = %name,
                "Shades are missing SetPosition, Open/Close and ToggleOpen"
            );
        }

        if caps.preset {
            ButtonService::new(&accessory, PRESET, Some(PRESET))
                .bind(&observer, press(&api, &device, Action::Preset))
                .await;
        } else {
            prune(&accessory, &[PRESET]);
        }

        if options.include_toggle_state {
            ButtonService::new(&accessory, TOGGLE_STATE, Some("ToggleState"))
                .bind(&observer, toggle(&api, &device, ToggleProperty::Open))
                .await;
        } else {
            prune(&accessory, &[TOGGLE_STATE]);
        }

        Self {
            accessory,
            device,
            covering,
            position: caps.position,
        }
    }

    /// Returns the window covering service.
    #[must_use]
    pub fn covering(&self) -> &WindowCoveringService {
        &self.covering
    }
}

impl BondAccessory for ShadesAccessory {
    fn accessory(&self) -> &Arc<PlatformAccessory> {
        &self.accessory
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn update_state(&self, state: &BondState) {
        let shown = match (self.position, state.position) {
            (Some(mapping), Some(position)) => Some(mapping.to_homekit(position)),
            _ => state.open.map(|open| if open == 1 { 100 } else { 0 }),
        };
        if let Some(position) = shown {
            self.covering.show_position(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::{Value as Json, json};

    use super::*;
    use crate::capabilities::{Archetype, DerivationOptions};
    use crate::error::Result;
    use crate::host::Value;
    use crate::protocol::ApiRequest;
    use crate::types::DeviceType;

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

    async fn shades(device: Device) -> (ShadesAccessory, Arc<BondApi<Recorder>>) {
        let Some(Archetype::Shades(caps)) =
            Archetype::from_device(&device, DerivationOptions::default())
        else {
            panic!("expected shades");
        };
        let api = Arc::new(BondApi::new(Recorder::default()));
        let accessory = PlatformAccessory::new(device.clone());
        let shades = ShadesAccessory::new(
            Arc::clone(&api),
            accessory,
            Arc::new(device),
            caps,
            &AccessoryOptions::default(),
        )
        .await;
        (shades, api)
    }

    #[tokio::test]
    async fn target_position_is_inverted_for_shades() {
        let device = Device::new("5", "Blind", DeviceType::Shades)
            .with_actions([Action::SetPosition, Action::Open, Action::Close]);
        let (shades, api) = shades(device).await;

        shades.covering().target_position.handle_set(25).await.unwrap();

        let requests = api.transport().requests.lock().clone();
        assert_eq!(
            requests,
            vec![(
                "/v2/devices/5/actions/SetPosition".to_string(),
                Some(json!({"argument": 75}))
            )]
        );
    }

    #[tokio::test]
    async fn open_close_snaps_to_full_steps() {
        let device =
            Device::new("5", "Blind", DeviceType::Shades).with_actions([Action::Open, Action::Close]);
        let (shades, api) = shades(device).await;
        let target = &shades.covering().target_position;
        assert_eq!(target.props().min_step, Some(100));

        target.handle_set(100).await.unwrap();
        target.handle_set(0).await.unwrap();

        let paths: Vec<_> = api
            .transport()
            .requests
            .lock()
            .iter()
            .map(|(path, _)| path.clone())
            .collect();
        assert_eq!(
            paths,
            vec!["/v2/devices/5/actions/Open", "/v2/devices/5/actions/Close"]
        );
    }

    #[tokio::test]
    async fn renders_open_without_position() {
        let device =
            Device::new("5", "Blind", DeviceType::Shades).with_actions([Action::ToggleOpen]);
        let (shades, _) = shades(device).await;

        shades.update_state(&BondState {
            open: Some(1),
            ..BondState::default()
        });
        assert_eq!(shades.covering().current_position.value(), Value::Int(100));
        assert_eq!(shades.covering().target_position.value(), Value::Int(100));
    }

    #[tokio::test]
    async fn renders_mapped_position() {
        let device = Device::new("5", "Awning", DeviceType::Shades)
            .with_subtype("AWNING")
            .with_actions([Action::SetPosition]);
        let (shades, _) = shades(device).await;

        shades.update_state(&BondState {
            position: Some(30),
            open: Some(1),
            ..BondState::default()
        });
        assert_eq!(shades.covering().current_position.value(), Value::Int(30));
    }

    #[tokio::test]
    async fn preset_button_only_with_preset_action() {
        let with_preset = Device::new("5", "Blind", DeviceType::Shades)
            .with_actions([Action::ToggleOpen, Action::Preset]);
        let (with_shades, _) = shades(with_preset).await;
        assert!(with_shades.accessory().service_by_name(PRESET).is_some());

        let without =
            Device::new("6", "Blind", DeviceType::Shades).with_actions([Action::ToggleOpen]);
        let (shades, _) = shades(without).await;
        assert!(shades.accessory().service_by_name(PRESET).is_none());
    }
}
